//! Technology catalog and the aggregate bonuses a tribe earns from it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a technology in the injected catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechId(pub String);

impl TechId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TechId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource classes a scavenging party can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Scrap,
    Weapons,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Scrap => "scrap",
            Self::Weapons => "weapons",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed effect granted by a completed technology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TechEffect {
    /// Food credited to global resources every turn.
    PassiveFood { amount: u32 },
    /// Scrap credited to global resources every turn.
    PassiveScrap { amount: u32 },
    /// Fractional yield bonus when scavenging the named resource.
    ScavengeBonus { resource: ResourceKind, fraction: f64 },
    /// Fractional attack strength bonus in combat.
    CombatAttack { fraction: f64 },
    /// Fractional defense strength bonus in combat.
    CombatDefense { fraction: f64 },
    /// Fractional movement speed bonus for journeys.
    MovementBonus { fraction: f64 },
}

impl TechEffect {
    /// Short human-readable description used in breakthrough narratives.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::PassiveFood { amount } => format!("+{amount} food per turn"),
            Self::PassiveScrap { amount } => format!("+{amount} scrap per turn"),
            Self::ScavengeBonus { resource, fraction } => {
                format!("+{:.0}% {resource} scavenging", fraction * 100.0)
            }
            Self::CombatAttack { fraction } => format!("+{:.0}% attack", fraction * 100.0),
            Self::CombatDefense { fraction } => format!("+{:.0}% defense", fraction * 100.0),
            Self::MovementBonus { fraction } => format!("+{:.0}% movement", fraction * 100.0),
        }
    }
}

/// A single researchable technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub id: TechId,
    pub name: String,
    /// Progress points required to finish the project.
    pub research_points: u32,
    /// Minimum troops that must staff the project.
    pub min_troops: u32,
    /// Scrap debited when research starts.
    pub scrap_cost: u32,
    #[serde(default)]
    pub effects: Vec<TechEffect>,
}

/// Injected read-only technology catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechCatalog {
    techs: BTreeMap<TechId, Technology>,
}

impl TechCatalog {
    #[must_use]
    pub fn new(techs: Vec<Technology>) -> Self {
        Self {
            techs: techs.into_iter().map(|tech| (tech.id.clone(), tech)).collect(),
        }
    }

    /// Parse a catalog from its JSON asset.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON does not describe a tech list.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        use anyhow::Context as _;
        let techs: Vec<Technology> =
            serde_json::from_str(json).context("parsing technology catalog")?;
        Ok(Self::new(techs))
    }

    #[must_use]
    pub fn get(&self, id: &TechId) -> Option<&Technology> {
        self.techs.get(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.techs.is_empty()
    }
}

/// Sum of all effects from a tribe's completed technologies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechBonuses {
    pub passive_food: u32,
    pub passive_scrap: u32,
    pub scavenge: BTreeMap<ResourceKind, f64>,
    pub attack: f64,
    pub defense: f64,
    pub movement: f64,
}

impl TechBonuses {
    /// Fractional scavenge bonus for one resource, zero when none earned.
    #[must_use]
    pub fn scavenge_bonus(&self, resource: ResourceKind) -> f64 {
        self.scavenge.get(&resource).copied().unwrap_or(0.0)
    }
}

/// Fold a tribe's completed technologies into one aggregate bonus block.
///
/// Unknown tech ids are skipped; the catalog is authoritative.
#[must_use]
pub fn aggregate_bonuses(completed: &BTreeSet<TechId>, catalog: &TechCatalog) -> TechBonuses {
    let mut bonuses = TechBonuses::default();
    for id in completed {
        let Some(tech) = catalog.get(id) else {
            continue;
        };
        for effect in &tech.effects {
            match *effect {
                TechEffect::PassiveFood { amount } => {
                    bonuses.passive_food = bonuses.passive_food.saturating_add(amount);
                }
                TechEffect::PassiveScrap { amount } => {
                    bonuses.passive_scrap = bonuses.passive_scrap.saturating_add(amount);
                }
                TechEffect::ScavengeBonus { resource, fraction } => {
                    *bonuses.scavenge.entry(resource).or_insert(0.0) += fraction;
                }
                TechEffect::CombatAttack { fraction } => bonuses.attack += fraction,
                TechEffect::CombatDefense { fraction } => bonuses.defense += fraction,
                TechEffect::MovementBonus { fraction } => bonuses.movement += fraction,
            }
        }
    }
    bonuses
}
