//! Whole-world snapshot types: tribes, garrisons, diplomacy, and the
//! turn-scoped narrative accumulator.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::hex::HexKey;
use crate::journey::{Journey, JourneyId};
use crate::tech::TechId;

/// Morale is a percentage meter.
pub const MORALE_MAX: u32 = 100;

/// Chiefs attached to a garrison or traveling force, by name.
pub type ChiefSet = SmallVec<[String; 2]>;

/// Identifier of a tribe within one game world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TribeId(pub u32);

impl fmt::Display for TribeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tribe-{}", self.0)
    }
}

/// Leader stat block feeding action formulas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub charisma: u32,
    pub intelligence: u32,
    pub leadership: u32,
    pub strength: u32,
}

/// Tribe-wide stockpiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalResources {
    pub food: u32,
    pub scrap: u32,
    pub morale: u32,
}

/// Ration policy selected by the player; persists until changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RationLevel {
    Hard,
    #[default]
    Normal,
    Generous,
}

impl RationLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Normal => "normal",
            Self::Generous => "generous",
        }
    }

    /// Food consumed per troop per turn.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Hard => 0.5,
            Self::Normal => 1.0,
            Self::Generous => 1.5,
        }
    }
}

impl fmt::Display for RationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RationLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard" => Ok(Self::Hard),
            "normal" => Ok(Self::Normal),
            "generous" => Ok(Self::Generous),
            _ => Err(()),
        }
    }
}

/// Troops, weapons, and chiefs stationed at one hex.
///
/// Owned exclusively by its tribe; emptied garrisons are harmless and are
/// not auto-deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garrison {
    pub troops: u32,
    pub weapons: u32,
    #[serde(default)]
    pub chiefs: ChiefSet,
}

impl Garrison {
    #[must_use]
    pub const fn new(troops: u32, weapons: u32) -> Self {
        Self {
            troops,
            weapons,
            chiefs: SmallVec::new_const(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.troops == 0 && self.weapons == 0 && self.chiefs.is_empty()
    }
}

/// Diplomatic stance between two tribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiplomaticStatus {
    War,
    #[default]
    Neutral,
    Alliance,
}

impl DiplomaticStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::War => "war",
            Self::Neutral => "neutral",
            Self::Alliance => "alliance",
        }
    }
}

impl fmt::Display for DiplomaticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tribe's recorded relation toward another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaticRelation {
    pub status: DiplomaticStatus,
    /// War declarations are blocked until this turn has passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truce_until_turn: Option<u32>,
}

/// Identifier of a diplomatic proposal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

/// A bundle of transferable resources (trade requests, payloads, reparations).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub food: u32,
    pub scrap: u32,
    pub weapons: u32,
}

impl ResourceBundle {
    #[must_use]
    pub const fn new(food: u32, scrap: u32, weapons: u32) -> Self {
        Self {
            food,
            scrap,
            weapons,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.food == 0 && self.scrap == 0 && self.weapons == 0
    }

    #[must_use]
    pub fn merged(self, other: Self) -> Self {
        Self {
            food: self.food.saturating_add(other.food),
            scrap: self.scrap.saturating_add(other.scrap),
            weapons: self.weapons.saturating_add(other.weapons),
        }
    }
}

impl fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} food, {} scrap, {} weapons",
            self.food, self.scrap, self.weapons
        )
    }
}

/// A pending alliance or peace proposal between two tribes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaticProposal {
    pub id: ProposalId,
    pub from: TribeId,
    pub to: TribeId,
    /// Target status on acceptance: `Alliance` or (for peace) `Neutral`.
    pub status_change_to: DiplomaticStatus,
    pub expires_on_turn: u32,
    /// Peace sweetener paid by the proposer on acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reparations: Option<ResourceBundle>,
}

/// A tribe's single in-flight research project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchProject {
    pub tech: TechId,
    pub progress: u32,
    /// Troops staffing the lab; physically present but reserved.
    pub assigned_troops: u32,
    pub location: HexKey,
}

/// Decision recorded by a tribe for an incoming trade journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResponse {
    Accept,
    Reject,
}

/// One player's (or AI's) colony.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tribe {
    pub name: String,
    pub stats: Stats,
    pub resources: GlobalResources,
    pub garrisons: BTreeMap<HexKey, Garrison>,
    pub explored: BTreeSet<HexKey>,
    pub rations: RationLevel,
    pub completed_techs: BTreeSet<TechId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_research: Option<ResearchProject>,
    pub diplomacy: BTreeMap<TribeId, DiplomaticRelation>,
    /// This turn's submitted action queue; consumed exactly once.
    #[serde(default)]
    pub actions: Vec<crate::actions::GameAction>,
    #[serde(default)]
    pub turn_submitted: bool,
    /// Narrative log from the most recent resolved turn.
    #[serde(default)]
    pub last_turn_results: Vec<String>,
    /// Per-turn responses to incoming trade journeys, by journey id.
    #[serde(default)]
    pub journey_responses: BTreeMap<JourneyId, TradeResponse>,
    /// Hexes under a Defend order. An order issued in turn T covers
    /// arrivals resolved in turn T+1; stale flags lapse when the next
    /// action queue is read.
    #[serde(default)]
    pub defending: BTreeSet<HexKey>,
}

impl Tribe {
    /// Garrison at a hex, creating an empty one on first use.
    pub fn garrison_mut(&mut self, at: &HexKey) -> &mut Garrison {
        self.garrisons.entry(at.clone()).or_default()
    }

    /// Troops at a hex that are free to act (research staffing is reserved).
    #[must_use]
    pub fn available_troops(&self, at: &HexKey) -> u32 {
        let stationed = self.garrisons.get(at).map_or(0, |g| g.troops);
        let reserved = self
            .current_research
            .as_ref()
            .filter(|project| &project.location == at)
            .map_or(0, |project| project.assigned_troops);
        stationed.saturating_sub(reserved)
    }

    /// All troops currently stationed in garrisons.
    #[must_use]
    pub fn garrison_troops(&self) -> u32 {
        self.garrisons.values().map(|g| g.troops).sum()
    }

    /// Recorded status toward another tribe, `Neutral` when unrecorded.
    #[must_use]
    pub fn relation(&self, other: TribeId) -> DiplomaticStatus {
        self.diplomacy.get(&other).map_or_else(Default::default, |r| r.status)
    }

    #[must_use]
    pub fn is_at_war(&self, other: TribeId) -> bool {
        self.relation(other) == DiplomaticStatus::War
    }

    /// Raise morale, clamped to the meter maximum.
    pub fn raise_morale(&mut self, amount: u32) {
        self.resources.morale = (self.resources.morale + amount).min(MORALE_MAX);
    }

    /// All weapons currently stocked in garrisons.
    #[must_use]
    pub fn total_weapons(&self) -> u32 {
        self.garrisons.values().map(|g| g.weapons).sum()
    }

    /// Debit weapons across garrisons in proportion to each garrison's
    /// share of the stockpile, so no single rack is emptied while others
    /// stay full. The rounding remainder comes off garrisons in key
    /// order, one weapon each.
    ///
    /// Returns `false` (and leaves state untouched) when the tribe cannot
    /// cover the amount.
    pub fn debit_weapons(&mut self, amount: u32) -> bool {
        let total = self.total_weapons();
        if total < amount {
            return false;
        }
        if amount == 0 {
            return true;
        }

        let mut taken = 0;
        for garrison in self.garrisons.values_mut() {
            #[allow(clippy::cast_possible_truncation)]
            let share =
                (u64::from(garrison.weapons) * u64::from(amount) / u64::from(total)) as u32;
            garrison.weapons -= share;
            taken += share;
        }
        // Every garrison that rounded down still holds at least one
        // weapon, so a single pass always covers the remainder.
        let mut remaining = amount - taken;
        for garrison in self.garrisons.values_mut() {
            if remaining == 0 {
                break;
            }
            if garrison.weapons > 0 {
                garrison.weapons -= 1;
                remaining -= 1;
            }
        }
        remaining == 0
    }
}

/// The whole-world snapshot consumed and produced by `process_turn`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: u32,
    pub tribes: BTreeMap<TribeId, Tribe>,
    pub journeys: Vec<Journey>,
    pub proposals: Vec<DiplomaticProposal>,
    #[serde(default)]
    pub next_journey_id: u64,
    #[serde(default)]
    pub next_proposal_id: u64,
}

impl GameState {
    /// Total troops a tribe owns, garrisoned plus in transit.
    ///
    /// Upkeep feeds on this figure, so forces in flight still eat.
    #[must_use]
    pub fn total_troops(&self, tribe: TribeId) -> u32 {
        let garrisoned = self.tribes.get(&tribe).map_or(0, Tribe::garrison_troops);
        let in_transit: u32 = self
            .journeys
            .iter()
            .filter(|journey| journey.tribe == tribe)
            .map(|journey| journey.force.troops)
            .sum();
        garrisoned + in_transit
    }

    pub fn allocate_journey_id(&mut self) -> JourneyId {
        let id = JourneyId(self.next_journey_id);
        self.next_journey_id += 1;
        id
    }

    pub fn allocate_proposal_id(&mut self) -> ProposalId {
        let id = ProposalId(self.next_proposal_id);
        self.next_proposal_id += 1;
        id
    }
}

/// Per-tribe narrative accumulator owned by the orchestrator for one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeLog {
    entries: BTreeMap<TribeId, Vec<String>>,
}

impl NarrativeLog {
    pub fn push(&mut self, tribe: TribeId, text: impl Into<String>) {
        self.entries.entry(tribe).or_default().push(text.into());
    }

    /// Drain the accumulated entries for one tribe.
    #[must_use]
    pub fn take(&mut self, tribe: TribeId) -> Vec<String> {
        self.entries.remove(&tribe).unwrap_or_default()
    }

    #[must_use]
    pub fn entries(&self, tribe: TribeId) -> &[String] {
        self.entries.get(&tribe).map_or(&[], Vec::as_slice)
    }
}
