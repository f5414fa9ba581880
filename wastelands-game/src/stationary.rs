//! Resolvers for actions that never leave the garrison.

use rand::Rng;

use crate::actions::{ActionError, ActionKind};
use crate::hex::HexKey;
use crate::state::{RationLevel, ResearchProject, Tribe};
use crate::tech::{TechCatalog, TechId};

const RECRUIT_RATE: f64 = 0.3;
const RECRUIT_CHARISMA_STEP: f64 = 0.05;
const REST_BASE_MORALE: u32 = 15;
const REST_MORALE_JITTER: u32 = 10;
const REST_LEADERSHIP_STEP: f64 = 0.01;
const WEAPONS_RATE: f64 = 0.4;
const WEAPONS_INTELLIGENCE_STEP: f64 = 0.02;

/// Dispatch a stationary action to its resolver.
///
/// # Errors
///
/// Returns the validation failure for the narrative log; tribe state is
/// untouched on error.
pub fn resolve_stationary<R>(
    tribe: &mut Tribe,
    kind: &ActionKind,
    catalog: &TechCatalog,
    rng: &mut R,
) -> Result<String, ActionError>
where
    R: Rng + ?Sized,
{
    match kind {
        ActionKind::Recruit { at, food_offered } => recruit(tribe, at, *food_offered),
        ActionKind::Rest => Ok(rest(tribe, rng)),
        ActionKind::BuildWeapons { at, scrap_used } => build_weapons(tribe, at, *scrap_used),
        ActionKind::SetRations { level } => set_rations(tribe, level),
        ActionKind::Defend { at } => Ok(defend(tribe, at)),
        ActionKind::StartResearch { tech, at, troops } => {
            start_research(tribe, tech, at, *troops, catalog)
        }
        _ => unreachable!("travel actions are dispatched through the journey manager"),
    }
}

fn recruit(tribe: &mut Tribe, at: &HexKey, food_offered: u32) -> Result<String, ActionError> {
    if food_offered > tribe.resources.food {
        return Err(ActionError::InsufficientFood {
            needed: food_offered,
            available: tribe.resources.food,
        });
    }
    let charisma_mult = 1.0 + RECRUIT_CHARISMA_STEP * f64::from(tribe.stats.charisma);
    let recruits = floor_u32(f64::from(food_offered) * RECRUIT_RATE * charisma_mult);

    tribe.resources.food -= food_offered;
    tribe.garrison_mut(at).troops += recruits;
    Ok(format!(
        "Offered {food_offered} food and drew {recruits} new recruits to {at}."
    ))
}

fn rest<R>(tribe: &mut Tribe, rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    let jitter = rng.gen_range(0..REST_MORALE_JITTER);
    let leadership_mult = 1.0 + REST_LEADERSHIP_STEP * f64::from(tribe.stats.leadership);
    let gained = floor_u32(f64::from(REST_BASE_MORALE + jitter) * leadership_mult);
    tribe.raise_morale(gained);
    format!(
        "The tribe rested; morale rose by {gained} to {}.",
        tribe.resources.morale
    )
}

fn build_weapons(tribe: &mut Tribe, at: &HexKey, scrap_used: u32) -> Result<String, ActionError> {
    if scrap_used > tribe.resources.scrap {
        return Err(ActionError::InsufficientScrap {
            needed: scrap_used,
            available: tribe.resources.scrap,
        });
    }
    let intelligence_mult = 1.0 + WEAPONS_INTELLIGENCE_STEP * f64::from(tribe.stats.intelligence);
    let built = floor_u32(f64::from(scrap_used) * WEAPONS_RATE * intelligence_mult);

    tribe.resources.scrap -= scrap_used;
    tribe.garrison_mut(at).weapons += built;
    Ok(format!(
        "Spent {scrap_used} scrap forging {built} weapons at {at}."
    ))
}

fn set_rations(tribe: &mut Tribe, level: &str) -> Result<String, ActionError> {
    let parsed: RationLevel = level
        .parse()
        .map_err(|()| ActionError::InvalidRations(level.to_string()))?;
    tribe.rations = parsed;
    Ok(format!("Rations set to {parsed}."))
}

fn defend(tribe: &mut Tribe, at: &HexKey) -> String {
    // The bonus itself is consumed by combat resolution, not applied here.
    tribe.defending.insert(at.clone());
    format!("The garrison at {at} dug in and braced for attack.")
}

fn start_research(
    tribe: &mut Tribe,
    tech_id: &TechId,
    at: &HexKey,
    troops: u32,
    catalog: &TechCatalog,
) -> Result<String, ActionError> {
    if tribe.current_research.is_some() {
        return Err(ActionError::ResearchActive);
    }
    let tech = catalog
        .get(tech_id)
        .ok_or_else(|| ActionError::UnknownTech(tech_id.clone()))?;
    if tech.scrap_cost > tribe.resources.scrap {
        return Err(ActionError::InsufficientScrap {
            needed: tech.scrap_cost,
            available: tribe.resources.scrap,
        });
    }
    let available = tribe.available_troops(at);
    if troops > available {
        return Err(ActionError::InsufficientTroops {
            at: at.clone(),
            needed: troops,
            available,
        });
    }
    if troops < tech.min_troops {
        return Err(ActionError::BelowMinimumStaff {
            needed: tech.min_troops,
            assigned: troops,
        });
    }

    tribe.resources.scrap -= tech.scrap_cost;
    tribe.current_research = Some(ResearchProject {
        tech: tech_id.clone(),
        progress: 0,
        assigned_troops: troops,
        location: at.clone(),
    });
    Ok(format!(
        "Research into {} began at {at} with {troops} assigned.",
        tech.name
    ))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_u32(value: f64) -> u32 {
    value.max(0.0).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Axial;
    use crate::state::Garrison;
    use crate::tech::{TechEffect, Technology};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn tribe_with_garrison(troops: u32) -> (Tribe, HexKey) {
        let home = Axial::new(0, 0).key();
        let mut tribe = Tribe {
            name: String::from("Dust Runners"),
            ..Tribe::default()
        };
        tribe.resources.food = 100;
        tribe.resources.scrap = 100;
        tribe.garrisons.insert(home.clone(), Garrison::new(troops, 0));
        (tribe, home)
    }

    fn catalog() -> TechCatalog {
        TechCatalog::new(vec![Technology {
            id: TechId::new("water_purifiers"),
            name: String::from("Water Purifiers"),
            research_points: 25,
            min_troops: 4,
            scrap_cost: 30,
            effects: vec![TechEffect::PassiveFood { amount: 3 }],
        }])
    }

    #[test]
    fn recruit_matches_worked_example() {
        // charisma 5, 20 food => floor(20 * 0.3 * 1.25) = 7 recruits.
        let (mut tribe, home) = tribe_with_garrison(10);
        tribe.stats.charisma = 5;

        let narrative = recruit(&mut tribe, &home, 20).unwrap();
        assert_eq!(tribe.garrisons[&home].troops, 17);
        assert_eq!(tribe.resources.food, 80);
        assert!(narrative.contains("7 new recruits"));
    }

    #[test]
    fn recruit_rejects_overspend_without_mutation() {
        let (mut tribe, home) = tribe_with_garrison(10);
        tribe.resources.food = 10;

        let err = recruit(&mut tribe, &home, 25).unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientFood {
                needed: 25,
                available: 10
            }
        );
        assert_eq!(tribe.resources.food, 10);
        assert_eq!(tribe.garrisons[&home].troops, 10);
    }

    #[test]
    fn rest_raises_morale_within_bounds() {
        let (mut tribe, _) = tribe_with_garrison(5);
        tribe.stats.leadership = 10;
        tribe.resources.morale = 40;
        let mut rng = SmallRng::seed_from_u64(11);

        rest(&mut tribe, &mut rng);
        let gained = tribe.resources.morale - 40;
        // floor((15..25) * 1.1) stays within [16, 27].
        assert!((16..=27).contains(&gained), "gained {gained}");
    }

    #[test]
    fn build_weapons_credits_the_named_garrison() {
        let (mut tribe, home) = tribe_with_garrison(5);
        tribe.stats.intelligence = 10;

        build_weapons(&mut tribe, &home, 50).unwrap();
        // floor(50 * 0.4 * 1.2) = 24.
        assert_eq!(tribe.garrisons[&home].weapons, 24);
        assert_eq!(tribe.resources.scrap, 50);
    }

    #[test]
    fn set_rations_validates_the_level() {
        let (mut tribe, _) = tribe_with_garrison(5);
        set_rations(&mut tribe, "hard").unwrap();
        assert_eq!(tribe.rations, RationLevel::Hard);

        let err = set_rations(&mut tribe, "lavish").unwrap_err();
        assert_eq!(err, ActionError::InvalidRations(String::from("lavish")));
        assert_eq!(tribe.rations, RationLevel::Hard);
    }

    #[test]
    fn defend_flags_the_hex_without_other_changes() {
        let (mut tribe, home) = tribe_with_garrison(5);
        let before = tribe.clone();
        defend(&mut tribe, &home);
        assert!(tribe.defending.contains(&home));
        assert_eq!(tribe.garrisons, before.garrisons);
        assert_eq!(tribe.resources, before.resources);
    }

    #[test]
    fn research_runs_every_failure_gate() {
        let catalog = catalog();
        let (mut tribe, home) = tribe_with_garrison(10);
        let tech = TechId::new("water_purifiers");

        // Staffing below the tech minimum.
        let err = start_research(&mut tribe, &tech, &home, 2, &catalog).unwrap_err();
        assert_eq!(
            err,
            ActionError::BelowMinimumStaff {
                needed: 4,
                assigned: 2
            }
        );

        // More troops than the garrison can spare.
        let err = start_research(&mut tribe, &tech, &home, 15, &catalog).unwrap_err();
        assert!(matches!(err, ActionError::InsufficientTroops { .. }));

        // Unknown tech.
        let err =
            start_research(&mut tribe, &TechId::new("cold_fusion"), &home, 5, &catalog).unwrap_err();
        assert!(matches!(err, ActionError::UnknownTech(_)));

        // Success installs the project and debits scrap.
        start_research(&mut tribe, &tech, &home, 5, &catalog).unwrap();
        assert_eq!(tribe.resources.scrap, 70);
        let project = tribe.current_research.as_ref().unwrap();
        assert_eq!(project.assigned_troops, 5);
        assert_eq!(project.progress, 0);

        // Second project is refused while one is active.
        let err = start_research(&mut tribe, &tech, &home, 5, &catalog).unwrap_err();
        assert_eq!(err, ActionError::ResearchActive);
    }

    #[test]
    fn research_scrap_gate_fires_before_installation() {
        let catalog = catalog();
        let (mut tribe, home) = tribe_with_garrison(10);
        tribe.resources.scrap = 10;

        let err = start_research(&mut tribe, &TechId::new("water_purifiers"), &home, 5, &catalog)
            .unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientScrap {
                needed: 30,
                available: 10
            }
        );
        assert!(tribe.current_research.is_none());
    }
}
