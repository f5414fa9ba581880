//! Arrival resolution, dispatched by journey type.

use rand::Rng;

use crate::combat::{self, CombatOutcome, Combatant, DefenseModifiers};
use crate::config::EngineConfig;
use crate::hex::{HexKey, hexes_in_range};
use crate::journey::{Journey, JourneyKind, JourneyStatus};
use crate::map::{MapData, Poi, Terrain};
use crate::state::{GameState, NarrativeLog, ResourceBundle, TribeId};
use crate::tech::{ResourceKind, TechCatalog, aggregate_bonuses};

const FOOD_YIELD_BASE: f64 = 1.5;
const FOOD_TERRAIN_RICH: f64 = 1.5;
const FOOD_TERRAIN_POOR: f64 = 0.5;
const FOOD_POI_MULT: f64 = 3.0;
const SCRAP_YIELD_BASE: f64 = 1.0;
const SCRAP_POI_MULT: f64 = 3.5;
const SCRAP_TERRAIN_MULT: f64 = 1.2;

/// Resolve a journey that has reached its destination.
///
/// Returns the follow-on journey when one is produced: a synthesized
/// return leg, or the same journey parked in `AwaitingResponse` for trade.
pub fn resolve_arrival<R>(
    mut journey: Journey,
    state: &mut GameState,
    map: &mut MapData,
    catalog: &TechCatalog,
    cfg: &EngineConfig,
    rng: &mut R,
    narr: &mut NarrativeLog,
) -> Option<Journey>
where
    R: Rng + ?Sized,
{
    log::debug!(
        "journey {} ({}) arriving at {}",
        journey.id,
        journey.kind,
        journey.destination
    );
    match journey.kind {
        JourneyKind::Move => {
            let text = format!(
                "Your force of {} troops arrived at {} and joined the garrison.",
                journey.force.troops, journey.destination
            );
            merge_force(state, &journey, &journey.destination.clone());
            narr.push(journey.tribe, text);
            None
        }
        JourneyKind::Attack => resolve_attack(journey, state, map, catalog, cfg, narr),
        JourneyKind::Scout => {
            let revealed = reveal_around(state, &journey, map, cfg);
            narr.push(
                journey.tribe,
                format!(
                    "Scouts reached {} and charted {revealed} new hexes; they are heading home.",
                    journey.destination
                ),
            );
            synthesize_return(journey, ResourceBundle::default(), state, narr)
        }
        JourneyKind::Scavenge => resolve_scavenge(journey, state, map, catalog, cfg, rng, narr),
        JourneyKind::BuildOutpost => {
            resolve_build_outpost(&journey, state, map, cfg, narr);
            None
        }
        JourneyKind::Trade => {
            match trade_partner(state, journey.tribe, &journey.destination) {
                Some(partner) => {
                    journey.status = JourneyStatus::AwaitingResponse;
                    journey.response_deadline = Some(state.turn + cfg.trade_response_deadline);
                    let proposer_name = tribe_name(state, journey.tribe);
                    if let Some(terms) = journey.trade.as_mut() {
                        terms.partner = Some(partner);
                    }
                    let request = journey
                        .trade
                        .as_ref()
                        .map(|terms| terms.request)
                        .unwrap_or_default();
                    narr.push(
                        journey.tribe,
                        format!(
                            "Your caravan reached {} and laid out its goods; awaiting an answer.",
                            journey.destination
                        ),
                    );
                    narr.push(
                        partner,
                        format!(
                            "A caravan from {proposer_name} arrived at {} offering {} in exchange for {request}.",
                            journey.destination, journey.payload
                        ),
                    );
                    Some(journey)
                }
                None => {
                    // Nobody left to trade with; turn the caravan around.
                    narr.push(
                        journey.tribe,
                        format!(
                            "Your caravan found no one to trade with at {} and turned back.",
                            journey.destination
                        ),
                    );
                    let payload = journey.payload;
                    synthesize_return(journey, payload, state, narr)
                }
            }
        }
        JourneyKind::Return => {
            let text = format!(
                "Your force returned to {} carrying {}.",
                journey.destination, journey.payload
            );
            credit_return(state, &journey);
            narr.push(journey.tribe, text);
            None
        }
    }
}

/// Convert a force that cannot travel onward into a holding garrison at
/// the last hex it reached.
pub fn strand_force(journey: &Journey, state: &mut GameState, narr: &mut NarrativeLog) {
    let at = journey.last_reached();
    narr.push(
        journey.tribe,
        format!(
            "With no route onward, your force of {} troops dug in at {at} as a holding garrison.",
            journey.force.troops
        ),
    );
    merge_force(state, journey, &at);
    if let Some(tribe) = state.tribes.get_mut(&journey.tribe) {
        tribe.resources.food = tribe.resources.food.saturating_add(journey.payload.food);
        tribe.resources.scrap = tribe.resources.scrap.saturating_add(journey.payload.scrap);
        tribe.garrison_mut(&at).weapons += journey.payload.weapons;
    }
}

fn merge_force(state: &mut GameState, journey: &Journey, at: &HexKey) {
    if let Some(tribe) = state.tribes.get_mut(&journey.tribe) {
        let garrison = tribe.garrison_mut(at);
        garrison.troops += journey.force.troops;
        garrison.weapons += journey.force.weapons;
        garrison.chiefs.extend(journey.force.chiefs.iter().cloned());
    }
}

fn credit_return(state: &mut GameState, journey: &Journey) {
    merge_force(state, journey, &journey.destination);
    if let Some(tribe) = state.tribes.get_mut(&journey.tribe) {
        tribe.resources.food = tribe.resources.food.saturating_add(journey.payload.food);
        tribe.resources.scrap = tribe.resources.scrap.saturating_add(journey.payload.scrap);
        tribe.garrison_mut(&journey.destination).weapons += journey.payload.weapons;
    }
}

fn tribe_name(state: &GameState, id: TribeId) -> String {
    state
        .tribes
        .get(&id)
        .map_or_else(|| id.to_string(), |tribe| tribe.name.clone())
}

fn reveal_around(state: &mut GameState, journey: &Journey, map: &MapData, cfg: &EngineConfig) -> usize {
    let Some(center) = journey.destination.decode().ok() else {
        return 0;
    };
    let Some(tribe) = state.tribes.get_mut(&journey.tribe) else {
        return 0;
    };
    let mut revealed = 0;
    for hex in hexes_in_range(center, cfg.scout_reveal_radius) {
        let key = hex.key();
        if map.hexes.contains_key(&key) && tribe.explored.insert(key) {
            revealed += 1;
        }
    }
    revealed
}

fn trade_partner(state: &GameState, proposer: TribeId, at: &HexKey) -> Option<TribeId> {
    state
        .tribes
        .iter()
        .find(|(id, tribe)| {
            **id != proposer && tribe.garrisons.get(at).is_some_and(|g| g.troops > 0)
        })
        .map(|(id, _)| *id)
}

fn hostile_defender(state: &GameState, attacker: TribeId, at: &HexKey) -> Option<TribeId> {
    let attacking_tribe = state.tribes.get(&attacker)?;
    state
        .tribes
        .iter()
        .find(|(id, tribe)| {
            **id != attacker
                && attacking_tribe.is_at_war(**id)
                && tribe.garrisons.get(at).is_some_and(|g| g.troops > 0)
        })
        .map(|(id, _)| *id)
}

fn resolve_attack(
    mut journey: Journey,
    state: &mut GameState,
    map: &MapData,
    catalog: &TechCatalog,
    cfg: &EngineConfig,
    narr: &mut NarrativeLog,
) -> Option<Journey> {
    let at = journey.destination.clone();
    let Some(defender_id) = hostile_defender(state, journey.tribe, &at) else {
        let text = format!(
            "Your war party arrived at {at} and met no resistance; the hex is yours."
        );
        merge_force(state, &journey, &at);
        narr.push(journey.tribe, text);
        return None;
    };

    let attacker_bonus = aggregate_bonuses(&state.tribes[&journey.tribe].completed_techs, catalog);
    let defender_tribe = &state.tribes[&defender_id];
    let defender_bonus = aggregate_bonuses(&defender_tribe.completed_techs, catalog);
    let defender_garrison = defender_tribe.garrisons[&at].clone();

    let result = combat::resolve_combat(
        Combatant {
            troops: journey.force.troops,
            weapons: journey.force.weapons,
            tech_bonus: attacker_bonus.attack,
        },
        Combatant {
            troops: defender_garrison.troops,
            weapons: defender_garrison.weapons,
            tech_bonus: defender_bonus.defense,
        },
        DefenseModifiers {
            terrain: map.terrain_at(&at),
            poi: map.poi_at(&at),
            defend_order: defender_tribe.defending.contains(&at),
            defend_bonus: cfg.defend_bonus,
        },
    );

    journey.force.troops -= result.attacker_losses.troops;
    journey.force.weapons -= result.attacker_losses.weapons;

    match result.outcome {
        CombatOutcome::Captured => {
            let remnant = apply_defender_rout(state, defender_id, &at, result.defender_losses);
            narr.push(
                journey.tribe,
                format!(
                    "Your warriors stormed {at}, losing {} troops but driving the enemy out.",
                    result.attacker_losses.troops
                ),
            );
            narr.push(
                defender_id,
                match remnant {
                    Some(fallback) => format!(
                        "The garrison at {at} was overrun; {} troops fell and the survivors fled to {fallback}.",
                        result.defender_losses.troops
                    ),
                    None => format!(
                        "The garrison at {at} was overrun and wiped out; {} troops were lost.",
                        result.defender_losses.troops
                    ),
                },
            );
            merge_force(state, &journey, &at);
            None
        }
        CombatOutcome::Repelled => {
            if let Some(defender) = state.tribes.get_mut(&defender_id) {
                let garrison = defender.garrison_mut(&at);
                garrison.troops -= result.defender_losses.troops;
                garrison.weapons -= result.defender_losses.weapons;
            }
            narr.push(
                defender_id,
                format!(
                    "An assault on {at} was repelled at the cost of {} defenders.",
                    result.defender_losses.troops
                ),
            );
            if journey.force.is_empty() {
                narr.push(
                    journey.tribe,
                    format!("Your assault on {at} was crushed; no one returned."),
                );
                return None;
            }
            narr.push(
                journey.tribe,
                format!(
                    "Your assault on {at} was repelled; {} survivors are falling back home.",
                    journey.force.troops
                ),
            );
            synthesize_return(journey, ResourceBundle::default(), state, narr)
        }
    }
}

/// Remove the routed garrison and retreat any survivors to the nearest
/// friendly garrison. Returns the retreat hex, `None` when the remnant
/// had nowhere to go.
fn apply_defender_rout(
    state: &mut GameState,
    defender_id: TribeId,
    at: &HexKey,
    losses: combat::Casualties,
) -> Option<HexKey> {
    let defender = state.tribes.get_mut(&defender_id)?;
    let mut garrison = defender.garrisons.remove(at)?;
    garrison.troops -= losses.troops;
    garrison.weapons -= losses.weapons;

    if garrison.troops == 0 && garrison.weapons == 0 && garrison.chiefs.is_empty() {
        return None;
    }
    let here = at.decode().ok()?;
    let fallback = defender
        .garrisons
        .keys()
        .filter_map(|key| key.decode().ok().map(|coord| (key.clone(), coord)))
        .min_by_key(|(_, coord)| here.distance(*coord))
        .map(|(key, _)| key)?;

    let home = defender.garrison_mut(&fallback);
    home.troops += garrison.troops;
    home.weapons += garrison.weapons;
    home.chiefs.extend(garrison.chiefs);
    Some(fallback)
}

fn resolve_scavenge<R>(
    mut journey: Journey,
    state: &mut GameState,
    map: &mut MapData,
    catalog: &TechCatalog,
    cfg: &EngineConfig,
    rng: &mut R,
    narr: &mut NarrativeLog,
) -> Option<Journey>
where
    R: Rng + ?Sized,
{
    let at = journey.destination.clone();
    let terrain = map.terrain_at(&at);
    let poi = map.poi_at(&at);

    // Radiation burns through a party before it can gather anything.
    if terrain == Some(Terrain::Radiation) {
        let casualties = ceil_u32(f64::from(journey.force.troops) * cfg.radiation_attrition)
            .min(journey.force.troops);
        journey.force.troops -= casualties;
        if casualties > 0 {
            narr.push(
                journey.tribe,
                format!("The radiation at {at} claimed {casualties} scavengers."),
            );
        }
        if journey.force.troops == 0 {
            narr.push(
                journey.tribe,
                format!("The whole scavenging party perished in the radiation at {at}."),
            );
            return None;
        }
    }

    let bonuses = aggregate_bonuses(&state.tribes[&journey.tribe].completed_techs, catalog);
    let survivors = journey.force.troops;
    let resource = journey.scavenge_resource.unwrap_or(ResourceKind::Scrap);
    let bonus = 1.0 + bonuses.scavenge_bonus(resource);

    let mut payload = ResourceBundle::default();
    match resource {
        ResourceKind::Food => {
            let terrain_mult = if poi == Some(Poi::FoodSource) {
                FOOD_POI_MULT
            } else if matches!(terrain, Some(Terrain::Forest | Terrain::Swamp)) {
                FOOD_TERRAIN_RICH
            } else {
                FOOD_TERRAIN_POOR
            };
            payload.food = floor_u32(FOOD_YIELD_BASE * f64::from(survivors) * terrain_mult * bonus);
        }
        ResourceKind::Scrap => {
            let terrain_mult = if matches!(poi, Some(Poi::Scrapyard | Poi::Factory)) {
                SCRAP_POI_MULT
            } else {
                SCRAP_TERRAIN_MULT
            };
            payload.scrap =
                floor_u32(SCRAP_YIELD_BASE * f64::from(survivors) * terrain_mult * bonus);
        }
        ResourceKind::Weapons => {
            if poi == Some(Poi::WeaponsCache) {
                let jitter = rng.gen_range(0..(survivors / 4).max(1));
                payload.weapons = floor_u32(f64::from(1 + jitter) * bonus);
                map.consume_weapons_cache_key(&at);
            }
        }
    }

    if payload.is_empty() {
        narr.push(
            journey.tribe,
            format!("Scavengers combed {at} for {resource} but found nothing worth hauling."),
        );
    } else {
        narr.push(
            journey.tribe,
            format!("Scavengers at {at} gathered {payload} and are hauling it home."),
        );
    }

    synthesize_return(journey, payload, state, narr)
}

/// Build the homeward leg, or fall back to stranding the force in place
/// when the recorded path is unusable.
fn synthesize_return(
    journey: Journey,
    payload: ResourceBundle,
    state: &mut GameState,
    narr: &mut NarrativeLog,
) -> Option<Journey> {
    if journey.path.is_empty() || journey.origin.decode().is_err() {
        let mut stranded = journey;
        stranded.payload = payload;
        strand_force(&stranded, state, narr);
        return None;
    }
    let id = state.allocate_journey_id();
    Some(journey.return_leg(id, payload))
}

fn resolve_build_outpost(
    journey: &Journey,
    state: &mut GameState,
    map: &mut MapData,
    cfg: &EngineConfig,
    narr: &mut NarrativeLog,
) {
    let at = journey.destination.clone();
    let cost = cfg.outpost_scrap_cost;
    let affordable = state
        .tribes
        .get(&journey.tribe)
        .is_some_and(|tribe| tribe.resources.scrap >= cost);

    if affordable {
        if let Some(tribe) = state.tribes.get_mut(&journey.tribe) {
            tribe.resources.scrap -= cost;
        }
        merge_force(state, journey, &at);
        map.stamp_outpost_key(&at);
        narr.push(
            journey.tribe,
            format!(
                "Your builders raised an outpost at {at} for {cost} scrap; the force garrisons it."
            ),
        );
    } else {
        // Not lost, just disappointed: the crew walks back home.
        merge_force(state, journey, &journey.origin);
        narr.push(
            journey.tribe,
            format!(
                "Not enough scrap ({cost} needed) to raise an outpost at {at}; the crew returned home."
            ),
        );
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_u32(value: f64) -> u32 {
    value.max(0.0).floor() as u32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_u32(value: f64) -> u32 {
    value.max(0.0).ceil() as u32
}
