//! Dispatch of travel-class actions into journeys, including the
//! fast-track shortcut for short, non-aggressive errands.

use rand::Rng;

use crate::actions::{ActionError, ActionKind, TravelOrder};
use crate::config::EngineConfig;
use crate::journey::{
    Force, Journey, JourneyKind, JourneyStatus, TradeTerms, arrival::resolve_arrival,
};
use crate::map::MapData;
use crate::pathfinding::find_path;
use crate::state::{GameState, NarrativeLog, ResourceBundle, TribeId};
use crate::tech::{TechCatalog, aggregate_bonuses};

/// Resolve a submitted travel action: route it, debit the origin garrison
/// atomically, and either fast-track the errand or enqueue a journey.
///
/// # Errors
///
/// Validation failures leave the tribe untouched and become the action's
/// failure narrative.
pub fn dispatch_travel_action<R>(
    state: &mut GameState,
    tribe_id: TribeId,
    kind: &ActionKind,
    map: &mut MapData,
    catalog: &TechCatalog,
    cfg: &EngineConfig,
    rng: &mut R,
    narr: &mut NarrativeLog,
) -> Result<String, ActionError>
where
    R: Rng + ?Sized,
{
    let (travel, journey_kind, resource, trade) = match kind {
        ActionKind::Move { travel } => (travel, JourneyKind::Move, None, None),
        ActionKind::Scout { travel } => (travel, JourneyKind::Scout, None, None),
        ActionKind::Scavenge { travel, resource } => {
            (travel, JourneyKind::Scavenge, Some(*resource), None)
        }
        ActionKind::Attack { travel } => (travel, JourneyKind::Attack, None, None),
        ActionKind::BuildOutpost { travel } => (travel, JourneyKind::BuildOutpost, None, None),
        ActionKind::Trade {
            travel,
            offer,
            request,
        } => (travel, JourneyKind::Trade, None, Some((*offer, *request))),
        _ => unreachable!("stationary actions are resolved in place"),
    };

    let from = travel
        .from
        .decode()
        .map_err(|_| ActionError::InvalidCoordinate(travel.from.clone()))?;
    let to = travel
        .to
        .decode()
        .map_err(|_| ActionError::InvalidCoordinate(travel.to.clone()))?;

    let path = find_path(from, to, map).ok_or_else(|| ActionError::NoPath {
        from: travel.from.clone(),
        to: travel.to.clone(),
    })?;

    let offer = trade.map(|(offer, _)| offer).unwrap_or_default();
    validate_force(state, tribe_id, travel, offer)?;

    let tribe = state
        .tribes
        .get(&tribe_id)
        .ok_or_else(|| ActionError::MissingGarrison(travel.from.clone()))?;
    let bonuses = aggregate_bonuses(&tribe.completed_techs, catalog);
    let turns = path.turns_with_bonus(bonuses.movement);
    let tribe_name = tribe.name.clone();

    debit_origin(state, tribe_id, travel, offer);

    let id = state.allocate_journey_id();
    let mut journey = Journey {
        id,
        tribe: tribe_id,
        kind: journey_kind,
        status: JourneyStatus::EnRoute,
        origin: travel.from.clone(),
        destination: travel.to.clone(),
        path: path.hexes.iter().map(|hex| hex.key()).collect(),
        turns_remaining: i32::try_from(turns).unwrap_or(i32::MAX),
        planned_turns: turns,
        force: Force {
            troops: travel.troops,
            weapons: travel.weapons,
            chiefs: travel.chiefs.clone(),
        },
        payload: offer,
        scavenge_resource: resource,
        trade: trade.map(|(_, request)| TradeTerms {
            request,
            from_tribe_name: tribe_name,
            partner: None,
        }),
        response_deadline: None,
    };

    if turns <= cfg.fast_track_threshold && journey_kind.fast_track_eligible() {
        // Short, non-aggressive errands resolve within the dispatch step,
        // chaining the return leg while it also stays under the threshold.
        let mut pending = Some(journey);
        while let Some(leg) = pending {
            let instant = leg.kind.fast_track_eligible()
                && leg.status != JourneyStatus::AwaitingResponse
                && leg.planned_turns <= cfg.fast_track_threshold;
            if instant {
                pending = resolve_arrival(leg, state, map, catalog, cfg, rng, narr);
            } else {
                state.journeys.push(leg);
                pending = None;
            }
        }
        return Ok(format!(
            "A party of {} set out for {} and completed its errand within the turn.",
            travel.troops, travel.to
        ));
    }

    if turns > 1 {
        // Make the first hex of progress visible immediately.
        journey.advance_one_hex();
    }
    state.journeys.push(journey);
    Ok(format!(
        "A force of {} troops set out from {} toward {}; travel time {turns} turn(s).",
        travel.troops, travel.from, travel.to
    ))
}

fn validate_force(
    state: &GameState,
    tribe_id: TribeId,
    travel: &TravelOrder,
    offer: ResourceBundle,
) -> Result<(), ActionError> {
    if travel.troops == 0 {
        return Err(ActionError::EmptyForce);
    }
    let tribe = state
        .tribes
        .get(&tribe_id)
        .ok_or_else(|| ActionError::MissingGarrison(travel.from.clone()))?;
    let garrison = tribe
        .garrisons
        .get(&travel.from)
        .ok_or_else(|| ActionError::MissingGarrison(travel.from.clone()))?;

    let available = tribe.available_troops(&travel.from);
    if travel.troops > available {
        return Err(ActionError::InsufficientTroops {
            at: travel.from.clone(),
            needed: travel.troops,
            available,
        });
    }
    let weapons_needed = travel.weapons.saturating_add(offer.weapons);
    if weapons_needed > garrison.weapons {
        return Err(ActionError::InsufficientWeapons {
            at: travel.from.clone(),
            needed: weapons_needed,
            available: garrison.weapons,
        });
    }
    for chief in &travel.chiefs {
        if !garrison.chiefs.iter().any(|name| name == chief) {
            return Err(ActionError::MissingChief(chief.clone()));
        }
    }
    if offer.food > tribe.resources.food {
        return Err(ActionError::InsufficientFood {
            needed: offer.food,
            available: tribe.resources.food,
        });
    }
    if offer.scrap > tribe.resources.scrap {
        return Err(ActionError::InsufficientScrap {
            needed: offer.scrap,
            available: tribe.resources.scrap,
        });
    }
    Ok(())
}

/// Debit troops, weapons, chiefs, and any trade cargo in one step; runs
/// only after every validation gate has passed.
fn debit_origin(
    state: &mut GameState,
    tribe_id: TribeId,
    travel: &TravelOrder,
    offer: ResourceBundle,
) {
    let Some(tribe) = state.tribes.get_mut(&tribe_id) else {
        return;
    };
    tribe.resources.food -= offer.food;
    tribe.resources.scrap -= offer.scrap;
    let garrison = tribe.garrison_mut(&travel.from);
    garrison.troops -= travel.troops;
    garrison.weapons -= travel.weapons + offer.weapons;
    garrison
        .chiefs
        .retain(|name| !travel.chiefs.iter().any(|taken| taken == name));
}
