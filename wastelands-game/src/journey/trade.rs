//! Resolution of trade journeys waiting on the counterpart tribe.
//!
//! Runs before journey advancement each turn so a caravan answered last
//! turn starts home immediately.

use crate::journey::{Journey, JourneyStatus};
use crate::state::{GameState, NarrativeLog, ResourceBundle, TradeResponse, TribeId};

/// Resolve every `awaiting_response` journey against the counterpart
/// tribe's recorded answer, an elapsed deadline, or a vanished garrison.
pub fn resolve_trade_responses(state: &mut GameState, narr: &mut NarrativeLog) {
    let journeys = std::mem::take(&mut state.journeys);
    let mut kept: Vec<Journey> = Vec::with_capacity(journeys.len());

    for journey in journeys {
        if journey.status != JourneyStatus::AwaitingResponse {
            kept.push(journey);
            continue;
        }

        let partner = journey.trade.as_ref().and_then(|terms| terms.partner);
        let partner_present = partner.is_some_and(|id| {
            state.tribes.get(&id).is_some_and(|tribe| {
                tribe
                    .garrisons
                    .get(&journey.destination)
                    .is_some_and(|garrison| garrison.troops > 0)
            })
        });

        if !partner_present {
            // The camp packed up mid-negotiation; nothing to do but leave.
            narr.push(
                journey.tribe,
                format!(
                    "The camp at {} was gone when your caravan looked for an answer; it is returning with its goods.",
                    journey.destination
                ),
            );
            kept.push(build_return(state, journey, None));
            continue;
        }
        let partner_id = partner.unwrap_or_default();

        let response = state
            .tribes
            .get(&partner_id)
            .and_then(|tribe| tribe.journey_responses.get(&journey.id).copied());
        let expired = journey
            .response_deadline
            .is_some_and(|deadline| state.turn > deadline);

        match response {
            Some(TradeResponse::Accept) => {
                if try_accept(state, &journey, partner_id, narr) {
                    let request = journey
                        .trade
                        .as_ref()
                        .map(|terms| terms.request)
                        .unwrap_or_default();
                    kept.push(build_return(state, journey, Some(request)));
                } else {
                    // Responder could no longer afford the request; demote
                    // to reject semantics.
                    narr.push(
                        partner_id,
                        format!(
                            "You accepted the caravan at {} but could not cover the asking price; the traders left.",
                            journey.destination
                        ),
                    );
                    narr.push(
                        journey.tribe,
                        format!(
                            "The deal at {} fell through; your caravan is returning with its goods.",
                            journey.destination
                        ),
                    );
                    kept.push(build_return(state, journey, None));
                }
            }
            Some(TradeResponse::Reject) => {
                narr.push(
                    partner_id,
                    format!("You turned away the caravan at {}.", journey.destination),
                );
                narr.push(
                    journey.tribe,
                    format!(
                        "Your offer at {} was rejected; the caravan is returning with its goods.",
                        journey.destination
                    ),
                );
                kept.push(build_return(state, journey, None));
            }
            None if expired => {
                narr.push(
                    partner_id,
                    format!(
                        "The caravan at {} waited for an answer that never came and left.",
                        journey.destination
                    ),
                );
                narr.push(
                    journey.tribe,
                    format!(
                        "No answer came at {}; your caravan gave up and is returning with its goods.",
                        journey.destination
                    ),
                );
                kept.push(build_return(state, journey, None));
            }
            None => kept.push(journey),
        }
    }

    state.journeys = kept;
}

/// Execute the exchange on acceptance. Returns `false` without touching
/// state when the responder cannot afford the request.
fn try_accept(
    state: &mut GameState,
    journey: &Journey,
    partner_id: TribeId,
    narr: &mut NarrativeLog,
) -> bool {
    let request = journey
        .trade
        .as_ref()
        .map(|terms| terms.request)
        .unwrap_or_default();

    let affordable = state.tribes.get(&partner_id).is_some_and(|tribe| {
        tribe.resources.food >= request.food
            && tribe.resources.scrap >= request.scrap
            && tribe.total_weapons() >= request.weapons
    });
    if !affordable {
        return false;
    }

    let offered = journey.payload;
    if let Some(partner) = state.tribes.get_mut(&partner_id) {
        partner.resources.food -= request.food;
        partner.resources.scrap -= request.scrap;
        partner.debit_weapons(request.weapons);

        partner.resources.food = partner.resources.food.saturating_add(offered.food);
        partner.resources.scrap = partner.resources.scrap.saturating_add(offered.scrap);
        partner.garrison_mut(&journey.destination).weapons += offered.weapons;
    }

    narr.push(
        partner_id,
        format!(
            "You traded {request} for the caravan's {offered} at {}.",
            journey.destination
        ),
    );
    narr.push(
        journey.tribe,
        format!(
            "Your offer at {} was accepted; the caravan is bringing home {request}.",
            journey.destination
        ),
    );
    true
}

/// Build the homeward leg; `cargo` defaults to the original payload when
/// the deal did not happen.
fn build_return(state: &mut GameState, journey: Journey, cargo: Option<ResourceBundle>) -> Journey {
    let payload = cargo.unwrap_or(journey.payload);
    let id = state.allocate_journey_id();
    journey.return_leg(id, payload)
}
