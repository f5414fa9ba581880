//! Turn orchestration: the fixed phase order every resolved turn follows.
//!
//! Phases run in a deterministic order so two engines fed the same state,
//! map, and RNG produce identical successor states:
//! proposal expiry, trade responses, journey advancement, action
//! resolution, research and upkeep, finalization.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::EngineConfig;
use crate::diplomacy;
use crate::journey::{advance_journeys, dispatch_travel_action, resolve_trade_responses};
use crate::map::MapData;
use crate::state::{GameState, NarrativeLog, TribeId};
use crate::stationary::resolve_stationary;
use crate::tech::{TechCatalog, aggregate_bonuses};

/// Food consumed per troop per turn before the ration multiplier.
const UPKEEP_PER_TROOP: f64 = 1.0;

/// The turn resolution engine: a tech catalog plus tunables, no state of
/// its own.
#[derive(Debug, Clone, Default)]
pub struct TurnEngine {
    catalog: TechCatalog,
    config: EngineConfig,
}

impl TurnEngine {
    #[must_use]
    pub fn new(catalog: TechCatalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &TechCatalog {
        &self.catalog
    }

    /// Resolve one full turn with an entropy-seeded RNG.
    #[must_use]
    pub fn process_turn(&self, state: GameState, map: &mut MapData) -> GameState {
        let mut rng = SmallRng::from_entropy();
        self.process_turn_with_rng(state, map, &mut rng)
    }

    /// Resolve one full turn from a reproducible seed; replays and shared
    /// games feed the same seed per turn.
    #[must_use]
    pub fn process_turn_seeded(&self, state: GameState, map: &mut MapData, seed: u64) -> GameState {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.process_turn_with_rng(state, map, &mut rng)
    }

    /// Resolve one full turn with a caller-supplied RNG; same inputs and
    /// seed give the same successor state.
    #[must_use]
    pub fn process_turn_with_rng<R>(
        &self,
        mut state: GameState,
        map: &mut MapData,
        rng: &mut R,
    ) -> GameState
    where
        R: Rng + ?Sized,
    {
        log::debug!(
            "resolving turn {} for {} tribes, {} journeys in flight",
            state.turn,
            state.tribes.len(),
            state.journeys.len()
        );
        let mut narr = NarrativeLog::default();

        diplomacy::expire_proposals(&mut state, &mut narr);
        resolve_trade_responses(&mut state, &mut narr);
        advance_journeys(&mut state, map, &self.catalog, &self.config, rng, &mut narr);
        self.resolve_actions(&mut state, map, rng, &mut narr);
        self.advance_research(&mut state, &mut narr);
        self.apply_passive_income(&mut state);
        self.apply_upkeep(&mut state, &mut narr);
        finalize(&mut state, &mut narr);

        state
    }

    /// Phase 4: consume each tribe's submitted action queue in tribe-id
    /// order, preserving each queue's submission order.
    fn resolve_actions<R>(
        &self,
        state: &mut GameState,
        map: &mut MapData,
        rng: &mut R,
        narr: &mut NarrativeLog,
    ) where
        R: Rng + ?Sized,
    {
        // Defend orders cover the journey arrivals that already resolved
        // this turn; stale flags lapse before the new queues are read.
        for tribe in state.tribes.values_mut() {
            tribe.defending.clear();
        }

        let ids: Vec<TribeId> = state.tribes.keys().copied().collect();
        for id in ids {
            let mut actions = state
                .tribes
                .get_mut(&id)
                .map(|tribe| std::mem::take(&mut tribe.actions))
                .unwrap_or_default();

            for action in &mut actions {
                let outcome = if action.kind.is_travel() {
                    dispatch_travel_action(
                        state,
                        id,
                        &action.kind,
                        map,
                        &self.catalog,
                        &self.config,
                        rng,
                        narr,
                    )
                } else {
                    match state.tribes.get_mut(&id) {
                        Some(tribe) => resolve_stationary(tribe, &action.kind, &self.catalog, rng),
                        None => continue,
                    }
                };

                let text = match outcome {
                    Ok(text) => text,
                    Err(err) => format!("Could not {}: {err}.", action.kind.verb()),
                };
                narr.push(id, text.clone());
                action.result = Some(text);
            }

            if let Some(tribe) = state.tribes.get_mut(&id) {
                tribe.actions = actions;
            }
        }
    }

    /// Phase 5a: research projects earn one point per assigned troop per
    /// turn; finished projects grant their effects immediately.
    fn advance_research(&self, state: &mut GameState, narr: &mut NarrativeLog) {
        for (&id, tribe) in &mut state.tribes {
            let Some(project) = tribe.current_research.as_mut() else {
                continue;
            };
            let Some(tech) = self.catalog.get(&project.tech) else {
                // Catalog changed under a running project; refund nothing,
                // release the staff.
                narr.push(
                    id,
                    format!(
                        "Research into {} was abandoned; the plans no longer make sense.",
                        project.tech
                    ),
                );
                tribe.current_research = None;
                continue;
            };

            project.progress = project.progress.saturating_add(project.assigned_troops);
            if project.progress >= tech.research_points {
                let effects: Vec<String> =
                    tech.effects.iter().map(crate::tech::TechEffect::describe).collect();
                narr.push(
                    id,
                    format!("Breakthrough: {} ({}).", tech.name, effects.join(", ")),
                );
                tribe.completed_techs.insert(project.tech.clone());
                tribe.current_research = None;
            }
        }
    }

    /// Phase 5b: flat per-turn income from completed technologies.
    fn apply_passive_income(&self, state: &mut GameState) {
        for tribe in state.tribes.values_mut() {
            let bonuses = aggregate_bonuses(&tribe.completed_techs, &self.catalog);
            tribe.resources.food = tribe.resources.food.saturating_add(bonuses.passive_food);
            tribe.resources.scrap = tribe.resources.scrap.saturating_add(bonuses.passive_scrap);
        }
    }

    /// Phase 5c: feed every troop, garrisoned or in transit. A shortfall
    /// empties the larder and dents morale instead of killing troops.
    fn apply_upkeep(&self, state: &mut GameState, narr: &mut NarrativeLog) {
        let totals: Vec<(TribeId, u32)> = state
            .tribes
            .keys()
            .map(|&id| (id, state.total_troops(id)))
            .collect();

        for (id, troops) in totals {
            let Some(tribe) = state.tribes.get_mut(&id) else {
                continue;
            };
            let need = ceil_u32(f64::from(troops) * UPKEEP_PER_TROOP * tribe.rations.multiplier());
            if tribe.resources.food >= need {
                tribe.resources.food -= need;
                continue;
            }

            let deficit = need - tribe.resources.food;
            tribe.resources.food = 0;
            let penalty = (deficit / 2).min(self.config.starvation_morale_cap);
            tribe.resources.morale = tribe.resources.morale.saturating_sub(penalty);
            narr.push(
                id,
                format!(
                    "The tribe went hungry: {deficit} food short, morale fell by {penalty} to {}.",
                    tribe.resources.morale
                ),
            );
        }
    }
}

/// Phase 6: drain narratives into each tribe, reset per-turn fields, and
/// advance the turn counter. Running it on an already-finalized state
/// only re-clears what is already clear.
fn finalize(state: &mut GameState, narr: &mut NarrativeLog) {
    for (&id, tribe) in &mut state.tribes {
        tribe.actions.clear();
        tribe.turn_submitted = false;
        tribe.last_turn_results = narr.take(id);
        tribe.journey_responses.clear();
    }
    state.turn += 1;
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_u32(value: f64) -> u32 {
    value.max(0.0).ceil() as u32
}
