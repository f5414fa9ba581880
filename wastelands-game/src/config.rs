//! Engine tunables grouped into one serde-friendly config block.

use serde::{Deserialize, Serialize};

/// Knobs governing turn resolution. Defaults match the live balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chance per advancing journey per turn of a random road event.
    pub event_chance: f64,
    /// Journeys at or under this many turns of travel resolve instantly
    /// (never Attack or Trade).
    pub fast_track_threshold: u32,
    /// Scrap charged when an outpost-building force arrives.
    pub outpost_scrap_cost: u32,
    /// Reveal radius around a scout's destination.
    pub scout_reveal_radius: u32,
    /// Turns a trade counterpart has to answer before implicit rejection.
    pub trade_response_deadline: u32,
    /// Turns a post-peace truce blocks new war declarations.
    pub truce_turns: u32,
    /// Defense strength multiplier granted by a Defend order or an outpost.
    pub defend_bonus: f64,
    /// Fraction of troops lost when scavenging a radiation hex.
    pub radiation_attrition: f64,
    /// Cap on the starvation morale penalty per turn.
    pub starvation_morale_cap: u32,
    /// Turns an accepted proposal lives before expiring unanswered.
    pub proposal_lifetime: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_chance: 0.2,
            fast_track_threshold: 1,
            outpost_scrap_cost: 25,
            scout_reveal_radius: 2,
            trade_response_deadline: 2,
            truce_turns: 5,
            defend_bonus: 0.3,
            radiation_attrition: 0.10,
            starvation_morale_cap: 20,
            proposal_lifetime: 3,
        }
    }
}

impl EngineConfig {
    /// Config with road events disabled; used by equivalence tests.
    #[must_use]
    pub fn without_events() -> Self {
        Self {
            event_chance: 0.0,
            ..Self::default()
        }
    }
}
