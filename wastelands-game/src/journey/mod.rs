//! Journey lifecycle: forces in transit between hexes.
//!
//! A journey owns its force exclusively while in flight; the origin
//! garrison is debited atomically at dispatch and troops only rejoin a
//! garrison when the journey resolves.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hex::{Axial, HexKey};
use crate::state::{ChiefSet, ResourceBundle, TribeId};
use crate::tech::ResourceKind;

pub mod arrival;
pub mod dispatch;
pub mod events;
pub mod trade;

pub use arrival::resolve_arrival;
pub use dispatch::dispatch_travel_action;
pub use events::{EVENT_TABLE, apply_random_event};
pub use trade::resolve_trade_responses;

/// Identifier of a journey within one game world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct JourneyId(pub u64);

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "journey-{}", self.0)
    }
}

/// What the force intends to do on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyKind {
    Move,
    Scout,
    Scavenge,
    Attack,
    BuildOutpost,
    Trade,
    Return,
}

impl JourneyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Scout => "scout",
            Self::Scavenge => "scavenge",
            Self::Attack => "attack",
            Self::BuildOutpost => "build_outpost",
            Self::Trade => "trade",
            Self::Return => "return",
        }
    }

    /// Attack and Trade never take the fast-track shortcut.
    #[must_use]
    pub const fn fast_track_eligible(self) -> bool {
        !matches!(self, Self::Attack | Self::Trade)
    }
}

impl fmt::Display for JourneyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state; terminal exit is removal from the journey list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    EnRoute,
    AwaitingResponse,
    Returning,
}

/// Troops, weapons, and chiefs traveling together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Force {
    pub troops: u32,
    pub weapons: u32,
    #[serde(default)]
    pub chiefs: ChiefSet,
}

impl Force {
    #[must_use]
    pub const fn new(troops: u32, weapons: u32) -> Self {
        Self {
            troops,
            weapons,
            chiefs: ChiefSet::new_const(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.troops == 0 && self.weapons == 0 && self.chiefs.is_empty()
    }
}

/// Counterpart terms carried by a trade caravan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTerms {
    /// Bundle requested from the counterpart tribe.
    pub request: ResourceBundle,
    /// Display name of the proposing tribe, for the counterpart's panel.
    pub from_tribe_name: String,
    /// Resolved at arrival: the tribe being offered the deal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<TribeId>,
}

/// A force in transit between hexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub id: JourneyId,
    pub tribe: TribeId,
    pub kind: JourneyKind,
    pub status: JourneyStatus,
    pub origin: HexKey,
    pub destination: HexKey,
    /// Remaining coordinate sequence, head-first; last entry is the
    /// destination.
    pub path: Vec<HexKey>,
    /// Turns until arrival; counts down, arrival at zero or below.
    pub turns_remaining: i32,
    /// Travel time the outbound path was planned at; reused for the
    /// homeward leg.
    pub planned_turns: u32,
    pub force: Force,
    /// Resources carried (scavenge hauls, trade offers, return cargo).
    #[serde(default, skip_serializing_if = "ResourceBundle::is_empty")]
    pub payload: ResourceBundle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scavenge_resource: Option<ResourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade: Option<TradeTerms>,
    /// Turn by which the trade counterpart must answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_deadline: Option<u32>,
}

impl Journey {
    /// Drop the head of the path, keeping at least the destination.
    pub fn advance_one_hex(&mut self) {
        if self.path.len() > 1 {
            self.path.remove(0);
        }
    }

    /// The hex the force most recently reached, falling back to the origin.
    #[must_use]
    pub fn last_reached(&self) -> HexKey {
        self.path.first().cloned().unwrap_or_else(|| self.origin.clone())
    }

    /// Whether this journey moves during the advancement phase.
    #[must_use]
    pub const fn advances(&self) -> bool {
        matches!(
            self.status,
            JourneyStatus::EnRoute | JourneyStatus::Returning
        )
    }

    /// Build the homeward leg for the surviving force and cargo.
    #[must_use]
    pub fn return_leg(&self, id: JourneyId, payload: ResourceBundle) -> Self {
        let mut path: Vec<HexKey> = self.path.clone();
        path.reverse();
        if path.last() != Some(&self.origin) {
            path.push(self.origin.clone());
        }
        Self {
            id,
            tribe: self.tribe,
            kind: JourneyKind::Return,
            status: JourneyStatus::Returning,
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            path,
            turns_remaining: i32::try_from(self.planned_turns.max(1)).unwrap_or(i32::MAX),
            planned_turns: self.planned_turns.max(1),
            force: self.force.clone(),
            payload,
            scavenge_resource: None,
            trade: None,
            response_deadline: None,
        }
    }

    /// Decode the most recently reached hex, tolerating corrupt keys.
    #[must_use]
    pub fn last_reached_axial(&self) -> Option<Axial> {
        self.last_reached().decode().ok()
    }
}

/// Advance every moving journey one step and resolve arrivals this turn.
///
/// `awaiting_response` journeys sit still; they are handled by the trade
/// response phase.
pub fn advance_journeys<R>(
    state: &mut crate::state::GameState,
    map: &mut crate::map::MapData,
    catalog: &crate::tech::TechCatalog,
    cfg: &crate::config::EngineConfig,
    rng: &mut R,
    narr: &mut crate::state::NarrativeLog,
) where
    R: rand::Rng + ?Sized,
{
    let journeys = std::mem::take(&mut state.journeys);
    let mut arrived = Vec::new();
    let mut moving = Vec::with_capacity(journeys.len());

    for mut journey in journeys {
        if !journey.advances() {
            moving.push(journey);
            continue;
        }
        if let Some(text) = events::apply_random_event(&mut journey.force, cfg.event_chance, rng) {
            narr.push(journey.tribe, text);
        }
        if journey.force.is_empty() {
            narr.push(
                journey.tribe,
                format!(
                    "The last of the force bound for {} was lost on the road; the journey ends.",
                    journey.destination
                ),
            );
            continue;
        }
        journey.turns_remaining -= 1;
        journey.advance_one_hex();
        if journey.turns_remaining <= 0 {
            arrived.push(journey);
        } else {
            moving.push(journey);
        }
    }

    state.journeys = moving;
    for journey in arrived {
        if let Some(follow_on) = resolve_arrival(journey, state, map, catalog, cfg, rng, narr) {
            state.journeys.push(follow_on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Axial;

    fn sample_journey() -> Journey {
        let path: Vec<HexKey> = (0..4).map(|q| Axial::new(q, 0).key()).collect();
        Journey {
            id: JourneyId(1),
            tribe: TribeId(1),
            kind: JourneyKind::Scout,
            status: JourneyStatus::EnRoute,
            origin: Axial::new(0, 0).key(),
            destination: Axial::new(3, 0).key(),
            path,
            turns_remaining: 1,
            planned_turns: 1,
            force: Force::new(5, 1),
            payload: ResourceBundle::default(),
            scavenge_resource: None,
            trade: None,
            response_deadline: None,
        }
    }

    #[test]
    fn advancing_never_drops_the_destination() {
        let mut journey = sample_journey();
        for _ in 0..10 {
            journey.advance_one_hex();
        }
        assert_eq!(journey.path, vec![Axial::new(3, 0).key()]);
        assert_eq!(journey.last_reached(), Axial::new(3, 0).key());
    }

    #[test]
    fn return_leg_reverses_the_route() {
        let journey = sample_journey();
        let back = journey.return_leg(JourneyId(2), ResourceBundle::new(10, 0, 0));

        assert_eq!(back.kind, JourneyKind::Return);
        assert_eq!(back.status, JourneyStatus::Returning);
        assert_eq!(back.origin, journey.destination);
        assert_eq!(back.destination, journey.origin);
        assert_eq!(back.path.first(), Some(&Axial::new(3, 0).key()));
        assert_eq!(back.path.last(), Some(&Axial::new(0, 0).key()));
        assert_eq!(back.payload.food, 10);
        assert_eq!(back.force, journey.force);
    }

    #[test]
    fn awaiting_response_journeys_do_not_advance() {
        let mut journey = sample_journey();
        assert!(journey.advances());
        journey.status = JourneyStatus::AwaitingResponse;
        assert!(!journey.advances());
    }
}
