//! Typed per-turn action payloads and the validation errors they can raise.
//!
//! Each failure becomes a narrative attached to the action's `result`; the
//! turn itself never aborts on a bad action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hex::HexKey;
use crate::state::{ChiefSet, ResourceBundle};
use crate::tech::{ResourceKind, TechId};

/// Force composition and route for a travel-class action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelOrder {
    pub from: HexKey,
    pub to: HexKey,
    pub troops: u32,
    #[serde(default)]
    pub weapons: u32,
    #[serde(default)]
    pub chiefs: ChiefSet,
}

/// One planned operation, submitted in a per-tribe ordered batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAction {
    pub id: u64,
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Narrative outcome, written exactly once during resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl GameAction {
    #[must_use]
    pub const fn new(id: u64, kind: ActionKind) -> Self {
        Self {
            id,
            kind,
            result: None,
        }
    }
}

/// Tagged action payload; exactly one variant per player-facing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Recruit {
        at: HexKey,
        food_offered: u32,
    },
    Rest,
    BuildWeapons {
        at: HexKey,
        scrap_used: u32,
    },
    /// The level arrives as raw text from the submission layer and is
    /// validated by the resolver.
    SetRations {
        level: String,
    },
    Defend {
        at: HexKey,
    },
    StartResearch {
        tech: TechId,
        at: HexKey,
        troops: u32,
    },
    Move {
        travel: TravelOrder,
    },
    Scout {
        travel: TravelOrder,
    },
    Scavenge {
        travel: TravelOrder,
        resource: ResourceKind,
    },
    Attack {
        travel: TravelOrder,
    },
    BuildOutpost {
        travel: TravelOrder,
    },
    Trade {
        travel: TravelOrder,
        /// Goods loaded onto the caravan.
        offer: ResourceBundle,
        /// Goods requested from the counterpart tribe.
        request: ResourceBundle,
    },
}

impl ActionKind {
    /// Whether resolution goes through the journey lifecycle.
    #[must_use]
    pub const fn is_travel(&self) -> bool {
        matches!(
            self,
            Self::Move { .. }
                | Self::Scout { .. }
                | Self::Scavenge { .. }
                | Self::Attack { .. }
                | Self::BuildOutpost { .. }
                | Self::Trade { .. }
        )
    }

    /// Short verb used in failure narratives.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Recruit { .. } => "recruit",
            Self::Rest => "rest",
            Self::BuildWeapons { .. } => "build weapons",
            Self::SetRations { .. } => "set rations",
            Self::Defend { .. } => "defend",
            Self::StartResearch { .. } => "start research",
            Self::Move { .. } => "move",
            Self::Scout { .. } => "scout",
            Self::Scavenge { .. } => "scavenge",
            Self::Attack { .. } => "attack",
            Self::BuildOutpost { .. } => "build an outpost",
            Self::Trade { .. } => "trade",
        }
    }
}

/// Validation failure local to one action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("not enough food: needed {needed}, have {available}")]
    InsufficientFood { needed: u32, available: u32 },
    #[error("not enough scrap: needed {needed}, have {available}")]
    InsufficientScrap { needed: u32, available: u32 },
    #[error("not enough troops at {at}: needed {needed}, available {available}")]
    InsufficientTroops {
        at: HexKey,
        needed: u32,
        available: u32,
    },
    #[error("not enough weapons at {at}: needed {needed}, available {available}")]
    InsufficientWeapons {
        at: HexKey,
        needed: u32,
        available: u32,
    },
    #[error("`{0}` is not a ration level (hard, normal, generous)")]
    InvalidRations(String),
    #[error("a research project is already underway")]
    ResearchActive,
    #[error("unknown technology `{0}`")]
    UnknownTech(TechId),
    #[error("research needs at least {needed} troops, only {assigned} assigned")]
    BelowMinimumStaff { needed: u32, assigned: u32 },
    #[error("no passable route from {from} to {to}")]
    NoPath { from: HexKey, to: HexKey },
    #[error("coordinate `{0}` is not a valid hex key")]
    InvalidCoordinate(HexKey),
    #[error("no garrison at {0}")]
    MissingGarrison(HexKey),
    #[error("chief `{0}` is not present in the garrison")]
    MissingChief(String),
    #[error("a force needs at least one troop")]
    EmptyForce,
}
