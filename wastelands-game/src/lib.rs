//! Wastelands Game Engine
//!
//! Deterministic turn-resolution core for the Wastelands hex-map strategy
//! game. This crate provides all game mechanics without UI, networking, or
//! persistence dependencies; callers own the map, the tech catalog, and
//! the state snapshot and feed them through [`TurnEngine::process_turn`].

pub mod actions;
pub mod combat;
pub mod config;
pub mod diplomacy;
pub mod hex;
pub mod journey;
pub mod map;
pub mod pathfinding;
pub mod state;
pub mod stationary;
pub mod tech;
pub mod turn;

// Re-export commonly used types
pub use actions::{ActionError, ActionKind, GameAction, TravelOrder};
pub use combat::{Casualties, Combatant, CombatOutcome, CombatResult, DefenseModifiers, resolve_combat};
pub use config::EngineConfig;
pub use diplomacy::{
    DiplomacyError, accept_proposal, declare_war, propose_alliance, reject_proposal, sue_for_peace,
};
pub use hex::{Axial, HexKey, HexKeyError, hexes_in_range};
pub use journey::{
    Force, Journey, JourneyId, JourneyKind, JourneyStatus, TradeTerms, dispatch_travel_action,
};
pub use map::{MapData, MapHex, Poi, Terrain};
pub use pathfinding::{Path, find_path};
pub use state::{
    ChiefSet, DiplomaticProposal, DiplomaticRelation, DiplomaticStatus, GameState, Garrison,
    GlobalResources,
    NarrativeLog, ProposalId, RationLevel, ResearchProject, ResourceBundle, Stats, TradeResponse,
    Tribe, TribeId,
};
pub use tech::{
    ResourceKind, TechBonuses, TechCatalog, TechEffect, TechId, Technology, aggregate_bonuses,
};
pub use turn::TurnEngine;
