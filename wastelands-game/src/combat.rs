//! Combat resolution for attack journeys arriving at a hostile garrison.
//!
//! Strength is troops scaled by armament and tech bonuses; the defender
//! additionally benefits from terrain, fortification, and a standing
//! Defend order. Ties favor the defender.

use crate::map::{Poi, Terrain};

const WEAPON_STRENGTH_FACTOR: f64 = 0.5;
const WINNER_CASUALTY_RATE: f64 = 0.2;
const LOSER_CASUALTY_RATE: f64 = 0.5;
const ROUGH_TERRAIN_DEFENSE: f64 = 1.25;

/// One side of an engagement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combatant {
    pub troops: u32,
    pub weapons: u32,
    /// Aggregate tech bonus for this side's role (attack or defense).
    pub tech_bonus: f64,
}

impl Combatant {
    /// Effective strength: troops scaled by how well-armed they are.
    /// Weapons beyond one per troop add nothing.
    #[must_use]
    pub fn strength(&self) -> f64 {
        if self.troops == 0 {
            return 0.0;
        }
        let armed = f64::from(self.weapons.min(self.troops)) / f64::from(self.troops);
        f64::from(self.troops) * (1.0 + WEAPON_STRENGTH_FACTOR * armed) * (1.0 + self.tech_bonus)
    }
}

/// Situational modifiers applied to the defender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseModifiers {
    pub terrain: Option<Terrain>,
    pub poi: Option<Poi>,
    /// Defender issued a Defend order at this hex this turn.
    pub defend_order: bool,
    /// Multiplier granted by fortification or a Defend order.
    pub defend_bonus: f64,
}

impl DefenseModifiers {
    #[must_use]
    fn multiplier(&self) -> f64 {
        let terrain = match self.terrain {
            Some(Terrain::Mountains | Terrain::Ruins) => ROUGH_TERRAIN_DEFENSE,
            _ => 1.0,
        };
        let fortified = self.defend_order || self.poi == Some(Poi::Outpost);
        let fortification = if fortified {
            1.0 + self.defend_bonus
        } else {
            1.0
        };
        terrain * fortification
    }
}

/// Which side holds the hex afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatOutcome {
    /// Attacker took the hex; the defending garrison is destroyed.
    Captured,
    /// Defender held; attacker survivors turn back.
    Repelled,
}

/// Troop and weapon losses for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Casualties {
    pub troops: u32,
    pub weapons: u32,
}

/// Full engagement outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatResult {
    pub outcome: CombatOutcome,
    pub attacker_losses: Casualties,
    pub defender_losses: Casualties,
    pub attacker_strength: f64,
    pub defender_strength: f64,
}

/// Resolve one engagement.
///
/// The winner loses a fifth of its troops scaled by how close the fight
/// was; the loser loses half. Weapons are lost in proportion to troops.
#[must_use]
pub fn resolve_combat(
    attacker: Combatant,
    defender: Combatant,
    mods: DefenseModifiers,
) -> CombatResult {
    let attacker_strength = attacker.strength();
    let defender_strength = defender.strength() * mods.multiplier();

    let attacker_wins = attacker_strength > defender_strength;
    let (winner_strength, loser_strength) = if attacker_wins {
        (attacker_strength, defender_strength)
    } else {
        (defender_strength, attacker_strength)
    };
    let ratio = if winner_strength > 0.0 {
        loser_strength / winner_strength
    } else {
        0.0
    };

    let winner_losses = |side: Combatant| casualties(side, WINNER_CASUALTY_RATE * ratio);
    let loser_losses = |side: Combatant| casualties(side, LOSER_CASUALTY_RATE);

    let (attacker_losses, defender_losses) = if attacker_wins {
        (winner_losses(attacker), loser_losses(defender))
    } else {
        (loser_losses(attacker), winner_losses(defender))
    };

    CombatResult {
        outcome: if attacker_wins {
            CombatOutcome::Captured
        } else {
            CombatOutcome::Repelled
        },
        attacker_losses,
        defender_losses,
        attacker_strength,
        defender_strength,
    }
}

fn casualties(side: Combatant, rate: f64) -> Casualties {
    let troops = ceil_u32(f64::from(side.troops) * rate).min(side.troops);
    let weapons = if side.troops == 0 {
        0
    } else {
        ceil_u32(f64::from(side.weapons) * f64::from(troops) / f64::from(side.troops))
            .min(side.weapons)
    };
    Casualties { troops, weapons }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_u32(value: f64) -> u32 {
    value.max(0.0).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN_GROUND: DefenseModifiers = DefenseModifiers {
        terrain: Some(Terrain::Wasteland),
        poi: None,
        defend_order: false,
        defend_bonus: 0.3,
    };

    #[test]
    fn superior_force_captures_the_hex() {
        let result = resolve_combat(
            Combatant {
                troops: 20,
                weapons: 20,
                tech_bonus: 0.0,
            },
            Combatant {
                troops: 5,
                weapons: 0,
                tech_bonus: 0.0,
            },
            OPEN_GROUND,
        );
        assert_eq!(result.outcome, CombatOutcome::Captured);
        // Loser loses half, rounded up.
        assert_eq!(result.defender_losses.troops, 3);
        assert!(result.attacker_losses.troops < result.defender_losses.troops);
    }

    #[test]
    fn ties_favor_the_defender() {
        let evenly_matched = Combatant {
            troops: 10,
            weapons: 0,
            tech_bonus: 0.0,
        };
        let mods = DefenseModifiers {
            terrain: Some(Terrain::Wasteland),
            poi: None,
            defend_order: false,
            defend_bonus: 0.0,
        };
        let result = resolve_combat(evenly_matched, evenly_matched, mods);
        assert_eq!(result.outcome, CombatOutcome::Repelled);
    }

    #[test]
    fn defend_order_can_turn_the_fight() {
        let attacker = Combatant {
            troops: 11,
            weapons: 0,
            tech_bonus: 0.0,
        };
        let defender = Combatant {
            troops: 10,
            weapons: 0,
            tech_bonus: 0.0,
        };

        let open = resolve_combat(attacker, defender, OPEN_GROUND);
        assert_eq!(open.outcome, CombatOutcome::Captured);

        let dug_in = resolve_combat(
            attacker,
            defender,
            DefenseModifiers {
                defend_order: true,
                ..OPEN_GROUND
            },
        );
        assert_eq!(dug_in.outcome, CombatOutcome::Repelled);
    }

    #[test]
    fn rough_terrain_and_outposts_boost_defense() {
        let defender = Combatant {
            troops: 10,
            weapons: 0,
            tech_bonus: 0.0,
        };
        let mountain = DefenseModifiers {
            terrain: Some(Terrain::Mountains),
            poi: None,
            defend_order: false,
            defend_bonus: 0.3,
        };
        let base = defender.strength();
        assert!((defender.strength() * mountain.multiplier() - base * 1.25).abs() < 1e-9);

        let outpost = DefenseModifiers {
            terrain: Some(Terrain::Wasteland),
            poi: Some(Poi::Outpost),
            defend_order: false,
            defend_bonus: 0.3,
        };
        assert!((outpost.multiplier() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn weapons_cap_at_one_per_troop() {
        let over_armed = Combatant {
            troops: 4,
            weapons: 100,
            tech_bonus: 0.0,
        };
        assert!((over_armed.strength() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn casualties_never_exceed_the_side() {
        let result = resolve_combat(
            Combatant {
                troops: 1,
                weapons: 1,
                tech_bonus: 0.0,
            },
            Combatant {
                troops: 30,
                weapons: 30,
                tech_bonus: 0.5,
            },
            OPEN_GROUND,
        );
        assert_eq!(result.outcome, CombatOutcome::Repelled);
        assert!(result.attacker_losses.troops <= 1);
        assert!(result.defender_losses.weapons <= 30);
    }
}
