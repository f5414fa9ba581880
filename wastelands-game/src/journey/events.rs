//! Random road events rolled while a journey advances.
//!
//! The catalog is a declarative list of weighted, precondition-filtered
//! entries so new events slot in without branching code.

use rand::Rng;

use crate::journey::Force;

/// What a road event does to the in-flight force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadEvent {
    /// Raiders hit the column; a share of the troops is lost.
    Ambush,
    /// One traveler wanders off and is never found.
    LostScout,
    /// A supply cart tips; weapons are lost.
    SupplyCartLoss,
    /// A wastelander joins the column.
    RescuedRecruit,
}

/// Catalog entry: selection weight plus the event itself.
#[derive(Debug, Clone, Copy)]
pub struct EventEntry {
    pub weight: u32,
    pub event: RoadEvent,
}

/// The full road-event catalog.
pub const EVENT_TABLE: [EventEntry; 4] = [
    EventEntry {
        weight: 3,
        event: RoadEvent::Ambush,
    },
    EventEntry {
        weight: 2,
        event: RoadEvent::LostScout,
    },
    EventEntry {
        weight: 2,
        event: RoadEvent::SupplyCartLoss,
    },
    EventEntry {
        weight: 3,
        event: RoadEvent::RescuedRecruit,
    },
];

impl RoadEvent {
    /// Whether the current force can experience this event at all.
    #[must_use]
    pub const fn applies_to(self, force: &Force) -> bool {
        match self {
            Self::Ambush => force.troops >= 2,
            Self::LostScout => force.troops >= 1,
            Self::SupplyCartLoss => force.weapons >= 1,
            Self::RescuedRecruit => true,
        }
    }

    /// Mutate the force and return the narrative line.
    pub fn apply(self, force: &mut Force) -> String {
        match self {
            Self::Ambush => {
                let casualties = (force.troops / 5).max(1);
                force.troops -= casualties;
                format!("Raiders ambushed the column on the road; {casualties} troops were lost.")
            }
            Self::LostScout => {
                force.troops -= 1;
                String::from("A scout strayed from the column and never returned.")
            }
            Self::SupplyCartLoss => {
                let lost = (force.weapons / 4).max(1);
                force.weapons -= lost;
                format!("A supply cart overturned in a ravine; {lost} weapons were lost.")
            }
            Self::RescuedRecruit => {
                force.troops += 1;
                String::from("A stranded wastelander was rescued and joined the column.")
            }
        }
    }
}

/// Weighted choice among entries whose preconditions the force satisfies.
fn pick_event<R>(force: &Force, rng: &mut R) -> Option<RoadEvent>
where
    R: Rng + ?Sized,
{
    let eligible: Vec<EventEntry> = EVENT_TABLE
        .iter()
        .copied()
        .filter(|entry| entry.event.applies_to(force))
        .collect();
    let total: u32 = eligible.iter().map(|entry| entry.weight).sum();
    if total == 0 {
        return None;
    }

    let mut remaining = rng.gen_range(0..total);
    for entry in &eligible {
        if remaining < entry.weight {
            return Some(entry.event);
        }
        remaining -= entry.weight;
    }
    None
}

/// Roll the per-turn event chance and, on a hit, apply one eligible event.
///
/// Returns the narrative line when an event fired.
pub fn apply_random_event<R>(force: &mut Force, chance: f64, rng: &mut R) -> Option<String>
where
    R: Rng + ?Sized,
{
    if chance <= 0.0 || rng.r#gen::<f64>() >= chance {
        return None;
    }
    pick_event(force, rng).map(|event| event.apply(force))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn preconditions_gate_eligibility() {
        let unarmed = Force::new(5, 0);
        assert!(!RoadEvent::SupplyCartLoss.applies_to(&unarmed));
        assert!(RoadEvent::Ambush.applies_to(&unarmed));

        let lone = Force::new(1, 0);
        assert!(!RoadEvent::Ambush.applies_to(&lone));
        assert!(RoadEvent::LostScout.applies_to(&lone));
    }

    #[test]
    fn zero_chance_never_fires() {
        let mut force = Force::new(10, 5);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(apply_random_event(&mut force, 0.0, &mut rng).is_none());
        }
        assert_eq!(force, Force::new(10, 5));
    }

    #[test]
    fn certain_chance_always_picks_an_eligible_event() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut force = Force::new(10, 5);
            let narrative = apply_random_event(&mut force, 1.0, &mut rng);
            assert!(narrative.is_some());
            // No event may drive the force negative.
            assert!(force.troops >= 8);
        }
    }

    #[test]
    fn events_never_underflow_a_minimal_force() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            // Only LostScout and RescuedRecruit are eligible here.
            let mut force = Force::new(1, 0);
            let _ = apply_random_event(&mut force, 1.0, &mut rng);
            assert!(force.troops <= 2);
        }
    }

    #[test]
    fn ambush_scales_with_force_size() {
        let mut force = Force::new(25, 0);
        RoadEvent::Ambush.apply(&mut force);
        assert_eq!(force.troops, 20);

        let mut small = Force::new(3, 0);
        RoadEvent::Ambush.apply(&mut small);
        assert_eq!(small.troops, 2);
    }
}
