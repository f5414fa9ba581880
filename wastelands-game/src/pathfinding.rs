//! A* pathfinding over the terrain-weighted hex grid.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::hex::Axial;
use crate::map::{BASE_MOVEMENT_PER_TURN, MapData};

/// Cheapest possible per-hex step in turns. The search heuristic must
/// never overestimate, so remaining distance is priced at this rate.
const CHEAPEST_STEP: f64 = 1.0 / BASE_MOVEMENT_PER_TURN;

/// A resolved route between two hexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Ordered coordinates, inclusive of both endpoints.
    pub hexes: Vec<Axial>,
    /// Total travel cost rounded up to whole turns. Never zero for a
    /// non-trivial route.
    pub cost_turns: u32,
    /// Unrounded cost in turns, before movement-speed bonuses.
    pub raw_cost: f64,
}

impl Path {
    /// Travel turns after a fractional movement-speed bonus, never below
    /// one for a non-trivial route.
    #[must_use]
    pub fn turns_with_bonus(&self, movement_bonus: f64) -> u32 {
        if self.hexes.len() <= 1 {
            return 0;
        }
        let adjusted = self.raw_cost / (1.0 + movement_bonus.max(0.0));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let turns = adjusted.ceil().max(1.0) as u32;
        turns
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNode {
    coord: Axial,
    f_score: f64,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the cheapest node pops first.
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.coord.cmp(&other.coord))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest route from `start` to `goal`.
///
/// Edge cost is the movement cost of the hex being entered; water and
/// off-map hexes are never expanded. Returns `None` when no route exists,
/// which callers surface as a failed dispatch.
#[must_use]
pub fn find_path(start: Axial, goal: Axial, map: &MapData) -> Option<Path> {
    if start == goal {
        return Some(Path {
            hexes: vec![start],
            cost_turns: 0,
            raw_cost: 0.0,
        });
    }
    if !map.passable(goal) {
        return None;
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<Axial, Axial> = HashMap::new();
    let mut g_score: HashMap<Axial, f64> = HashMap::new();

    g_score.insert(start, 0.0);
    open.push(OpenNode {
        coord: start,
        f_score: f64::from(start.distance(goal)) * CHEAPEST_STEP,
    });

    while let Some(OpenNode { coord, .. }) = open.pop() {
        if coord == goal {
            return Some(reconstruct(&came_from, start, goal, g_score[&goal]));
        }
        let current_g = g_score[&coord];

        for neighbor in coord.neighbors() {
            let Some(step_cost) = map.terrain(neighbor).and_then(|t| t.movement_cost()) else {
                continue;
            };
            let tentative = current_g + step_cost;
            if g_score
                .get(&neighbor)
                .is_none_or(|&existing| tentative < existing)
            {
                came_from.insert(neighbor, coord);
                g_score.insert(neighbor, tentative);
                open.push(OpenNode {
                    coord: neighbor,
                    f_score: tentative + f64::from(neighbor.distance(goal)) * CHEAPEST_STEP,
                });
            }
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<Axial, Axial>, start: Axial, goal: Axial, cost: f64) -> Path {
    let mut hexes = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        cursor = came_from[&cursor];
        hexes.push(cursor);
    }
    hexes.reverse();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cost_turns = cost.ceil().max(1.0) as u32;
    Path {
        hexes,
        cost_turns,
        raw_cost: cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{MapHex, Terrain};

    fn strip_map(length: i32, terrain: Terrain) -> MapData {
        let mut map = MapData::default();
        for q in 0..=length {
            for r in -1..=1 {
                map.insert(Axial::new(q, r), MapHex::new(terrain));
            }
        }
        map
    }

    #[test]
    fn straight_route_costs_ceiling_of_summed_hexes() {
        let map = strip_map(6, Terrain::Wasteland);
        let path = find_path(Axial::new(0, 0), Axial::new(6, 0), &map).unwrap();
        assert_eq!(path.hexes.first(), Some(&Axial::new(0, 0)));
        assert_eq!(path.hexes.last(), Some(&Axial::new(6, 0)));
        assert_eq!(path.hexes.len(), 7);
        // Six hexes entered at 0.2 turns each.
        assert_eq!(path.cost_turns, 2);
    }

    #[test]
    fn short_route_still_costs_a_full_turn() {
        let map = strip_map(2, Terrain::Wasteland);
        let path = find_path(Axial::new(0, 0), Axial::new(1, 0), &map).unwrap();
        assert_eq!(path.cost_turns, 1);
    }

    #[test]
    fn water_blocks_routing() {
        let mut map = strip_map(4, Terrain::Wasteland);
        // Wall of water across the strip.
        for r in -1..=1 {
            map.insert(Axial::new(2, r), MapHex::new(Terrain::Water));
        }
        assert!(find_path(Axial::new(0, 0), Axial::new(4, 0), &map).is_none());
    }

    #[test]
    fn detours_around_expensive_terrain() {
        let mut map = strip_map(2, Terrain::Wasteland);
        map.insert(Axial::new(1, 0), MapHex::new(Terrain::Mountains));
        let path = find_path(Axial::new(0, 0), Axial::new(2, 0), &map).unwrap();
        // Route through (1,-1) or (1,1) is cheaper than the mountain hex.
        assert!(!path.hexes.contains(&Axial::new(1, 0)));
    }

    #[test]
    fn longer_cheap_detour_beats_shorter_mountain_route() {
        // The direct route crosses two mountain hexes (raw cost 1.2);
        // the wasteland detour takes more hexes but only 0.8 turns.
        let mut map = strip_map(3, Terrain::Wasteland);
        map.insert(Axial::new(1, 0), MapHex::new(Terrain::Mountains));
        map.insert(Axial::new(2, 0), MapHex::new(Terrain::Mountains));

        let path = find_path(Axial::new(0, 0), Axial::new(3, 0), &map).unwrap();
        assert_eq!(path.cost_turns, 1);
        assert!(path.raw_cost < 1.0);
        assert!(!path.hexes.contains(&Axial::new(1, 0)));
        assert!(!path.hexes.contains(&Axial::new(2, 0)));
    }

    #[test]
    fn movement_bonus_compresses_travel_time() {
        let map = strip_map(10, Terrain::Wasteland);
        let path = find_path(Axial::new(0, 0), Axial::new(10, 0), &map).unwrap();
        // 10 hexes at 0.2 turns each.
        assert_eq!(path.cost_turns, 2);
        assert_eq!(path.turns_with_bonus(0.0), 2);
        assert_eq!(path.turns_with_bonus(1.0), 1);
        // A bonus never drops a real route below one turn.
        assert_eq!(path.turns_with_bonus(100.0), 1);
    }

    #[test]
    fn degenerate_route_is_free() {
        let map = strip_map(1, Terrain::Wasteland);
        let path = find_path(Axial::new(0, 0), Axial::new(0, 0), &map).unwrap();
        assert_eq!(path.hexes, vec![Axial::new(0, 0)]);
        assert_eq!(path.cost_turns, 0);
    }
}
