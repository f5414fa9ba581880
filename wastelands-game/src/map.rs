//! Read-mostly hex map consumed by the engine.
//!
//! The grid itself comes from the external map generator; the engine only
//! mutates it in two narrow cases (stamping a new outpost, consuming a
//! looted weapons cache).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::hex::{Axial, HexKey};

/// Hexes a force covers per turn on the cheapest terrain.
pub const BASE_MOVEMENT_PER_TURN: f64 = 5.0;

/// Terrain classes on the wasteland map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Wasteland,
    Forest,
    Swamp,
    Mountains,
    Ruins,
    Radiation,
    Water,
}

impl Terrain {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wasteland => "wasteland",
            Self::Forest => "forest",
            Self::Swamp => "swamp",
            Self::Mountains => "mountains",
            Self::Ruins => "ruins",
            Self::Radiation => "radiation",
            Self::Water => "water",
        }
    }

    /// Raw cost of entering a hex of this terrain, in movement points.
    /// `None` means impassable.
    #[must_use]
    pub const fn base_cost(self) -> Option<f64> {
        match self {
            Self::Wasteland => Some(1.0),
            Self::Forest | Self::Ruins => Some(1.5),
            Self::Swamp => Some(2.0),
            Self::Mountains => Some(2.5),
            Self::Radiation => Some(1.2),
            Self::Water => None,
        }
    }

    /// Per-hex travel cost expressed in turns, or `None` when impassable.
    #[must_use]
    pub fn movement_cost(self) -> Option<f64> {
        self.base_cost().map(|cost| cost / BASE_MOVEMENT_PER_TURN)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-of-interest feature on a hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Poi {
    Scrapyard,
    Factory,
    FoodSource,
    WeaponsCache,
    Outpost,
    Vault,
}

impl Poi {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scrapyard => "scrapyard",
            Self::Factory => "factory",
            Self::FoodSource => "food_source",
            Self::WeaponsCache => "weapons_cache",
            Self::Outpost => "outpost",
            Self::Vault => "vault",
        }
    }
}

impl fmt::Display for Poi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapHex {
    pub terrain: Terrain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi: Option<Poi>,
}

impl MapHex {
    #[must_use]
    pub const fn new(terrain: Terrain) -> Self {
        Self { terrain, poi: None }
    }

    #[must_use]
    pub const fn with_poi(terrain: Terrain, poi: Poi) -> Self {
        Self {
            terrain,
            poi: Some(poi),
        }
    }
}

/// The world grid, keyed by serialized hex coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapData {
    pub hexes: BTreeMap<HexKey, MapHex>,
}

impl MapData {
    #[must_use]
    pub fn get(&self, coord: Axial) -> Option<&MapHex> {
        self.hexes.get(&coord.key())
    }

    #[must_use]
    pub fn terrain(&self, coord: Axial) -> Option<Terrain> {
        self.get(coord).map(|hex| hex.terrain)
    }

    #[must_use]
    pub fn poi(&self, coord: Axial) -> Option<Poi> {
        self.get(coord).and_then(|hex| hex.poi)
    }

    #[must_use]
    pub fn terrain_at(&self, key: &HexKey) -> Option<Terrain> {
        self.hexes.get(key).map(|hex| hex.terrain)
    }

    #[must_use]
    pub fn poi_at(&self, key: &HexKey) -> Option<Poi> {
        self.hexes.get(key).and_then(|hex| hex.poi)
    }

    /// Whether a force can enter the hex at all.
    #[must_use]
    pub fn passable(&self, coord: Axial) -> bool {
        self.terrain(coord)
            .is_some_and(|terrain| terrain.movement_cost().is_some())
    }

    /// Stamp an outpost onto a hex after a successful build.
    pub fn stamp_outpost(&mut self, coord: Axial) {
        self.stamp_outpost_key(&coord.key());
    }

    pub fn stamp_outpost_key(&mut self, key: &HexKey) {
        if let Some(hex) = self.hexes.get_mut(key) {
            hex.poi = Some(Poi::Outpost);
        }
    }

    /// Remove a looted weapons cache.
    pub fn consume_weapons_cache(&mut self, coord: Axial) {
        self.consume_weapons_cache_key(&coord.key());
    }

    pub fn consume_weapons_cache_key(&mut self, key: &HexKey) {
        if let Some(hex) = self.hexes.get_mut(key)
            && hex.poi == Some(Poi::WeaponsCache)
        {
            hex.poi = None;
        }
    }

    pub fn insert(&mut self, coord: Axial, hex: MapHex) {
        self.hexes.insert(coord.key(), hex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> MapData {
        let mut map = MapData::default();
        map.insert(Axial::new(0, 0), MapHex::new(Terrain::Wasteland));
        map.insert(Axial::new(1, 0), MapHex::new(Terrain::Water));
        map.insert(
            Axial::new(2, 0),
            MapHex::with_poi(Terrain::Ruins, Poi::WeaponsCache),
        );
        map
    }

    #[test]
    fn water_is_impassable() {
        let map = small_map();
        assert!(map.passable(Axial::new(0, 0)));
        assert!(!map.passable(Axial::new(1, 0)));
        // Off-map counts as impassable too.
        assert!(!map.passable(Axial::new(9, 9)));
    }

    #[test]
    fn movement_cost_scales_by_base_movement() {
        assert_eq!(Terrain::Wasteland.movement_cost(), Some(0.2));
        assert_eq!(Terrain::Swamp.movement_cost(), Some(0.4));
        assert_eq!(Terrain::Water.movement_cost(), None);
    }

    #[test]
    fn outpost_stamp_and_cache_consumption() {
        let mut map = small_map();
        map.stamp_outpost(Axial::new(0, 0));
        assert_eq!(map.poi(Axial::new(0, 0)), Some(Poi::Outpost));

        map.consume_weapons_cache(Axial::new(2, 0));
        assert_eq!(map.poi(Axial::new(2, 0)), None);
        // Consuming a cache elsewhere is a no-op.
        map.consume_weapons_cache(Axial::new(0, 0));
        assert_eq!(map.poi(Axial::new(0, 0)), Some(Poi::Outpost));
    }
}
