//! Axial hex coordinate math and the fixed-width map-key encoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Offset added to both axes when encoding so keys stay non-negative.
pub const KEY_OFFSET: i32 = 50;

/// The six axial neighbor directions, clockwise from east.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Axial hex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Axial {
    pub q: i32,
    pub r: i32,
}

impl Axial {
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube-coordinate distance between two hexes.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        let ds = dq + dr;
        (dq.unsigned_abs() + dr.unsigned_abs() + ds.unsigned_abs()) / 2
    }

    /// The six adjacent hexes.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        DIRECTIONS.map(|(dq, dr)| Self::new(self.q + dq, self.r + dr))
    }

    /// Map key for this coordinate (`"050.050"` encodes the origin).
    #[must_use]
    pub fn key(self) -> HexKey {
        HexKey(format!(
            "{:03}.{:03}",
            self.q + KEY_OFFSET,
            self.r + KEY_OFFSET
        ))
    }
}

impl fmt::Display for Axial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().0)
    }
}

/// Errors raised while decoding a serialized hex key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexKeyError {
    #[error("hex key `{0}` is not in QQQ.RRR form")]
    Malformed(String),
    #[error("hex key `{0}` holds a non-numeric axis")]
    NonNumeric(String),
}

/// Fixed-width string form of an [`Axial`] coordinate, used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexKey(pub String);

impl HexKey {
    /// Decode back into an axial coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is not two dot-separated numeric axes.
    pub fn decode(&self) -> Result<Axial, HexKeyError> {
        let (q_part, r_part) = self
            .0
            .split_once('.')
            .ok_or_else(|| HexKeyError::Malformed(self.0.clone()))?;
        let parse = |part: &str| {
            part.parse::<i32>()
                .map_err(|_| HexKeyError::NonNumeric(self.0.clone()))
        };
        Ok(Axial::new(
            parse(q_part)? - KEY_OFFSET,
            parse(r_part)? - KEY_OFFSET,
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HexKey {
    type Err = HexKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = Self(s.to_string());
        key.decode()?;
        Ok(key)
    }
}

impl From<Axial> for HexKey {
    fn from(value: Axial) -> Self {
        value.key()
    }
}

/// All hexes within `radius` of `center`, inclusive of the center itself.
///
/// Used for scout field-of-view reveals.
#[must_use]
pub fn hexes_in_range(center: Axial, radius: u32) -> Vec<Axial> {
    let radius = i32::try_from(radius).unwrap_or(i32::MAX);
    let mut out = Vec::new();
    for dq in -radius..=radius {
        let lo = (-radius).max(-dq - radius);
        let hi = radius.min(-dq + radius);
        for dr in lo..=hi {
            out.push(Axial::new(center.q + dq, center.r + dr));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_encodes_with_offset() {
        let origin = Axial::new(0, 0);
        assert_eq!(origin.key().as_str(), "050.050");
        assert_eq!(Axial::new(-2, 3).key().as_str(), "048.053");
    }

    #[test]
    fn key_roundtrips_through_decode() {
        let coord = Axial::new(7, -4);
        let key = coord.key();
        assert_eq!(key.decode().unwrap(), coord);
        assert_eq!("057.046".parse::<HexKey>().unwrap(), key);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(
            HexKey(String::from("050050")).decode(),
            Err(HexKeyError::Malformed(_))
        ));
        assert!(matches!(
            HexKey(String::from("05a.050")).decode(),
            Err(HexKeyError::NonNumeric(_))
        ));
    }

    #[test]
    fn distance_matches_cube_metric() {
        let origin = Axial::new(0, 0);
        assert_eq!(origin.distance(origin), 0);
        assert_eq!(origin.distance(Axial::new(3, 0)), 3);
        assert_eq!(origin.distance(Axial::new(2, -1)), 2);
        assert_eq!(origin.distance(Axial::new(-2, -1)), 3);
        // Symmetric.
        assert_eq!(Axial::new(4, -2).distance(origin), origin.distance(Axial::new(4, -2)));
    }

    #[test]
    fn neighbors_are_all_at_distance_one() {
        let center = Axial::new(5, -3);
        for neighbor in center.neighbors() {
            assert_eq!(center.distance(neighbor), 1);
        }
    }

    #[test]
    fn range_query_counts_match_hex_formula() {
        // 1 + 3r(r+1) hexes within radius r.
        assert_eq!(hexes_in_range(Axial::new(0, 0), 0).len(), 1);
        assert_eq!(hexes_in_range(Axial::new(0, 0), 1).len(), 7);
        assert_eq!(hexes_in_range(Axial::new(2, 2), 2).len(), 19);
        let center = Axial::new(1, 1);
        for hex in hexes_in_range(center, 2) {
            assert!(center.distance(hex) <= 2);
        }
    }
}
