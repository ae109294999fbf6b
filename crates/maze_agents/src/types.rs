//! Core value types shared by the search engine and the learning agent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// An integer grid coordinate `(x, z)`.
///
/// Locations are plain values: equality and hashing are by coordinate. A
/// `Location` is also used as a movement offset ("direction").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub z: i32,
}

impl Location {
    /// Creates a new location.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Manhattan (L1) distance to `other`.
    pub fn manhattan(&self, other: &Location) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    /// Straight-line (Euclidean) distance to `other`.
    pub fn euclidean(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        f64::from(dx * dx + dz * dz).sqrt()
    }

    /// Returns `true` if `other` is exactly one Manhattan step away.
    pub fn is_adjacent(&self, other: &Location) -> bool {
        self.manhattan(other) == 1
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, rhs: Location) -> Location {
        Location::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, rhs: Location) -> Location {
        Location::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, z): (i32, i32)) -> Self {
        Location::new(x, z)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Movement offsets.
///
/// The order of these slices defines action indices for the Q-table, so a
/// serialized table row is only meaningful together with the direction set
/// that produced it.
pub mod directions {
    use super::Location;

    /// East, north, west, south. Action indices 0..3.
    pub const FOUR_WAY: [Location; 4] = [
        Location::new(1, 0),
        Location::new(0, 1),
        Location::new(-1, 0),
        Location::new(0, -1),
    ];

    /// [`FOUR_WAY`] followed by the diagonals NE, NW, SW, SE. Action indices 0..7.
    pub const EIGHT_WAY: [Location; 8] = [
        Location::new(1, 0),
        Location::new(0, 1),
        Location::new(-1, 0),
        Location::new(0, -1),
        Location::new(1, 1),
        Location::new(-1, 1),
        Location::new(-1, -1),
        Location::new(1, -1),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_arithmetic() {
        let a = Location::new(2, 3);
        let b = Location::new(-1, 1);
        assert_eq!(a + b, Location::new(1, 4));
        assert_eq!(a - b, Location::new(3, 2));
    }

    #[test]
    fn test_distances() {
        let a = Location::new(1, 1);
        let b = Location::new(4, 5);
        assert_eq!(a.manhattan(&b), 7);
        assert!((a.euclidean(&b) - 5.0).abs() < 1e-9);
        assert!(a.is_adjacent(&Location::new(1, 2)));
        assert!(!a.is_adjacent(&Location::new(2, 2)));
    }

    #[test]
    fn test_location_hash_by_value() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Location::new(1, 2));
        set.insert(Location::from((1, 2)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::new(3, -4).to_string(), "(3, -4)");
    }

    #[test]
    fn test_direction_order_is_stable() {
        assert_eq!(directions::FOUR_WAY[0], Location::new(1, 0));
        assert_eq!(directions::FOUR_WAY[3], Location::new(0, -1));
        assert_eq!(&directions::EIGHT_WAY[..4], &directions::FOUR_WAY[..]);
    }
}
