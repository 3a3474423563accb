//! Galactic coordinates and straight-line distance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the galaxy, in light years relative to Sol.
///
/// Matches the `coords` object returned by EDSM, so it can be deserialized
/// straight out of API responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Sol sits at the origin of the EDSM coordinate frame.
pub const ORIGIN: Coordinate = Coordinate {
    x: 0.0,
    y: 0.0,
    z: 0.0,
};

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position, in light years.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
