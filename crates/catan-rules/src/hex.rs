//! Hex coordinate system using axial coordinates (q, r).
//!
//! Only hex centres live here. Corners and sides are derived from pixel positions
//! by the board graph builder, which collapses shared corners into one vertex.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes in clockwise order starting from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.q + 1, self.r),     // East
            HexCoord::new(self.q, self.r + 1),     // SouthEast
            HexCoord::new(self.q - 1, self.r + 1), // SouthWest
            HexCoord::new(self.q - 1, self.r),     // West
            HexCoord::new(self.q, self.r - 1),     // NorthWest
            HexCoord::new(self.q + 1, self.r - 1), // NorthEast
        ]
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Convert to pixel coordinates (center of hex)
    /// Uses pointy-top orientation with the given hex size (radius)
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }

    /// Pixel position of corner `index` (0..6, clockwise from the upper-right corner)
    pub fn corner_pixel(&self, index: usize, hex_size: f64) -> (f64, f64) {
        let (cx, cy) = self.to_pixel(hex_size);
        let angle = (60.0 * index as f64 - 30.0).to_radians();
        (cx + hex_size * angle.cos(), cy + hex_size * angle.sin())
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
