//! Position types for map entities

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tile coordinate on a map
///
/// Coordinates are one byte wide on the wire. Ordering is row-major
/// (`y` first, then `x`), which is the order entities are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapCoordinate {
    pub x: u8,
    pub y: u8,
}

impl MapCoordinate {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Check whether this coordinate lies within a map of the given
    /// dimensions (width/height are the largest valid x/y)
    pub const fn is_within(self, width: u8, height: u8) -> bool {
        self.x <= width && self.y <= height
    }
}

impl Ord for MapCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for MapCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
