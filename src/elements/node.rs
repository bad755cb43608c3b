//! Node - a point on the plate mid-plane

use serde::{Deserialize, Serialize};

/// A mesh node in the plate mid-plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id, equal to its index in the mesh
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}
