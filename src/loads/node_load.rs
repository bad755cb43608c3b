//! Node loads - concentrated transverse forces applied directly to nodes

use serde::{Deserialize, Serialize};

/// A transverse point force acting on the deflection DOF of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    /// Node id
    pub node: usize,
    /// Force in the direction of positive deflection
    pub fz: f64,
}

impl NodeLoad {
    /// Create a new node load
    pub fn new(node: usize, fz: f64) -> Self {
        Self { node, fz }
    }
}
