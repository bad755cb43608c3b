//! Plate surface loads

use serde::{Deserialize, Serialize};

/// A uniform pressure over the whole plate
///
/// Positive pressure acts in the direction of positive deflection `w`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateLoad {
    /// Pressure magnitude (force per unit area)
    pub pressure: f64,
}

impl PlateLoad {
    /// Create a new pressure load
    pub fn new(pressure: f64) -> Self {
        Self { pressure }
    }

    /// Total force over an area
    pub fn resultant(&self, area: f64) -> f64 {
        self.pressure * area
    }
}

impl Default for PlateLoad {
    fn default() -> Self {
        Self::new(0.0)
    }
}
