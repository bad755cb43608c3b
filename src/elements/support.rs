//! Support conditions
//!
//! Supports are described per plate edge and expanded to nodal DOF
//! constraints by the boundary applicator. Local DOF 0 is the deflection `w`,
//! local DOF 1 the x-slope and local DOF 2 the y-slope in both formulations
//! (the Hermite element carries the twist as local DOF 3).

use serde::{Deserialize, Serialize};

use crate::mesh::PlateEdge;

/// Local DOF index of the deflection
pub const DOF_W: usize = 0;
/// Local DOF index of the x-slope
pub const DOF_SLOPE_X: usize = 1;
/// Local DOF index of the y-slope
pub const DOF_SLOPE_Y: usize = 2;
/// Local DOF index of the Hermite twist
pub const DOF_TWIST: usize = 3;

/// Support type along one plate edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeSupport {
    /// No restraint
    Free,
    /// `w = 0` and the slope along the edge vanishes; the normal slope is free
    #[default]
    SimplySupported,
    /// `w = 0` only
    SoftSimplySupported,
    /// `w = 0` and both slopes vanish (and the twist for Hermite elements)
    Clamped,
}

impl EdgeSupport {
    /// Local DOFs restrained on a node lying on `edge`
    ///
    /// `dofs_per_node` is 4 for Hermite and 3 for DKQ.
    pub fn restrained_dofs(&self, edge: PlateEdge, dofs_per_node: usize) -> Vec<usize> {
        match self {
            EdgeSupport::Free => Vec::new(),
            EdgeSupport::SoftSimplySupported => vec![DOF_W],
            EdgeSupport::SimplySupported => {
                let tangential = if edge.is_parallel_to_x() {
                    DOF_SLOPE_X
                } else {
                    DOF_SLOPE_Y
                };
                vec![DOF_W, tangential]
            }
            EdgeSupport::Clamped => {
                let mut dofs = vec![DOF_W, DOF_SLOPE_X, DOF_SLOPE_Y];
                if dofs_per_node > DOF_TWIST {
                    dofs.push(DOF_TWIST);
                }
                dofs
            }
        }
    }

    /// Check if the edge carries any restraint
    pub fn is_supported(&self) -> bool {
        !matches!(self, EdgeSupport::Free)
    }
}

/// Supports on the four edges of a rectangular plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSupports {
    /// Edge y = 0
    pub bottom: EdgeSupport,
    /// Edge x = a
    pub right: EdgeSupport,
    /// Edge y = b
    pub top: EdgeSupport,
    /// Edge x = 0
    pub left: EdgeSupport,
}

impl EdgeSupports {
    /// Same support on all four edges
    pub fn all(support: EdgeSupport) -> Self {
        Self {
            bottom: support,
            right: support,
            top: support,
            left: support,
        }
    }

    /// All edges simply supported
    pub fn simply_supported() -> Self {
        Self::all(EdgeSupport::SimplySupported)
    }

    /// All edges clamped
    pub fn clamped() -> Self {
        Self::all(EdgeSupport::Clamped)
    }

    /// Unsupported plate
    pub fn free() -> Self {
        Self::all(EdgeSupport::Free)
    }

    /// Set the support on a single edge
    pub fn with_edge(mut self, edge: PlateEdge, support: EdgeSupport) -> Self {
        match edge {
            PlateEdge::Bottom => self.bottom = support,
            PlateEdge::Right => self.right = support,
            PlateEdge::Top => self.top = support,
            PlateEdge::Left => self.left = support,
        }
        self
    }

    /// Support on a given edge
    pub fn on(&self, edge: PlateEdge) -> EdgeSupport {
        match edge {
            PlateEdge::Bottom => self.bottom,
            PlateEdge::Right => self.right,
            PlateEdge::Top => self.top,
            PlateEdge::Left => self.left,
        }
    }
}

impl Default for EdgeSupports {
    fn default() -> Self {
        Self::simply_supported()
    }
}

/// What a boundary condition does to its DOF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DofConstraint {
    /// Explicitly left free (overrides nothing, kept for completeness of input)
    Free,
    /// Held at zero
    Fixed,
    /// Held at a prescribed value
    Prescribed(f64),
}

impl DofConstraint {
    /// Value the DOF is held at, if constrained
    pub fn value(&self) -> Option<f64> {
        match self {
            DofConstraint::Free => None,
            DofConstraint::Fixed => Some(0.0),
            DofConstraint::Prescribed(v) => Some(*v),
        }
    }
}

/// A constraint on one nodal DOF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    /// Node id
    pub node: usize,
    /// Local DOF index at the node
    pub dof: usize,
    /// Constraint kind
    pub kind: DofConstraint,
}

impl BoundaryCondition {
    /// Hold a DOF at zero
    pub fn fixed(node: usize, dof: usize) -> Self {
        Self { node, dof, kind: DofConstraint::Fixed }
    }

    /// Hold a DOF at a prescribed value
    pub fn prescribed(node: usize, dof: usize, value: f64) -> Self {
        Self { node, dof, kind: DofConstraint::Prescribed(value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simply_supported_restrains_tangential_slope() {
        let ss = EdgeSupport::SimplySupported;
        assert_eq!(ss.restrained_dofs(PlateEdge::Bottom, 3), vec![0, 1]);
        assert_eq!(ss.restrained_dofs(PlateEdge::Top, 4), vec![0, 1]);
        assert_eq!(ss.restrained_dofs(PlateEdge::Left, 3), vec![0, 2]);
        assert_eq!(ss.restrained_dofs(PlateEdge::Right, 4), vec![0, 2]);
    }

    #[test]
    fn test_clamped_includes_twist_for_hermite_only() {
        let c = EdgeSupport::Clamped;
        assert_eq!(c.restrained_dofs(PlateEdge::Bottom, 4), vec![0, 1, 2, 3]);
        assert_eq!(c.restrained_dofs(PlateEdge::Bottom, 3), vec![0, 1, 2]);
        assert!(EdgeSupport::Free.restrained_dofs(PlateEdge::Left, 4).is_empty());
        assert_eq!(
            EdgeSupport::SoftSimplySupported.restrained_dofs(PlateEdge::Left, 4),
            vec![0]
        );
    }

    #[test]
    fn test_edge_supports_builder() {
        let s = EdgeSupports::simply_supported().with_edge(PlateEdge::Left, EdgeSupport::Clamped);
        assert_eq!(s.on(PlateEdge::Left), EdgeSupport::Clamped);
        assert_eq!(s.on(PlateEdge::Top), EdgeSupport::SimplySupported);
        assert!(!EdgeSupports::free().on(PlateEdge::Bottom).is_supported());
    }

    #[test]
    fn test_constraint_values() {
        assert_eq!(BoundaryCondition::fixed(3, 0).kind.value(), Some(0.0));
        assert_eq!(BoundaryCondition::prescribed(3, 1, 0.5).kind.value(), Some(0.5));
        assert_eq!(DofConstraint::Free.value(), None);
    }
}
