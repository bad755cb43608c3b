//! Quad element - 4-node plate bending element connectivity

use serde::{Deserialize, Serialize};

/// A 4-node quadrilateral plate element
///
/// Nodes are listed counter-clockwise (i, j, m, n). Curvature signs depend
/// on this winding, so clockwise elements are rejected by the element kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    /// Element id, equal to its index in the mesh
    pub id: usize,
    /// Corner node ids in counter-clockwise order
    pub nodes: [usize; 4],
}

impl Quad {
    /// Create a new quad element
    pub fn new(id: usize, nodes: [usize; 4]) -> Self {
        Self { id, nodes }
    }

    /// Local corner index (0..4) of a node
    pub fn corner_of(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_lookup() {
        let q = Quad::new(0, [0, 4, 5, 1]);
        assert_eq!(q.corner_of(5), Some(2));
        assert_eq!(q.corner_of(7), None);
    }
}
