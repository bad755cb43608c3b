//! Plate meshes
//!
//! A [`Mesh`] stores nodes and counter-clockwise quad connectivity together
//! with the derived boundary classification and node→element adjacency.
//! [`MeshBuilder`] generates structured rectangular meshes with the
//! numbering
//!
//! ```text
//! node    = ix * (ny + 1) + iy
//! element = ix * ny + iy
//! quad    = [n(ix, iy), n(ix+1, iy), n(ix+1, iy+1), n(ix, iy+1)]
//! ```

use serde::{Deserialize, Serialize};

use crate::elements::{Node, Quad};
use crate::error::{FEAError, FEAResult};

/// One of the four edges of a rectangular plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateEdge {
    /// y = y_min
    Bottom,
    /// x = x_max
    Right,
    /// y = y_max
    Top,
    /// x = x_min
    Left,
}

impl PlateEdge {
    pub const ALL: [PlateEdge; 4] = [PlateEdge::Bottom, PlateEdge::Right, PlateEdge::Top, PlateEdge::Left];

    /// Whether the edge runs along the x axis
    pub fn is_parallel_to_x(&self) -> bool {
        matches!(self, PlateEdge::Bottom | PlateEdge::Top)
    }

    fn index(&self) -> usize {
        match self {
            PlateEdge::Bottom => 0,
            PlateEdge::Right => 1,
            PlateEdge::Top => 2,
            PlateEdge::Left => 3,
        }
    }
}

/// Division counts of a structured mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divisions {
    pub nx: usize,
    pub ny: usize,
}

/// A quadrilateral plate mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Node>,
    elements: Vec<Quad>,
    /// Nodes on each plate edge, ascending, indexed by `PlateEdge::index`
    boundary: [Vec<usize>; 4],
    /// Elements touching each node
    adjacency: Vec<Vec<usize>>,
    bbox: ([f64; 2], [f64; 2]),
    divisions: Option<Divisions>,
}

impl Mesh {
    /// Build a mesh from explicit nodes and elements
    ///
    /// Ids must equal positions. Boundary nodes are those on the bounding box.
    pub fn from_parts(nodes: Vec<Node>, elements: Vec<Quad>) -> FEAResult<Self> {
        if nodes.is_empty() || elements.is_empty() {
            return Err(FEAError::InvalidInput(
                "mesh needs at least one node and one element".to_string(),
            ));
        }
        for (i, node) in nodes.iter().enumerate() {
            if node.id != i {
                return Err(FEAError::InvalidInput(format!(
                    "node at position {i} has id {}",
                    node.id
                )));
            }
            if !(node.x.is_finite() && node.y.is_finite()) {
                return Err(FEAError::InvalidGeometry(format!("node {i} has non-finite coordinates")));
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (e, quad) in elements.iter().enumerate() {
            if quad.id != e {
                return Err(FEAError::InvalidInput(format!(
                    "element at position {e} has id {}",
                    quad.id
                )));
            }
            for &n in &quad.nodes {
                if n >= nodes.len() {
                    return Err(FEAError::AssemblyInconsistency(format!(
                        "element {e} references node {n}, mesh has {} nodes",
                        nodes.len()
                    )));
                }
            }
            for i in 0..4 {
                if quad.nodes[(i + 1)..].contains(&quad.nodes[i]) {
                    return Err(FEAError::InvalidGeometry(format!(
                        "element {e} repeats node {}",
                        quad.nodes[i]
                    )));
                }
            }
            for &n in &quad.nodes {
                adjacency[n].push(e);
            }
        }

        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for node in &nodes {
            min[0] = min[0].min(node.x);
            min[1] = min[1].min(node.y);
            max[0] = max[0].max(node.x);
            max[1] = max[1].max(node.y);
        }

        let tol = 1e-9 * (max[0] - min[0]).max(max[1] - min[1]).max(f64::MIN_POSITIVE);
        let mut boundary: [Vec<usize>; 4] = Default::default();
        for node in &nodes {
            if (node.y - min[1]).abs() <= tol {
                boundary[PlateEdge::Bottom.index()].push(node.id);
            }
            if (node.x - max[0]).abs() <= tol {
                boundary[PlateEdge::Right.index()].push(node.id);
            }
            if (node.y - max[1]).abs() <= tol {
                boundary[PlateEdge::Top.index()].push(node.id);
            }
            if (node.x - min[0]).abs() <= tol {
                boundary[PlateEdge::Left.index()].push(node.id);
            }
        }

        Ok(Self {
            nodes,
            elements,
            boundary,
            adjacency,
            bbox: (min, max),
            divisions: None,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Quad] {
        &self.elements
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Get a node by id
    pub fn node(&self, id: usize) -> FEAResult<&Node> {
        self.nodes.get(id).ok_or(FEAError::NodeNotFound(id))
    }

    /// Get an element by id
    pub fn element(&self, id: usize) -> FEAResult<&Quad> {
        self.elements.get(id).ok_or(FEAError::ElementNotFound(id))
    }

    /// Corner coordinates of an element in node order
    pub fn element_coords(&self, quad: &Quad) -> [[f64; 2]; 4] {
        quad.nodes.map(|n| self.nodes[n].coords())
    }

    /// Nodes on a plate edge, ascending
    pub fn boundary_nodes(&self, edge: PlateEdge) -> &[usize] {
        &self.boundary[edge.index()]
    }

    /// Plate edges a node lies on (two for a corner)
    pub fn node_edges(&self, node: usize) -> Vec<PlateEdge> {
        PlateEdge::ALL
            .into_iter()
            .filter(|e| self.boundary[e.index()].binary_search(&node).is_ok())
            .collect()
    }

    /// Whether a node lies on any plate edge
    pub fn is_boundary(&self, node: usize) -> bool {
        !self.node_edges(node).is_empty()
    }

    /// Elements sharing a node
    pub fn node_elements(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lower-left and upper-right corners of the bounding box
    pub fn bounding_box(&self) -> ([f64; 2], [f64; 2]) {
        self.bbox
    }

    /// Node closest to a point
    pub fn nearest_node(&self, x: f64, y: f64) -> usize {
        let probe = Node::new(usize::MAX, x, y);
        self.nodes
            .iter()
            .min_by(|a, b| a.distance_to(&probe).total_cmp(&b.distance_to(&probe)))
            .map_or(0, |n| n.id)
    }

    /// Node at grid position `(ix, iy)` of a structured mesh
    pub fn grid_node(&self, ix: usize, iy: usize) -> Option<usize> {
        let d = self.divisions?;
        (ix <= d.nx && iy <= d.ny).then(|| ix * (d.ny + 1) + iy)
    }

    /// Plate area as the sum of element areas (shoelace formula)
    pub fn area(&self) -> f64 {
        self.elements
            .iter()
            .map(|q| {
                let c = self.element_coords(q);
                0.5 * (0..4)
                    .map(|i| c[i][0] * c[(i + 1) % 4][1] - c[(i + 1) % 4][0] * c[i][1])
                    .sum::<f64>()
            })
            .sum()
    }
}

/// Builder for structured rectangular meshes
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    width: f64,
    height: f64,
    nx: usize,
    ny: usize,
}

impl MeshBuilder {
    /// Plate of span `width` (along x) by `height` (along y), one element
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            nx: 1,
            ny: 1,
        }
    }

    /// Number of elements along x and y
    pub fn divisions(mut self, nx: usize, ny: usize) -> Self {
        self.nx = nx;
        self.ny = ny;
        self
    }

    /// Generate the mesh
    pub fn build(&self) -> FEAResult<Mesh> {
        if !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0 {
            return Err(FEAError::InvalidGeometry(format!(
                "plate span must be positive, got {} x {}",
                self.width, self.height
            )));
        }
        if self.nx < 1 || self.ny < 1 {
            return Err(FEAError::InvalidInput(format!(
                "mesh divisions must be at least 1, got {} x {}",
                self.nx, self.ny
            )));
        }

        let (nx, ny) = (self.nx, self.ny);
        let node_id = |ix: usize, iy: usize| ix * (ny + 1) + iy;

        let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
        for ix in 0..=nx {
            for iy in 0..=ny {
                let x = self.width * ix as f64 / nx as f64;
                let y = self.height * iy as f64 / ny as f64;
                nodes.push(Node::new(node_id(ix, iy), x, y));
            }
        }

        let mut elements = Vec::with_capacity(nx * ny);
        for ix in 0..nx {
            for iy in 0..ny {
                elements.push(Quad::new(
                    ix * ny + iy,
                    [
                        node_id(ix, iy),
                        node_id(ix + 1, iy),
                        node_id(ix + 1, iy + 1),
                        node_id(ix, iy + 1),
                    ],
                ));
            }
        }

        let mut mesh = Mesh::from_parts(nodes, elements)?;
        mesh.divisions = Some(Divisions { nx, ny });
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_structured_numbering() {
        let mesh = MeshBuilder::new(6.0, 4.0).divisions(3, 2).build().unwrap();
        assert_eq!(mesh.n_nodes(), 12);
        assert_eq!(mesh.n_elements(), 6);

        // node = ix * (ny + 1) + iy
        let n5 = mesh.node(5).unwrap();
        assert_relative_eq!(n5.x, 2.0);
        assert_relative_eq!(n5.y, 4.0);

        // element = ix * ny + iy, counter-clockwise connectivity
        let e3 = mesh.element(3).unwrap();
        assert_eq!(e3.nodes, [4, 7, 8, 5]);
        assert_eq!(mesh.grid_node(3, 2), Some(11));
        assert_eq!(mesh.grid_node(4, 0), None);
        assert_relative_eq!(mesh.area(), 24.0, epsilon = 1e-12);
        assert_eq!(mesh.bounding_box(), ([0.0, 0.0], [6.0, 4.0]));
    }

    #[test]
    fn test_boundary_classification() {
        let mesh = MeshBuilder::new(6.0, 4.0).divisions(3, 2).build().unwrap();
        assert_eq!(mesh.boundary_nodes(PlateEdge::Bottom), &[0, 3, 6, 9]);
        assert_eq!(mesh.boundary_nodes(PlateEdge::Top), &[2, 5, 8, 11]);
        assert_eq!(mesh.boundary_nodes(PlateEdge::Left), &[0, 1, 2]);
        assert_eq!(mesh.boundary_nodes(PlateEdge::Right), &[9, 10, 11]);
        assert_eq!(mesh.node_edges(0), vec![PlateEdge::Bottom, PlateEdge::Left]);
        assert!(!mesh.is_boundary(4));
        assert!(mesh.is_boundary(10));
    }

    #[test]
    fn test_adjacency_and_lookup() {
        let mesh = MeshBuilder::new(2.0, 2.0).divisions(2, 2).build().unwrap();
        assert_eq!(mesh.node_elements(4), &[0, 1, 2, 3]);
        assert_eq!(mesh.node_elements(0), &[0]);
        assert_eq!(mesh.nearest_node(1.1, 0.9), 4);
        assert!(matches!(mesh.node(99), Err(FEAError::NodeNotFound(99))));
        assert!(matches!(mesh.element(4), Err(FEAError::ElementNotFound(4))));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            MeshBuilder::new(1.0, 1.0).divisions(0, 2).build(),
            Err(FEAError::InvalidInput(_))
        ));
        assert!(matches!(
            MeshBuilder::new(-1.0, 1.0).build(),
            Err(FEAError::InvalidGeometry(_))
        ));

        let nodes = vec![Node::new(0, 0.0, 0.0), Node::new(1, 1.0, 0.0), Node::new(2, 1.0, 1.0)];
        let r = Mesh::from_parts(nodes, vec![Quad::new(0, [0, 1, 2, 3])]);
        assert!(matches!(r, Err(FEAError::AssemblyInconsistency(_))));
    }
}
