//! Plate Solver - finite element analysis of thin plates in bending
//!
//! Kirchhoff plate bending on quadrilateral meshes, with two element families:
//! - Hermite: the C¹ bicubic rectangle (Bogner-Fox-Schmit), 16 DOFs
//! - DKQ: the Discrete Kirchhoff Quadrilateral (Batoz & Tahar), 12 DOFs
//!
//! Element matrices are integrated by Gauss quadrature in parallel, assembled
//! into a sparse global system, constrained by elimination or penalty, solved
//! by Cholesky or preconditioned CG, and post-processed into bending moments.
//! A Navier series solution is included for validation.
//!
//! ## Example
//! ```rust
//! use plate_solver::prelude::*;
//!
//! // 6 m x 4 m slab, 100 mm thick, E = 35 000 MPa, 10 kN/m², simply supported
//! let model = PlateModel::rectangular(
//!     6.0, 4.0, 6, 4,
//!     Material::new(35000e3, 0.15, 0.1),
//!     PlateFormulation::Hermite,
//! )
//! .unwrap()
//! .with_pressure(10.0);
//!
//! let solution = model.analyze(&AnalysisOptions::default()).unwrap();
//!
//! let center = model.mesh().nearest_node(3.0, 2.0);
//! let w_mm = solution.deflection_mm(center).unwrap();
//! assert!(w_mm > 6.0 && w_mm < 7.5);
//! ```

pub mod analysis;
pub mod assembly;
pub mod boundary;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod mesh;
pub mod model;
pub mod navier;
pub mod recovery;
pub mod results;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, PlateProblem};
    pub use crate::boundary::BoundaryMethod;
    pub use crate::elements::{
        BoundaryCondition, DofConstraint, EdgeSupport, EdgeSupports, Material, Node, Quad,
    };
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::loads::{NodeLoad, PlateLoad};
    pub use crate::math::plate::PlateFormulation;
    pub use crate::mesh::{Mesh, MeshBuilder, PlateEdge};
    pub use crate::model::PlateModel;
    pub use crate::navier::NavierSeries;
    pub use crate::results::{NodeDisplacement, PlateMoments, PlateSolution};
    pub use crate::solver::SolverKind;
}
