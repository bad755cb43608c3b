//! Plate model building blocks

mod material;
mod node;
mod quad;
mod support;

pub use material::Material;
pub use node::Node;
pub use quad::Quad;
pub use support::{
    BoundaryCondition, DofConstraint, EdgeSupport, EdgeSupports, DOF_SLOPE_X, DOF_SLOPE_Y,
    DOF_TWIST, DOF_W,
};
