//! Load types

mod node_load;
mod plate_load;

pub use node_load::NodeLoad;
pub use plate_load::PlateLoad;
