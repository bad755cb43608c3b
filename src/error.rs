//! Error types for the plate solver

use std::fmt;

use thiserror::Error;

/// Main error type for plate analysis
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Node {0} not found in mesh")]
    NodeNotFound(usize),

    #[error("Element {0} not found in mesh")]
    ElementNotFound(usize),

    #[error("Assembly inconsistency: {0}")]
    AssemblyInconsistency(String),

    #[error("Element {element} stiffness matrix is not symmetric (relative asymmetry {asymmetry:.3e})")]
    AsymmetricStiffness { element: usize, asymmetry: f64 },

    #[error("Singular stiffness matrix - {0}")]
    SingularSystem(Box<SingularityReport>),

    #[error("Iterative solver did not converge after {iterations} iterations (relative residual {residual:.3e})")]
    ConvergenceFailed { iterations: usize, residual: f64 },

    #[error("No free degrees of freedom - every DOF is constrained")]
    NoFreeDofs,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for plate analysis
pub type FEAResult<T> = Result<T, FEAError>;

/// Diagnostic context for a singular or non positive-definite system
#[derive(Debug, Clone, PartialEq)]
pub struct SingularityReport {
    /// Global equation (DOF) index where factorization broke down
    pub equation: usize,
    /// Node owning the equation, once mapped back through the DOF map
    pub node: Option<usize>,
    /// Name of the local DOF (e.g. "w", "dw/dx")
    pub dof_name: Option<&'static str>,
    /// Pivot encountered at the failing equation
    pub pivot: f64,
    /// Original diagonal entry of that equation
    pub diagonal: f64,
    /// Smallest eigenvalues of the reduced matrix, when it was small enough to compute them
    pub smallest_eigenvalues: Vec<f64>,
}

impl SingularityReport {
    pub fn new(equation: usize, pivot: f64, diagonal: f64) -> Self {
        Self {
            equation,
            node: None,
            dof_name: None,
            pivot,
            diagonal,
            smallest_eigenvalues: Vec::new(),
        }
    }
}

impl fmt::Display for SingularityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "breakdown at equation {}", self.equation)?;
        if let (Some(node), Some(dof)) = (self.node, self.dof_name) {
            write!(f, " (node {node}, {dof})")?;
        }
        write!(
            f,
            ", pivot {:.3e} against diagonal {:.3e}; check supports for unconstrained rigid-body modes",
            self.pivot, self.diagonal
        )?;
        if !self.smallest_eigenvalues.is_empty() {
            write!(f, "; smallest eigenvalues {:?}", self.smallest_eigenvalues)?;
        }
        Ok(())
    }
}
