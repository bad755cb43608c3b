//! Mathematical utilities for plate FEA calculations

pub mod gauss;
pub mod plate;
pub mod shape;
pub mod sparse;

use nalgebra::{DMatrix, Matrix3};

// Re-export sparse utilities
pub use sparse::{
    dense_submatrix, solve_pcg, sparse_matvec, to_dense, SkylineCholesky, SparseMatrixBuilder,
};

pub type Mat = DMatrix<f64>;
pub type Mat3 = Matrix3<f64>;

// Re-export plate functions
pub use plate::{
    curvature_matrix, element_matrices, negative_eigenvalue, physical_point, plate_load,
    plate_stiffness, ElementMatrices, PlateFormulation,
};

/// The `count` smallest eigenvalues of a symmetric matrix, ascending
pub fn smallest_eigenvalues(a: &Mat, count: usize) -> Vec<f64> {
    let mut eig: Vec<f64> = a.clone().symmetric_eigenvalues().iter().cloned().collect();
    eig.sort_by(|x, y| x.total_cmp(y));
    eig.truncate(count);
    eig
}

/// Number of eigenvalues with `|λ| < rel_tol · max |λ|`
#[cfg(test)]
pub(crate) fn count_zero_eigenvalues(a: &Mat, rel_tol: f64) -> usize {
    let eig = a.clone().symmetric_eigenvalues();
    let max = eig.amax();
    eig.iter().filter(|l| l.abs() < rel_tol * max).count()
}
