//! Sparse matrix utilities for plate stiffness systems
//!
//! Plate stiffness matrices are banded: with the structured node numbering
//! a node only couples to its 8 neighbours, so the profile (skyline) of the
//! matrix is narrow and a profile Cholesky factorization stays cheap.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::error::{FEAError, FEAResult, SingularityReport};

/// Triplet accumulator for a square stiffness matrix
///
/// Entries pushed at the same position are summed when converting to CSR,
/// so element blocks can be scattered without a lookup.
pub struct SparseMatrixBuilder {
    coo: CooMatrix<f64>,
}

impl SparseMatrixBuilder {
    pub fn new(size: usize) -> Self {
        Self { coo: CooMatrix::new(size, size) }
    }

    /// Accumulate `value` at `(row, col)`; explicit zeros are skipped
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.coo.push(row, col, value);
        }
    }

    /// Scatter an element block, where local row `i` maps to global DOF `dofs[i]`
    pub fn add_element_matrix(&mut self, dofs: &[usize], ke: &DMatrix<f64>) {
        for (j, &gj) in dofs.iter().enumerate() {
            for (i, &gi) in dofs.iter().enumerate() {
                self.add(gi, gj, ke[(i, j)]);
            }
        }
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        CsrMatrix::from(&self.coo)
    }
}

/// Dense copy of a CSR matrix, for eigen-analysis of small systems
pub fn to_dense(k: &CsrMatrix<f64>) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(k.nrows(), k.ncols());
    for (r, c, &v) in k.triplet_iter() {
        m[(r, c)] += v;
    }
    m
}

/// Dense copy of the rows and columns `keep` of a CSR matrix
pub fn dense_submatrix(k: &CsrMatrix<f64>, keep: &[usize]) -> DMatrix<f64> {
    let mut index = vec![None; k.nrows()];
    for (i, &g) in keep.iter().enumerate() {
        index[g] = Some(i);
    }
    let mut m = DMatrix::zeros(keep.len(), keep.len());
    for (r, c, &v) in k.triplet_iter() {
        if let (Some(i), Some(j)) = (index[r], index[c]) {
            m[(i, j)] += v;
        }
    }
    m
}

/// Profile (skyline) Cholesky factorization `K = L Lᵗ`
///
/// Row `i` of `L` is stored from its first structural non-zero up to the
/// diagonal. A pivot that falls below `pivot_tolerance` times the original
/// diagonal is reported as a singular system at that equation.
pub struct SkylineCholesky {
    size: usize,
    // Skyline storage: for each row, from first non-zero to the diagonal
    skyline: Vec<Vec<f64>>,
    // Row heights (distance from diagonal to first non-zero on the left)
    heights: Vec<usize>,
    factorized: bool,
}

impl SkylineCholesky {
    /// Copy the lower triangle of a symmetric CSR matrix into skyline storage
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _val) in csr.triplet_iter() {
            if col < row {
                heights[row] = heights[row].max(row - col);
            }
        }

        let mut skyline: Vec<Vec<f64>> = heights.iter().map(|&h| vec![0.0; h + 1]).collect();

        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                let idx = col - (row - heights[row]);
                skyline[row][idx] += val;
            }
        }

        Self { size, skyline, heights, factorized: false }
    }

    /// Number of stored profile entries
    pub fn profile_size(&self) -> usize {
        self.skyline.iter().map(Vec::len).sum()
    }

    /// Factorize in place
    pub fn factorize(&mut self, pivot_tolerance: f64) -> FEAResult<()> {
        for i in 0..self.size {
            let hi = self.heights[i];
            let start_i = i - hi;
            let original_diag = self.skyline[i][hi];

            // L[i,j] for j < i
            for j in start_i..i {
                let hj = self.heights[j];
                let start_j = j - hj;
                let start = start_i.max(start_j);

                let mut sum = 0.0;
                for k in start..j {
                    sum += self.skyline[i][k - start_i] * self.skyline[j][k - start_j];
                }

                let idx = j - start_i;
                self.skyline[i][idx] = (self.skyline[i][idx] - sum) / self.skyline[j][hj];
            }

            // L[i,i]
            let sum: f64 = self.skyline[i][..hi].iter().map(|v| v * v).sum();
            let pivot = original_diag - sum;
            if !pivot.is_finite() || pivot <= pivot_tolerance * original_diag.abs() {
                return Err(FEAError::SingularSystem(Box::new(SingularityReport::new(
                    i,
                    pivot,
                    original_diag,
                ))));
            }
            self.skyline[i][hi] = pivot.sqrt();
        }

        self.factorized = true;
        Ok(())
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        let start = row - self.heights[row];
        if col < start {
            return 0.0;
        }
        self.skyline[row][col - start]
    }

    /// Diagonal of `L` after factorization
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.size).map(|i| self.get(i, i)).collect()
    }

    /// Pivot-based condition estimate `(max L_ii / min L_ii)²`
    pub fn condition_estimate(&self) -> f64 {
        let diag = self.diagonal();
        let max = diag.iter().cloned().fold(0.0_f64, f64::max);
        let min = diag.iter().cloned().fold(f64::INFINITY, f64::min);
        if min > 0.0 {
            (max / min).powi(2)
        } else {
            f64::INFINITY
        }
    }

    /// Solve `L Lᵗ x = b`
    pub fn solve(&self, b: &DVector<f64>) -> FEAResult<DVector<f64>> {
        if !self.factorized {
            return Err(FEAError::InvalidInput(
                "skyline solve called before factorization".to_string(),
            ));
        }
        let mut x = b.clone();

        // Forward substitution: L * y = b
        for i in 0..self.size {
            let start = i - self.heights[i];
            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }

        // Backward substitution: L^T * x = y
        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);
            let start = i - self.heights[i];
            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        Ok(x)
    }
}

/// Iteration count and final relative residual of a converged PCG solve
#[derive(Debug, Clone, Copy)]
pub struct PcgStats {
    pub iterations: usize,
    pub residual: f64,
}

/// Solve sparse linear system using Preconditioned Conjugate Gradient
///
/// Uses Jacobi (diagonal) preconditioner. Converged when
/// `‖r‖ ≤ tol · ‖b‖`.
pub fn solve_pcg(
    csr: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
) -> FEAResult<(DVector<f64>, PcgStats)> {
    let n = csr.nrows();

    let mut diag = DVector::zeros(n);
    for (row, col, &val) in csr.triplet_iter() {
        if row == col {
            diag[row] = val;
        }
    }
    if let Some(i) = diag.iter().position(|&d| d <= 0.0) {
        return Err(FEAError::SingularSystem(Box::new(SingularityReport::new(
            i, diag[i], diag[i],
        ))));
    }

    let b_norm = b.norm();
    let mut x = DVector::zeros(n);
    if b_norm == 0.0 {
        return Ok((x, PcgStats { iterations: 0, residual: 0.0 }));
    }

    let mut r = b.clone();
    let mut z = r.component_div(&diag);
    let mut p = z.clone();
    let mut r_dot_z = r.dot(&z);
    let mut residual = 1.0;

    for iter in 0..max_iter {
        let ap = sparse_matvec(csr, &p);
        let p_dot_ap = p.dot(&ap);

        if p_dot_ap <= 0.0 {
            // Direction of non-positive curvature: K is not positive definite
            return Err(FEAError::ConvergenceFailed { iterations: iter, residual });
        }

        let alpha = r_dot_z / p_dot_ap;

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        residual = r.norm() / b_norm;
        if residual <= tol {
            return Ok((x, PcgStats { iterations: iter + 1, residual }));
        }

        z = r.component_div(&diag);
        let r_dot_z_new = r.dot(&z);
        let beta = r_dot_z_new / r_dot_z;
        r_dot_z = r_dot_z_new;

        p = &z + beta * &p;
    }

    Err(FEAError::ConvergenceFailed { iterations: max_iter, residual })
}

/// `y = K x`
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        csr.nrows(),
        csr.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&c, v)| v * x[c])
                .sum::<f64>()
        }),
    )
}
