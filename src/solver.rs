//! Linear solvers for the constrained stiffness system
//!
//! All three solvers expect a symmetric positive-definite matrix. A system
//! that is not (typically a plate with unrestrained rigid-body modes) is
//! reported as [`FEAError::SingularSystem`] instead of producing NaN or
//! huge displacements.

use log::{debug, warn};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult, SingularityReport};
use crate::math::{smallest_eigenvalues, solve_pcg, sparse_matvec, to_dense, SkylineCholesky};

/// Condition estimate above which a solved system is flagged as ill-conditioned
pub const CONDITION_WARNING: f64 = 1e12;

/// Largest system for which a failed factorization is followed by a dense
/// eigen-analysis for the error report
pub const DIAGNOSTIC_EIGEN_LIMIT: usize = 600;

/// Linear solver selection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// Profile Cholesky on the sparse matrix
    #[default]
    Skyline,
    /// Dense nalgebra Cholesky
    Dense,
    /// Jacobi-preconditioned conjugate gradient
    ConjugateGradient { tolerance: f64, max_iterations: usize },
}

impl SolverKind {
    /// CG with a relative residual tolerance and an iteration cap of `10 n`
    pub fn conjugate_gradient(tolerance: f64) -> Self {
        SolverKind::ConjugateGradient { tolerance, max_iterations: 0 }
    }
}

/// Diagnostics of a successful solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    pub solver: SolverKind,
    /// Number of equations solved
    pub equations: usize,
    /// `(max L_ii / min L_ii)²` for the direct solvers
    pub condition_estimate: Option<f64>,
    /// CG iterations
    pub iterations: Option<usize>,
    /// `‖K u − f‖ / ‖f‖`
    pub relative_residual: f64,
    /// Condition estimate exceeded [`CONDITION_WARNING`]
    pub ill_conditioned: bool,
}

/// Attach the smallest eigenvalues to a singular-system error, when affordable
fn with_eigen_context(err: FEAError, k: &CsrMatrix<f64>) -> FEAError {
    match err {
        FEAError::SingularSystem(mut report) if k.nrows() <= DIAGNOSTIC_EIGEN_LIMIT => {
            report.smallest_eigenvalues = smallest_eigenvalues(&to_dense(k), 4);
            FEAError::SingularSystem(report)
        }
        other => other,
    }
}

/// Solve `K u = f`
///
/// `pivot_tolerance` is relative to each equation's original diagonal.
pub fn solve(
    k: &CsrMatrix<f64>,
    f: &DVector<f64>,
    kind: SolverKind,
    pivot_tolerance: f64,
) -> FEAResult<(DVector<f64>, SolveDiagnostics)> {
    let n = k.nrows();
    if n != f.len() || n != k.ncols() {
        return Err(FEAError::AssemblyInconsistency(format!(
            "system is {}x{} with a load vector of {}",
            k.nrows(),
            k.ncols(),
            f.len()
        )));
    }
    if n == 0 {
        return Err(FEAError::NoFreeDofs);
    }

    let (u, condition_estimate, iterations) = match kind {
        SolverKind::Skyline => {
            let mut chol = SkylineCholesky::new(k);
            debug!("Skyline profile: {} entries for {} equations", chol.profile_size(), n);
            chol.factorize(pivot_tolerance)
                .map_err(|e| with_eigen_context(e, k))?;
            (chol.solve(f)?, Some(chol.condition_estimate()), None)
        }
        SolverKind::Dense => {
            let dense = to_dense(k);
            let Some(chol) = dense.clone().cholesky() else {
                let mut report = SingularityReport::new(0, f64::NAN, 0.0);
                // nalgebra does not expose the failing pivot; locate it from the eigenvector
                let eig = dense.clone().symmetric_eigen();
                let (imin, &lmin) = eig
                    .eigenvalues
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .ok_or(FEAError::NoFreeDofs)?;
                report.equation = eig.eigenvectors.column(imin).iamax();
                report.pivot = lmin;
                report.diagonal = dense[(report.equation, report.equation)];
                if n <= DIAGNOSTIC_EIGEN_LIMIT {
                    report.smallest_eigenvalues = smallest_eigenvalues(&dense, 4);
                }
                return Err(FEAError::SingularSystem(Box::new(report)));
            };
            let l_diag = chol.l_dirty().diagonal();
            if let Some(i) = (0..n).find(|&i| l_diag[i] * l_diag[i] <= pivot_tolerance * dense[(i, i)].abs()) {
                let mut report = SingularityReport::new(i, l_diag[i] * l_diag[i], dense[(i, i)]);
                if n <= DIAGNOSTIC_EIGEN_LIMIT {
                    report.smallest_eigenvalues = smallest_eigenvalues(&dense, 4);
                }
                return Err(FEAError::SingularSystem(Box::new(report)));
            }
            let max = l_diag.max();
            let min = l_diag.min();
            let u = chol.solve(f);
            let cond = if min > 0.0 { (max / min).powi(2) } else { f64::INFINITY };
            (u, Some(cond), None)
        }
        SolverKind::ConjugateGradient { tolerance, max_iterations } => {
            let cap = if max_iterations == 0 { 10 * n } else { max_iterations };
            let (u, stats) = solve_pcg(k, f, tolerance, cap).map_err(|e| with_eigen_context(e, k))?;
            debug!("PCG converged in {} iterations (residual {:.3e})", stats.iterations, stats.residual);
            (u, None, Some(stats.iterations))
        }
    };

    if u.iter().any(|v| !v.is_finite()) {
        return Err(FEAError::SingularSystem(Box::new(SingularityReport::new(
            u.iter().position(|v| !v.is_finite()).unwrap_or(0),
            f64::NAN,
            0.0,
        ))));
    }

    let f_norm = f.norm();
    let residual = (sparse_matvec(k, &u) - f).norm();
    let relative_residual = if f_norm > 0.0 { residual / f_norm } else { residual };

    let ill_conditioned = condition_estimate.is_some_and(|c| c > CONDITION_WARNING);
    if ill_conditioned {
        warn!(
            "Stiffness matrix is ill-conditioned (estimate {:.3e}); check supports and penalty stiffness",
            condition_estimate.unwrap_or(f64::INFINITY)
        );
    }

    Ok((
        u,
        SolveDiagnostics {
            solver: kind,
            equations: n,
            condition_estimate,
            iterations,
            relative_residual,
            ill_conditioned,
        },
    ))
}
