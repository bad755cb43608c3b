//! Analysis options and the serializable plate problem description

use serde::{Deserialize, Serialize};

use crate::assembly::AssemblyOptions;
use crate::boundary::BoundaryMethod;
use crate::elements::{EdgeSupports, Material};
use crate::error::{FEAError, FEAResult};
use crate::math::plate::PlateFormulation;
use crate::model::PlateModel;
use crate::navier::NavierSeries;
use crate::results::PlateSolution;
use crate::solver::SolverKind;

/// Largest system, in DOFs, on which eigen checks run when not set explicitly
pub const EIGEN_CHECK_LIMIT: usize = 200;

/// Options for a plate analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// How constrained DOFs are enforced
    pub boundary: BoundaryMethod,
    /// Linear solver
    pub solver: SolverKind,
    /// Gauss order override (None = formulation default)
    pub gauss_order: Option<usize>,
    /// Evaluate element kernels on the rayon pool
    pub parallel: bool,
    /// Negative-eigenvalue checks of the element and assembled stiffness;
    /// `None` runs them on systems of at most [`EIGEN_CHECK_LIMIT`] DOFs
    pub eigen_checks: Option<bool>,
    /// Check vertical equilibrium of the reactions after the solve
    pub check_statics: bool,
    /// Smallest accepted Cholesky pivot relative to its original diagonal
    pub pivot_tolerance: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            boundary: BoundaryMethod::Elimination,
            solver: SolverKind::Skyline,
            gauss_order: None,
            parallel: true,
            eigen_checks: None,
            check_statics: true,
            pivot_tolerance: 1e-10,
        }
    }
}

impl AnalysisOptions {
    /// Enforce constraints by penalty with the given stiffness
    pub fn with_penalty(mut self, stiffness: f64) -> Self {
        self.boundary = BoundaryMethod::Penalty { stiffness };
        self
    }

    pub fn with_boundary(mut self, method: BoundaryMethod) -> Self {
        self.boundary = method;
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Set the Gauss order per direction
    pub fn with_gauss_order(mut self, order: usize) -> Self {
        self.gauss_order = Some(order);
        self
    }

    /// Evaluate elements on the calling thread
    pub fn serial(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Force the eigen checks on or off regardless of system size
    pub fn with_eigen_checks(mut self, enabled: bool) -> Self {
        self.eigen_checks = Some(enabled);
        self
    }

    pub fn with_pivot_tolerance(mut self, tol: f64) -> Self {
        self.pivot_tolerance = tol;
        self
    }

    /// Skip the equilibrium check
    pub fn without_statics_check(mut self) -> Self {
        self.check_statics = false;
        self
    }

    pub(crate) fn assembly(&self, n_dofs: usize) -> AssemblyOptions {
        AssemblyOptions {
            parallel: self.parallel,
            gauss_order: self.gauss_order,
            eigen_checks: self.eigen_checks.unwrap_or(n_dofs <= EIGEN_CHECK_LIMIT),
        }
    }
}

/// A rectangular plate problem on a regular mesh
///
/// Units are the caller's, as long as they are consistent (kN and m in the
/// default problem).
///
/// ```
/// use plate_solver::analysis::PlateProblem;
///
/// let problem = PlateProblem::from_json(r#"{ "nx": 4, "ny": 2, "formulation": "Dkq" }"#).unwrap();
/// assert_eq!(problem.width, 6.0);
/// assert_eq!(problem.nx, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateProblem {
    /// Span along x
    pub width: f64,
    /// Span along y
    pub height: f64,
    pub thickness: f64,
    /// Young's modulus
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Uniform pressure
    pub pressure: f64,
    pub nx: usize,
    pub ny: usize,
    pub formulation: PlateFormulation,
    pub supports: EdgeSupports,
}

impl Default for PlateProblem {
    /// 6 m × 4 m concrete slab, 100 mm thick, 10 kN/m², simply supported
    fn default() -> Self {
        Self {
            width: 6.0,
            height: 4.0,
            thickness: 0.1,
            e: 35000e3,
            nu: 0.15,
            pressure: 10.0,
            nx: 6,
            ny: 4,
            formulation: PlateFormulation::default(),
            supports: EdgeSupports::default(),
        }
    }
}

impl PlateProblem {
    /// Parse a problem from JSON; missing fields take the default values
    pub fn from_json(json: &str) -> FEAResult<Self> {
        let problem: PlateProblem = serde_json::from_str(json)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn to_json(&self) -> FEAResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> FEAResult<()> {
        self.material().validate()?;
        if !self.pressure.is_finite() {
            return Err(FEAError::InvalidInput(format!(
                "pressure must be finite, got {}",
                self.pressure
            )));
        }
        if self.nx == 0 || self.ny == 0 {
            return Err(FEAError::InvalidInput(format!(
                "mesh divisions must be positive, got {}x{}",
                self.nx, self.ny
            )));
        }
        Ok(())
    }

    pub fn material(&self) -> Material {
        Material::new(self.e, self.nu, self.thickness)
    }

    /// Build the finite element model
    pub fn to_model(&self) -> FEAResult<PlateModel> {
        self.validate()?;
        Ok(PlateModel::rectangular(
            self.width,
            self.height,
            self.nx,
            self.ny,
            self.material(),
            self.formulation,
        )?
        .with_pressure(self.pressure)
        .with_supports(self.supports))
    }

    /// Build and analyze the model
    pub fn solve(&self, options: &AnalysisOptions) -> FEAResult<PlateSolution> {
        self.to_model()?.analyze(options)
    }

    /// Closed-form reference for the same plate, simply supported on all edges
    pub fn navier(&self) -> FEAResult<NavierSeries> {
        NavierSeries::new(self.width, self.height, &self.material())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::EdgeSupport;

    #[test]
    fn test_options_builders() {
        let opts = AnalysisOptions::default()
            .with_penalty(1e18)
            .with_gauss_order(3)
            .serial()
            .with_pivot_tolerance(1e-12)
            .without_statics_check();
        assert_eq!(opts.boundary, BoundaryMethod::Penalty { stiffness: 1e18 });
        assert_eq!(opts.pivot_tolerance, 1e-12);
        let asm = opts.assembly(100);
        assert_eq!(asm.gauss_order, Some(3));
        assert!(!asm.parallel);
        assert!(!opts.check_statics);
    }

    #[test]
    fn test_eigen_checks_follow_system_size() {
        let auto = AnalysisOptions::default();
        assert!(auto.assembly(EIGEN_CHECK_LIMIT).eigen_checks);
        assert!(!auto.assembly(EIGEN_CHECK_LIMIT + 1).eigen_checks);
        assert!(auto.clone().with_eigen_checks(true).assembly(10_000).eigen_checks);
        assert!(!auto.with_eigen_checks(false).assembly(4).eigen_checks);
    }

    #[test]
    fn test_problem_json() {
        let json = r#"{
            "width": 5.0, "height": 5.0, "nx": 4, "ny": 4,
            "formulation": "Dkq",
            "supports": { "bottom": "Clamped", "right": "SimplySupported",
                          "top": "Free", "left": "SimplySupported" }
        }"#;
        let p = PlateProblem::from_json(json).unwrap();
        assert_eq!(p.formulation, PlateFormulation::Dkq);
        assert_eq!(p.supports.bottom, EdgeSupport::Clamped);
        assert_eq!(p.supports.top, EdgeSupport::Free);
        assert_eq!(p.thickness, 0.1);
        let back = PlateProblem::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_problem_rejects_bad_input() {
        assert!(matches!(
            PlateProblem::from_json("{ \"nu\": 0.6 }"),
            Err(FEAError::InvalidMaterial(_))
        ));
        assert!(matches!(PlateProblem::from_json("{ \"nx\": 0 }"), Err(FEAError::InvalidInput(_))));
        assert!(matches!(PlateProblem::from_json("{ nx: 1 }"), Err(FEAError::Serialization(_))));
    }
}
