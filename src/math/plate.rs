//! Plate bending element kernels
//!
//! References:
//! - Bogner, Fox, Schmit (1965), conforming bicubic rectangle
//! - Batoz & Ben Tahar (1982), Discrete Kirchhoff Quadrilateral
//!
//! Both families are pure Kirchhoff plates with curvature vector
//! `κ = [∂²w/∂x², ∂²w/∂y², 2∂²w/∂x∂y]`, so that `Ke = ∫ Bᵗ D B dA` and
//! moments follow as `M = −D κ`.
//!
//! Available formulations:
//! - **Hermite**: 16 DOF, axis-aligned rectangles, C¹ conforming
//! - **DKQ**: 12 DOF, any strictly convex quadrilateral

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::gauss::{gauss_2d, Interval, MAX_ORDER};
use super::shape::{dkq, hermite};
use super::Mat3;
use crate::elements::Material;
use crate::error::{FEAError, FEAResult};

/// Relative asymmetry above which an element matrix is rejected
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Plate bending element family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlateFormulation {
    /// Bicubic Hermite rectangle, nodal DOFs `[w, ∂w/∂x, ∂w/∂y, ∂²w/∂x∂y]`
    #[default]
    Hermite,
    /// Discrete Kirchhoff Quadrilateral, nodal DOFs `[w, βx, βy]`
    /// with `βx = −∂w/∂x`, `βy = −∂w/∂y`
    Dkq,
}

impl PlateFormulation {
    /// Unknowns per node
    pub fn dofs_per_node(&self) -> usize {
        match self {
            PlateFormulation::Hermite => 4,
            PlateFormulation::Dkq => 3,
        }
    }

    /// Unknowns per element
    pub fn element_dofs(&self) -> usize {
        4 * self.dofs_per_node()
    }

    /// Parametric interval of each element coordinate
    pub fn interval(&self) -> Interval {
        match self {
            PlateFormulation::Hermite => Interval::Unit,
            PlateFormulation::Dkq => Interval::Symmetric,
        }
    }

    /// Parametric coordinates of the element center
    pub fn center(&self) -> (f64, f64) {
        match self {
            PlateFormulation::Hermite => (0.5, 0.5),
            PlateFormulation::Dkq => (0.0, 0.0),
        }
    }

    /// Parametric coordinates of the 4 corners, in node order
    pub fn corners(&self) -> [(f64, f64); 4] {
        match self {
            PlateFormulation::Hermite => [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            PlateFormulation::Dkq => dkq::CORNERS,
        }
    }

    /// Gauss order used when none is requested
    pub fn default_gauss_order(&self) -> usize {
        match self {
            PlateFormulation::Hermite => 4,
            PlateFormulation::Dkq => 2,
        }
    }

    /// Names of the nodal DOFs, for diagnostics
    pub fn dof_names(&self) -> &'static [&'static str] {
        match self {
            PlateFormulation::Hermite => &["w", "dw/dx", "dw/dy", "d2w/dxdy"],
            PlateFormulation::Dkq => &["w", "beta_x", "beta_y"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlateFormulation::Hermite => "Hermite",
            PlateFormulation::Dkq => "DKQ",
        }
    }
}

/// Stiffness matrix and consistent load vector of one element
#[derive(Debug, Clone)]
pub struct ElementMatrices {
    pub stiffness: DMatrix<f64>,
    pub load: DVector<f64>,
}

/// Check that corner coordinates form a valid element of the given family
///
/// Hermite elements must be axis-aligned rectangles with positive size;
/// DKQ elements must be strictly convex and counter-clockwise.
pub fn validate_geometry(
    formulation: PlateFormulation,
    element: usize,
    coords: &[[f64; 2]; 4],
) -> FEAResult<()> {
    if coords.iter().flatten().any(|v| !v.is_finite()) {
        return Err(FEAError::InvalidGeometry(format!(
            "element {element} has non-finite coordinates"
        )));
    }
    match formulation {
        PlateFormulation::Hermite => {
            let (a, b) = rectangle_size(coords);
            if a <= 0.0 || b <= 0.0 {
                return Err(FEAError::InvalidGeometry(format!(
                    "element {element} has non-positive size {a} x {b} (nodes must run counter-clockwise from the lower-left corner)"
                )));
            }
            let tol = 1e-9 * a.max(b);
            let [p0, p1, p2, p3] = *coords;
            let aligned = (p1[1] - p0[1]).abs() < tol
                && (p3[0] - p0[0]).abs() < tol
                && (p2[0] - p1[0]).abs() < tol
                && (p2[1] - p3[1]).abs() < tol;
            if !aligned {
                return Err(FEAError::InvalidGeometry(format!(
                    "Hermite element {element} is not an axis-aligned rectangle"
                )));
            }
        }
        PlateFormulation::Dkq => {
            let scale = coords
                .iter()
                .flat_map(|p| p.iter())
                .fold(0.0_f64, |m, v| m.max(v.abs()))
                .max(1.0);
            for i in 0..4 {
                let p0 = coords[i];
                let p1 = coords[(i + 1) % 4];
                let p2 = coords[(i + 2) % 4];
                let cross = (p1[0] - p0[0]) * (p2[1] - p1[1]) - (p1[1] - p0[1]) * (p2[0] - p1[0]);
                if cross <= 1e-12 * scale * scale {
                    return Err(FEAError::InvalidGeometry(format!(
                        "DKQ element {element} is degenerate, non-convex or clockwise at corner {}",
                        (i + 1) % 4
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Side lengths `(a, b)` of a Hermite rectangle
pub fn rectangle_size(coords: &[[f64; 2]; 4]) -> (f64, f64) {
    (coords[1][0] - coords[0][0], coords[3][1] - coords[0][1])
}

/// Physical position of a parametric point
pub fn physical_point(
    formulation: PlateFormulation,
    coords: &[[f64; 2]; 4],
    xi: f64,
    eta: f64,
) -> [f64; 2] {
    match formulation {
        PlateFormulation::Hermite => {
            let (a, b) = rectangle_size(coords);
            [coords[0][0] + xi * a, coords[0][1] + eta * b]
        }
        PlateFormulation::Dkq => {
            let n = dkq::bilinear(xi, eta);
            let mut p = [0.0; 2];
            for i in 0..4 {
                p[0] += n[i] * coords[i][0];
                p[1] += n[i] * coords[i][1];
            }
            p
        }
    }
}

/// Curvature-displacement matrix `B` (3 × element DOFs) at `(xi, eta)`
///
/// Rows are `∂²w/∂x²`, `∂²w/∂y²` and `2∂²w/∂x∂y`.
pub fn curvature_matrix(
    formulation: PlateFormulation,
    coords: &[[f64; 2]; 4],
    xi: f64,
    eta: f64,
) -> DMatrix<f64> {
    match formulation {
        PlateFormulation::Hermite => {
            let (a, b) = rectangle_size(coords);
            let rows = hermite::curvature_rows(xi, eta, a, b);
            DMatrix::from_fn(3, hermite::NUM_DOFS, |r, c| rows[r][c])
        }
        PlateFormulation::Dkq => {
            let (rows, _) = dkq_curvature_rows(coords, xi, eta);
            DMatrix::from_fn(3, dkq::NUM_DOFS, |r, c| rows[r][c])
        }
    }
}

/// DKQ curvature rows and the Jacobian determinant at `(xi, eta)`
///
/// `κ = −[βx,x ; βy,y ; βx,y + βy,x]`
fn dkq_curvature_rows(coords: &[[f64; 2]; 4], xi: f64, eta: f64) -> ([[f64; dkq::NUM_DOFS]; 3], f64) {
    let edges = dkq::EdgeCoefficients::for_element(coords);
    let (n_xi, n_eta) = dkq::serendipity_derivatives(xi, eta);
    let h_xi = dkq::rotation_rows(&n_xi, &edges);
    let h_eta = dkq::rotation_rows(&n_eta, &edges);
    let jac = dkq::Jacobian::new(xi, eta, coords);

    let mut b = [[0.0; dkq::NUM_DOFS]; 3];
    for i in 0..dkq::NUM_DOFS {
        let (hx_x, hx_y) = jac.to_physical(h_xi.hx[i], h_eta.hx[i]);
        let (hy_x, hy_y) = jac.to_physical(h_xi.hy[i], h_eta.hy[i]);
        b[0][i] = -hx_x;
        b[1][i] = -hy_y;
        b[2][i] = -(hx_y + hy_x);
    }
    (b, jac.det)
}

/// Accumulate `factor · Bᵗ D B` into `k`
fn add_btdb<const N: usize>(k: &mut DMatrix<f64>, b: &[[f64; N]; 3], d: &Mat3, factor: f64) {
    for i in 0..N {
        for j in 0..N {
            let mut sum = 0.0;
            for m in 0..3 {
                for n in 0..3 {
                    sum += b[m][i] * d[(m, n)] * b[n][j];
                }
            }
            k[(i, j)] += factor * sum;
        }
    }
}

/// Element stiffness matrix by `n × n` Gauss quadrature
pub fn plate_stiffness(
    formulation: PlateFormulation,
    coords: &[[f64; 2]; 4],
    material: &Material,
    gauss_order: usize,
) -> FEAResult<DMatrix<f64>> {
    let d = material.bending_matrix();
    let points = gauss_2d(gauss_order, formulation.interval())?;
    let ndof = formulation.element_dofs();
    let mut k = DMatrix::zeros(ndof, ndof);

    match formulation {
        PlateFormulation::Hermite => {
            let (a, b) = rectangle_size(coords);
            for gp in &points {
                let rows = hermite::curvature_rows(gp.xi, gp.eta, a, b);
                add_btdb(&mut k, &rows, &d, gp.weight * a * b);
            }
        }
        PlateFormulation::Dkq => {
            for gp in &points {
                let (rows, det) = dkq_curvature_rows(coords, gp.xi, gp.eta);
                add_btdb(&mut k, &rows, &d, gp.weight * det);
            }
        }
    }
    Ok(k)
}

/// Consistent load vector for a uniform pressure `q`
///
/// All 16 Hermite functions interpolate `w` and receive load. For DKQ the
/// deflection is interpolated bilinearly from the corner `w` DOFs and the
/// rotation DOFs receive none.
pub fn plate_load(
    formulation: PlateFormulation,
    coords: &[[f64; 2]; 4],
    pressure: f64,
    gauss_order: usize,
) -> FEAResult<DVector<f64>> {
    let points = gauss_2d(gauss_order, formulation.interval())?;
    let mut f = DVector::zeros(formulation.element_dofs());

    match formulation {
        PlateFormulation::Hermite => {
            let (a, b) = rectangle_size(coords);
            for gp in &points {
                let n = hermite::values(gp.xi, gp.eta, a, b);
                for i in 0..hermite::NUM_DOFS {
                    f[i] += gp.weight * a * b * n[i] * pressure;
                }
            }
        }
        PlateFormulation::Dkq => {
            for gp in &points {
                let n = dkq::bilinear(gp.xi, gp.eta);
                let det = dkq::Jacobian::new(gp.xi, gp.eta, coords).det;
                for i in 0..4 {
                    f[3 * i] += gp.weight * det * n[i] * pressure;
                }
            }
        }
    }
    Ok(f)
}

/// Largest `|K_ij − K_ji|` relative to the largest `|K_ij|`
pub fn relative_asymmetry(k: &DMatrix<f64>) -> f64 {
    let scale = k.amax();
    if scale == 0.0 {
        return 0.0;
    }
    let mut worst = 0.0_f64;
    for i in 0..k.nrows() {
        for j in (i + 1)..k.ncols() {
            worst = worst.max((k[(i, j)] - k[(j, i)]).abs());
        }
    }
    worst / scale
}

/// Most negative eigenvalue of a symmetric matrix, if it is negative beyond
/// round-off (`−1e-10 · max |λ|`)
pub fn negative_eigenvalue(k: &DMatrix<f64>) -> Option<f64> {
    let eig = k.clone().symmetric_eigenvalues();
    let max_abs = eig.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let min = eig.iter().cloned().fold(f64::INFINITY, f64::min);
    (min < -1e-10 * max_abs).then_some(min)
}

/// Validate geometry, integrate `Ke` and `Fe`, and self-check the result
pub fn element_matrices(
    formulation: PlateFormulation,
    element: usize,
    coords: &[[f64; 2]; 4],
    material: &Material,
    pressure: f64,
    gauss_order: usize,
) -> FEAResult<ElementMatrices> {
    if !(1..=MAX_ORDER).contains(&gauss_order) {
        return Err(FEAError::InvalidInput(format!(
            "Gauss order must be in 1..={MAX_ORDER}, got {gauss_order}"
        )));
    }
    validate_geometry(formulation, element, coords)?;

    let stiffness = plate_stiffness(formulation, coords, material, gauss_order)?;
    let load = plate_load(formulation, coords, pressure, gauss_order)?;

    if stiffness.iter().chain(load.iter()).any(|v| !v.is_finite()) {
        return Err(FEAError::InvalidGeometry(format!(
            "element {element} produced non-finite stiffness or load"
        )));
    }
    let asymmetry = relative_asymmetry(&stiffness);
    if asymmetry > SYMMETRY_TOLERANCE {
        return Err(FEAError::AsymmetricStiffness { element, asymmetry });
    }
    Ok(ElementMatrices { stiffness, load })
}
