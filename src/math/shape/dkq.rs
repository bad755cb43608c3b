//! Discrete Kirchhoff Quadrilateral (DKQ) interpolation
//!
//! Reference: J.-L. Batoz, M. Ben Tahar, "Evaluation of a new quadrilateral
//! thin plate bending element", IJNME 18 (1982) 1655-1677.
//!
//! The rotations `βx = −∂w/∂x` and `βy = −∂w/∂y` are interpolated from the
//! 12 nodal DOFs `[w, βx, βy]` per corner through
//!
//! ```text
//! βx = Σ Hx_w,i w_i + Hxx_i βx_i + Hxy_i βy_i
//! βy = Σ Hy_w,i w_i + Hyx_i βx_i + Hyy_i βy_i
//! ```
//!
//! built from the 8-node serendipity functions and per-edge geometric
//! coefficients. Corner `i` uses edge `k = i → i+1` (mid-side node `4 + i`)
//! and edge `m = i−1 → i` (mid-side node `4 + (i+3) % 4`).

/// Number of element DOFs
pub const NUM_DOFS: usize = 12;

/// Parametric corner positions, counter-clockwise
pub const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Bilinear corner functions
pub fn bilinear(xi: f64, eta: f64) -> [f64; 4] {
    let mut n = [0.0; 4];
    for (i, &(xi_i, eta_i)) in CORNERS.iter().enumerate() {
        n[i] = 0.25 * (1.0 + xi * xi_i) * (1.0 + eta * eta_i);
    }
    n
}

/// Parametric derivatives `(∂N/∂ξ, ∂N/∂η)` of the bilinear functions
pub fn bilinear_derivatives(xi: f64, eta: f64) -> ([f64; 4], [f64; 4]) {
    let mut dxi = [0.0; 4];
    let mut deta = [0.0; 4];
    for (i, &(xi_i, eta_i)) in CORNERS.iter().enumerate() {
        dxi[i] = 0.25 * xi_i * (1.0 + eta * eta_i);
        deta[i] = 0.25 * eta_i * (1.0 + xi * xi_i);
    }
    (dxi, deta)
}

/// 8-node serendipity functions N1..N8 (corners, then mid-sides 5..8)
pub fn serendipity(xi: f64, eta: f64) -> [f64; 8] {
    let mut n = [0.0; 8];
    for (i, &(xi_i, eta_i)) in CORNERS.iter().enumerate() {
        n[i] = 0.25 * (1.0 + xi * xi_i) * (1.0 + eta * eta_i) * (xi * xi_i + eta * eta_i - 1.0);
    }
    n[4] = 0.5 * (1.0 - xi * xi) * (1.0 - eta);
    n[5] = 0.5 * (1.0 + xi) * (1.0 - eta * eta);
    n[6] = 0.5 * (1.0 - xi * xi) * (1.0 + eta);
    n[7] = 0.5 * (1.0 - xi) * (1.0 - eta * eta);
    n
}

/// Parametric derivatives `(∂N/∂ξ, ∂N/∂η)` of the serendipity functions
pub fn serendipity_derivatives(xi: f64, eta: f64) -> ([f64; 8], [f64; 8]) {
    let mut dxi = [0.0; 8];
    let mut deta = [0.0; 8];
    for (i, &(xi_i, eta_i)) in CORNERS.iter().enumerate() {
        dxi[i] = 0.25 * xi_i * (1.0 + eta * eta_i) * (2.0 * xi * xi_i + eta * eta_i);
        deta[i] = 0.25 * eta_i * (1.0 + xi * xi_i) * (xi * xi_i + 2.0 * eta * eta_i);
    }
    dxi[4] = -xi * (1.0 - eta);
    deta[4] = -0.5 * (1.0 - xi * xi);
    dxi[5] = 0.5 * (1.0 - eta * eta);
    deta[5] = -eta * (1.0 + xi);
    dxi[6] = -xi * (1.0 + eta);
    deta[6] = 0.5 * (1.0 - xi * xi);
    dxi[7] = -0.5 * (1.0 - eta * eta);
    deta[7] = -eta * (1.0 - xi);
    (dxi, deta)
}

/// Geometric coefficients of one element edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
}

impl EdgeCoefficients {
    /// Coefficients of the edge from corner `i` to corner `j`
    ///
    /// Uses `x_ij = x_i − x_j`, `y_ij = y_i − y_j`, `l² = x_ij² + y_ij²`.
    pub fn new(pi: [f64; 2], pj: [f64; 2]) -> Self {
        let xij = pi[0] - pj[0];
        let yij = pi[1] - pj[1];
        let l2 = xij * xij + yij * yij;
        Self {
            a: -xij / l2,
            b: 0.75 * xij * yij / l2,
            c: (0.25 * xij * xij - 0.5 * yij * yij) / l2,
            d: -yij / l2,
            e: (0.25 * yij * yij - 0.5 * xij * xij) / l2,
        }
    }

    /// Coefficients of the four edges 1-2, 2-3, 3-4, 4-1
    pub fn for_element(coords: &[[f64; 2]; 4]) -> [Self; 4] {
        [
            Self::new(coords[0], coords[1]),
            Self::new(coords[1], coords[2]),
            Self::new(coords[2], coords[3]),
            Self::new(coords[3], coords[0]),
        ]
    }
}

/// Rotation interpolation rows over the 12 DOFs
///
/// `hx · U = βx` and `hy · U = βy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationRows {
    pub hx: [f64; NUM_DOFS],
    pub hy: [f64; NUM_DOFS],
}

/// Combine serendipity values (or one of their derivatives) into `Hx`, `Hy`
///
/// The mapping is linear in `n`, so passing `∂N/∂ξ` yields `∂Hx/∂ξ`.
pub fn rotation_rows(n: &[f64; 8], edges: &[EdgeCoefficients; 4]) -> RotationRows {
    let mut hx = [0.0; NUM_DOFS];
    let mut hy = [0.0; NUM_DOFS];
    for i in 0..4 {
        let k = i;
        let m = (i + 3) % 4;
        let (nk, nm) = (n[4 + k], n[4 + m]);
        let (ek, em) = (&edges[k], &edges[m]);

        hx[3 * i] = 1.5 * (ek.a * nk - em.a * nm);
        hx[3 * i + 1] = n[i] - ek.c * nk - em.c * nm;
        hx[3 * i + 2] = -(ek.b * nk + em.b * nm);

        hy[3 * i] = 1.5 * (ek.d * nk - em.d * nm);
        hy[3 * i + 1] = -(ek.b * nk + em.b * nm);
        hy[3 * i + 2] = n[i] - ek.e * nk - em.e * nm;
    }
    RotationRows { hx, hy }
}

/// Jacobian of the bilinear map at a parametric point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobian {
    /// `[[∂x/∂ξ, ∂y/∂ξ], [∂x/∂η, ∂y/∂η]]`
    pub j: [[f64; 2]; 2],
    pub det: f64,
}

impl Jacobian {
    pub fn new(xi: f64, eta: f64, coords: &[[f64; 2]; 4]) -> Self {
        let (dxi, deta) = bilinear_derivatives(xi, eta);
        let mut j = [[0.0; 2]; 2];
        for i in 0..4 {
            j[0][0] += dxi[i] * coords[i][0];
            j[0][1] += dxi[i] * coords[i][1];
            j[1][0] += deta[i] * coords[i][0];
            j[1][1] += deta[i] * coords[i][1];
        }
        let det = j[0][0] * j[1][1] - j[0][1] * j[1][0];
        Self { j, det }
    }

    /// Map parametric derivatives to physical `(∂/∂x, ∂/∂y)`
    #[inline]
    pub fn to_physical(&self, d_xi: f64, d_eta: f64) -> (f64, f64) {
        let j = &self.j;
        (
            (j[1][1] * d_xi - j[0][1] * d_eta) / self.det,
            (-j[1][0] * d_xi + j[0][0] * d_eta) / self.det,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn distorted() -> [[f64; 2]; 4] {
        [[0.0, 0.0], [2.0, 0.3], [2.4, 1.9], [0.2, 1.5]]
    }

    /// Parametric positions of the 8 serendipity nodes
    fn serendipity_nodes() -> [(f64, f64); 8] {
        [
            (-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0),
            (0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0),
        ]
    }

    #[test]
    fn test_serendipity_kronecker_and_partition() {
        for (j, &(xi, eta)) in serendipity_nodes().iter().enumerate() {
            let n = serendipity(xi, eta);
            for (i, &ni) in n.iter().enumerate() {
                assert_relative_eq!(ni, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-14);
            }
        }
        let n = serendipity(0.31, -0.62);
        assert_relative_eq!(n.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        let b = bilinear(0.31, -0.62);
        assert_relative_eq!(b.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let h = 1e-6;
        let (xi, eta) = (0.27, -0.44);
        let (dxi, deta) = serendipity_derivatives(xi, eta);
        let (bxi, beta) = bilinear_derivatives(xi, eta);
        let (np, nm) = (serendipity(xi + h, eta), serendipity(xi - h, eta));
        let (ep, em) = (serendipity(xi, eta + h), serendipity(xi, eta - h));
        for i in 0..8 {
            assert_relative_eq!(dxi[i], (np[i] - nm[i]) / (2.0 * h), epsilon = 1e-8);
            assert_relative_eq!(deta[i], (ep[i] - em[i]) / (2.0 * h), epsilon = 1e-8);
        }
        let (bp, bm) = (bilinear(xi + h, eta), bilinear(xi - h, eta));
        let (cp, cm) = (bilinear(xi, eta + h), bilinear(xi, eta - h));
        for i in 0..4 {
            assert_relative_eq!(bxi[i], (bp[i] - bm[i]) / (2.0 * h), epsilon = 1e-8);
            assert_relative_eq!(beta[i], (cp[i] - cm[i]) / (2.0 * h), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_kronecker_property_at_corners() {
        let edges = EdgeCoefficients::for_element(&distorted());
        for (j, &(xi, eta)) in CORNERS.iter().enumerate() {
            let rows = rotation_rows(&serendipity(xi, eta), &edges);
            for i in 0..4 {
                let delta = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(rows.hx[3 * i + 1], delta, epsilon = 1e-14);
                assert_relative_eq!(rows.hy[3 * i + 2], delta, epsilon = 1e-14);
                assert_relative_eq!(rows.hx[3 * i], 0.0, epsilon = 1e-14);
                assert_relative_eq!(rows.hx[3 * i + 2], 0.0, epsilon = 1e-14);
                assert_relative_eq!(rows.hy[3 * i], 0.0, epsilon = 1e-14);
                assert_relative_eq!(rows.hy[3 * i + 1], 0.0, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_linear_field_gives_constant_rotations() {
        // w = 0.4 x − 1.3 y: βx = −0.4, βy = 1.3 everywhere
        let coords = distorted();
        let edges = EdgeCoefficients::for_element(&coords);
        let mut u = [0.0; NUM_DOFS];
        for (i, p) in coords.iter().enumerate() {
            u[3 * i] = 0.4 * p[0] - 1.3 * p[1];
            u[3 * i + 1] = -0.4;
            u[3 * i + 2] = 1.3;
        }
        for &(xi, eta) in &[(0.0, 0.0), (0.5, -0.2), (-0.7, 0.9)] {
            let rows = rotation_rows(&serendipity(xi, eta), &edges);
            let bx: f64 = rows.hx.iter().zip(&u).map(|(h, v)| h * v).sum();
            let by: f64 = rows.hy.iter().zip(&u).map(|(h, v)| h * v).sum();
            assert_relative_eq!(bx, -0.4, epsilon = 1e-12);
            assert_relative_eq!(by, 1.3, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_jacobian_of_rectangle() {
        let rect = [[0.0, 0.0], [3.0, 0.0], [3.0, 2.0], [0.0, 2.0]];
        let jac = Jacobian::new(0.2, -0.3, &rect);
        assert_relative_eq!(jac.det, 1.5, epsilon = 1e-14);
        let (dx, dy) = jac.to_physical(1.0, 1.0);
        assert_relative_eq!(dx, 2.0 / 3.0, epsilon = 1e-14);
        assert_relative_eq!(dy, 1.0, epsilon = 1e-14);
    }
}
