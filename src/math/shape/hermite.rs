//! Bicubic Hermite (Bogner-Fox-Schmit) shape functions
//!
//! The 1D cubics are written in terms of `ξ ∈ [0, 1]` and the edge length
//! `L`; derivatives are taken with respect to the physical coordinate, so
//! each order carries a factor `1/L`.
//!
//! | cubic | value            | at ξ=0          | at ξ=1          |
//! |-------|------------------|-----------------|-----------------|
//! | Φ1    | 1 − ξ²(3 − 2ξ)   | Φ = 1           |                 |
//! | Φ2    | ξL(1 − ξ(2 − ξ)) | Φ' = 1          |                 |
//! | Φ3    | ξ²(3 − 2ξ)       |                 | Φ = 1           |
//! | Φ4    | ξ²L(ξ − 1)       |                 | Φ' = 1          |

/// Number of element DOFs
pub const NUM_DOFS: usize = 16;

/// Local DOF → (cubic along x, cubic along y), zero-based cubic indices
///
/// Node order (0,0), (1,0), (1,1), (0,1); per node `[w, ∂w/∂x, ∂w/∂y, ∂²w/∂x∂y]`.
pub const DOF_TABLE: [(usize, usize); NUM_DOFS] = [
    (0, 0), (1, 0), (0, 1), (1, 1),
    (2, 0), (3, 0), (2, 1), (3, 1),
    (2, 2), (3, 2), (2, 3), (3, 3),
    (0, 2), (1, 2), (0, 3), (1, 3),
];

/// 1D cubics Φ1..Φ4 at `xi`
pub fn cubic(xi: f64, l: f64) -> [f64; 4] {
    [
        1.0 - xi * xi * (3.0 - 2.0 * xi),
        xi * l * (1.0 - xi * (2.0 - xi)),
        xi * xi * (3.0 - 2.0 * xi),
        xi * xi * l * (xi - 1.0),
    ]
}

/// First physical derivatives of Φ1..Φ4
pub fn cubic_d1(xi: f64, l: f64) -> [f64; 4] {
    [
        -6.0 * xi * (1.0 - xi) / l,
        1.0 - xi * (4.0 - 3.0 * xi),
        6.0 * xi * (1.0 - xi) / l,
        -xi * (2.0 - 3.0 * xi),
    ]
}

/// Second physical derivatives of Φ1..Φ4
pub fn cubic_d2(xi: f64, l: f64) -> [f64; 4] {
    [
        -6.0 * (1.0 - 2.0 * xi) / (l * l),
        -(2.0 / l) * (2.0 - 3.0 * xi),
        6.0 * (1.0 - 2.0 * xi) / (l * l),
        -(2.0 / l) * (1.0 - 3.0 * xi),
    ]
}

/// The 16 displacement functions at `(xi, eta)` of an `a × b` rectangle
pub fn values(xi: f64, eta: f64, a: f64, b: f64) -> [f64; NUM_DOFS] {
    let px = cubic(xi, a);
    let py = cubic(eta, b);
    let mut n = [0.0; NUM_DOFS];
    for (k, &(i, j)) in DOF_TABLE.iter().enumerate() {
        n[k] = px[i] * py[j];
    }
    n
}

/// Curvature-displacement rows `[∂²/∂x², ∂²/∂y², 2∂²/∂x∂y]`
pub fn curvature_rows(xi: f64, eta: f64, a: f64, b: f64) -> [[f64; NUM_DOFS]; 3] {
    let (px, dpx, ddpx) = (cubic(xi, a), cubic_d1(xi, a), cubic_d2(xi, a));
    let (py, dpy, ddpy) = (cubic(eta, b), cubic_d1(eta, b), cubic_d2(eta, b));
    let mut rows = [[0.0; NUM_DOFS]; 3];
    for (k, &(i, j)) in DOF_TABLE.iter().enumerate() {
        rows[0][k] = ddpx[i] * py[j];
        rows[1][k] = px[i] * ddpy[j];
        rows[2][k] = 2.0 * dpx[i] * dpy[j];
    }
    rows
}
