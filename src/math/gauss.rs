//! Gauss-Legendre quadrature rules
//!
//! 1D rules of order 1..=6 on `[-1, 1]`, their mapping onto `[0, 1]` and
//! the `n × n` tensor-product rules used by the plate element kernels.
//!
//! ```
//! use plate_solver::math::gauss::{gauss_2d, Interval};
//!
//! let rule = gauss_2d(2, Interval::Symmetric).unwrap();
//! let area: f64 = rule.iter().map(|gp| gp.weight).sum();
//! assert!((area - 4.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Highest supported rule order
pub const MAX_ORDER: usize = 6;

/// Parametric interval a rule is expressed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    /// `[-1, 1]`
    Symmetric,
    /// `[0, 1]`
    Unit,
}

impl Interval {
    /// Length of the interval
    pub fn length(&self) -> f64 {
        match self {
            Interval::Symmetric => 2.0,
            Interval::Unit => 1.0,
        }
    }
}

/// A 2D quadrature point with its parametric coordinates and weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    /// First parametric coordinate
    pub xi: f64,
    /// Second parametric coordinate
    pub eta: f64,
    /// Integration weight
    pub weight: f64,
}

impl GaussPoint {
    pub fn new(xi: f64, eta: f64, weight: f64) -> Self {
        Self { xi, eta, weight }
    }
}

/// 1D Gauss-Legendre points and weights on `[-1, 1]`
///
/// Returns `(point, weight)` pairs in ascending point order.
pub fn gauss_1d(n: usize) -> FEAResult<Vec<(f64, f64)>> {
    let rule = match n {
        1 => vec![(0.0, 2.0)],
        2 => {
            let p = 1.0 / 3.0_f64.sqrt();
            vec![(-p, 1.0), (p, 1.0)]
        }
        3 => {
            let p = (3.0 / 5.0_f64).sqrt();
            vec![(-p, 5.0 / 9.0), (0.0, 8.0 / 9.0), (p, 5.0 / 9.0)]
        }
        4 => {
            let (p1, w1) = (0.339_981_043_584_856_3, 0.652_145_154_862_546_1);
            let (p2, w2) = (0.861_136_311_594_052_6, 0.347_854_845_137_453_9);
            vec![(-p2, w2), (-p1, w1), (p1, w1), (p2, w2)]
        }
        5 => {
            let w0 = 128.0 / 225.0;
            let (p1, w1) = (0.538_469_310_105_683_1, 0.478_628_670_499_366_5);
            let (p2, w2) = (0.906_179_845_938_664_0, 0.236_926_885_056_189_1);
            vec![(-p2, w2), (-p1, w1), (0.0, w0), (p1, w1), (p2, w2)]
        }
        6 => {
            let (p1, w1) = (0.238_619_186_083_196_9, 0.467_913_934_572_691_0);
            let (p2, w2) = (0.661_209_386_466_264_5, 0.360_761_573_048_138_6);
            let (p3, w3) = (0.932_469_514_203_152_1, 0.171_324_492_379_170_4);
            vec![(-p3, w3), (-p2, w2), (-p1, w1), (p1, w1), (p2, w2), (p3, w3)]
        }
        _ => {
            return Err(FEAError::InvalidInput(format!(
                "Gauss order must be in 1..={MAX_ORDER}, got {n}"
            )))
        }
    };
    Ok(rule)
}

/// 1D rule on the requested interval
pub fn gauss_1d_on(n: usize, interval: Interval) -> FEAResult<Vec<(f64, f64)>> {
    let rule = gauss_1d(n)?;
    Ok(match interval {
        Interval::Symmetric => rule,
        Interval::Unit => rule
            .into_iter()
            .map(|(p, w)| (0.5 * (p + 1.0), 0.5 * w))
            .collect(),
    })
}

/// `n × n` tensor-product rule on the square `interval²`
///
/// Points are ordered with `eta` varying fastest.
pub fn gauss_2d(n: usize, interval: Interval) -> FEAResult<Vec<GaussPoint>> {
    let rule = gauss_1d_on(n, interval)?;
    let mut points = Vec::with_capacity(n * n);
    for &(xi, wi) in &rule {
        for &(eta, wj) in &rule {
            points.push(GaussPoint::new(xi, eta, wi * wj));
        }
    }
    Ok(points)
}
