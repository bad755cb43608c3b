//! Navier double-series solution for simply supported rectangular plates
//!
//! Reference: Timoshenko & Woinowsky-Krieger, "Theory of Plates and Shells",
//! §30-§34. Used to validate the finite element results.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::elements::Material;
use crate::error::{FEAError, FEAResult};
use crate::results::PlateMoments;

/// Terms per direction used when none are given
pub const DEFAULT_TERMS: usize = 100;

/// Navier series for an `a × b` plate simply supported on all edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavierSeries {
    pub a: f64,
    pub b: f64,
    /// Flexural rigidity
    pub d: f64,
    pub nu: f64,
    /// Terms per direction (odd terms only for uniform load)
    pub terms: usize,
}

impl NavierSeries {
    pub fn new(a: f64, b: f64, material: &Material) -> FEAResult<Self> {
        material.validate()?;
        if !(a.is_finite() && b.is_finite()) || a <= 0.0 || b <= 0.0 {
            return Err(FEAError::InvalidGeometry(format!(
                "plate span must be positive, got {a} x {b}"
            )));
        }
        Ok(Self {
            a,
            b,
            d: material.flexural_rigidity(),
            nu: material.nu,
            terms: DEFAULT_TERMS,
        })
    }

    /// Set the number of terms per direction
    pub fn with_terms(mut self, terms: usize) -> Self {
        self.terms = terms.max(1);
        self
    }

    /// `(m²/a² + n²/b²)²`
    #[inline]
    fn denominator(&self, m: f64, n: f64) -> f64 {
        (m * m / (self.a * self.a) + n * n / (self.b * self.b)).powi(2)
    }

    /// Odd harmonics `1, 3, 5, …`
    fn odd(&self) -> impl Iterator<Item = f64> + Clone {
        (0..self.terms).map(|k| (2 * k + 1) as f64)
    }

    /// Deflection under a uniform pressure `q`
    pub fn uniform_deflection(&self, q: f64, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        for m in self.odd() {
            let sx = (m * PI * x / self.a).sin();
            for n in self.odd() {
                let sy = (n * PI * y / self.b).sin();
                sum += sx * sy / (m * n * self.denominator(m, n));
            }
        }
        16.0 * q / (PI.powi(6) * self.d) * sum
    }

    /// Moments under a uniform pressure `q`, with the `M = −D κ` convention
    pub fn uniform_moments(&self, q: f64, x: f64, y: f64) -> PlateMoments {
        let (a2, b2) = (self.a * self.a, self.b * self.b);
        let (mut sx_sum, mut sy_sum, mut sxy_sum) = (0.0, 0.0, 0.0);
        for m in self.odd() {
            let (sx, cx) = (m * PI * x / self.a).sin_cos();
            for n in self.odd() {
                let (sy, cy) = (n * PI * y / self.b).sin_cos();
                let den = self.denominator(m, n);
                let s = sx * sy / (m * n * den);
                sx_sum += (m * m / a2 + self.nu * n * n / b2) * s;
                sy_sum += (self.nu * m * m / a2 + n * n / b2) * s;
                sxy_sum += cx * cy / den;
            }
        }
        let c = 16.0 * q / PI.powi(4);
        PlateMoments::new(
            c * sx_sum,
            c * sy_sum,
            -(1.0 - self.nu) * c * sxy_sum / (self.a * self.b),
        )
    }

    /// Deflection at `(x, y)` under a point force `p` at `(x0, y0)`
    ///
    /// Uses all harmonics `1..=terms`; convergence is slow at the load point.
    pub fn point_load_deflection(&self, p: f64, x0: f64, y0: f64, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        for m in (1..=self.terms).map(|k| k as f64) {
            let sx = (m * PI * x0 / self.a).sin() * (m * PI * x / self.a).sin();
            for n in (1..=self.terms).map(|k| k as f64) {
                let sy = (n * PI * y0 / self.b).sin() * (n * PI * y / self.b).sin();
                sum += sx * sy / self.denominator(m, n);
            }
        }
        4.0 * p / (PI.powi(4) * self.d * self.a * self.b) * sum
    }

    /// Center deflection under a uniform pressure
    pub fn center_deflection(&self, q: f64) -> f64 {
        self.uniform_deflection(q, 0.5 * self.a, 0.5 * self.b)
    }
}
