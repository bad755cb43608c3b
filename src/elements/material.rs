//! Plate material and flexural constitutive law

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Isotropic elastic plate material with its thickness
///
/// Units only need to be consistent: the reference slab uses kN and m
/// (E in kN/m², q in kN/m², moments in kN·m/m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus)
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Plate thickness
    pub thickness: f64,
}

impl Material {
    /// Create a new material with given properties
    pub fn new(e: f64, nu: f64, thickness: f64) -> Self {
        Self { e, nu, thickness }
    }

    /// Reject materials for which D is not symmetric positive-definite
    pub fn validate(&self) -> FEAResult<()> {
        if !(self.e.is_finite() && self.nu.is_finite() && self.thickness.is_finite()) {
            return Err(FEAError::InvalidMaterial(format!(
                "non-finite properties: E={}, nu={}, t={}",
                self.e, self.nu, self.thickness
            )));
        }
        if self.e <= 0.0 {
            return Err(FEAError::InvalidMaterial(format!(
                "Young's modulus must be positive, got {}",
                self.e
            )));
        }
        if !(0.0..0.5).contains(&self.nu) {
            return Err(FEAError::InvalidMaterial(format!(
                "Poisson's ratio must lie in [0, 0.5), got {}",
                self.nu
            )));
        }
        if self.thickness <= 0.0 {
            return Err(FEAError::InvalidMaterial(format!(
                "thickness must be positive, got {}",
                self.thickness
            )));
        }
        Ok(())
    }

    /// Flexural rigidity E t³ / (12 (1 - nu²))
    pub fn flexural_rigidity(&self) -> f64 {
        self.e * self.thickness.powi(3) / (12.0 * (1.0 - self.nu * self.nu))
    }

    /// Bending constitutive matrix [D] relating curvatures to moments
    pub fn bending_matrix(&self) -> Matrix3<f64> {
        let d = self.flexural_rigidity();
        let nu = self.nu;
        Matrix3::new(
            d,      d * nu, 0.0,
            d * nu, d,      0.0,
            0.0,    0.0,    d * (1.0 - nu) / 2.0,
        )
    }
}
