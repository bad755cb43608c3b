//! Result types for plate analysis

use std::ops::Add;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::assembly::DofMap;
use crate::elements::Material;
use crate::error::FEAResult;
use crate::math::plate::PlateFormulation;
use crate::mesh::Mesh;
use crate::recovery::MomentRecovery;
use crate::solver::SolveDiagnostics;

/// Displacement results at a node
///
/// Slopes are always reported as derivatives of `w`, whatever the element
/// family stores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Deflection
    pub w: f64,
    /// ∂w/∂x
    pub dw_dx: f64,
    /// ∂w/∂y
    pub dw_dy: f64,
    /// ∂²w/∂x∂y (Hermite only)
    pub twist: Option<f64>,
}

impl NodeDisplacement {
    /// Create from the nodal DOF values of a formulation
    pub fn from_dofs(formulation: PlateFormulation, dofs: &[f64]) -> Self {
        match formulation {
            PlateFormulation::Hermite => Self {
                w: dofs[0],
                dw_dx: dofs[1],
                dw_dy: dofs[2],
                twist: Some(dofs[3]),
            },
            PlateFormulation::Dkq => Self {
                w: dofs[0],
                dw_dx: -dofs[1],
                dw_dy: -dofs[2],
                twist: None,
            },
        }
    }
}

/// Bending and twisting moments per unit width
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateMoments {
    pub mx: f64,
    pub my: f64,
    pub mxy: f64,
}

impl PlateMoments {
    pub fn new(mx: f64, my: f64, mxy: f64) -> Self {
        Self { mx, my, mxy }
    }

    /// Scale all components by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.mx * factor, self.my * factor, self.mxy * factor)
    }

    /// Principal moments `(m1, m2)` with `m1 >= m2`
    pub fn principal(&self) -> (f64, f64) {
        let mean = 0.5 * (self.mx + self.my);
        let radius = (0.25 * (self.mx - self.my).powi(2) + self.mxy.powi(2)).sqrt();
        (mean + radius, mean - radius)
    }
}

impl Add for PlateMoments {
    type Output = PlateMoments;

    fn add(self, rhs: PlateMoments) -> PlateMoments {
        PlateMoments::new(self.mx + rhs.mx, self.my + rhs.my, self.mxy + rhs.mxy)
    }
}

/// A suspicious but non-fatal numerical finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalAnomaly {
    /// Element involved, if element-level
    pub element: Option<usize>,
    /// Offending eigenvalue or measure
    pub value: f64,
    pub message: String,
}

impl NumericalAnomaly {
    pub fn negative_element_eigenvalue(element: usize, eigenvalue: f64) -> Self {
        Self {
            element: Some(element),
            value: eigenvalue,
            message: format!(
                "element {element} stiffness has negative eigenvalue {eigenvalue:.3e}; check node ordering and sign conventions"
            ),
        }
    }

    pub fn negative_global_eigenvalue(eigenvalue: f64) -> Self {
        Self {
            element: None,
            value: eigenvalue,
            message: format!(
                "assembled stiffness has negative eigenvalue {eigenvalue:.3e} before supports are applied"
            ),
        }
    }

    pub fn equilibrium(imbalance: f64, total_load: f64) -> Self {
        Self {
            element: None,
            value: imbalance,
            message: format!(
                "vertical reactions do not balance the applied load: imbalance {imbalance:.3e} against {total_load:.3e}"
            ),
        }
    }
}

/// Summary of an analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub total_dofs: usize,
    pub free_dofs: usize,
    pub constrained_dofs: usize,
    /// Largest |w|
    pub max_deflection: f64,
    pub max_deflection_node: usize,
    /// Sum of applied transverse loads
    pub total_load: f64,
    /// Sum of vertical reactions
    pub total_reaction: f64,
}

/// Solved plate: displacements, reactions and on-demand moments
#[derive(Debug, Clone)]
pub struct PlateSolution {
    pub(crate) mesh: Mesh,
    pub(crate) material: Material,
    pub(crate) dof_map: DofMap,
    /// Global displacement vector `U`
    pub displacements: DVector<f64>,
    /// `K U − F` over all DOFs; non-zero only at constrained DOFs
    pub reactions: DVector<f64>,
    pub summary: AnalysisSummary,
    pub diagnostics: SolveDiagnostics,
    pub anomalies: Vec<NumericalAnomaly>,
}

impl PlateSolution {
    pub fn formulation(&self) -> PlateFormulation {
        self.dof_map.formulation()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    /// Displacement results at a node
    pub fn node_displacement(&self, node: usize) -> FEAResult<NodeDisplacement> {
        let base = self.dof_map.global(node, 0)?;
        let ndpn = self.dof_map.dofs_per_node();
        Ok(NodeDisplacement::from_dofs(
            self.formulation(),
            &self.displacements.as_slice()[base..base + ndpn],
        ))
    }

    /// Deflection of every node, in node order
    pub fn deflections(&self) -> Vec<f64> {
        let ndpn = self.dof_map.dofs_per_node();
        (0..self.mesh.n_nodes()).map(|n| self.displacements[n * ndpn]).collect()
    }

    /// Deflection of a node in millimetres, for models in metres
    pub fn deflection_mm(&self, node: usize) -> FEAResult<f64> {
        Ok(self.node_displacement(node)?.w * 1000.0)
    }

    /// Vertical reaction at a node
    pub fn reaction(&self, node: usize) -> FEAResult<f64> {
        Ok(self.reactions[self.dof_map.global(node, 0)?])
    }

    /// Moment recovery bound to this solution
    pub fn recovery(&self) -> FEAResult<MomentRecovery<'_>> {
        MomentRecovery::new(&self.mesh, &self.material, self.dof_map, &self.displacements)
    }

    /// Moments at a parametric point of an element
    pub fn moments_at(&self, element: usize, xi: f64, eta: f64) -> FEAResult<PlateMoments> {
        self.recovery()?.moments(element, xi, eta)
    }

    /// Moments at an element center
    pub fn element_moments(&self, element: usize) -> FEAResult<PlateMoments> {
        self.recovery()?.center_moments(element)
    }

    /// Averaged moments at every node
    pub fn nodal_moments(&self) -> FEAResult<Vec<PlateMoments>> {
        self.recovery()?.nodal_moments()
    }
}
