//! Curvature and moment recovery from a solved displacement vector
//!
//! `κ = B(ξ, η) · Ue` and `M = −D · κ`, with `Ue` gathered through the same
//! DOF map used for assembly. Nothing is cached: every query re-evaluates
//! `B` at its point.

use nalgebra::{DVector, Matrix3, Vector3};

use crate::assembly::DofMap;
use crate::elements::Material;
use crate::error::{FEAError, FEAResult};
use crate::math::gauss::Interval;
use crate::math::plate::{curvature_matrix, physical_point, PlateFormulation};
use crate::math::shape::{dkq, hermite};
use crate::mesh::Mesh;
use crate::results::PlateMoments;

/// Moment recovery over one solved mesh
pub struct MomentRecovery<'a> {
    mesh: &'a Mesh,
    d: Matrix3<f64>,
    dof_map: DofMap,
    displacements: &'a DVector<f64>,
}

impl<'a> MomentRecovery<'a> {
    pub fn new(
        mesh: &'a Mesh,
        material: &Material,
        dof_map: DofMap,
        displacements: &'a DVector<f64>,
    ) -> FEAResult<Self> {
        if displacements.len() != dof_map.n_dofs() {
            return Err(FEAError::AssemblyInconsistency(format!(
                "displacement vector has {} entries, DOF map expects {}",
                displacements.len(),
                dof_map.n_dofs()
            )));
        }
        Ok(Self {
            mesh,
            d: material.bending_matrix(),
            dof_map,
            displacements,
        })
    }

    fn formulation(&self) -> PlateFormulation {
        self.dof_map.formulation()
    }

    fn check_point(&self, xi: f64, eta: f64) -> FEAResult<()> {
        let (lo, hi) = match self.formulation().interval() {
            Interval::Unit => (0.0, 1.0),
            Interval::Symmetric => (-1.0, 1.0),
        };
        let inside = |v: f64| v >= lo - 1e-12 && v <= hi + 1e-12;
        if inside(xi) && inside(eta) {
            Ok(())
        } else {
            Err(FEAError::InvalidInput(format!(
                "parametric point ({xi}, {eta}) is outside [{lo}, {hi}]²"
            )))
        }
    }

    /// Element DOF values `Ue` in element-local order
    pub fn element_displacements(&self, element: usize) -> FEAResult<DVector<f64>> {
        let quad = self.mesh.element(element)?;
        let dofs = self.dof_map.element_dofs(quad);
        Ok(DVector::from_iterator(dofs.len(), dofs.iter().map(|&g| self.displacements[g])))
    }

    /// Curvatures `[∂²w/∂x², ∂²w/∂y², 2∂²w/∂x∂y]` at a parametric point
    pub fn curvatures(&self, element: usize, xi: f64, eta: f64) -> FEAResult<Vector3<f64>> {
        self.check_point(xi, eta)?;
        let quad = self.mesh.element(element)?;
        let coords = self.mesh.element_coords(quad);
        let b = curvature_matrix(self.formulation(), &coords, xi, eta);
        let ue = self.element_displacements(element)?;
        let kappa = b * ue;
        Ok(Vector3::new(kappa[0], kappa[1], kappa[2]))
    }

    /// Moments per unit width at a parametric point
    pub fn moments(&self, element: usize, xi: f64, eta: f64) -> FEAResult<PlateMoments> {
        let m = -(self.d * self.curvatures(element, xi, eta)?);
        Ok(PlateMoments::new(m[0], m[1], m[2]))
    }

    /// Moments at the element center
    pub fn center_moments(&self, element: usize) -> FEAResult<PlateMoments> {
        let (xi, eta) = self.formulation().center();
        self.moments(element, xi, eta)
    }

    /// Nodal moments averaged over the corners of all adjacent elements
    pub fn nodal_moments(&self) -> FEAResult<Vec<PlateMoments>> {
        let corners = self.formulation().corners();
        (0..self.mesh.n_nodes())
            .map(|node| {
                let adjacent = self.mesh.node_elements(node);
                let mut sum = PlateMoments::default();
                for &element in adjacent {
                    let corner = self.mesh.element(element)?.corner_of(node).ok_or_else(|| {
                        FEAError::AssemblyInconsistency(format!(
                            "element {element} is listed at node {node} but does not use it"
                        ))
                    })?;
                    let (xi, eta) = corners[corner];
                    sum = sum + self.moments(element, xi, eta)?;
                }
                Ok(match adjacent.len() {
                    0 => sum,
                    n => sum.scaled(1.0 / n as f64),
                })
            })
            .collect()
    }

    /// Deflection `w` at a parametric point
    ///
    /// For Hermite elements this is the conforming bicubic field. For DKQ it
    /// is only a bilinear interpolation of the corner deflections: the DKQ
    /// Kirchhoff constraints act on rotations, not on `w`, so between nodes
    /// the value is not the plate deflection and should not be compared
    /// against an analytical solution there.
    pub fn deflection(&self, element: usize, xi: f64, eta: f64) -> FEAResult<f64> {
        self.check_point(xi, eta)?;
        let quad = self.mesh.element(element)?;
        let ue = self.element_displacements(element)?;
        let w = match self.formulation() {
            PlateFormulation::Hermite => {
                let coords = self.mesh.element_coords(quad);
                let (a, b) = crate::math::plate::rectangle_size(&coords);
                let n = hermite::values(xi, eta, a, b);
                n.iter().zip(ue.iter()).map(|(ni, ui)| ni * ui).sum()
            }
            PlateFormulation::Dkq => {
                let n = dkq::bilinear(xi, eta);
                (0..4).map(|i| n[i] * ue[3 * i]).sum()
            }
        };
        Ok(w)
    }

    /// Physical coordinates of a parametric point
    pub fn point(&self, element: usize, xi: f64, eta: f64) -> FEAResult<[f64; 2]> {
        let quad = self.mesh.element(element)?;
        let coords = self.mesh.element_coords(quad);
        Ok(physical_point(self.formulation(), &coords, xi, eta))
    }
}
