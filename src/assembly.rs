//! Global assembly of the plate stiffness system
//!
//! Element kernels are evaluated on the rayon pool, one task per element.
//! Their results are collected in element order and scattered serially, so
//! the summation order (and therefore the assembled matrix) does not depend
//! on thread scheduling.

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::elements::{Material, Quad};
use crate::error::{FEAError, FEAResult};
use crate::loads::NodeLoad;
use crate::math::plate::{element_matrices, negative_eigenvalue, ElementMatrices, PlateFormulation};
use crate::math::{to_dense, SparseMatrixBuilder};
use crate::mesh::Mesh;
use crate::results::NumericalAnomaly;

/// Mapping between (node, local DOF) pairs and global equation numbers
///
/// `global = dofs_per_node * node + local`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DofMap {
    formulation: PlateFormulation,
    n_nodes: usize,
}

impl DofMap {
    pub fn new(formulation: PlateFormulation, n_nodes: usize) -> Self {
        Self { formulation, n_nodes }
    }

    pub fn formulation(&self) -> PlateFormulation {
        self.formulation
    }

    pub fn dofs_per_node(&self) -> usize {
        self.formulation.dofs_per_node()
    }

    /// Total number of global DOFs
    pub fn n_dofs(&self) -> usize {
        self.n_nodes * self.dofs_per_node()
    }

    /// Global index of a nodal DOF
    pub fn global(&self, node: usize, local: usize) -> FEAResult<usize> {
        if node >= self.n_nodes {
            return Err(FEAError::NodeNotFound(node));
        }
        if local >= self.dofs_per_node() {
            return Err(FEAError::InvalidInput(format!(
                "{} nodes have {} DOFs, got local DOF {local}",
                self.formulation.name(),
                self.dofs_per_node()
            )));
        }
        Ok(node * self.dofs_per_node() + local)
    }

    /// Global indices of an element's DOFs, in element-local order
    pub fn element_dofs(&self, quad: &Quad) -> Vec<usize> {
        let ndpn = self.dofs_per_node();
        quad.nodes
            .iter()
            .flat_map(|&n| (0..ndpn).map(move |d| n * ndpn + d))
            .collect()
    }

    /// Node and local DOF of a global index
    pub fn locate(&self, global: usize) -> (usize, usize) {
        (global / self.dofs_per_node(), global % self.dofs_per_node())
    }

    /// Human-readable name of a global DOF's local component
    pub fn dof_name(&self, global: usize) -> &'static str {
        self.formulation.dof_names()[global % self.dofs_per_node()]
    }
}

/// Assembly settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssemblyOptions {
    /// Evaluate element kernels on the rayon thread pool
    pub parallel: bool,
    /// Gauss order override (default: 4 for Hermite, 2 for DKQ)
    pub gauss_order: Option<usize>,
    /// Eigen-check every element stiffness and the assembled matrix
    pub eigen_checks: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            gauss_order: None,
            eigen_checks: false,
        }
    }
}

/// Assembled stiffness system of one analysis run
#[derive(Debug, Clone)]
pub struct GlobalSystem {
    /// Global stiffness `K` (singular before supports are applied)
    pub stiffness: CsrMatrix<f64>,
    /// Global load vector `F`
    pub load: DVector<f64>,
    pub dof_map: DofMap,
    /// Element-level anomalies found while assembling
    pub anomalies: Vec<NumericalAnomaly>,
}

impl GlobalSystem {
    pub fn n_dofs(&self) -> usize {
        self.dof_map.n_dofs()
    }

    /// Largest diagonal stiffness term
    pub fn max_diagonal(&self) -> f64 {
        self.stiffness
            .triplet_iter()
            .filter(|(r, c, _)| r == c)
            .fold(0.0_f64, |m, (_, _, &v)| m.max(v.abs()))
    }
}

/// Anomaly for an element stiffness with a negative eigenvalue
pub fn check_element_stiffness(element: usize, ke: &DMatrix<f64>) -> Option<NumericalAnomaly> {
    negative_eigenvalue(ke).map(|ev| NumericalAnomaly::negative_element_eigenvalue(element, ev))
}

/// Anomaly for an unconstrained global stiffness with a negative eigenvalue
///
/// `K` must be positive semi-definite before supports are applied.
pub fn check_global_stiffness(k: &CsrMatrix<f64>) -> Option<NumericalAnomaly> {
    negative_eigenvalue(&to_dense(k)).map(NumericalAnomaly::negative_global_eigenvalue)
}

/// Build `K` and `F` for a uniform pressure plus nodal point loads
pub fn assemble(
    mesh: &Mesh,
    material: &Material,
    formulation: PlateFormulation,
    pressure: f64,
    point_loads: &[NodeLoad],
    options: &AssemblyOptions,
) -> FEAResult<GlobalSystem> {
    material.validate()?;
    if !pressure.is_finite() {
        return Err(FEAError::InvalidInput(format!("pressure must be finite, got {pressure}")));
    }
    let gauss_order = options
        .gauss_order
        .unwrap_or_else(|| formulation.default_gauss_order());
    let dof_map = DofMap::new(formulation, mesh.n_nodes());
    let n_dofs = dof_map.n_dofs();

    info!(
        "Assembling {} {} elements ({} DOFs, {}x{} Gauss)",
        mesh.n_elements(),
        formulation.name(),
        n_dofs,
        gauss_order,
        gauss_order
    );

    let compute = |quad: &Quad| -> FEAResult<(ElementMatrices, Option<NumericalAnomaly>)> {
        let coords = mesh.element_coords(quad);
        let em = element_matrices(formulation, quad.id, &coords, material, pressure, gauss_order)?;
        let anomaly = if options.eigen_checks {
            check_element_stiffness(quad.id, &em.stiffness)
        } else {
            None
        };
        Ok((em, anomaly))
    };

    let results: Vec<(ElementMatrices, Option<NumericalAnomaly>)> = if options.parallel {
        mesh.elements().par_iter().map(compute).collect::<FEAResult<_>>()?
    } else {
        mesh.elements().iter().map(compute).collect::<FEAResult<_>>()?
    };

    let mut builder = SparseMatrixBuilder::new(n_dofs);
    let mut load = DVector::zeros(n_dofs);
    let mut anomalies = Vec::new();

    for (quad, (em, anomaly)) in mesh.elements().iter().zip(results) {
        let dofs = dof_map.element_dofs(quad);
        if em.stiffness.nrows() != dofs.len() || em.load.len() != dofs.len() {
            return Err(FEAError::AssemblyInconsistency(format!(
                "element {} produced {} DOFs, {} expects {}",
                quad.id,
                em.stiffness.nrows(),
                formulation.name(),
                dofs.len()
            )));
        }
        builder.add_element_matrix(&dofs, &em.stiffness);
        for (i, &g) in dofs.iter().enumerate() {
            load[g] += em.load[i];
        }
        if let Some(anomaly) = anomaly {
            warn!("{}", anomaly.message);
            anomalies.push(anomaly);
        }
    }

    for pl in point_loads {
        if !pl.fz.is_finite() {
            return Err(FEAError::InvalidInput(format!(
                "point load at node {} is not finite",
                pl.node
            )));
        }
        let g = dof_map.global(pl.node, 0)?;
        load[g] += pl.fz;
    }

    let stiffness = builder.to_csr();
    if options.eigen_checks {
        if let Some(anomaly) = check_global_stiffness(&stiffness) {
            warn!("{}", anomaly.message);
            anomalies.push(anomaly);
        } else {
            debug!("Eigen checks passed for {} elements and the assembled matrix", mesh.n_elements());
        }
    }
    debug!(
        "Assembled K: {} x {}, {} stored entries, |F| = {:.4e}",
        n_dofs,
        n_dofs,
        stiffness.nnz(),
        load.norm()
    );

    Ok(GlobalSystem {
        stiffness,
        load,
        dof_map,
        anomalies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::count_zero_eigenvalues;
    use crate::mesh::MeshBuilder;
    use approx::assert_relative_eq;


    #[test]
    fn test_dof_map() {
        let map = DofMap::new(PlateFormulation::Hermite, 6);
        assert_eq!(map.n_dofs(), 24);
        assert_eq!(map.global(2, 3).unwrap(), 11);
        assert_eq!(map.locate(11), (2, 3));
        assert_eq!(map.dof_name(11), "d2w/dxdy");
        assert!(map.global(6, 0).is_err());
        assert!(map.global(0, 4).is_err());
        let q = Quad::new(0, [0, 3, 4, 1]);
        assert_eq!(&map.element_dofs(&q)[4..8], &[12, 13, 14, 15]);
    }

    #[test]
    fn test_unsupported_plate_has_three_rigid_modes() {
        let mat = Material::new(35000e3, 0.15, 0.1);
        for f in [PlateFormulation::Hermite, PlateFormulation::Dkq] {
            let mesh = MeshBuilder::new(2.0, 1.5).divisions(3, 2).build().unwrap();
            let sys = assemble(&mesh, &mat, f, 1.0, &[], &AssemblyOptions::default()).unwrap();
            let k = to_dense(&sys.stiffness);
            assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9 * k.amax());
            assert_eq!(count_zero_eigenvalues(&k, 1e-10), 3, "{}", f.name());
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mat = Material::new(35000e3, 0.15, 0.1);
        let mesh = MeshBuilder::new(6.0, 4.0).divisions(6, 4).build().unwrap();
        let par = assemble(&mesh, &mat, PlateFormulation::Dkq, 10.0, &[], &AssemblyOptions::default()).unwrap();
        let ser_opts = AssemblyOptions { parallel: false, ..Default::default() };
        let ser = assemble(&mesh, &mat, PlateFormulation::Dkq, 10.0, &[], &ser_opts).unwrap();
        assert_eq!(par.stiffness, ser.stiffness);
        assert_eq!(par.load, ser.load);
    }

    #[test]
    fn test_total_load() {
        let mat = Material::new(35000e3, 0.15, 0.1);
        let mesh = MeshBuilder::new(6.0, 4.0).divisions(3, 2).build().unwrap();
        let loads = [NodeLoad::new(4, 5.0)];
        for f in [PlateFormulation::Hermite, PlateFormulation::Dkq] {
            let sys = assemble(&mesh, &mat, f, 10.0, &loads, &AssemblyOptions::default()).unwrap();
            let ndpn = f.dofs_per_node();
            let total: f64 = (0..mesh.n_nodes()).map(|n| sys.load[n * ndpn]).sum();
            assert_relative_eq!(total, 245.0, epsilon = 1e-9);
        }
        let bad = [NodeLoad::new(99, 1.0)];
        let r = assemble(&mesh, &mat, PlateFormulation::Dkq, 0.0, &bad, &AssemblyOptions::default());
        assert!(matches!(r, Err(FEAError::NodeNotFound(99))));
    }

    #[test]
    fn test_invalid_material_aborts() {
        let mesh = MeshBuilder::new(1.0, 1.0).build().unwrap();
        let mat = Material::new(1.0, 0.6, 0.1);
        let r = assemble(&mesh, &mat, PlateFormulation::Dkq, 1.0, &[], &AssemblyOptions::default());
        assert!(matches!(r, Err(FEAError::InvalidMaterial(_))));
    }

    #[test]
    fn test_eigen_checks_flag_indefinite_stiffness() {
        let mat = Material::new(35000e3, 0.15, 0.1);
        let coords = [[0.0, 0.0], [1.0, 0.0], [1.2, 0.9], [0.1, 1.0]];
        let em = element_matrices(PlateFormulation::Dkq, 7, &coords, &mat, 0.0, 2).unwrap();
        assert!(check_element_stiffness(7, &em.stiffness).is_none());

        // A sign flip on the kernel output must be caught
        let flipped = -em.stiffness;
        let anomaly = check_element_stiffness(7, &flipped).unwrap();
        assert_eq!(anomaly.element, Some(7));
        assert!(anomaly.value < 0.0);

        let mesh = MeshBuilder::new(2.0, 1.5).divisions(3, 2).build().unwrap();
        let sys = assemble(&mesh, &mat, PlateFormulation::Hermite, 1.0, &[], &AssemblyOptions::default()).unwrap();
        assert!(check_global_stiffness(&sys.stiffness).is_none());
        let mut negated = SparseMatrixBuilder::new(sys.n_dofs());
        for (r, c, &v) in sys.stiffness.triplet_iter() {
            negated.add(r, c, -v);
        }
        let anomaly = check_global_stiffness(&negated.to_csr()).unwrap();
        assert_eq!(anomaly.element, None);
        assert!(anomaly.value < 0.0);
    }

    #[test]
    fn test_eigen_checks_pass_on_sound_mesh() {
        let mat = Material::new(35000e3, 0.15, 0.1);
        let mesh = MeshBuilder::new(6.0, 4.0).divisions(6, 4).build().unwrap();
        let options = AssemblyOptions { eigen_checks: true, ..Default::default() };
        for f in [PlateFormulation::Hermite, PlateFormulation::Dkq] {
            let sys = assemble(&mesh, &mat, f, 10.0, &[], &options).unwrap();
            assert!(sys.anomalies.is_empty(), "{}: {:?}", f.name(), sys.anomalies);
        }
    }
}
