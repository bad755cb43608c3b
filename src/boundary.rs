//! Boundary condition enforcement
//!
//! Edge supports and explicit nodal constraints are expanded to a map of
//! constrained global DOFs, then enforced on the assembled system either
//! exactly by elimination (`K_ff u_f = F_f − K_fc u_c`) or approximately by
//! penalty augmentation.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use crate::assembly::{DofMap, GlobalSystem};
use crate::elements::{BoundaryCondition, DofConstraint, EdgeSupports};
use crate::error::{FEAError, FEAResult};
use crate::math::{dense_submatrix, smallest_eigenvalues, SparseMatrixBuilder};
use crate::mesh::{Mesh, PlateEdge};

/// Penalty stiffness used when none is given
pub const DEFAULT_PENALTY: f64 = 1e20;

/// How constrained DOFs are enforced
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BoundaryMethod {
    /// Partition into free and constrained DOFs and solve the reduced system
    #[default]
    Elimination,
    /// Add `stiffness` to the constrained diagonal terms (approximate)
    Penalty { stiffness: f64 },
}

impl BoundaryMethod {
    /// Penalty method with the default stiffness
    pub fn penalty() -> Self {
        BoundaryMethod::Penalty { stiffness: DEFAULT_PENALTY }
    }
}

/// Expand edge supports and explicit conditions to `global DOF → value`
///
/// Explicit conditions are applied after the edge supports, so they can
/// prescribe a non-zero value on a supported DOF or release it with
/// [`DofConstraint::Free`].
pub fn collect_constraints(
    mesh: &Mesh,
    dof_map: &DofMap,
    supports: &EdgeSupports,
    conditions: &[BoundaryCondition],
) -> FEAResult<BTreeMap<usize, f64>> {
    let mut constrained = BTreeMap::new();

    for edge in PlateEdge::ALL {
        let dofs = supports.on(edge).restrained_dofs(edge, dof_map.dofs_per_node());
        for &node in mesh.boundary_nodes(edge) {
            for &local in &dofs {
                constrained.insert(dof_map.global(node, local)?, 0.0);
            }
        }
    }

    for bc in conditions {
        let g = dof_map.global(bc.node, bc.dof)?;
        match bc.kind {
            DofConstraint::Free => {
                constrained.remove(&g);
            }
            DofConstraint::Fixed | DofConstraint::Prescribed(_) => {
                let value = bc.kind.value().unwrap_or(0.0);
                if !value.is_finite() {
                    return Err(FEAError::InvalidInput(format!(
                        "prescribed value at node {} DOF {} is not finite",
                        bc.node, bc.dof
                    )));
                }
                constrained.insert(g, value);
            }
        }
    }

    debug!("{} constrained DOFs of {}", constrained.len(), dof_map.n_dofs());
    Ok(constrained)
}

/// The system actually handed to the linear solver
#[derive(Debug, Clone)]
pub struct ConstrainedSystem {
    pub stiffness: CsrMatrix<f64>,
    pub load: DVector<f64>,
    /// Global DOF of each solver equation
    pub equations: Vec<usize>,
    /// Constrained global DOFs and their values
    pub constrained: BTreeMap<usize, f64>,
    pub method: BoundaryMethod,
    n_dofs: usize,
}

impl ConstrainedSystem {
    /// Number of solver equations
    pub fn n_equations(&self) -> usize {
        self.equations.len()
    }

    /// Scatter a solver solution back to the full DOF vector
    pub fn expand(&self, solution: &DVector<f64>) -> DVector<f64> {
        let mut u = DVector::zeros(self.n_dofs);
        for (i, &g) in self.equations.iter().enumerate() {
            u[g] = solution[i];
        }
        if matches!(self.method, BoundaryMethod::Elimination) {
            for (&g, &value) in &self.constrained {
                u[g] = value;
            }
        }
        u
    }

    /// Map a singular-system report from solver equations back to node and DOF
    ///
    /// Under the penalty method the eigenvalues attached by the solver are
    /// recomputed on the unpenalized block, where the unrestrained modes live.
    pub fn locate_singularity(&self, err: FEAError, dof_map: &DofMap) -> FEAError {
        match err {
            FEAError::SingularSystem(mut report) => {
                if matches!(self.method, BoundaryMethod::Penalty { .. })
                    && !report.smallest_eigenvalues.is_empty()
                {
                    report.smallest_eigenvalues = smallest_eigenvalues(&self.unpenalized_stiffness(), 4);
                }
                if let Some(&g) = self.equations.get(report.equation) {
                    let (node, _) = dof_map.locate(g);
                    report.equation = g;
                    report.node = Some(node);
                    report.dof_name = Some(dof_map.dof_name(g));
                }
                FEAError::SingularSystem(report)
            }
            other => other,
        }
    }

    /// Dense stiffness over the solver equations that carry no constraint
    ///
    /// For elimination this is the whole reduced matrix.
    pub fn unpenalized_stiffness(&self) -> DMatrix<f64> {
        let keep: Vec<usize> = self
            .equations
            .iter()
            .enumerate()
            .filter(|(_, g)| !self.constrained.contains_key(g))
            .map(|(i, _)| i)
            .collect();
        dense_submatrix(&self.stiffness, &keep)
    }
}

/// Enforce the constrained DOFs on an assembled system
pub fn apply(
    system: &GlobalSystem,
    constrained: &BTreeMap<usize, f64>,
    method: BoundaryMethod,
) -> FEAResult<ConstrainedSystem> {
    let n = system.n_dofs();
    if let Some(&g) = constrained.keys().find(|&&g| g >= n) {
        return Err(FEAError::AssemblyInconsistency(format!(
            "constrained DOF {g} is outside the {n}-DOF system"
        )));
    }

    match method {
        BoundaryMethod::Elimination => eliminate(system, constrained),
        BoundaryMethod::Penalty { stiffness } => penalize(system, constrained, stiffness),
    }
}

fn eliminate(system: &GlobalSystem, constrained: &BTreeMap<usize, f64>) -> FEAResult<ConstrainedSystem> {
    let n = system.n_dofs();
    let equations: Vec<usize> = (0..n).filter(|g| !constrained.contains_key(g)).collect();
    if equations.is_empty() {
        return Err(FEAError::NoFreeDofs);
    }

    let mut reduced_index = vec![None; n];
    for (i, &g) in equations.iter().enumerate() {
        reduced_index[g] = Some(i);
    }

    let mut builder = SparseMatrixBuilder::new(equations.len());
    let mut load = DVector::from_iterator(equations.len(), equations.iter().map(|&g| system.load[g]));

    for (r, c, &v) in system.stiffness.triplet_iter() {
        let Some(ri) = reduced_index[r] else { continue };
        match reduced_index[c] {
            Some(ci) => builder.add(ri, ci, v),
            None => load[ri] -= v * constrained[&c],
        }
    }

    info!(
        "Elimination: {} free / {} constrained DOFs",
        equations.len(),
        constrained.len()
    );

    Ok(ConstrainedSystem {
        stiffness: builder.to_csr(),
        load,
        equations,
        constrained: constrained.clone(),
        method: BoundaryMethod::Elimination,
        n_dofs: n,
    })
}

fn penalize(
    system: &GlobalSystem,
    constrained: &BTreeMap<usize, f64>,
    penalty: f64,
) -> FEAResult<ConstrainedSystem> {
    if !(penalty.is_finite() && penalty > 0.0) {
        return Err(FEAError::InvalidInput(format!(
            "penalty stiffness must be positive and finite, got {penalty}"
        )));
    }
    let n = system.n_dofs();
    let max_diag = system.max_diagonal();
    if penalty < 1e6 * max_diag {
        warn!(
            "Penalty stiffness {:.3e} is less than 1e6 x the largest diagonal term {:.3e}; constrained DOFs will not be held accurately",
            penalty, max_diag
        );
    }

    let mut builder = SparseMatrixBuilder::new(n);
    for (r, c, &v) in system.stiffness.triplet_iter() {
        builder.add(r, c, v);
    }
    let mut load = system.load.clone();
    for (&g, &value) in constrained {
        builder.add(g, g, penalty);
        load[g] += penalty * value;
    }

    info!(
        "Penalty: {} constrained DOFs with k = {:.3e}",
        constrained.len(),
        penalty
    );

    Ok(ConstrainedSystem {
        stiffness: builder.to_csr(),
        load,
        equations: (0..n).collect(),
        constrained: constrained.clone(),
        method: BoundaryMethod::Penalty { stiffness: penalty },
        n_dofs: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{assemble, AssemblyOptions};
    use crate::elements::{EdgeSupport, Material};
    use crate::math::plate::PlateFormulation;
    use crate::math::to_dense;
    use crate::mesh::MeshBuilder;

    fn setup(f: PlateFormulation) -> (Mesh, GlobalSystem) {
        let mesh = MeshBuilder::new(3.0, 2.0).divisions(3, 2).build().unwrap();
        let mat = Material::new(35000e3, 0.15, 0.1);
        let sys = assemble(&mesh, &mat, f, 10.0, &[], &AssemblyOptions::default()).unwrap();
        (mesh, sys)
    }

    #[test]
    fn test_simply_supported_dof_sets() {
        let (mesh, sys) = setup(PlateFormulation::Dkq);
        let map = sys.dof_map;
        let c = collect_constraints(&mesh, &map, &EdgeSupports::simply_supported(), &[]).unwrap();

        // Corner node 0: w and both slopes
        assert!(c.contains_key(&0) && c.contains_key(&1) && c.contains_key(&2));
        // Bottom edge node 3 (ix = 1): w and x-slope only
        assert!(c.contains_key(&9) && c.contains_key(&10) && !c.contains_key(&11));
        // Left edge node 1 (iy = 1): w and y-slope only
        assert!(c.contains_key(&3) && !c.contains_key(&4) && c.contains_key(&5));
        // Interior node 4
        assert!((12..15).all(|g| !c.contains_key(&g)));
    }

    #[test]
    fn test_explicit_conditions_override_edges() {
        let (mesh, sys) = setup(PlateFormulation::Hermite);
        let map = sys.dof_map;
        let supports = EdgeSupports::free().with_edge(PlateEdge::Left, EdgeSupport::Clamped);
        let extra = [
            BoundaryCondition::prescribed(4, 0, 0.01),
            BoundaryCondition { node: 0, dof: 3, kind: DofConstraint::Free },
        ];
        let c = collect_constraints(&mesh, &map, &supports, &extra).unwrap();
        assert_eq!(c.get(&16), Some(&0.01));
        assert!(!c.contains_key(&3));
        assert!(c.contains_key(&7));
        let bad = [BoundaryCondition::fixed(0, 4)];
        assert!(collect_constraints(&mesh, &map, &supports, &bad).is_err());
    }

    #[test]
    fn test_elimination_reduces_system() {
        let (mesh, sys) = setup(PlateFormulation::Dkq);
        let c = collect_constraints(&mesh, &sys.dof_map, &EdgeSupports::clamped(), &[]).unwrap();
        let cs = apply(&sys, &c, BoundaryMethod::Elimination).unwrap();
        // 2 interior nodes remain free
        assert_eq!(cs.n_equations(), 6);
        assert_eq!(cs.stiffness.nrows(), 6);
        let u = cs.expand(&DVector::from_element(6, 1.0));
        assert_eq!(u.len(), 36);
        assert_eq!(u[0], 0.0);
        assert_eq!(u[12], 1.0);
    }

    #[test]
    fn test_all_constrained_is_rejected() {
        let (mesh, sys) = setup(PlateFormulation::Dkq);
        let extra: Vec<_> = (0..mesh.n_nodes())
            .flat_map(|n| (0..3).map(move |d| BoundaryCondition::fixed(n, d)))
            .collect();
        let c = collect_constraints(&mesh, &sys.dof_map, &EdgeSupports::free(), &extra).unwrap();
        assert!(matches!(apply(&sys, &c, BoundaryMethod::Elimination), Err(FEAError::NoFreeDofs)));
    }

    #[test]
    fn test_penalty_augments_diagonal() {
        let (mesh, sys) = setup(PlateFormulation::Dkq);
        let extra = [BoundaryCondition::prescribed(4, 0, 0.002)];
        let c = collect_constraints(&mesh, &sys.dof_map, &EdgeSupports::free(), &extra).unwrap();
        let cs = apply(&sys, &c, BoundaryMethod::penalty()).unwrap();
        assert_eq!(cs.n_equations(), sys.n_dofs());
        assert!((cs.load[12] - (sys.load[12] + 1e20 * 0.002)).abs() < 1e6);
        assert!(apply(&sys, &c, BoundaryMethod::Penalty { stiffness: -1.0 }).is_err());
    }

    #[test]
    fn test_unpenalized_block_matches_elimination() {
        let (mesh, sys) = setup(PlateFormulation::Hermite);
        let supports = EdgeSupports::free().with_edge(PlateEdge::Left, EdgeSupport::SimplySupported);
        let c = collect_constraints(&mesh, &sys.dof_map, &supports, &[]).unwrap();
        let eliminated = apply(&sys, &c, BoundaryMethod::Elimination).unwrap();
        let penalized = apply(&sys, &c, BoundaryMethod::penalty()).unwrap();
        assert_eq!(penalized.unpenalized_stiffness(), to_dense(&eliminated.stiffness));
        assert_eq!(eliminated.unpenalized_stiffness(), to_dense(&eliminated.stiffness));
    }
}
