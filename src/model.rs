//! Plate model - mesh, material, loads and supports, and the analysis run

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisOptions;
use crate::assembly::assemble;
use crate::boundary::{self, collect_constraints};
use crate::elements::{BoundaryCondition, EdgeSupports, Material};
use crate::error::{FEAError, FEAResult};
use crate::loads::{NodeLoad, PlateLoad};
use crate::math::plate::PlateFormulation;
use crate::math::sparse_matvec;
use crate::mesh::{Mesh, MeshBuilder, PlateEdge};
use crate::results::{AnalysisSummary, NumericalAnomaly, PlateSolution};
use crate::solver;

/// Relative tolerance of the vertical equilibrium check
pub const STATICS_TOLERANCE: f64 = 1e-6;

/// A plate bending model
///
/// The model is immutable during [`PlateModel::analyze`]; every run builds
/// and owns its own global system.
#[derive(Debug, Clone)]
pub struct PlateModel {
    mesh: Mesh,
    pub material: Material,
    pub formulation: PlateFormulation,
    /// Uniform pressure over every element
    pub load: PlateLoad,
    /// Transverse nodal forces
    pub point_loads: Vec<NodeLoad>,
    /// Support policy per plate edge
    pub supports: EdgeSupports,
    /// Explicit nodal constraints, applied after the edge supports
    pub conditions: Vec<BoundaryCondition>,
}

/// Input echo of a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub nodes: usize,
    pub elements: usize,
    pub formulation: PlateFormulation,
    pub material: Material,
    pub pressure: f64,
    pub supports: EdgeSupports,
}

impl PlateModel {
    /// Create an unloaded model on an existing mesh, simply supported on all edges
    pub fn new(mesh: Mesh, material: Material, formulation: PlateFormulation) -> Self {
        Self {
            mesh,
            material,
            formulation,
            load: PlateLoad::default(),
            point_loads: Vec::new(),
            supports: EdgeSupports::default(),
            conditions: Vec::new(),
        }
    }

    /// Rectangular `width × height` plate on a regular `nx × ny` grid
    pub fn rectangular(
        width: f64,
        height: f64,
        nx: usize,
        ny: usize,
        material: Material,
        formulation: PlateFormulation,
    ) -> FEAResult<Self> {
        let mesh = MeshBuilder::new(width, height).divisions(nx, ny).build()?;
        Ok(Self::new(mesh, material, formulation))
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Set the uniform pressure
    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.load = PlateLoad::new(pressure);
        self
    }

    /// Set the edge supports
    pub fn with_supports(mut self, supports: EdgeSupports) -> Self {
        self.supports = supports;
        self
    }

    /// Add a transverse force at a node
    pub fn add_node_load(&mut self, load: NodeLoad) -> FEAResult<()> {
        self.mesh.node(load.node)?;
        if !load.fz.is_finite() {
            return Err(FEAError::InvalidInput(format!(
                "node load at {} is not finite",
                load.node
            )));
        }
        self.point_loads.push(load);
        Ok(())
    }

    /// Add an explicit nodal constraint
    pub fn add_condition(&mut self, condition: BoundaryCondition) -> FEAResult<()> {
        self.mesh.node(condition.node)?;
        if condition.dof >= self.formulation.dofs_per_node() {
            return Err(FEAError::InvalidInput(format!(
                "{} nodes have {} DOFs, got DOF {}",
                self.formulation.name(),
                self.formulation.dofs_per_node(),
                condition.dof
            )));
        }
        self.conditions.push(condition);
        Ok(())
    }

    /// Sum of applied transverse loads
    pub fn total_load(&self) -> f64 {
        self.load.resultant(self.mesh.area()) + self.point_loads.iter().map(|l| l.fz).sum::<f64>()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            nodes: self.mesh.n_nodes(),
            elements: self.mesh.n_elements(),
            formulation: self.formulation,
            material: self.material,
            pressure: self.load.pressure,
            supports: self.supports,
        }
    }

    /// Run a linear static analysis
    pub fn analyze(&self, options: &AnalysisOptions) -> FEAResult<PlateSolution> {
        info!(
            "Plate analysis: {} nodes, {} {} elements, q = {}",
            self.mesh.n_nodes(),
            self.mesh.n_elements(),
            self.formulation.name(),
            self.load.pressure
        );

        let unsupported = PlateEdge::ALL.iter().all(|&e| !self.supports.on(e).is_supported());
        if unsupported && self.conditions.is_empty() {
            warn!("No edge is supported and no nodal constraints are given; expect a singular system");
        }

        let n_dofs = self.formulation.dofs_per_node() * self.mesh.n_nodes();
        let system = assemble(
            &self.mesh,
            &self.material,
            self.formulation,
            self.load.pressure,
            &self.point_loads,
            &options.assembly(n_dofs),
        )?;
        let dof_map = system.dof_map;
        let mut anomalies = system.anomalies.clone();

        let constrained = collect_constraints(&self.mesh, &dof_map, &self.supports, &self.conditions)?;
        let reduced = boundary::apply(&system, &constrained, options.boundary)?;

        info!("Solving {} equations with {:?}", reduced.n_equations(), options.solver);
        let (solution, diagnostics) = solver::solve(
            &reduced.stiffness,
            &reduced.load,
            options.solver,
            options.pivot_tolerance,
        )
        .map_err(|e| reduced.locate_singularity(e, &dof_map))?;
        debug!("Relative residual {:.3e}", diagnostics.relative_residual);

        let displacements = reduced.expand(&solution);

        // Reactions live on the constrained DOFs only
        let mut reactions = sparse_matvec(&system.stiffness, &displacements) - &system.load;
        for (g, r) in reactions.iter_mut().enumerate() {
            if !constrained.contains_key(&g) {
                *r = 0.0;
            }
        }

        let ndpn = dof_map.dofs_per_node();
        let (max_deflection_node, max_deflection) = (0..self.mesh.n_nodes())
            .map(|n| (n, displacements[n * ndpn].abs()))
            .fold((0, 0.0_f64), |best, cur| if cur.1 > best.1 { cur } else { best });

        let total_load = self.total_load();
        let total_reaction: f64 = (0..self.mesh.n_nodes()).map(|n| reactions[n * ndpn]).sum();

        if options.check_statics {
            let imbalance = total_reaction + total_load;
            let scale = total_load.abs().max(reactions.amax()).max(f64::MIN_POSITIVE);
            if imbalance.abs() > STATICS_TOLERANCE * scale {
                let anomaly = NumericalAnomaly::equilibrium(imbalance, total_load);
                warn!("{}", anomaly.message);
                anomalies.push(anomaly);
            } else {
                debug!("Statics check passed: imbalance {:.3e}", imbalance);
            }
        }

        let summary = AnalysisSummary {
            num_nodes: self.mesh.n_nodes(),
            num_elements: self.mesh.n_elements(),
            total_dofs: dof_map.n_dofs(),
            free_dofs: dof_map.n_dofs() - constrained.len(),
            constrained_dofs: constrained.len(),
            max_deflection,
            max_deflection_node,
            total_load,
            total_reaction,
        };

        info!(
            "Analysis complete: max |w| = {:.6e} at node {}",
            summary.max_deflection, summary.max_deflection_node
        );

        Ok(PlateSolution {
            mesh: self.mesh.clone(),
            material: self.material,
            dof_map,
            displacements,
            reactions,
            summary,
            diagnostics,
            anomalies,
        })
    }
}
