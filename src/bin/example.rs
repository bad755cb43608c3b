//! Plate Solver Example - Simply supported concrete slab
//!
//! Runs the 6 m x 4 m reference slab with both element families and compares
//! against the Navier series. Pass a JSON problem file to run a different plate.

use anyhow::{Context, Result};
use log::{debug, info};
use plate_solver::prelude::*;

fn run(problem: &PlateProblem, formulation: PlateFormulation) -> Result<()> {
    let problem = PlateProblem {
        formulation,
        ..problem.clone()
    };
    let model = problem.to_model()?;
    info!("Model: {}", serde_json::to_string(&model.info())?);
    let solution = model
        .analyze(&AnalysisOptions::default())
        .with_context(|| format!("{} analysis failed", formulation.name()))?;

    let ([x0, y0], [x1, y1]) = model.mesh().bounding_box();
    let center = model.mesh().nearest_node(0.5 * (x0 + x1), 0.5 * (y0 + y1));
    let node = model.mesh().node(center)?;
    let moments = solution.nodal_moments()?[center];
    let (m1, m2) = moments.principal();

    println!("--- {} ({} DOFs) ---", formulation.name(), solution.summary.total_dofs);
    println!("  Center node {} at ({:.3}, {:.3})", center, node.x, node.y);
    println!("  Deflection: {:.4} mm", solution.deflection_mm(center)?);
    println!("  Mx: {:.4}  My: {:.4}  Mxy: {:.4}", moments.mx, moments.my, moments.mxy);
    println!("  Principal: M1 = {:.4}  M2 = {:.4}", m1, m2);
    for &element in model.mesh().node_elements(center) {
        let m = solution.element_moments(element)?;
        println!("  Element {} center: Mx {:.4}  My {:.4}  Mxy {:.4}", element, m.mx, m.my, m.mxy);
    }
    println!(
        "  Total load: {:.3}  Total reaction: {:.3}",
        solution.summary.total_load, solution.summary.total_reaction
    );
    if let Some(cond) = solution.diagnostics.condition_estimate {
        println!("  Condition estimate: {:.3e}", cond);
    }
    for anomaly in &solution.anomalies {
        println!("  Warning: {}", anomaly.message);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let problem = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            PlateProblem::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => PlateProblem::default(),
    };
    debug!("Problem:\n{}", problem.to_json()?);

    println!("=== Plate Solver Example ===\n");
    println!(
        "Plate {} x {}, t = {}, E = {:.3e}, nu = {}, q = {}, mesh {}x{}\n",
        problem.width,
        problem.height,
        problem.thickness,
        problem.e,
        problem.nu,
        problem.pressure,
        problem.nx,
        problem.ny
    );

    for formulation in [PlateFormulation::Hermite, PlateFormulation::Dkq] {
        run(&problem, formulation)?;
    }

    if problem.supports == EdgeSupports::simply_supported() {
        let navier = problem.navier()?;
        let (cx, cy) = (0.5 * problem.width, 0.5 * problem.height);
        let m = navier.uniform_moments(problem.pressure, cx, cy);
        println!("--- Navier series ({} terms) ---", navier.terms);
        println!("  Deflection: {:.4} mm", navier.uniform_deflection(problem.pressure, cx, cy) * 1000.0);
        println!("  Mx: {:.4}  My: {:.4}", m.mx, m.my);
    }

    Ok(())
}
