//! End-to-end analyses of the reference slab and related plates

use approx::assert_relative_eq;
use plate_solver::prelude::*;

const FORMULATIONS: [PlateFormulation; 2] = [PlateFormulation::Hermite, PlateFormulation::Dkq];

fn reference(formulation: PlateFormulation) -> PlateModel {
    PlateProblem { formulation, ..PlateProblem::default() }.to_model().unwrap()
}

#[test]
fn test_reference_scenario() {
    let problem = PlateProblem::default();
    let exact = problem.navier().unwrap().center_deflection(problem.pressure);

    for formulation in FORMULATIONS {
        let model = reference(formulation);
        let solution = model.analyze(&AnalysisOptions::default()).unwrap();
        let center = model.mesh().nearest_node(3.0, 2.0);

        let w_mm = solution.deflection_mm(center).unwrap();
        assert!(w_mm > 6.3 && w_mm < 7.0, "{formulation:?}: {w_mm} mm");
        assert!((w_mm / 1000.0 - exact).abs() < 0.02 * exact);

        let m = solution.nodal_moments().unwrap()[center];
        assert!(m.mx > 6.0 && m.mx < 8.0, "{formulation:?}: Mx = {}", m.mx);
        assert!(m.my > 5.0 && m.my < 13.0, "{formulation:?}: My = {}", m.my);
        assert!(m.my > m.mx);
        assert!(m.mxy.abs() < 1e-6);

        assert_eq!(solution.summary.max_deflection_node, center);
        assert_relative_eq!(solution.summary.total_load, 240.0, epsilon = 1e-9);
        assert_relative_eq!(solution.summary.total_reaction, -240.0, max_relative = 1e-8);
        assert!(solution.anomalies.is_empty());
        assert!(solution.diagnostics.relative_residual < 1e-8);
        assert!(!solution.diagnostics.ill_conditioned);
    }
}

#[test]
fn test_square_plate_symmetry() {
    let n = 4;
    for formulation in FORMULATIONS {
        let model = PlateModel::rectangular(4.0, 4.0, n, n, Material::new(35000e3, 0.2, 0.15), formulation)
            .unwrap()
            .with_pressure(5.0);
        let solution = model.analyze(&AnalysisOptions::default()).unwrap();
        let w = solution.deflections();
        let mesh = model.mesh();
        let scale = solution.summary.max_deflection;

        for ix in 0..=n {
            for iy in 0..=n {
                let here = w[mesh.grid_node(ix, iy).unwrap()];
                let rotated = w[mesh.grid_node(iy, n - ix).unwrap()];
                let mirrored = w[mesh.grid_node(n - ix, iy).unwrap()];
                assert_relative_eq!(here, rotated, epsilon = 1e-9 * scale);
                assert_relative_eq!(here, mirrored, epsilon = 1e-9 * scale);
            }
        }

        let center = mesh.grid_node(n / 2, n / 2).unwrap();
        let m = solution.nodal_moments().unwrap()[center];
        assert_relative_eq!(m.mx, m.my, max_relative = 1e-9);
    }
}

#[test]
fn test_penalty_matches_elimination() {
    for formulation in FORMULATIONS {
        let model = reference(formulation);
        let exact = model.analyze(&AnalysisOptions::default()).unwrap();
        let penalty = model
            .analyze(&AnalysisOptions::default().with_boundary(BoundaryMethod::penalty()))
            .unwrap();
        let scale = exact.summary.max_deflection;
        for (a, b) in exact.deflections().iter().zip(penalty.deflections()) {
            assert_relative_eq!(*a, b, epsilon = 1e-6 * scale);
        }
        assert_relative_eq!(
            penalty.summary.total_reaction,
            exact.summary.total_reaction,
            max_relative = 1e-6
        );
    }
}

#[test]
fn test_solvers_agree() {
    for formulation in FORMULATIONS {
        let model = reference(formulation);
        let skyline = model.analyze(&AnalysisOptions::default()).unwrap();
        let scale = skyline.displacements.amax();
        for solver in [SolverKind::Dense, SolverKind::conjugate_gradient(1e-12)] {
            let other = model
                .analyze(&AnalysisOptions::default().with_solver(solver).serial())
                .unwrap();
            assert_relative_eq!(other.displacements, skyline.displacements.clone(), epsilon = 1e-6 * scale);
        }
    }
}

#[test]
fn test_clamped_square_plate() {
    // D = 1, q = 1, a = 1: Timoshenko gives w = 0.00126 q a⁴ / D
    let material = Material::new(12.0 * (1.0 - 0.09), 0.3, 1.0);
    let model = PlateModel::rectangular(1.0, 1.0, 8, 8, material, PlateFormulation::Hermite)
        .unwrap()
        .with_pressure(1.0)
        .with_supports(EdgeSupports::clamped());
    let solution = model.analyze(&AnalysisOptions::default()).unwrap();
    let center = model.mesh().grid_node(4, 4).unwrap();
    assert_relative_eq!(solution.node_displacement(center).unwrap().w, 0.001265, max_relative = 2e-3);

    let dkq = PlateModel::rectangular(1.0, 1.0, 12, 12, material, PlateFormulation::Dkq)
        .unwrap()
        .with_pressure(1.0)
        .with_supports(EdgeSupports::clamped());
    let center = dkq.mesh().grid_node(6, 6).unwrap();
    let solution = dkq.analyze(&AnalysisOptions::default()).unwrap();
    let w = solution.node_displacement(center).unwrap().w;
    assert_relative_eq!(w, 0.001265, max_relative = 0.03);
}

#[test]
fn test_unsupported_plate_is_singular() {
    for formulation in FORMULATIONS {
        let model = reference(formulation).with_supports(EdgeSupports::free());
        match model.analyze(&AnalysisOptions::default()) {
            Err(FEAError::SingularSystem(report)) => {
                assert!(report.node.is_some());
                assert!(report.dof_name.is_some());
                let eig = &report.smallest_eigenvalues;
                assert_eq!(eig.len(), 4);
                // three rigid-body modes: w, and rotations about x and y
                for lambda in &eig[..3] {
                    assert!(lambda.abs() < 1e-6 * eig[3], "{formulation:?}: {eig:?}");
                }
            }
            other => panic!("{formulation:?}: expected singular system, got {:?}", other.map(|s| s.summary)),
        }
    }
}

#[test]
fn test_singular_report_matches_between_constraint_methods() {
    // Supported along one edge only, the plate can still rotate about it
    let supports = EdgeSupports::free().with_edge(PlateEdge::Left, EdgeSupport::SimplySupported);
    for formulation in FORMULATIONS {
        let model = reference(formulation).with_supports(supports);
        let eigenvalues = |options: AnalysisOptions| match model.analyze(&options) {
            Err(FEAError::SingularSystem(report)) => report.smallest_eigenvalues,
            other => panic!("{formulation:?}: expected singular system, got {:?}", other.map(|s| s.summary)),
        };
        let eliminated = eigenvalues(AnalysisOptions::default());
        let penalized = eigenvalues(AnalysisOptions::default().with_boundary(BoundaryMethod::penalty()));

        assert_eq!(penalized.len(), 4);
        assert!(penalized[1] > 0.0, "{formulation:?}: {penalized:?}");
        assert!(penalized[0].abs() < 1e-6 * penalized[1], "{formulation:?}: {penalized:?}");
        for (a, b) in eliminated.iter().zip(&penalized).skip(1) {
            assert_relative_eq!(*a, *b, max_relative = 1e-9);
        }
    }
}

#[test]
fn test_equilibrium_with_point_loads() {
    for formulation in FORMULATIONS {
        let mut model = reference(formulation).with_supports(EdgeSupports::clamped());
        let a = model.mesh().nearest_node(2.0, 1.0);
        let b = model.mesh().nearest_node(5.0, 3.0);
        model.add_node_load(NodeLoad::new(a, 20.0)).unwrap();
        model.add_node_load(NodeLoad::new(b, 10.0)).unwrap();

        let solution = model.analyze(&AnalysisOptions::default()).unwrap();
        assert_relative_eq!(solution.summary.total_load, 270.0, epsilon = 1e-9);
        assert_relative_eq!(solution.summary.total_reaction, -270.0, max_relative = 1e-8);
        assert!(solution.anomalies.is_empty());

        let boundary_sum: f64 = (0..model.mesh().n_nodes())
            .filter(|&n| model.mesh().is_boundary(n))
            .map(|n| solution.reaction(n).unwrap())
            .sum();
        assert_relative_eq!(boundary_sum, -270.0, max_relative = 1e-8);
    }
}

#[test]
fn test_clamping_stiffens_the_slab() {
    let json = r#"{
        "formulation": "Dkq",
        "supports": { "bottom": "Clamped", "right": "Clamped", "top": "Clamped", "left": "Clamped" }
    }"#;
    let clamped = PlateProblem::from_json(json).unwrap();
    let simply = PlateProblem { formulation: PlateFormulation::Dkq, ..PlateProblem::default() };

    let options = AnalysisOptions::default();
    let w_clamped = clamped.solve(&options).unwrap().summary.max_deflection;
    let w_simply = simply.solve(&options).unwrap().summary.max_deflection;
    assert!(w_clamped < 0.5 * w_simply);
}

#[test]
fn test_prescribed_settlement_without_load() {
    let mut model = reference(PlateFormulation::Dkq).with_pressure(0.0);
    let corner = model.mesh().grid_node(6, 4).unwrap();
    model
        .add_condition(BoundaryCondition::prescribed(corner, 0, 0.001))
        .unwrap();
    let solution = model.analyze(&AnalysisOptions::default()).unwrap();
    assert_relative_eq!(solution.node_displacement(corner).unwrap().w, 0.001);
    assert_relative_eq!(solution.summary.total_reaction, 0.0, epsilon = 1e-9);
    assert!(solution.anomalies.is_empty());
}
