//! Closed sphere in uniform flow against the analytical surface pressure

use approx::assert_relative_eq;
use math_audio_panel::core::mesh::generators::ellipsoid;
use math_audio_panel::core::{AnalysisConfig, PanelAnalysis, Vector3};
use math_audio_panel::testing::{sphere_surface_cp, ValidationResult};

#[test]
fn test_dirichlet_sphere_pressure() {
    let mesh = ellipsoid(1.0, 1.0, 12, 16);
    let analysis = PanelAnalysis::new(AnalysisConfig::default());
    let result = analysis.run(&mesh, 0.0, 0.0, 1.0).unwrap();

    let centre = Vector3::zero();
    let wind = Vector3::unit_x();
    let reference: Vec<f64> = mesh
        .panels
        .iter()
        .map(|p| sphere_surface_cp(&p.cog(), &centre, &wind))
        .collect();

    for (p, cp) in mesh.panels.iter().zip(&result.cp) {
        let c = p.cog();
        if c.x.abs() < 0.2 {
            assert!((-1.35..=-1.1).contains(cp), "equator cp {} at {:?}", cp, c);
        }
    }
    let stagnation = mesh
        .panels
        .iter()
        .zip(&result.cp)
        .filter(|(p, _)| p.cog().x < -0.9)
        .map(|(_, cp)| *cp)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(stagnation > 0.8, "stagnation cp {}", stagnation);

    // d'Alembert: no net force on a closed body
    assert!(result.forces.force.norm() < 0.05);
    assert_relative_eq!(result.forces.lift, 0.0, epsilon = 1e-8);
    assert_relative_eq!(result.forces.side, 0.0, epsilon = 1e-8);

    let validation = ValidationResult::new("sphere_12x16", &reference, &result.cp);
    assert_eq!(validation.n_panels, mesh.n_panels());
    assert!(
        validation.errors.l2_relative < 0.2,
        "{}",
        validation.summary()
    );
}

#[test]
fn test_sphere_solution_scales_with_speed() {
    let mesh = ellipsoid(1.0, 1.0, 10, 12);
    let unit = PanelAnalysis::new(AnalysisConfig::default())
        .solve_unit(&mesh)
        .unwrap();
    let a = unit.operating_point(0.0, 0.0, 1.0).unwrap();
    let b = unit.operating_point(0.0, 0.0, 3.0).unwrap();
    for (ca, cb) in a.cp.iter().zip(&b.cp) {
        assert_relative_eq!(ca, cb, epsilon = 1e-10);
    }
    for (ma, mb) in a.mu.iter().zip(&b.mu) {
        assert_relative_eq!(3.0 * ma, mb, epsilon = 1e-12, max_relative = 1e-10);
    }
}

#[test]
fn test_validation_record_round_trips_through_json() {
    let reference = [1.0, -0.5, -1.25];
    let computed = [0.95, -0.55, -1.2];
    let record = ValidationResult::new("tiny", &reference, &computed);

    let path = std::env::temp_dir().join(format!("panel_validation_{}.json", std::process::id()));
    record.save_json(&path).unwrap();
    let back = ValidationResult::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(back.test_name, "tiny");
    assert_relative_eq!(back.errors.l2_relative, record.errors.l2_relative, max_relative = 1e-12);
    assert!(back.summary().contains("3 panels"));
}
