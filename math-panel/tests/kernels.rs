//! Panel kernel properties: frame, self terms, far-field switch

use approx::assert_relative_eq;
use math_audio_panel::core::constants::{DEFAULT_FAR_FIELD_RATIO, PI2};
use math_audio_panel::core::mesh::generators::{ellipsoid, rectangular_wing};
use math_audio_panel::core::{Panel, Vector3};

fn quad(aspect: f64, skew: f64) -> Panel {
    Panel::new(
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(skew, aspect, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(1.0 + 0.5 * skew, aspect, 0.0),
    )
}

#[test]
fn test_normals_are_unit_and_areas_non_negative() {
    let meshes = [
        ellipsoid(2.0, 0.5, 10, 14),
        rectangular_wing(1.0, 3.0, 0.15, 8, 5, 10.0, 2),
    ];
    for mesh in &meshes {
        for p in mesh.panels.iter().chain(mesh.wake_panels.iter()) {
            assert_relative_eq!(p.normal().norm(), 1.0, epsilon = 1e-9);
            assert!(p.area() >= 0.0);
        }
    }
}

#[test]
fn test_self_influence_is_two_pi() {
    for (aspect, skew) in [(1.0, 0.0), (0.2, 0.3), (5.0, -0.4)] {
        let p = quad(aspect, skew);
        let c = p.cog();
        assert_eq!(p.doublet_potential(&c, true, 1e-5, None), PI2);
        assert_relative_eq!(
            p.source_velocity(&c, true, 1e-5, None).dot(&p.normal()),
            PI2,
            epsilon = 1e-14
        );
    }
}

#[test]
fn test_far_field_source_potential_of_flat_panel() {
    let p = Panel::new(
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 2.0, 0.0),
        Vector3::new(1.5, 0.0, 0.0),
        Vector3::new(1.5, 2.0, 0.0),
    );
    let a = p.area();
    assert_relative_eq!(a, 3.0, epsilon = 1e-12);

    // Monopole limit: -A/d; the exact integral converges to it as (size/d)²
    for (factor, tol) in [(100.0, 1e-4), (1000.0, 1e-6)] {
        let d = factor * a.sqrt();
        let c = p.cog() + p.normal() * d;
        let far = p.source_potential(&c, 1e-5, Some(DEFAULT_FAR_FIELD_RATIO));
        let near = p.source_potential(&c, 1e-5, None);
        assert_relative_eq!(far, -a / d, max_relative = 1e-12);
        assert_relative_eq!(near, far, max_relative = tol);
    }
}

#[test]
fn test_doublet_velocity_continuous_at_far_field_switch() {
    let directions = [
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(1.0, -2.0, 0.5),
        Vector3::new(0.3, 0.1, -1.0),
    ];
    let rff = DEFAULT_FAR_FIELD_RATIO;
    let mut shapes = 0;
    for aspect in [0.1, 0.2, 0.3, 0.5, 0.8, 1.0, 1.5, 2.0, 3.0, 5.0, 8.0, 10.0] {
        for skew in [0.0, 0.3] {
            let p = quad(aspect, skew);
            shapes += 1;
            let d = rff * p.max_size() * 1.0001;
            for dir in &directions {
                let c = p.cog() + dir.normalized_or_zero() * d;
                let near = p.vortex_ring_velocity(&c, 1e-5, None);
                let far = p.vortex_ring_velocity(&c, 1e-5, Some(rff));
                let edge_sums = p.doublet_velocity(&c, 1e-5, None);
                let err = (near - far).norm() / near.norm();
                assert!(
                    err < 0.01,
                    "aspect {} skew {}: near/far mismatch {:.4}",
                    aspect,
                    skew,
                    err
                );
                assert_relative_eq!((near - edge_sums).norm(), 0.0, epsilon = 1e-9 * near.norm().max(1e-12));
            }
        }
    }
    assert!(shapes >= 10);
}

#[test]
fn test_doublet_potential_jump_across_panel() {
    let p = quad(0.7, 0.1);
    let h = 1e-7;
    let above = p.doublet_potential(&(p.cog() + p.normal() * h), false, 1e-9, None);
    let below = p.doublet_potential(&(p.cog() - p.normal() * h), false, 1e-9, None);
    assert_relative_eq!(below - above, 2.0 * PI2, epsilon = 1e-5);
}
