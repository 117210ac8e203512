//! Pressure coefficients and panel forces
//!
//! On a thick panel the surface velocity is the in-plane component of the
//! freestream plus the reconstructed perturbation velocity:
//!
//! ```text
//! Cp = 1 - |V_t|² / |V∞|²
//! ```
//!
//! A thin (mid) panel carries a velocity jump instead. Half of it is added on
//! the upper side and subtracted on the lower side (NASA TN-4023 §3.4), and
//! the panel reports `Cp_upper - Cp_lower`.

use crate::core::error::AnalysisError;
use crate::core::mesh::PanelMesh;
use crate::core::types::Vector3;
use serde::{Deserialize, Serialize};

fn check_len(expected: usize, got: usize) -> Result<(), AnalysisError> {
    if expected == got {
        Ok(())
    } else {
        Err(AnalysisError::DimensionMismatch { expected, got })
    }
}

/// Pressure coefficient of every body panel
///
/// `local_velocities` are the perturbation velocities in each panel frame
/// and `v_inf` the freestream velocity in the same units.
pub fn pressure_coefficients(
    mesh: &PanelMesh,
    local_velocities: &[Vector3],
    v_inf: &Vector3,
) -> Result<Vec<f64>, AnalysisError> {
    let onset = vec![*v_inf; mesh.n_panels()];
    pressure_coefficients_in_field(mesh, local_velocities, &onset, v_inf.norm())
}

/// Pressure coefficients under a non-uniform onset flow
///
/// `onset[k]` is the onset velocity at panel `k` (freestream plus any
/// velocity induced from outside the body, e.g. by vortons) and `q_ref` the
/// reference speed of the coefficients.
pub fn pressure_coefficients_in_field(
    mesh: &PanelMesh,
    local_velocities: &[Vector3],
    onset: &[Vector3],
    q_ref: f64,
) -> Result<Vec<f64>, AnalysisError> {
    check_len(mesh.n_panels(), local_velocities.len())?;
    check_len(mesh.n_panels(), onset.len())?;
    let q2 = q_ref * q_ref;
    if !(q2 > 0.0) {
        return Err(AnalysisError::Config(
            "pressure coefficients need a non-zero freestream".into(),
        ));
    }
    let cp_of = |v: &Vector3| 1.0 - (v.x * v.x + v.y * v.y) / q2;

    Ok(mesh
        .panels
        .iter()
        .zip(local_velocities.iter().zip(onset))
        .map(|(panel, (vl, v))| {
            let onset = panel.global_to_local(v);
            if panel.is_mid() {
                let half = *vl * 0.5;
                cp_of(&(onset + half)) - cp_of(&(onset - half))
            } else {
                cp_of(&(onset + *vl))
            }
        })
        .collect())
}

/// Integrated pressure force in freestream-dynamic-pressure units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelForces {
    /// `Σ -Cp · area · n` in the body axes
    pub force: Vector3,
    /// Component normal to the freestream in the x-z plane
    pub lift: f64,
    /// Component along the freestream in the x-z plane
    pub drag: f64,
    /// Spanwise component
    pub side: f64,
    /// Pressure moment about the reference point in the body axes
    ///
    /// `x` is the rolling, `y` the pitching and `z` the yawing moment.
    pub moment: Vector3,
}

/// Sum the panel pressure forces and moments and rotate the force into wind axes
///
/// `alpha` is the angle of attack in degrees and `reference_point` the
/// moment centre. Divide by a reference area (and length, for moments) to
/// get coefficients.
pub fn panel_forces(
    mesh: &PanelMesh,
    cp: &[f64],
    alpha: f64,
    reference_point: &Vector3,
) -> Result<PanelForces, AnalysisError> {
    check_len(mesh.n_panels(), cp.len())?;
    let (force, moment) = mesh.panels.iter().zip(cp).fold(
        (Vector3::zero(), Vector3::zero()),
        |(force, moment), (panel, cp)| {
            let f = panel.normal() * (-cp * panel.area());
            (force + f, moment + (panel.cog() - *reference_point).cross(&f))
        },
    );

    let (sina, cosa) = alpha.to_radians().sin_cos();
    Ok(PanelForces {
        force,
        lift: force.z * cosa - force.x * sina,
        drag: force.x * cosa + force.z * sina,
        side: force.y,
        moment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::generators::{flat_plate, rectangular_wing};
    use approx::assert_relative_eq;

    #[test]
    fn test_thick_panel_cp_limits() {
        let mesh = rectangular_wing(1.0, 2.0, 0.12, 4, 2, 5.0, 1);
        let zero = vec![Vector3::zero(); mesh.n_panels()];
        // freestream along the top-surface normal of the mid-chord panel: stagnation
        let k = 2;
        let n = mesh.panels[k].normal();
        let cp = pressure_coefficients(&mesh, &zero, &(n * 3.0)).unwrap();
        assert_relative_eq!(cp[k], 1.0, epsilon = 1e-12);

        // tangential flow with a perturbation that doubles the speed
        let t = mesh.panels[k].l() * 2.0;
        let mut local = zero.clone();
        local[k] = Vector3::new(2.0, 0.0, 0.0);
        let cp = pressure_coefficients(&mesh, &local, &t).unwrap();
        assert_relative_eq!(cp[k], -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_thin_panel_reports_pressure_jump() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let a = 0.3;
        let local = vec![Vector3::new(a, 0.0, 0.0); mesh.n_panels()];
        let cp = pressure_coefficients(&mesh, &local, &Vector3::unit_x()).unwrap();
        for value in cp {
            assert_relative_eq!(value, -2.0 * a, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_freestream_rejected() {
        let mesh = flat_plate(1.0, 1.0, 1, 1, 5.0, 1);
        let r = pressure_coefficients(&mesh, &[Vector3::zero()], &Vector3::zero());
        assert!(matches!(r, Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_uniform_suction_on_plate_gives_lift() {
        let mesh = flat_plate(2.0, 3.0, 3, 2, 5.0, 1);
        let cp = vec![-1.0; mesh.n_panels()];
        let f = panel_forces(&mesh, &cp, 0.0, &Vector3::zero()).unwrap();
        assert_relative_eq!(f.lift, 6.0, epsilon = 1e-12);
        assert_relative_eq!(f.drag, 0.0, epsilon = 1e-12);

        let f = panel_forces(&mesh, &cp, 90.0, &Vector3::zero()).unwrap();
        assert_relative_eq!(f.drag, 6.0, epsilon = 1e-12);
        assert_relative_eq!(f.lift, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_suction_on_plate_pitches_about_reference_point() {
        // centroid at x = 1, lift 6
        let mesh = flat_plate(2.0, 3.0, 4, 2, 5.0, 1);
        let cp = vec![-1.0; mesh.n_panels()];

        let f = panel_forces(&mesh, &cp, 0.0, &Vector3::zero()).unwrap();
        assert_relative_eq!(f.moment.y, -6.0, epsilon = 1e-12);
        assert_relative_eq!(f.moment.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(f.moment.z, 0.0, epsilon = 1e-12);

        let f = panel_forces(&mesh, &cp, 0.0, &Vector3::new(0.5, 0.0, 0.0)).unwrap();
        assert_relative_eq!(f.moment.y, -3.0, epsilon = 1e-12);
        let f = panel_forces(&mesh, &cp, 0.0, &Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(f.moment.y, 0.0, epsilon = 1e-12);

        // lift on the +y half only rolls the plate
        let cp: Vec<f64> = mesh
            .panels
            .iter()
            .map(|p| if p.cog().y > 0.0 { -1.0 } else { 0.0 })
            .collect();
        let f = panel_forces(&mesh, &cp, 0.0, &Vector3::new(1.0, 0.0, 0.0)).unwrap();
        // 3 units of lift at y = 0.75
        assert_relative_eq!(f.moment.x, 2.25, epsilon = 1e-12);
        assert_relative_eq!(f.moment.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_onset_field_enters_the_pressure() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let zero = vec![Vector3::zero(); mesh.n_panels()];
        let q = Vector3::unit_x();
        let uniform = pressure_coefficients(&mesh, &zero, &q).unwrap();
        let onset = vec![q; mesh.n_panels()];
        let same = pressure_coefficients_in_field(&mesh, &zero, &onset, 1.0).unwrap();
        assert_eq!(uniform, same);

        // thick panels: a faster local onset lowers the pressure
        let wing = rectangular_wing(1.0, 2.0, 0.12, 4, 2, 5.0, 1);
        let zero = vec![Vector3::zero(); wing.n_panels()];
        let k = 2;
        let t = wing.panels[k].l();
        let mut onset = vec![t; wing.n_panels()];
        onset[k] = t * 2.0;
        let cp = pressure_coefficients_in_field(&wing, &zero, &onset, 1.0).unwrap();
        assert_relative_eq!(cp[k], -3.0, epsilon = 1e-12);

        let r = pressure_coefficients_in_field(&wing, &zero, &onset[1..], 1.0);
        assert!(matches!(r, Err(AnalysisError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_closed_body_uniform_cp_has_no_force() {
        let mesh = rectangular_wing(1.0, 2.0, 0.12, 6, 3, 5.0, 1);
        let cp = vec![0.4; mesh.n_panels()];
        let f = panel_forces(&mesh, &cp, 3.0, &Vector3::zero()).unwrap();
        assert_relative_eq!(f.force.norm(), 0.0, epsilon = 1e-10);
    }
}
