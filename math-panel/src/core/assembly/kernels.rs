//! Configured influence kernels
//!
//! Thin wrappers over the panel kernels that apply the per-analysis
//! choices: doublet velocity model, core radius, far-field ratio and the
//! ground / free-surface image.
//!
//! The image of the body in the plane `z = -h` is evaluated by reflecting
//! the field point instead of the panel: `C' = (x, y, -z - 2h)`. Potentials
//! add `coef · φ'`, velocities add `coef · (Vx', Vy', -Vz')`, with `coef = +1`
//! for a solid ground and `-1` for a free surface.

use crate::core::config::{AnalysisConfig, DoubletVelocityModel};
use crate::core::mesh::Panel;
use crate::core::types::Vector3;

/// Field point reflected about the image plane
#[inline]
pub fn mirror_point(c: &Vector3, ground_height: f64) -> Vector3 {
    Vector3::new(c.x, c.y, -c.z - 2.0 * ground_height)
}

#[inline]
fn far_field(config: &AnalysisConfig, use_far_field: bool) -> Option<f64> {
    use_far_field.then_some(config.far_field_ratio)
}

/// Image contribution to a velocity, `coef · (Vx', Vy', -Vz')`
pub(crate) fn image_velocity<F>(c: &Vector3, config: &AnalysisConfig, eval: F) -> Vector3
where
    F: Fn(&Vector3) -> Vector3,
{
    match config.surface_effect.image_coefficient() {
        Some(coef) => {
            let vg = eval(&mirror_point(c, config.ground_height));
            Vector3::new(coef * vg.x, coef * vg.y, -coef * vg.z)
        }
        None => Vector3::zero(),
    }
}

/// Image contribution to a potential, `coef · φ'`
fn image_potential<F>(c: &Vector3, config: &AnalysisConfig, eval: F) -> f64
where
    F: Fn(&Vector3) -> f64,
{
    match config.surface_effect.image_coefficient() {
        Some(coef) => coef * eval(&mirror_point(c, config.ground_height)),
        None => 0.0,
    }
}

/// Velocity of a unit doublet density, with the configured model and image
pub fn doublet_velocity(
    panel: &Panel,
    c: &Vector3,
    config: &AnalysisConfig,
    use_far_field: bool,
) -> Vector3 {
    let rff = far_field(config, use_far_field);
    let core = config.core_radius;
    let eval = |p: &Vector3| match config.doublet_velocity_model {
        DoubletVelocityModel::N4023 => panel.doublet_velocity(p, core, rff),
        DoubletVelocityModel::VortexRing => panel.vortex_ring_velocity(p, core, rff),
    };
    eval(c) + image_velocity(c, config, eval)
}

/// Potential of a unit doublet density with image
///
/// The self term applies to the direct evaluation only.
pub fn doublet_potential(
    panel: &Panel,
    c: &Vector3,
    is_self: bool,
    config: &AnalysisConfig,
    use_far_field: bool,
) -> f64 {
    let rff = far_field(config, use_far_field);
    let core = config.core_radius;
    panel.doublet_potential(c, is_self, core, rff)
        + image_potential(c, config, |p| panel.doublet_potential(p, false, core, rff))
}

/// Velocity of a unit source density with image
pub fn source_velocity(
    panel: &Panel,
    c: &Vector3,
    is_self: bool,
    config: &AnalysisConfig,
    use_far_field: bool,
) -> Vector3 {
    let rff = far_field(config, use_far_field);
    let core = config.core_radius;
    panel.source_velocity(c, is_self, core, rff)
        + image_velocity(c, config, |p| panel.source_velocity(p, false, core, rff))
}

/// Potential of a unit source density with image
pub fn source_potential(
    panel: &Panel,
    c: &Vector3,
    config: &AnalysisConfig,
    use_far_field: bool,
) -> f64 {
    let rff = far_field(config, use_far_field);
    let core = config.core_radius;
    let eval = |p: &Vector3| panel.source_potential(p, core, rff);
    eval(c) + image_potential(c, config, eval)
}
