//! Straight vortex filaments and vortons

use crate::core::constants::{LENGTH_PRECISION, PI4};
use crate::core::types::Vector3;
use serde::{Deserialize, Serialize};

/// Velocity at `c` induced by a straight filament `a → b` of unit circulation
///
/// Biot-Savart law with the `1/4π` factor included. The core radius regularises
/// the kernel: points closer than `core_radius` to either end, or a filament
/// shorter than the length precision, give no contribution.
pub fn vortex_segment_velocity(a: &Vector3, b: &Vector3, c: &Vector3, core_radius: f64) -> Vector3 {
    let r0 = *b - *a;
    let r1 = *c - *a;
    let r2 = *c - *b;

    let l0 = r0.norm();
    let l1 = r1.norm();
    let l2 = r2.norm();
    if l0 < LENGTH_PRECISION || l1 < core_radius || l2 < core_radius || l1 == 0.0 || l2 == 0.0 {
        return Vector3::zero();
    }

    let cross = r1.cross(&r2);
    let denom = cross.norm_sqr() + (core_radius * l0).powi(2);
    if denom < LENGTH_PRECISION * LENGTH_PRECISION * LENGTH_PRECISION * LENGTH_PRECISION {
        return Vector3::zero();
    }

    let k = r0.dot(&(r1 / l1 - r2 / l2)) / (PI4 * denom);
    cross * k
}

/// A point vortex particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vorton {
    /// Position
    pub position: Vector3,
    /// Vector circulation (strength × length)
    pub alpha: Vector3,
}

impl Vorton {
    /// Create a vorton
    pub fn new(position: Vector3, alpha: Vector3) -> Self {
        Self { position, alpha }
    }

    /// Regularised induced velocity `α × r / 4π(|r|² + δ²)^{3/2}`
    pub fn velocity_at(&self, c: &Vector3, core_size: f64) -> Vector3 {
        let r = *c - self.position;
        let d2 = r.norm_sqr() + core_size * core_size;
        if d2 <= 0.0 {
            return Vector3::zero();
        }
        self.alpha.cross(&r) / (PI4 * d2 * d2.sqrt())
    }

    /// Magnitude of the vector circulation
    pub fn strength(&self) -> f64 {
        self.alpha.norm()
    }
}
