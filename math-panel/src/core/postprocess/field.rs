//! Off-body field evaluation
//!
//! Perturbation velocity and potential at arbitrary points from a converged
//! solution. Densities are in the scaled units of the influence kernels, so
//! the sums below are the physical perturbation values:
//!
//! ```text
//! V(C) = Σ_k σ_k S_k(C) + µ_k D_k(C) + s_k µ_k W_k(C)
//! ```
//!
//! `S_k`, `D_k` are the source and doublet kernels of body panel `k` (far-field
//! switch enabled), `W_k` the doublet kernel summed along the wake chain of a
//! trailing panel, and `s_k` the shed sign (-1 on bottom panels).

use crate::core::assembly::{chain_potential, chain_velocity, kernels, shed_sign};
use crate::core::cancel::CancellationToken;
use crate::core::config::AnalysisConfig;
use crate::core::constants::PI4;
use crate::core::error::AnalysisError;
use crate::core::integration::vortex_segment_velocity;
use crate::core::mesh::PanelMesh;
use crate::core::postprocess::vortons::{VortonRow, rows_velocity_at};
use crate::core::types::Vector3;

/// Evaluates the flow induced by a solved panel mesh
pub struct FieldEvaluator<'a> {
    mesh: &'a PanelMesh,
    config: &'a AnalysisConfig,
    cancel: CancellationToken,
    vortons: &'a [VortonRow],
}

impl<'a> FieldEvaluator<'a> {
    /// Create an evaluator without a vorton wake
    pub fn new(mesh: &'a PanelMesh, config: &'a AnalysisConfig) -> Self {
        Self {
            mesh,
            config,
            cancel: CancellationToken::new(),
            vortons: &[],
        }
    }

    /// Use an externally controlled cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Include the velocity of a vorton wake
    pub fn with_vortons(mut self, rows: &'a [VortonRow]) -> Self {
        self.vortons = rows;
        self
    }

    fn check(&self, values: &[f64]) -> Result<(), AnalysisError> {
        let n = self.mesh.n_panels();
        if values.len() == n {
            Ok(())
        } else {
            Err(AnalysisError::DimensionMismatch {
                expected: n,
                got: values.len(),
            })
        }
    }

    /// Perturbation velocity at `c`
    pub fn velocity_at(&self, c: &Vector3, mu: &[f64], sigma: &[f64]) -> Result<Vector3, AnalysisError> {
        self.check(mu)?;
        self.check(sigma)?;
        let config = self.config;

        let mut v = Vector3::zero();
        for (k, panel) in self.mesh.panels.iter().enumerate() {
            if self.cancel.poll() {
                return Err(AnalysisError::Cancelled);
            }
            if !panel.is_mid() {
                v += kernels::source_velocity(panel, c, false, config, true) * sigma[k];
            }
            v += kernels::doublet_velocity(panel, c, config, true) * mu[k];
            if panel.trailing {
                let w = chain_velocity(self.mesh, panel.wake, c, config, &self.cancel)
                    .ok_or(AnalysisError::Cancelled)?;
                v += w * (shed_sign(panel) * mu[k]);
            }
        }
        if !self.vortons.is_empty() {
            v += rows_velocity_at(self.vortons, c, config);
        }
        Ok(v)
    }

    /// Perturbation potential at `c`
    pub fn potential_at(&self, c: &Vector3, mu: &[f64], sigma: &[f64]) -> Result<f64, AnalysisError> {
        self.check(mu)?;
        self.check(sigma)?;
        let config = self.config;

        let mut phi = 0.0;
        for (k, panel) in self.mesh.panels.iter().enumerate() {
            if self.cancel.poll() {
                return Err(AnalysisError::Cancelled);
            }
            if !panel.is_mid() {
                phi += kernels::source_potential(panel, c, config, true) * sigma[k];
            }
            phi += kernels::doublet_potential(panel, c, false, config, true) * mu[k];
            if panel.trailing {
                let w = chain_potential(self.mesh, panel.wake, c, config, &self.cancel)
                    .ok_or(AnalysisError::Cancelled)?;
                phi += w * shed_sign(panel) * mu[k];
            }
        }
        Ok(phi)
    }

    /// Velocity of the line-vortex far-wake model at `c`
    ///
    /// Every trailing panel sheds two straight legs of length
    /// `trefftz_distance` along +x, from `TA` with circulation `4πµ` and from
    /// `TB` with `-4πµ`. Bottom panels are oriented the other way round, so
    /// the pair of a thick trailing edge carries the doublet jump.
    pub fn far_field_velocity(&self, c: &Vector3, mu: &[f64]) -> Result<Vector3, AnalysisError> {
        self.check(mu)?;
        let leg = Vector3::new(self.config.trefftz_distance, 0.0, 0.0);
        let core = self.config.core_radius;

        let v: Vector3 = self
            .mesh
            .panels
            .iter()
            .zip(mu)
            .filter(|(p, _)| p.trailing)
            .map(|(p, m)| {
                let (ta, tb) = (p.ta(), p.tb());
                (vortex_segment_velocity(&ta, &(ta + leg), c, core)
                    - vortex_segment_velocity(&tb, &(tb + leg), c, core))
                    * *m
            })
            .sum();
        Ok(v * PI4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::generators::{ellipsoid, flat_plate};
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_doublet_sheet_potential() {
        let mesh = ellipsoid(1.0, 1.0, 8, 10);
        let config = AnalysisConfig::default();
        let mu = vec![1.0; mesh.n_panels()];
        let sigma = vec![0.0; mesh.n_panels()];
        let field = FieldEvaluator::new(&mesh, &config);
        let inside = field.potential_at(&Vector3::zero(), &mu, &sigma).unwrap();
        assert_relative_eq!(inside, PI4, epsilon = 1e-8);
        let outside = field
            .potential_at(&Vector3::new(3.0, 0.0, 0.0), &mu, &sigma)
            .unwrap();
        assert_relative_eq!(outside, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_near_wake_matches_line_vortex_model_downstream() {
        // A single thin panel with a long one-panel wake forms a horseshoe
        // whose legs coincide with the far-field model.
        let mesh = flat_plate(1.0, 4.0, 1, 1, 200.0, 1);
        let config = AnalysisConfig {
            trefftz_distance: 200.0,
            ..Default::default()
        };
        let mu = vec![0.7];
        let sigma = vec![0.0];
        let field = FieldEvaluator::new(&mesh, &config);
        let c = Vector3::new(100.0, 0.3, 0.5);
        let near = field.velocity_at(&c, &mu, &sigma).unwrap();
        let far = field.far_field_velocity(&c, &mu).unwrap();
        assert!(near.z.abs() > 1e-3);
        assert_relative_eq!(near.z, far.z, max_relative = 1e-3);
        assert_relative_eq!(near.y, far.y, epsilon = 1e-5, max_relative = 1e-2);
    }

    #[test]
    fn test_source_only_field() {
        let mesh = ellipsoid(1.0, 1.0, 4, 6);
        let config = AnalysisConfig::default();
        let n = mesh.n_panels();
        let mu = vec![0.0; n];
        let mut sigma = vec![0.0; n];
        sigma[3] = 2.0;
        let c = Vector3::new(0.2, 2.0, -1.0);
        let v = FieldEvaluator::new(&mesh, &config)
            .velocity_at(&c, &mu, &sigma)
            .unwrap();
        let expected = kernels::source_velocity(&mesh.panels[3], &c, false, &config, true) * 2.0;
        assert_relative_eq!(v.x, expected.x, epsilon = 1e-14);
        assert_relative_eq!(v.y, expected.y, epsilon = 1e-14);
        assert_relative_eq!(v.z, expected.z, epsilon = 1e-14);
    }

    #[test]
    fn test_cancelled_evaluation() {
        let mesh = flat_plate(1.0, 2.0, 4, 4, 10.0, 2);
        let config = AnalysisConfig::default();
        let n = mesh.n_panels();
        let field =
            FieldEvaluator::new(&mesh, &config).with_cancellation(CancellationToken::with_poll_limit(5));
        let r = field.velocity_at(&Vector3::new(0.5, 0.0, 1.0), &vec![1.0; n], &vec![0.0; n]);
        assert_eq!(r, Err(AnalysisError::Cancelled));
    }
}
