//! Testing and validation infrastructure
//!
//! Analytical reference solutions, error metrics between computed and
//! reference distributions, and a JSON record of a validation run.

use crate::core::types::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Exact surface pressure coefficient on a sphere in uniform flow
///
/// `Cp = 1 - 9/4 sin²θ`, with `θ` the angle between the surface point (taken
/// relative to `centre`) and the freestream direction `wind`.
pub fn sphere_surface_cp(point: &Vector3, centre: &Vector3, wind: &Vector3) -> f64 {
    let r = (*point - *centre).normalized_or_zero();
    let w = wind.normalized_or_zero();
    let cos = r.dot(&w);
    1.0 - 2.25 * (1.0 - cos * cos)
}

/// Error metrics between a computed and a reference distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Relative L2 error: ||computed - reference||₂ / ||reference||₂
    pub l2_relative: f64,
    /// L∞ error: max|computed - reference|
    pub linf: f64,
    /// RMS error
    pub rms: f64,
    /// Mean absolute error
    pub mean_absolute: f64,
}

impl ErrorMetrics {
    /// Compare two equally long distributions
    pub fn compute(reference: &[f64], computed: &[f64]) -> Self {
        let n = reference.len().min(computed.len());
        if n == 0 {
            return Self::default();
        }
        let diffs: Vec<f64> = reference
            .iter()
            .zip(computed)
            .map(|(r, c)| c - r)
            .collect();

        let l2_diff = diffs.iter().map(|d| d * d).sum::<f64>().sqrt();
        let l2_ref = reference[..n].iter().map(|r| r * r).sum::<f64>().sqrt();
        Self {
            l2_relative: if l2_ref > 0.0 { l2_diff / l2_ref } else { l2_diff },
            linf: diffs.iter().fold(0.0f64, |m, d| m.max(d.abs())),
            rms: l2_diff / (n as f64).sqrt(),
            mean_absolute: diffs.iter().map(|d| d.abs()).sum::<f64>() / n as f64,
        }
    }
}

/// Record of one validation case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Case name
    pub test_name: String,
    /// Number of body panels
    pub n_panels: usize,
    /// Error against the reference
    pub errors: ErrorMetrics,
    /// Library version
    pub version: String,
    /// Git commit hash
    pub git_commit: String,
}

impl ValidationResult {
    /// Build a record comparing `computed` with `reference`
    pub fn new(test_name: impl Into<String>, reference: &[f64], computed: &[f64]) -> Self {
        Self {
            test_name: test_name.into(),
            n_panels: computed.len(),
            errors: ErrorMetrics::compute(reference, computed),
            version: crate::VERSION.to_string(),
            git_commit: crate::GIT_HASH.to_string(),
        }
    }

    /// Save to JSON file
    pub fn save_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load_json(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} panels, L2 {:.3e}, Linf {:.3e}",
            self.test_name, self.n_panels, self.errors.l2_relative, self.errors.linf
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_cp_extremes() {
        let c = Vector3::zero();
        let w = Vector3::unit_x();
        assert_relative_eq!(sphere_surface_cp(&Vector3::new(-1.0, 0.0, 0.0), &c, &w), 1.0);
        assert_relative_eq!(sphere_surface_cp(&Vector3::new(0.0, 0.0, 2.0), &c, &w), -1.25);
    }

    #[test]
    fn test_error_metrics() {
        let m = ErrorMetrics::compute(&[1.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_relative_eq!(m.linf, 1.0);
        assert_relative_eq!(m.l2_relative, 1.0 / 3.0);
        assert_relative_eq!(m.mean_absolute, 1.0 / 3.0);
        assert_eq!(ErrorMetrics::compute(&[], &[]), ErrorMetrics::default());
    }
}
