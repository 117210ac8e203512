//! Per-analysis configuration
//!
//! Everything that used to be process-wide (precision, far-field ratio,
//! ground effect, ...) lives here and is passed by reference through the
//! whole call chain, so concurrent analyses never interfere.

use crate::core::constants::{
    DEFAULT_CTRL_POINT_FRACTION, DEFAULT_FAR_FIELD_RATIO, DEFAULT_VORTEX_FRACTION,
};
use crate::core::error::AnalysisError;
use crate::core::types::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Boundary condition enforced at the collocation points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    /// Zero normal velocity
    Neumann,
    /// Zero internal perturbation potential
    #[default]
    Dirichlet,
}

/// Image system used for proximity effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceEffect {
    /// Free air
    #[default]
    None,
    /// Solid ground plane at `z = -ground_height` (image of the same sign)
    Ground,
    /// Free surface at `z = -ground_height` (image of opposite sign)
    FreeSurface,
}

impl SurfaceEffect {
    /// Sign applied to the image contribution, `None` when there is no image
    pub fn image_coefficient(&self) -> Option<f64> {
        match self {
            SurfaceEffect::None => None,
            SurfaceEffect::Ground => Some(1.0),
            SurfaceEffect::FreeSurface => Some(-1.0),
        }
    }
}

/// Storage precision of the influence matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// f32 storage and solve
    Single,
    /// f64 storage and solve
    #[default]
    Double,
}

/// Kernel used for the velocity induced by a uniform doublet panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubletVelocityModel {
    /// Closed-form edge sums
    N4023,
    /// Equivalent ring of four straight vortex filaments
    #[default]
    VortexRing,
}

/// Dense solver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// LU / Householder QR in pure Rust
    #[default]
    PureRust,
    /// LAPACK through ndarray-linalg (requires the `lapack` feature)
    Lapack,
}

/// Complete configuration of one panel analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Boundary condition on thick surfaces (thin surfaces always use Neumann)
    #[serde(default)]
    pub boundary_condition: BoundaryCondition,
    /// Ground or free-surface image
    #[serde(default)]
    pub surface_effect: SurfaceEffect,
    /// Height of the body above the image plane
    #[serde(default)]
    pub ground_height: f64,
    /// Influence-matrix precision
    #[serde(default)]
    pub precision: Precision,
    /// Desingularisation radius used for field evaluations
    #[serde(default = "default_core_radius")]
    pub core_radius: f64,
    /// Far-field ratio: beyond `RFF × max_size` the multipole formulas are used
    #[serde(default = "default_far_field_ratio")]
    pub far_field_ratio: f64,
    /// Number of row blocks for parallel assembly
    #[serde(default = "default_n_blocks")]
    pub n_blocks: usize,
    /// Reference point for the rotational unit modes and moments
    #[serde(default)]
    pub reference_point: Vector3,
    /// Chordwise fraction of the control point
    #[serde(default = "default_ctrl_point_fraction")]
    pub ctrl_point_fraction: f64,
    /// Chordwise fraction of the bound vortex
    #[serde(default = "default_vortex_fraction")]
    pub vortex_fraction: f64,
    /// Doublet velocity kernel used on Neumann rows
    #[serde(default)]
    pub doublet_velocity_model: DoubletVelocityModel,
    /// Build a vorton row from the converged solution
    #[serde(default)]
    pub vorton_wake: bool,
    /// Re-solves with the vorton velocity added to the onset flow (0: rows only)
    #[serde(default = "default_vorton_iterations")]
    pub vorton_iterations: usize,
    /// Streamwise spacing of the vorton row
    #[serde(default = "default_vorton_spacing")]
    pub vorton_spacing: f64,
    /// Vorton core size δ
    #[serde(default = "default_vorton_core_size")]
    pub vorton_core_size: f64,
    /// Length of the semi-infinite trailing legs of the far-field model
    #[serde(default = "default_trefftz_distance")]
    pub trefftz_distance: f64,
    /// Dense solver backend
    #[serde(default)]
    pub solver_backend: SolverBackend,
}

fn default_core_radius() -> f64 {
    1.0e-5
}

fn default_far_field_ratio() -> f64 {
    DEFAULT_FAR_FIELD_RATIO
}

fn default_n_blocks() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_ctrl_point_fraction() -> f64 {
    DEFAULT_CTRL_POINT_FRACTION
}

fn default_vortex_fraction() -> f64 {
    DEFAULT_VORTEX_FRACTION
}

fn default_vorton_spacing() -> f64 {
    0.05
}

fn default_vorton_iterations() -> usize {
    1
}

fn default_vorton_core_size() -> f64 {
    0.02
}

fn default_trefftz_distance() -> f64 {
    100.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            boundary_condition: BoundaryCondition::default(),
            surface_effect: SurfaceEffect::default(),
            ground_height: 0.0,
            precision: Precision::default(),
            core_radius: default_core_radius(),
            far_field_ratio: default_far_field_ratio(),
            n_blocks: default_n_blocks(),
            reference_point: Vector3::zero(),
            ctrl_point_fraction: default_ctrl_point_fraction(),
            vortex_fraction: default_vortex_fraction(),
            doublet_velocity_model: DoubletVelocityModel::default(),
            vorton_wake: false,
            vorton_iterations: default_vorton_iterations(),
            vorton_spacing: default_vorton_spacing(),
            vorton_core_size: default_vorton_core_size(),
            trefftz_distance: default_trefftz_distance(),
            solver_backend: SolverBackend::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse JSON: {}", e))
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &Path) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, content).map_err(|e| format!("Failed to write config file: {}", e))
    }

    /// True when Neumann rows are used on thick surfaces
    pub fn is_neumann(&self) -> bool {
        self.boundary_condition == BoundaryCondition::Neumann
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.n_blocks == 0 {
            return Err(AnalysisError::Config("n_blocks must be at least 1".into()));
        }
        if !(self.far_field_ratio > 0.0) {
            return Err(AnalysisError::Config(format!(
                "far_field_ratio must be positive, got {}",
                self.far_field_ratio
            )));
        }
        if self.core_radius < 0.0 || !self.core_radius.is_finite() {
            return Err(AnalysisError::Config(format!(
                "core_radius must be a finite non-negative length, got {}",
                self.core_radius
            )));
        }
        for (name, value) in [
            ("ctrl_point_fraction", self.ctrl_point_fraction),
            ("vortex_fraction", self.vortex_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::Config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.surface_effect != SurfaceEffect::None && self.ground_height < 0.0 {
            return Err(AnalysisError::Config(format!(
                "ground_height must be non-negative, got {}",
                self.ground_height
            )));
        }
        if self.vorton_wake && !(self.vorton_spacing > 0.0 && self.vorton_core_size > 0.0) {
            return Err(AnalysisError::Config(
                "vorton_spacing and vorton_core_size must be positive".into(),
            ));
        }
        if self.trefftz_distance <= 0.0 {
            return Err(AnalysisError::Config(
                "trefftz_distance must be positive".into(),
            ));
        }
        if self.solver_backend == SolverBackend::Lapack && !cfg!(feature = "lapack") {
            return Err(AnalysisError::Config(
                "the lapack backend requires the `lapack` feature".into(),
            ));
        }
        Ok(())
    }
}
