//! Potential-flow panel method core
//!
//! Quadrilateral panels carrying uniform source and doublet densities, with
//! Dirichlet or Neumann boundary conditions, wake chains and optional ground
//! or free-surface images.
//!
//! ## Architecture
//!
//! - `types`: `Vector3` and panel classification
//! - `constants`: kernel scaling and geometric tolerances
//! - `config`: per-analysis configuration (no global state)
//! - `cancel`: cooperative cancellation token
//! - `parallel`: fork-join helpers (rayon with the `native` feature)
//! - `mesh`: panel geometry, mesh arena, reference geometries
//! - `integration`: closed-form panel kernels and vortex filaments
//! - `assembly`: influence matrix, right-hand sides, wake coupling
//! - `solver`: dense solve of the unit modes
//! - `postprocess`: surface velocities, Cp, forces, field and vortons
//! - `panel_solver`: high-level API

pub mod assembly;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod integration;
pub mod mesh;
pub mod panel_solver;
pub mod parallel;
pub mod postprocess;
pub mod solver;
pub mod types;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use config::{
    AnalysisConfig, BoundaryCondition, DoubletVelocityModel, Precision, SolverBackend,
    SurfaceEffect,
};
pub use error::AnalysisError;
pub use mesh::{Panel, PanelMesh};
pub use panel_solver::{AnalysisResult, PanelAnalysis, UnitAnalysis};
pub use types::*;
