//! # Panel: 3D Potential-Flow Panel Method
//!
//! Solver core of a low-order panel method for lifting surfaces and closed
//! bodies in incompressible potential flow.
//!
//! ## Features
//!
//! - Closed-form uniform source and doublet quadrilateral kernels (NASA TN-4023)
//!   with a multipole far-field switch
//! - Dirichlet and Neumann boundary conditions, thin and thick surfaces
//! - Wake-chain coupling, ground and free-surface images
//! - Parallel assembly with Rayon and cooperative cancellation
//! - Surface velocity reconstruction, Cp, forces and vorton wake rows
//!

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Kernel and assembly signatures carry many parameters

pub mod core;
pub mod testing;

// Re-exports
pub use crate::core::{AnalysisConfig, AnalysisError, AnalysisResult, PanelAnalysis, PanelMesh};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (set during build)
pub const GIT_HASH: &str = env!("GIT_HASH");
