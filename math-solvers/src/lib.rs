//! Dense linear solvers for panel and boundary-element methods
//!
//! This crate provides the dense direct solvers consumed by the panel-method
//! core: square solves for the influence system and small least-squares fits
//! for surface-gradient reconstruction.
//!
//! # Features
//!
//! - **Direct Solvers**: LU decomposition with partial pivoting, Householder QR least squares
//! - **Backends**: pure Rust always, LAPACK with the `ndarray-linalg` feature
//! - **Generic Scalar Types**: Works with f64 and f32
//!
//! # Example
//!
//! ```ignore
//! use math_audio_solvers::{LinearSolver, PureRustSolver};
//!
//! let solver = PureRustSolver;
//! let mu = solver.solve(&influence, &rhs)?;
//! ```

pub mod backend;
pub mod direct;
pub mod error;
pub mod traits;

pub use backend::PureRustSolver;
#[cfg(feature = "ndarray-linalg")]
pub use backend::LapackSolver;
pub use direct::{LuFactorization, lu_factorize, lu_solve, qr_least_squares};
pub use error::SolverError;
pub use traits::{LinearSolver, RealField};
