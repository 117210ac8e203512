//! Direct solvers for dense linear systems
//!
//! - [`lu_solve`]: LU decomposition with partial pivoting
//! - [`qr_least_squares`]: Householder QR for over-determined systems

mod lu;
mod qr;

pub use lu::{LuFactorization, lu_factorize, lu_solve};
pub use qr::qr_least_squares;
