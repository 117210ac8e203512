//! Linear system assembly
//!
//! - [`influence`]: dense influence matrix, direct + image + wake passes
//! - [`rhs`]: unit kinematic and arbitrary-field right-hand sides
//! - [`wake`]: wake-chain coupling of the trailing panels
//! - [`kernels`]: panel kernels with the per-analysis options applied

pub mod influence;
pub mod kernels;
pub mod rhs;
pub mod wake;

pub use influence::{InfluenceMatrix, InfluenceMatrixBuilder};
pub use rhs::{RhsBuilder, RhsSet, UnitMode, source_strength};
pub use wake::{WakeCoupling, chain_potential, chain_velocity, shed_sign};
