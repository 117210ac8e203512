//! Analytical panel and filament influence kernels
//!
//! - [`n4023`]: uniform source and doublet quadrilaterals, near and far field
//! - [`vortex`]: straight vortex filaments and vortons

pub mod n4023;
pub mod vortex;

pub use vortex::{Vorton, vortex_segment_velocity};
