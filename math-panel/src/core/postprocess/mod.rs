//! Post-processing of a converged solution
//!
//! - [`local_velocity`]: tangential velocities from the doublet-density gradient
//! - [`cp`]: pressure coefficients and integrated forces
//! - [`field`]: off-body velocity and potential, far-wake model
//! - [`vortons`]: vorton rows shed from the trailing edge

pub mod cp;
pub mod field;
pub mod local_velocity;
pub mod vortons;

pub use cp::{PanelForces, panel_forces, pressure_coefficients, pressure_coefficients_in_field};
pub use field::FieldEvaluator;
pub use local_velocity::{LocalVelocityReconstructor, line_fit, unfolded_cog};
pub use vortons::{VortexSegment, VortonRow, build_vorton_rows, kelvin_residual, rows_velocity_at};
