//! Numerical constants of the panel method

use std::f64::consts::PI;

/// 4π
pub const PI4: f64 = 4.0 * PI;

/// 2π
pub const PI2: f64 = 2.0 * PI;

/// Corners closer than this (on every axis) are the same node.
///
/// Collapsed edges contribute nothing to the frame nor to the kernels.
pub const COINCIDENT_TOLERANCE: f64 = 1.0e-3;

/// Normal distance below which a field point is treated as lying in the panel plane
pub const INPLANE_PRECISION: f64 = 1.0e-10;

/// Lengths below this are treated as zero
pub const LENGTH_PRECISION: f64 = 1.0e-9;

/// Angles (radians) below this are treated as zero
pub const ANGLE_PRECISION: f64 = 1.0e-6;

/// Three CoGs closer than this angle (degrees) to a straight line use the 1D regression
pub const COLLINEAR_ANGLE_DEG: f64 = 35.0;

/// Default far-field ratio RFF
pub const DEFAULT_FAR_FIELD_RATIO: f64 = 20.0;

/// Default chordwise fraction of the control point
pub const DEFAULT_CTRL_POINT_FRACTION: f64 = 0.75;

/// Default chordwise fraction of the bound vortex
pub const DEFAULT_VORTEX_FRACTION: f64 = 0.25;
