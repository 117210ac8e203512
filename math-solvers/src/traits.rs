//! Core traits for dense linear algebra
//!
//! - [`RealField`]: scalar types the dense solvers work with (`f32`, `f64`)
//! - [`LinearSolver`]: a dense solve / least-squares backend, selected at runtime

use crate::error::SolverError;
use ndarray::{Array1, Array2};
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;

/// Trait for real scalar types usable by the dense solvers.
///
/// Provided for `f64` (default) and `f32` (single-precision influence
/// matrices, half the memory footprint).
#[cfg(feature = "ndarray-linalg")]
pub trait RealField:
    Float
    + NumAssign
    + FromPrimitive
    + ToPrimitive
    + Send
    + Sync
    + Debug
    + Default
    + ndarray_linalg::Lapack<Real = Self>
    + 'static
{
    /// Pivot magnitude below which a matrix is treated as singular
    fn singular_threshold() -> Self;

    /// Lossless (f64) or rounding (f32) conversion from f64
    fn from_f64_lossy(v: f64) -> Self;

    /// Widen to f64
    fn to_f64_lossy(self) -> f64;
}

#[cfg(not(feature = "ndarray-linalg"))]
pub trait RealField:
    Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + Default + 'static
{
    /// Pivot magnitude below which a matrix is treated as singular
    fn singular_threshold() -> Self;

    /// Lossless (f64) or rounding (f32) conversion from f64
    fn from_f64_lossy(v: f64) -> Self;

    /// Widen to f64
    fn to_f64_lossy(self) -> f64;
}

impl RealField for f64 {
    #[inline]
    fn singular_threshold() -> Self {
        1e-30
    }

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}

impl RealField for f32 {
    #[inline]
    fn singular_threshold() -> Self {
        1e-30
    }

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self as f64
    }
}

/// A dense linear-system backend.
///
/// Every operation reports success or failure through `Result`; no backend
/// is allowed to panic on a singular or rank-deficient system.
pub trait LinearSolver<T: RealField>: Send + Sync {
    /// Short backend name, used in log messages
    fn name(&self) -> &'static str;

    /// Solve the square system `A x = b`
    fn solve(&self, a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, SolverError>;

    /// Solve `A X = B` for every column of `B`, factorising `A` once
    fn solve_many(&self, a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, SolverError>;

    /// Minimise `||A X - B||₂` column by column (`A` is m×n with m ≥ n)
    fn least_squares(&self, a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, SolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_f64_field() {
        let x = f64::from_f64_lossy(3.25);
        assert_relative_eq!(x, 3.25);
        assert_relative_eq!(x.to_f64_lossy(), 3.25);
        assert!(f64::singular_threshold() > 0.0);
    }

    #[test]
    fn test_f32_field() {
        let x = f32::from_f64_lossy(0.1);
        assert_relative_eq!(x.to_f64_lossy(), 0.1, epsilon = 1e-7);
    }
}
