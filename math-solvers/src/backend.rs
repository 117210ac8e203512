//! Dense solver backends
//!
//! [`PureRustSolver`] is always available. [`LapackSolver`] forwards to
//! LAPACK `gesv`/`getrf`/`gelsd` through `ndarray-linalg` and is only compiled
//! with the `ndarray-linalg` feature.

use crate::direct::{lu_factorize, qr_least_squares};
use crate::error::SolverError;
use crate::traits::{LinearSolver, RealField};
use ndarray::{Array1, Array2};

/// Portable backend: LU with partial pivoting and Householder QR
#[derive(Debug, Clone, Copy, Default)]
pub struct PureRustSolver;

impl<T: RealField> LinearSolver<T> for PureRustSolver {
    fn name(&self) -> &'static str {
        "pure-rust"
    }

    fn solve(&self, a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, SolverError> {
        lu_factorize(a)?.solve(b)
    }

    fn solve_many(&self, a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, SolverError> {
        lu_factorize(a)?.solve_columns(b)
    }

    fn least_squares(&self, a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, SolverError> {
        qr_least_squares(a, b)
    }
}

/// LAPACK backend through `ndarray-linalg`
#[cfg(feature = "ndarray-linalg")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LapackSolver;

#[cfg(feature = "ndarray-linalg")]
impl<T: RealField> LinearSolver<T> for LapackSolver {
    fn name(&self) -> &'static str {
        "lapack"
    }

    fn solve(&self, a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, SolverError> {
        use ndarray_linalg::Solve;
        a.solve(b).map_err(|e| SolverError::Backend(e.to_string()))
    }

    fn solve_many(&self, a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, SolverError> {
        use ndarray_linalg::{Factorize, Solve};
        if b.nrows() != a.nrows() {
            return Err(SolverError::DimensionMismatch {
                expected: a.nrows(),
                got: b.nrows(),
            });
        }
        let factorized = a
            .factorize()
            .map_err(|e| SolverError::Backend(e.to_string()))?;
        let mut x = Array2::zeros(b.raw_dim());
        for (j, col) in b.columns().into_iter().enumerate() {
            let xj = factorized
                .solve(&col)
                .map_err(|e| SolverError::Backend(e.to_string()))?;
            x.column_mut(j).assign(&xj);
        }
        Ok(x)
    }

    fn least_squares(&self, a: &Array2<T>, b: &Array2<T>) -> Result<Array2<T>, SolverError> {
        use ndarray_linalg::LeastSquaresSvd;
        let result = a
            .least_squares(b)
            .map_err(|e| SolverError::Backend(e.to_string()))?;
        if result.rank < a.ncols() as i32 {
            return Err(SolverError::RankDeficient {
                column: result.rank.max(0) as usize,
            });
        }
        Ok(result.solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_pure_rust_through_trait_object() {
        let solver: Box<dyn LinearSolver<f64>> = Box::new(PureRustSolver);
        let a = array![[3.0_f64, 1.0], [1.0, 2.0]];
        let b = array![9.0_f64, 8.0];
        let x = solver.solve(&a, &b).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
        assert_eq!(solver.name(), "pure-rust");
    }

    #[test]
    fn test_solve_many_matches_single_solves() {
        let a = array![[4.0_f64, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 4.0]];
        let b = array![[1.0_f64, 0.0], [0.0, 1.0], [1.0, 2.0]];
        let many = PureRustSolver.solve_many(&a, &b).unwrap();
        for j in 0..2 {
            let single =
                LinearSolver::<f64>::solve(&PureRustSolver, &a, &b.column(j).to_owned()).unwrap();
            for i in 0..3 {
                assert_relative_eq!(many[[i, j]], single[i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_reports_error() {
        let a = array![[1.0_f32, 1.0], [1.0, 1.0]];
        let b = array![1.0_f32, 2.0];
        assert!(LinearSolver::<f32>::solve(&PureRustSolver, &a, &b).is_err());
    }
}
