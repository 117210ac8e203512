//! LU decomposition solver
//!
//! Provides LU factorization with partial pivoting for solving dense linear systems.
//! Uses LAPACK when the `ndarray-linalg` feature is on, with a pure-Rust fallback.

use crate::error::SolverError;
use crate::traits::RealField;
use ndarray::{Array1, Array2, Axis};
use num_traits::Float;

#[cfg(feature = "ndarray-linalg")]
use ndarray_linalg::Solve;

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization<T: RealField> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Pivot indices
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: RealField> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, SolverError> {
        if b.len() != self.n {
            return Err(SolverError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        // Row permutation recorded as the sequence of swaps performed
        let mut x = b.clone();
        for i in 0..self.n {
            let pivot = self.pivots[i];
            if pivot != i {
                x.swap(i, pivot);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            let mut acc = x[i];
            for j in 0..i {
                acc -= self.lu[[i, j]] * x[j];
            }
            x[i] = acc;
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            let mut acc = x[i];
            for j in (i + 1)..self.n {
                acc -= self.lu[[i, j]] * x[j];
            }
            let u_ii = self.lu[[i, i]];
            if Float::abs(u_ii) < T::singular_threshold() {
                return Err(SolverError::SingularMatrix { pivot: i });
            }
            x[i] = acc / u_ii;
        }

        Ok(x)
    }

    /// Solve for every column of `b`
    pub fn solve_columns(&self, b: &Array2<T>) -> Result<Array2<T>, SolverError> {
        if b.nrows() != self.n {
            return Err(SolverError::DimensionMismatch {
                expected: self.n,
                got: b.nrows(),
            });
        }
        let mut x = Array2::zeros(b.raw_dim());
        for (j, col) in b.axis_iter(Axis(1)).enumerate() {
            let xj = self.solve(&col.to_owned())?;
            x.column_mut(j).assign(&xj);
        }
        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting (pure Rust implementation)
///
/// `pivots[k]` is the row swapped with row `k` at elimination step `k`.
pub fn lu_factorize<T: RealField>(a: &Array2<T>) -> Result<LuFactorization<T>, SolverError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = Float::abs(lu[[k, k]]);
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = Float::abs(lu[[i, k]]);
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val < T::singular_threshold() || max_val.is_nan() {
            return Err(SolverError::SingularMatrix { pivot: k });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
        }
        pivots[k] = max_row;

        // Compute multipliers and eliminate
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let mult = lu[[i, k]] / pivot;
            lu[[i, k]] = mult; // Store multiplier in L part
            if mult == T::zero() {
                continue;
            }
            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: RealField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, SolverError> {
    #[cfg(feature = "ndarray-linalg")]
    {
        a.solve(b).map_err(|e| SolverError::Backend(e.to_string()))
    }

    #[cfg(not(feature = "ndarray-linalg"))]
    {
        let factorization = lu_factorize(a)?;
        factorization.solve(b)
    }
}
