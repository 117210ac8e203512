//! Householder QR least-squares solver
//!
//! Minimises `||A X - B||₂` for an over-determined (or square) system with
//! full column rank. Used for small local fits where forming the normal
//! equations would square the condition number.

use crate::error::SolverError;
use crate::traits::RealField;
use ndarray::Array2;
use num_traits::Float;

/// Relative tolerance on `|R_jj| / max|R_ii|` below which a column is rank deficient
const RANK_TOLERANCE: f64 = 1e-12;

/// Solve the linear least-squares problem `min ||A X - B||₂` (pure Rust)
///
/// `a` is m×n with m ≥ n, `b` is m×k. Returns the n×k solution.
pub fn qr_least_squares<T: RealField>(
    a: &Array2<T>,
    b: &Array2<T>,
) -> Result<Array2<T>, SolverError> {
    let (m, n) = a.dim();
    if b.nrows() != m {
        return Err(SolverError::DimensionMismatch {
            expected: m,
            got: b.nrows(),
        });
    }
    if m < n {
        return Err(SolverError::DimensionMismatch { expected: n, got: m });
    }

    let k = b.ncols();
    let mut r = a.clone();
    let mut qtb = b.clone();
    let mut v = vec![T::zero(); m];

    for j in 0..n {
        // Householder vector for column j, rows j..m
        let mut norm_sq = T::zero();
        for i in j..m {
            norm_sq += r[[i, j]] * r[[i, j]];
        }
        let norm = Float::sqrt(norm_sq);
        if norm == T::zero() {
            return Err(SolverError::RankDeficient { column: j });
        }
        let alpha = if r[[j, j]] > T::zero() { -norm } else { norm };

        for i in j..m {
            v[i] = r[[i, j]];
        }
        v[j] -= alpha;
        let mut v_norm_sq = T::zero();
        for vi in v.iter().take(m).skip(j) {
            v_norm_sq += *vi * *vi;
        }
        if v_norm_sq == T::zero() {
            continue;
        }
        let two = T::one() + T::one();

        // Apply H = I - 2 v v^T / (v^T v) to the remaining columns of R
        for c in j..n {
            let mut dot = T::zero();
            for i in j..m {
                dot += v[i] * r[[i, c]];
            }
            let scale = two * dot / v_norm_sq;
            for i in j..m {
                r[[i, c]] -= scale * v[i];
            }
        }
        // ... and to every right-hand side
        for c in 0..k {
            let mut dot = T::zero();
            for i in j..m {
                dot += v[i] * qtb[[i, c]];
            }
            let scale = two * dot / v_norm_sq;
            for i in j..m {
                qtb[[i, c]] -= scale * v[i];
            }
        }
    }

    let r_max = (0..n)
        .map(|i| Float::abs(r[[i, i]]))
        .fold(T::zero(), |acc, x| if x > acc { x } else { acc });
    let tol = r_max * T::from_f64_lossy(RANK_TOLERANCE);
    for j in 0..n {
        if Float::abs(r[[j, j]]) <= tol || r[[j, j]].is_nan() {
            return Err(SolverError::RankDeficient { column: j });
        }
    }

    // Back substitution R x = Q^T b on the leading n rows
    let mut x = Array2::zeros((n, k));
    for c in 0..k {
        for i in (0..n).rev() {
            let mut acc = qtb[[i, c]];
            for j in (i + 1)..n {
                acc -= r[[i, j]] * x[[j, c]];
            }
            x[[i, c]] = acc / r[[i, i]];
        }
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_square_system_is_exact() {
        let a = array![[2.0_f64, 1.0], [1.0, 3.0]];
        let b = array![[3.0_f64], [5.0]];
        let x = qr_least_squares(&a, &b).unwrap();
        assert_relative_eq!(x[[0, 0]], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[[1, 0]], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_line_fit() {
        // y = 1 + 2x sampled exactly, plus one redundant row
        let a = array![[1.0_f64, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let b = array![[1.0_f64], [3.0], [5.0], [7.0]];
        let x = qr_least_squares(&a, &b).unwrap();
        assert_relative_eq!(x[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[[1, 0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noisy_fit_minimises_residual() {
        let a = array![[1.0_f64, -1.0], [1.0, 0.0], [1.0, 1.0]];
        let b = array![[0.0_f64], [1.0], [1.0]];
        let x = qr_least_squares(&a, &b).unwrap();
        // Normal equations: [3 0; 0 2] x = [2; 1]
        assert_relative_eq!(x[[0, 0]], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[[1, 0]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rank_deficient() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let b = array![[1.0_f64], [2.0], [3.0]];
        assert!(matches!(
            qr_least_squares(&a, &b),
            Err(SolverError::RankDeficient { .. })
        ));
    }

    #[test]
    fn test_underdetermined_rejected() {
        let a = array![[1.0_f64, 2.0, 3.0]];
        let b = array![[1.0_f64]];
        assert!(qr_least_squares(&a, &b).is_err());
    }
}
