//! Solve stage
//!
//! The influence matrix is factorised once and the six unit right-hand
//! sides are back-substituted together. Operating points are then linear
//! combinations of the unit solutions.
//!
//! Backends come from `math-audio-solvers` and are picked at run time from
//! the analysis configuration.

use crate::core::assembly::{InfluenceMatrix, RhsSet, UnitMode};
use crate::core::config::{AnalysisConfig, SolverBackend};
use crate::core::error::AnalysisError;
use crate::core::types::Vector3;
use ndarray::{Array1, Array2};
use solvers::{LinearSolver, PureRustSolver, RealField};

/// Dense solver selected by the configuration
pub fn select_solver<T: RealField>(
    config: &AnalysisConfig,
) -> Result<Box<dyn LinearSolver<T>>, AnalysisError> {
    match config.solver_backend {
        SolverBackend::PureRust => Ok(Box::new(PureRustSolver)),
        #[cfg(feature = "lapack")]
        SolverBackend::Lapack => Ok(Box::new(solvers::LapackSolver)),
        #[cfg(not(feature = "lapack"))]
        SolverBackend::Lapack => Err(AnalysisError::Config(
            "the lapack backend requires the `lapack` feature".into(),
        )),
    }
}

/// Freestream direction for angle of attack `alpha` and sideslip `beta` (degrees)
///
/// `(cos α cos β', sin β', sin α cos β')` with `β' = -β`.
pub fn wind_direction(alpha: f64, beta: f64) -> Vector3 {
    let (sina, cosa) = alpha.to_radians().sin_cos();
    let (sinb, cosb) = (-beta).to_radians().sin_cos();
    Vector3::new(cosa * cosb, sinb, sina * cosb)
}

fn solve_columns<T: RealField>(
    matrix: &Array2<T>,
    rhs: &RhsSet,
    config: &AnalysisConfig,
) -> Result<[Array1<f64>; 6], AnalysisError> {
    let n = matrix.nrows();
    let mut b = Array2::<T>::zeros((n, 6));
    for (m, column) in rhs.unit.iter().enumerate() {
        if column.len() != n {
            return Err(AnalysisError::DimensionMismatch {
                expected: n,
                got: column.len(),
            });
        }
        for (i, v) in column.iter().enumerate() {
            b[[i, m]] = T::from_f64_lossy(*v);
        }
    }

    let solver = select_solver::<T>(config)?;
    log::info!("Solving {}x{} system with the {} backend", n, n, solver.name());
    let x = solver.solve_many(matrix, &b).map_err(|e| {
        log::error!("Unconverged: {}", e);
        AnalysisError::from(e)
    })?;

    let solution = std::array::from_fn(|m| x.column(m).mapv(|v| v.to_f64_lossy()));
    Ok(solution)
}

fn solve_vector<T: RealField>(
    matrix: &Array2<T>,
    rhs: &Array1<f64>,
    config: &AnalysisConfig,
) -> Result<Array1<f64>, AnalysisError> {
    let n = matrix.nrows();
    if rhs.len() != n {
        return Err(AnalysisError::DimensionMismatch {
            expected: n,
            got: rhs.len(),
        });
    }
    let b = rhs.mapv(T::from_f64_lossy);
    let solver = select_solver::<T>(config)?;
    log::debug!("Solving one right-hand side with the {} backend", solver.name());
    let x = solver.solve(matrix, &b).map_err(|e| {
        log::error!("Unconverged: {}", e);
        AnalysisError::from(e)
    })?;
    Ok(x.mapv(|v| v.to_f64_lossy()))
}

/// Doublet densities for one arbitrary right-hand side
///
/// Used for onset fields that are not a combination of the unit modes, such
/// as the velocity induced by a vorton wake.
pub fn solve_doublets(
    matrix: &InfluenceMatrix,
    rhs: &Array1<f64>,
    config: &AnalysisConfig,
) -> Result<Array1<f64>, AnalysisError> {
    let mu = match matrix {
        InfluenceMatrix::Single(a) => solve_vector(a, rhs, config)?,
        InfluenceMatrix::Double(a) => solve_vector(a, rhs, config)?,
    };
    if mu.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::SolverFailure(
            "solution contains non-finite doublet densities".into(),
        ));
    }
    Ok(mu)
}

/// Doublet and source densities of the six unit kinematic modes
#[derive(Debug, Clone, PartialEq)]
pub struct DoubletSolution {
    /// Doublet densities, one vector per [`UnitMode`]
    pub mu: [Array1<f64>; 6],
    /// Source densities, one vector per [`UnitMode`]
    pub sigma: [Array1<f64>; 6],
}

impl DoubletSolution {
    /// Factorise the influence matrix once and solve all six unit modes
    pub fn solve_unit(
        matrix: &InfluenceMatrix,
        rhs: &RhsSet,
        sigma: [Array1<f64>; 6],
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        let mu = match matrix {
            InfluenceMatrix::Single(a) => solve_columns(a, rhs, config)?,
            InfluenceMatrix::Double(a) => solve_columns(a, rhs, config)?,
        };
        if mu.iter().any(|m| m.iter().any(|v| !v.is_finite())) {
            return Err(AnalysisError::SolverFailure(
                "solution contains non-finite doublet densities".into(),
            ));
        }
        Ok(Self { mu, sigma })
    }

    /// Unit solution of one mode
    pub fn mode(&self, mode: UnitMode) -> &Array1<f64> {
        &self.mu[mode as usize]
    }

    fn combine(columns: &[Array1<f64>; 6], alpha: f64, beta: f64) -> Array1<f64> {
        let wind = wind_direction(alpha, beta);
        &columns[0] * wind.x + &columns[1] * wind.y + &columns[2] * wind.z
    }

    /// Doublet densities for a unit freestream at `alpha`, `beta` (degrees)
    ///
    /// A single uniform value per panel.
    pub fn unit_doublet_strengths(&self, alpha: f64, beta: f64) -> Array1<f64> {
        Self::combine(&self.mu, alpha, beta)
    }

    /// Source densities for a unit freestream at `alpha`, `beta` (degrees)
    pub fn unit_source_strengths(&self, alpha: f64, beta: f64) -> Array1<f64> {
        Self::combine(&self.sigma, alpha, beta)
    }
}

/// Local velocities for a unit freestream at `alpha`, `beta`
///
/// `u`, `v`, `w` are the reconstructed velocities of the three unit
/// translation modes.
pub fn combine_local_velocities(
    u: &[Vector3],
    v: &[Vector3],
    w: &[Vector3],
    alpha: f64,
    beta: f64,
) -> Vec<Vector3> {
    let wind = wind_direction(alpha, beta);
    u.iter()
        .zip(v)
        .zip(w)
        .map(|((u, v), w)| *u * wind.x + *v * wind.y + *w * wind.z)
        .collect()
}
