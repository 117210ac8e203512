//! High-level panel analysis API
//!
//! Ties the stages together: validate, assemble the influence matrix with
//! its wake coupling, build the six unit right-hand sides, solve them with
//! one factorisation, reconstruct the surface velocities and evaluate Cp and
//! forces.
//!
//! With a vorton wake the rows shed by the combined solution are fed back as
//! an onset field and the system is re-solved for that field, a configurable
//! number of times.
//!
//! # Example
//!
//! ```ignore
//! use math_audio_panel::core::{PanelAnalysis, AnalysisConfig};
//! use math_audio_panel::core::mesh::generators::rectangular_wing;
//!
//! let mesh = rectangular_wing(1.0, 6.0, 0.12, 12, 16, 50.0, 1);
//! let analysis = PanelAnalysis::new(AnalysisConfig::default());
//!
//! // Factorise once, then evaluate as many operating points as needed
//! let unit = analysis.solve_unit(&mesh)?;
//! for alpha in [0.0, 2.0, 4.0] {
//!     let result = unit.operating_point(alpha, 0.0, 30.0)?;
//!     println!("alpha {alpha}: lift {}", result.forces.lift);
//! }
//! ```

use crate::core::assembly::{InfluenceMatrix, InfluenceMatrixBuilder, RhsBuilder, UnitMode};
use crate::core::cancel::CancellationToken;
use crate::core::config::AnalysisConfig;
use crate::core::error::AnalysisError;
use crate::core::mesh::PanelMesh;
use crate::core::postprocess::{
    FieldEvaluator, LocalVelocityReconstructor, PanelForces, VortonRow, build_vorton_rows,
    panel_forces, pressure_coefficients, pressure_coefficients_in_field, rows_velocity_at,
};
use crate::core::solver::{
    DoubletSolution, combine_local_velocities, solve_doublets, wind_direction,
};
use crate::core::types::Vector3;
use serde::{Deserialize, Serialize};

/// Panel-method analysis driver
#[derive(Debug, Clone, Default)]
pub struct PanelAnalysis {
    /// Analysis options
    pub config: AnalysisConfig,
    cancel: CancellationToken,
}

impl PanelAnalysis {
    /// Create an analysis with the given configuration
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally controlled cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set the number of parallel row blocks
    pub fn with_blocks(mut self, n_blocks: usize) -> Self {
        self.config.n_blocks = n_blocks;
        self
    }

    /// Token polled by every stage
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    fn check_cancelled(&self) -> Result<(), AnalysisError> {
        if self.cancel.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Solve the six unit modes and reconstruct the unit surface velocities
    pub fn solve_unit(&self, mesh: &PanelMesh) -> Result<UnitAnalysis, AnalysisError> {
        self.config.validate()?;
        mesh.validate()?;

        let mut mesh = mesh.clone();
        mesh.set_point_fractions(self.config.ctrl_point_fraction, self.config.vortex_fraction);
        log::info!(
            "Panel analysis: {} panels, {} wake panels, {:?} boundary condition",
            mesh.n_panels(),
            mesh.n_wake_panels(),
            self.config.boundary_condition
        );

        // Step 1: influence matrix with wake coupling
        let matrix = InfluenceMatrixBuilder::new(&mesh, &self.config)
            .with_cancellation(self.cancel.clone())
            .build()?;
        self.check_cancelled()?;

        // Step 2: unit right-hand sides
        let rhs_builder = RhsBuilder::new(&mesh, &self.config).with_cancellation(self.cancel.clone());
        let rhs = rhs_builder.unit_vectors()?;
        self.check_cancelled()?;

        // Step 3: one factorisation, six back-substitutions
        let solution =
            DoubletSolution::solve_unit(&matrix, &rhs, rhs_builder.unit_source_strengths(), &self.config)?;
        // the vorton iteration re-solves against the same matrix
        let matrix = (self.config.vorton_wake && self.config.vorton_iterations > 0).then_some(matrix);
        self.check_cancelled()?;

        // Step 4: surface velocities of the three translation modes
        let modes: Vec<Vec<f64>> = [UnitMode::U, UnitMode::V, UnitMode::W]
            .iter()
            .map(|m| solution.mode(*m).to_vec())
            .collect();
        let slices: Vec<&[f64]> = modes.iter().map(|m| m.as_slice()).collect();
        let local = LocalVelocityReconstructor::new(&mesh, &self.config)?.reconstruct(&slices)?;
        let local: [Vec<Vector3>; 3] = local.try_into().map_err(|_| {
            AnalysisError::SolverFailure("velocity reconstruction returned the wrong mode count".into())
        })?;

        log::info!("Unit solution complete");
        Ok(UnitAnalysis {
            mesh,
            config: self.config.clone(),
            solution,
            local,
            matrix,
        })
    }

    /// Full analysis at one operating point
    ///
    /// `alpha` and `beta` in degrees, `q_inf` the freestream speed.
    pub fn run(
        &self,
        mesh: &PanelMesh,
        alpha: f64,
        beta: f64,
        q_inf: f64,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.solve_unit(mesh)?.operating_point(alpha, beta, q_inf)
    }
}

/// Unit-mode solution of one mesh, reusable for any number of operating points
#[derive(Debug, Clone)]
pub struct UnitAnalysis {
    mesh: PanelMesh,
    config: AnalysisConfig,
    solution: DoubletSolution,
    local: [Vec<Vector3>; 3],
    matrix: Option<InfluenceMatrix>,
}

impl UnitAnalysis {
    /// Mesh the solution was computed on (with the configured point fractions)
    pub fn mesh(&self) -> &PanelMesh {
        &self.mesh
    }

    /// Doublet and source densities of the six unit modes
    pub fn solution(&self) -> &DoubletSolution {
        &self.solution
    }

    /// Field evaluator over the solved mesh
    pub fn field(&self) -> FieldEvaluator<'_> {
        FieldEvaluator::new(&self.mesh, &self.config)
    }

    /// Combine the unit modes for a freestream of speed `q_inf` at `alpha`, `beta`
    pub fn operating_point(
        &self,
        alpha: f64,
        beta: f64,
        q_inf: f64,
    ) -> Result<AnalysisResult, AnalysisError> {
        if !(q_inf > 0.0 && q_inf.is_finite()) {
            return Err(AnalysisError::Config(format!(
                "freestream speed must be positive, got {}",
                q_inf
            )));
        }
        let mu = (self.solution.unit_doublet_strengths(alpha, beta) * q_inf).to_vec();
        let sigma = (self.solution.unit_source_strengths(alpha, beta) * q_inf).to_vec();
        let [u, v, w] = &self.local;
        let local_velocities: Vec<Vector3> = combine_local_velocities(u, v, w, alpha, beta)
            .into_iter()
            .map(|vl| vl * q_inf)
            .collect();

        let v_inf = wind_direction(alpha, beta) * q_inf;
        let cp = pressure_coefficients(&self.mesh, &local_velocities, &v_inf)?;
        let forces = panel_forces(&self.mesh, &cp, alpha, &self.config.reference_point)?;
        let mut result = AnalysisResult {
            alpha,
            beta,
            q_inf,
            mu,
            sigma,
            local_velocities,
            cp,
            forces,
            vortons: Vec::new(),
        };

        if self.config.vorton_wake {
            result.vortons = build_vorton_rows(&self.mesh, &result.mu, &self.config)?;
            if let Some(matrix) = &self.matrix {
                for iteration in 0..self.config.vorton_iterations {
                    self.couple_vortons(matrix, &v_inf, &mut result)?;
                    log::debug!(
                        "vorton iteration {}: lift {:.6}",
                        iteration + 1,
                        result.forces.lift
                    );
                }
            }
        }

        log::debug!(
            "alpha {:.2}, beta {:.2}: lift {:.6}, drag {:.6}",
            alpha,
            beta,
            result.forces.lift,
            result.forces.drag
        );
        Ok(result)
    }

    /// Onset velocity at every body panel: freestream plus the vorton rows
    fn onset_with_vortons(&self, v_inf: &Vector3, rows: &[VortonRow]) -> Vec<Vector3> {
        self.mesh
            .panels
            .iter()
            .map(|p| *v_inf + rows_velocity_at(rows, &p.cog(), &self.config))
            .collect()
    }

    /// Re-solve `result` with its vorton rows as part of the onset flow
    ///
    /// The rows are rebuilt from the new doublet densities.
    fn couple_vortons(
        &self,
        matrix: &InfluenceMatrix,
        v_inf: &Vector3,
        result: &mut AnalysisResult,
    ) -> Result<(), AnalysisError> {
        let onset = self.onset_with_vortons(v_inf, &result.vortons);
        let rhs_builder = RhsBuilder::new(&self.mesh, &self.config);
        let rhs = rhs_builder.arbitrary(&onset, None)?;
        let mu = solve_doublets(matrix, &rhs, &self.config)?.to_vec();

        result.sigma = rhs_builder.source_strengths(&onset)?.to_vec();
        result.local_velocities =
            LocalVelocityReconstructor::new(&self.mesh, &self.config)?.reconstruct_one(&mu)?;
        result.cp = pressure_coefficients_in_field(
            &self.mesh,
            &result.local_velocities,
            &onset,
            result.q_inf,
        )?;
        result.forces =
            panel_forces(&self.mesh, &result.cp, result.alpha, &self.config.reference_point)?;
        result.vortons = build_vorton_rows(&self.mesh, &mu, &self.config)?;
        result.mu = mu;
        Ok(())
    }
}

/// Results of one operating point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Angle of attack (degrees)
    pub alpha: f64,
    /// Sideslip (degrees)
    pub beta: f64,
    /// Freestream speed
    pub q_inf: f64,
    /// Doublet density per body panel
    pub mu: Vec<f64>,
    /// Source density per body panel
    pub sigma: Vec<f64>,
    /// Perturbation velocity in each panel frame
    pub local_velocities: Vec<Vector3>,
    /// Pressure coefficient per panel (`Cp_upper - Cp_lower` on thin panels)
    pub cp: Vec<f64>,
    /// Pressure forces per unit dynamic pressure
    pub forces: PanelForces,
    /// Vorton rows, empty unless `vorton_wake` is set
    pub vortons: Vec<VortonRow>,
}

impl AnalysisResult {
    /// Lift and drag coefficients for a reference area
    pub fn coefficients(&self, reference_area: f64) -> (f64, f64) {
        (
            self.forces.lift / reference_area,
            self.forces.drag / reference_area,
        )
    }

    /// Write the result as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BoundaryCondition;
    use crate::core::mesh::generators::flat_plate;
    use crate::core::postprocess::kelvin_residual;
    use approx::assert_relative_eq;

    fn plate_config() -> AnalysisConfig {
        AnalysisConfig {
            boundary_condition: BoundaryCondition::Neumann,
            n_blocks: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_incidence_plate_has_no_load() {
        let mesh = flat_plate(1.0, 4.0, 4, 4, 50.0, 1);
        let result = PanelAnalysis::new(plate_config())
            .run(&mesh, 0.0, 0.0, 10.0)
            .unwrap();
        for cp in &result.cp {
            assert_relative_eq!(*cp, 0.0, epsilon = 1e-10);
        }
        assert_relative_eq!(result.forces.lift, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_operating_points_scale_linearly() {
        let mesh = flat_plate(1.0, 4.0, 4, 4, 50.0, 1);
        let unit = PanelAnalysis::new(plate_config()).solve_unit(&mesh).unwrap();
        let a = unit.operating_point(4.0, 0.0, 1.0).unwrap();
        let b = unit.operating_point(4.0, 0.0, 3.0).unwrap();
        for (ma, mb) in a.mu.iter().zip(&b.mu) {
            assert_relative_eq!(3.0 * ma, *mb, epsilon = 1e-12, max_relative = 1e-12);
        }
        // Cp does not depend on the freestream speed
        for (ca, cb) in a.cp.iter().zip(&b.cp) {
            assert_relative_eq!(*ca, *cb, epsilon = 1e-12, max_relative = 1e-10);
        }
        assert!(a.forces.lift > 0.0);
    }

    #[test]
    fn test_vortons_follow_config() {
        let mesh = flat_plate(1.0, 4.0, 3, 3, 20.0, 2);
        let mut config = plate_config();
        config.vorton_wake = true;
        config.vorton_iterations = 0;
        let plain = PanelAnalysis::new(plate_config()).run(&mesh, 5.0, 0.0, 1.0).unwrap();
        let result = PanelAnalysis::new(config).run(&mesh, 5.0, 0.0, 1.0).unwrap();
        assert!(plain.vortons.is_empty());
        assert_eq!(result.vortons.len(), 3);
        // rows only, the solution itself is untouched
        assert_eq!(result.mu, plain.mu);
        for row in &result.vortons {
            let residual = kelvin_residual(&mesh, &result.mu, row).unwrap();
            assert!(residual < 1e-10 * row.gamma.abs(), "residual {}", residual);
        }
    }

    #[test]
    fn test_vorton_feedback_solves_the_coupled_system() {
        // short wake so the rows sit close to the plate
        let mesh = flat_plate(1.0, 4.0, 4, 4, 1.5, 1);
        let config = AnalysisConfig {
            vorton_wake: true,
            vorton_iterations: 1,
            ..plate_config()
        };
        let unit = PanelAnalysis::new(config.clone()).solve_unit(&mesh).unwrap();
        let coupled = unit.operating_point(6.0, 0.0, 2.0).unwrap();

        let plain = PanelAnalysis::new(plate_config()).run(&mesh, 6.0, 0.0, 2.0).unwrap();
        let rows = build_vorton_rows(unit.mesh(), &plain.mu, &config).unwrap();
        let v_inf = wind_direction(6.0, 0.0) * 2.0;
        let onset = unit.onset_with_vortons(&v_inf, &rows);

        // the coupled densities satisfy the system with the vorton onset flow
        let rhs = RhsBuilder::new(unit.mesh(), &config).arbitrary(&onset, None).unwrap();
        let matrix = unit.matrix.as_ref().unwrap().to_f64();
        let mu = ndarray::Array1::from(coupled.mu.clone());
        let residual = matrix.dot(&mu) - &rhs;
        for r in residual.iter() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-9);
        }

        // cancelling the starting vortex of the truncated wake relieves downwash
        let (cl_plain, _) = plain.coefficients(4.0);
        let (cl_coupled, _) = coupled.coefficients(4.0);
        assert!(cl_coupled.is_finite());
        assert!(cl_coupled > cl_plain, "CL {} vs {}", cl_coupled, cl_plain);
        assert!(cl_coupled < 1.5 * cl_plain, "CL {} vs {}", cl_coupled, cl_plain);

        // returned rows are shed by the returned densities
        for row in &coupled.vortons {
            let residual = kelvin_residual(unit.mesh(), &coupled.mu, row).unwrap();
            assert!(residual < 1e-10 * row.gamma.abs().max(1.0));
        }
        let rebuilt = build_vorton_rows(unit.mesh(), &coupled.mu, &config).unwrap();
        assert_eq!(rebuilt, coupled.vortons);
    }

    #[test]
    fn test_moment_about_reference_point() {
        let mesh = flat_plate(1.0, 4.0, 4, 4, 50.0, 1);
        let at_origin = PanelAnalysis::new(plate_config()).run(&mesh, 5.0, 0.0, 1.0).unwrap();
        let config = AnalysisConfig {
            reference_point: Vector3::new(0.25, 0.0, 0.0),
            ..plate_config()
        };
        let at_quarter = PanelAnalysis::new(config).run(&mesh, 5.0, 0.0, 1.0).unwrap();

        // the load is the same, only the moment arm moves
        assert_relative_eq!(at_quarter.forces.lift, at_origin.forces.lift, max_relative = 1e-10);
        let shift = Vector3::new(0.25, 0.0, 0.0).cross(&at_origin.forces.force);
        let expected = at_origin.forces.moment - shift;
        assert_relative_eq!(at_quarter.forces.moment.y, expected.y, epsilon = 1e-10);
        // nose-down about the leading edge, symmetric span
        assert!(at_origin.forces.moment.y < 0.0);
        assert_relative_eq!(at_origin.forces.moment.x, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_inputs() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let analysis = PanelAnalysis::new(plate_config());
        let unit = analysis.solve_unit(&mesh).unwrap();
        assert!(matches!(
            unit.operating_point(0.0, 0.0, 0.0),
            Err(AnalysisError::Config(_))
        ));
        let r = analysis.clone().with_blocks(0).run(&mesh, 0.0, 0.0, 1.0);
        assert!(matches!(r, Err(AnalysisError::Config(_))));
        let r = analysis.run(&PanelMesh::default(), 0.0, 0.0, 1.0);
        assert!(matches!(r, Err(AnalysisError::InvalidMesh(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let token = CancellationToken::new();
        token.cancel();
        let r = PanelAnalysis::new(plate_config())
            .with_cancellation(token)
            .run(&mesh, 0.0, 0.0, 1.0);
        assert_eq!(r.unwrap_err(), AnalysisError::Cancelled);
    }

    #[test]
    fn test_result_serializes() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let result = PanelAnalysis::new(plate_config())
            .run(&mesh, 2.0, 0.0, 1.0)
            .unwrap();
        let json = result.to_json().unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cp.len(), result.cp.len());
        assert_relative_eq!(back.forces.lift, result.forces.lift, max_relative = 1e-12);
    }
}
