//! Right-hand sides
//!
//! Six unit kinematic modes (translations u, v, w and rotations p, q, r
//! about the reference point) plus an arbitrary velocity field. For a
//! relative onset flow `V`:
//!
//! ```text
//! RHS[i] = -V(C_i)·n_i              (Neumann row, or thin panel)
//!        = 0                        (Dirichlet row)
//!        - Σ_k  S_k(C_i) · σ_k      (k not thin)
//! ```
//!
//! where `S_k` is the source velocity (projected on `n_i`) or source
//! potential of panel `k` and `σ_k = -V(C_k)·n_k / 4π` is the thickness
//! source density.

use crate::core::assembly::kernels;
use crate::core::cancel::CancellationToken;
use crate::core::config::AnalysisConfig;
use crate::core::constants::PI4;
use crate::core::error::AnalysisError;
use crate::core::mesh::{Panel, PanelMesh};
use crate::core::parallel::parallel_map_indexed;
use crate::core::types::Vector3;
use ndarray::Array1;

/// Unit kinematic modes, in RHS order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitMode {
    /// Unit onset flow along x
    U,
    /// Unit onset flow along y
    V,
    /// Unit onset flow along z
    W,
    /// Unit rotation about x
    P,
    /// Unit rotation about y
    Q,
    /// Unit rotation about z
    R,
}

impl UnitMode {
    /// All six modes in RHS order
    pub const ALL: [UnitMode; 6] = [
        UnitMode::U,
        UnitMode::V,
        UnitMode::W,
        UnitMode::P,
        UnitMode::Q,
        UnitMode::R,
    ];

    /// Onset velocity of the mode at a point `lever` away from the reference point
    pub fn velocity(&self, lever: &Vector3) -> Vector3 {
        match self {
            UnitMode::U => Vector3::unit_x(),
            UnitMode::V => Vector3::unit_y(),
            UnitMode::W => Vector3::unit_z(),
            UnitMode::P => lever.cross(&Vector3::unit_x()),
            UnitMode::Q => lever.cross(&Vector3::unit_y()),
            UnitMode::R => lever.cross(&Vector3::unit_z()),
        }
    }
}

/// Thickness source density induced by an onset velocity
#[inline]
pub fn source_strength(normal: &Vector3, velocity: &Vector3) -> f64 {
    -normal.dot(velocity) / PI4
}

/// Six unit right-hand sides, owned by one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct RhsSet {
    /// One vector per [`UnitMode`], in [`UnitMode::ALL`] order
    pub unit: [Array1<f64>; 6],
}

impl RhsSet {
    /// Vector of one unit mode
    pub fn mode(&self, mode: UnitMode) -> &Array1<f64> {
        &self.unit[mode as usize]
    }

    /// Linear combination for the onset velocity `v` and rotation rate `omega`
    pub fn combine(&self, v: &Vector3, omega: &Vector3) -> Array1<f64> {
        let weights = [v.x, v.y, v.z, omega.x, omega.y, omega.z];
        let mut out = Array1::zeros(self.unit[0].len());
        for (w, rhs) in weights.iter().zip(self.unit.iter()) {
            if *w != 0.0 {
                out.scaled_add(*w, rhs);
            }
        }
        out
    }
}

/// Builder for the right-hand sides of one mesh under one configuration
pub struct RhsBuilder<'a> {
    mesh: &'a PanelMesh,
    config: &'a AnalysisConfig,
    cancel: CancellationToken,
}

impl<'a> RhsBuilder<'a> {
    /// Create a builder
    pub fn new(mesh: &'a PanelMesh, config: &'a AnalysisConfig) -> Self {
        Self {
            mesh,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally controlled cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn row_is_neumann(&self, i: usize) -> bool {
        self.config.is_neumann() || self.mesh.panels[i].is_mid()
    }

    fn lever(&self, panel: &Panel) -> Vector3 {
        panel.cog() - self.config.reference_point
    }

    /// Source influence of panel `k` on row `i`, projected on `normal` for Neumann rows
    fn source_influence(&self, i: usize, k: usize, normal: &Vector3) -> f64 {
        let panels = &self.mesh.panels;
        let c = panels[i].cog();
        if self.row_is_neumann(i) {
            kernels::source_velocity(&panels[k], &c, i == k, self.config, true).dot(normal)
        } else {
            kernels::source_potential(&panels[k], &c, self.config, true)
        }
    }

    /// Source densities of an onset velocity field; zero on thin panels
    ///
    /// `field[k]` is the onset velocity at panel `k`.
    pub fn source_strengths(&self, field: &[Vector3]) -> Result<Array1<f64>, AnalysisError> {
        let normals: Vec<Vector3> = self.mesh.panels.iter().map(|p| p.normal()).collect();
        self.source_strengths_with(field, &normals)
    }

    fn source_strengths_with(
        &self,
        field: &[Vector3],
        normals: &[Vector3],
    ) -> Result<Array1<f64>, AnalysisError> {
        let n = self.mesh.n_panels();
        for len in [field.len(), normals.len()] {
            if len != n {
                return Err(AnalysisError::DimensionMismatch { expected: n, got: len });
            }
        }
        Ok(self
            .mesh
            .panels
            .iter()
            .zip(field.iter().zip(normals))
            .map(|(p, (v, normal))| if p.is_mid() { 0.0 } else { source_strength(normal, v) })
            .collect())
    }

    /// Source densities of the six unit modes, `[mode][panel]`
    pub fn unit_source_strengths(&self) -> [Array1<f64>; 6] {
        UnitMode::ALL.map(|mode| {
            self.mesh
                .panels
                .iter()
                .map(|p| {
                    if p.is_mid() {
                        0.0
                    } else {
                        source_strength(&p.normal(), &mode.velocity(&self.lever(p)))
                    }
                })
                .collect()
        })
    }

    /// Build the six unit right-hand sides
    pub fn unit_vectors(&self) -> Result<RhsSet, AnalysisError> {
        let n = self.mesh.n_panels();
        let sigma = self.unit_source_strengths();
        log::info!("Building unit right-hand sides for {} panels", n);

        let rows = parallel_map_indexed(n, |i| -> Result<[f64; 6], AnalysisError> {
            if self.cancel.poll() {
                return Err(AnalysisError::Cancelled);
            }
            let panel = &self.mesh.panels[i];
            let normal = panel.normal();
            let lever = self.lever(panel);

            let mut row = [0.0; 6];
            if self.row_is_neumann(i) {
                for (value, mode) in row.iter_mut().zip(UnitMode::ALL) {
                    *value = -mode.velocity(&lever).dot(&normal);
                }
            }

            for (k, source) in self.mesh.panels.iter().enumerate() {
                if self.cancel.poll() {
                    return Err(AnalysisError::Cancelled);
                }
                if source.is_mid() {
                    continue;
                }
                let s = self.source_influence(i, k, &normal);
                for (m, value) in row.iter_mut().enumerate() {
                    *value -= s * sigma[m][k];
                }
                if row.iter().any(|v| !v.is_finite()) {
                    log::error!(
                        "numerical error in the source influence of panel {} on panel {}",
                        k,
                        i
                    );
                    return Err(AnalysisError::Numerical { row: i, col: k });
                }
            }
            Ok(row)
        });

        let mut unit: [Array1<f64>; 6] = std::array::from_fn(|_| Array1::zeros(n));
        for (i, row) in rows.into_iter().enumerate() {
            let row = row?;
            for (m, value) in row.into_iter().enumerate() {
                unit[m][i] = value;
            }
        }
        Ok(RhsSet { unit })
    }

    /// Right-hand side of an arbitrary onset velocity field
    ///
    /// `field[i]` is the onset velocity at the collocation point of panel `i`.
    /// `normals` optionally overrides the panel normals (e.g. for a deflected
    /// control surface).
    pub fn arbitrary(
        &self,
        field: &[Vector3],
        normals: Option<&[Vector3]>,
    ) -> Result<Array1<f64>, AnalysisError> {
        let n = self.mesh.n_panels();
        let normals: Vec<Vector3> = match normals {
            Some(ns) => ns.to_vec(),
            None => self.mesh.panels.iter().map(|p| p.normal()).collect(),
        };
        let sigma = self.source_strengths_with(field, &normals)?;

        let rows = parallel_map_indexed(n, |i| -> Result<f64, AnalysisError> {
            if self.cancel.poll() {
                return Err(AnalysisError::Cancelled);
            }
            let normal = normals[i];
            let mut value = if self.row_is_neumann(i) {
                -field[i].dot(&normal)
            } else {
                0.0
            };
            for (k, source) in self.mesh.panels.iter().enumerate() {
                if self.cancel.poll() {
                    return Err(AnalysisError::Cancelled);
                }
                if source.is_mid() {
                    continue;
                }
                value -= self.source_influence(i, k, &normal) * sigma[k];
                if !value.is_finite() {
                    return Err(AnalysisError::Numerical { row: i, col: k });
                }
            }
            Ok(value)
        });

        rows.into_iter().collect::<Result<Vec<_>, _>>().map(Array1::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BoundaryCondition;
    use crate::core::mesh::generators::{ellipsoid, flat_plate};
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_mode_velocity() {
        let lever = Vector3::new(0.0, 2.0, 0.0);
        // roll about x: a point on +y moves up, the onset flow goes down
        let v = UnitMode::P.velocity(&lever);
        assert_relative_eq!(v.z, -2.0);
        let v = UnitMode::R.velocity(&lever);
        assert_relative_eq!(v.x, 2.0);
    }

    #[test]
    fn test_thin_plate_rhs_is_minus_normal_velocity() {
        let mesh = flat_plate(1.0, 2.0, 3, 2, 10.0, 1);
        let config = AnalysisConfig::default();
        let rhs = RhsBuilder::new(&mesh, &config).unit_vectors().unwrap();
        for i in 0..mesh.n_panels() {
            assert_relative_eq!(rhs.mode(UnitMode::U)[i], 0.0, epsilon = 1e-14);
            assert_relative_eq!(rhs.mode(UnitMode::W)[i], -1.0, epsilon = 1e-14);
        }
        let combined = rhs.combine(&Vector3::new(0.9, 0.0, 0.1), &Vector3::zero());
        assert_relative_eq!(combined[0], -0.1, epsilon = 1e-14);
    }

    #[test]
    fn test_arbitrary_uniform_field_matches_unit_combination() {
        let mesh = ellipsoid(1.5, 0.5, 6, 8);
        for bc in [BoundaryCondition::Dirichlet, BoundaryCondition::Neumann] {
            let config = AnalysisConfig {
                boundary_condition: bc,
                ..Default::default()
            };
            let builder = RhsBuilder::new(&mesh, &config);
            let rhs = builder.unit_vectors().unwrap();
            let v = Vector3::new(0.8, 0.1, -0.3);
            let field = vec![v; mesh.n_panels()];
            let direct = builder.arbitrary(&field, None).unwrap();
            let combined = rhs.combine(&v, &Vector3::zero());
            for i in 0..mesh.n_panels() {
                assert_relative_eq!(direct[i], combined[i], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_source_strengths_follow_the_field() {
        let mesh = ellipsoid(1.5, 0.5, 6, 8);
        let config = AnalysisConfig::default();
        let builder = RhsBuilder::new(&mesh, &config);
        let v = Vector3::new(0.0, 0.0, 2.0);
        let field = vec![v; mesh.n_panels()];
        let sigma = builder.source_strengths(&field).unwrap();
        let unit = builder.unit_source_strengths();
        for k in 0..mesh.n_panels() {
            assert_relative_eq!(sigma[k], 2.0 * unit[UnitMode::W as usize][k], epsilon = 1e-14);
        }

        let plate = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let sigma = RhsBuilder::new(&plate, &config)
            .source_strengths(&[v; 4])
            .unwrap();
        assert!(sigma.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_symmetric_body_has_antisymmetric_side_rhs() {
        // For a body symmetric about y = 0 the v-mode RHS sums to zero
        let mesh = ellipsoid(2.0, 0.5, 8, 12);
        let config = AnalysisConfig::default();
        let rhs = RhsBuilder::new(&mesh, &config).unit_vectors().unwrap();
        assert_relative_eq!(rhs.mode(UnitMode::V).sum(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(rhs.mode(UnitMode::W).sum(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_field_length_checked() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let config = AnalysisConfig::default();
        let err = RhsBuilder::new(&mesh, &config)
            .arbitrary(&[Vector3::unit_x()], None)
            .unwrap_err();
        assert_eq!(err, AnalysisError::DimensionMismatch { expected: 4, got: 1 });
    }
}
