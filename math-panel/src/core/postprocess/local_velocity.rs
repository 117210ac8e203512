//! Tangential velocity from the doublet-density gradient
//!
//! On each panel the doublet density of the panel and its neighbours is fit
//! by a plane `µ(x, y) = a + b·x + c·y` in the panel's local frame (origin at
//! the collocation point). Neighbours that are not coplanar are unfolded
//! into the panel plane by a rotation about their shared edge. The local
//! perturbation velocity is then `(-4π b, -4π c, 0)`.
//!
//! Special cases:
//! - no neighbour: velocity left at zero (warning)
//! - one neighbour: the neighbour's velocity is copied, re-expressed in the
//!   panel frame
//! - two neighbours nearly aligned with the panel: line regression along
//!   the alignment instead of an ill-conditioned plane fit

use crate::core::config::AnalysisConfig;
use crate::core::constants::{ANGLE_PRECISION, COLLINEAR_ANGLE_DEG, PI4};
use crate::core::error::AnalysisError;
use crate::core::mesh::{Panel, PanelMesh};
use crate::core::parallel::parallel_map_indexed;
use crate::core::solver::select_solver;
use crate::core::types::Vector3;
use ndarray::Array2;
use solvers::LinearSolver;

/// Outcome of the fit on one panel
#[derive(Debug, Clone, PartialEq)]
enum Fit {
    /// Local velocities, one per doublet-density vector
    Solved(Vec<Vector3>),
    /// Copy from this neighbour once it is known
    CopyFrom(usize),
    /// Nothing could be computed
    Failed,
}

/// Collocation point of `neighbour` unfolded into the plane of `panel`
///
/// `edge` is the index of the shared edge on `panel`; the unfolding rotates
/// about its first vertex.
pub fn unfolded_cog(panel: &Panel, neighbour: &Panel, edge: usize) -> Vector3 {
    let cog = neighbour.cog();
    let axis = neighbour.normal().cross(&panel.normal());
    let sin = axis.norm();
    if sin < ANGLE_PRECISION {
        return cog;
    }
    let angle = sin.atan2(panel.normal().dot(&neighbour.normal()));
    cog.rotated_about(&panel.nodes()[edge % 4], &(axis / sin), angle)
}

/// Plane-fit reconstruction of local tangential velocities
pub struct LocalVelocityReconstructor<'a> {
    mesh: &'a PanelMesh,
    solver: Box<dyn LinearSolver<f64>>,
}

impl<'a> LocalVelocityReconstructor<'a> {
    /// Create a reconstructor using the configured least-squares backend
    pub fn new(mesh: &'a PanelMesh, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            mesh,
            solver: select_solver::<f64>(config)?,
        })
    }

    /// Local velocities (panel frame, `z = 0`) for each doublet-density vector
    ///
    /// Returns `result[j][panel]` for `mu[j]`.
    pub fn reconstruct(&self, mu: &[&[f64]]) -> Result<Vec<Vec<Vector3>>, AnalysisError> {
        let n = self.mesh.n_panels();
        if let Some(bad) = mu.iter().find(|m| m.len() != n) {
            return Err(AnalysisError::DimensionMismatch {
                expected: n,
                got: bad.len(),
            });
        }

        let fits = parallel_map_indexed(n, |i| self.fit_panel(i, mu));

        let mut out = vec![vec![Vector3::zero(); n]; mu.len()];
        let mut pending = Vec::new();
        for (i, fit) in fits.into_iter().enumerate() {
            match fit {
                Fit::Solved(v) => {
                    for (j, vj) in v.into_iter().enumerate() {
                        out[j][i] = vj;
                    }
                }
                Fit::CopyFrom(k) => pending.push((i, k)),
                Fit::Failed => {}
            }
        }

        // Chains of single-neighbour panels resolve in a few passes
        let mut known: Vec<bool> = (0..n).map(|i| !pending.iter().any(|p| p.0 == i)).collect();
        for _ in 0..pending.len() {
            let before = pending.len();
            pending.retain(|&(i, k)| {
                if !known[k] {
                    return true;
                }
                let (panel, neighbour) = (&self.mesh.panels[i], &self.mesh.panels[k]);
                for out_j in out.iter_mut() {
                    let global = neighbour.local_to_global(&out_j[k]);
                    let mut local = panel.global_to_local(&global);
                    local.z = 0.0;
                    out_j[i] = local;
                }
                known[i] = true;
                false
            });
            if pending.len() == before {
                break;
            }
        }
        for (i, k) in pending {
            log::warn!(
                "panel {}: single neighbour {} has no velocity to copy",
                i,
                k
            );
        }
        Ok(out)
    }

    /// Convenience wrapper for a single doublet-density vector
    pub fn reconstruct_one(&self, mu: &[f64]) -> Result<Vec<Vector3>, AnalysisError> {
        let mut all = self.reconstruct(&[mu])?;
        Ok(all.pop().unwrap_or_default())
    }

    fn fit_panel(&self, i: usize, mu: &[&[f64]]) -> Fit {
        let panel = &self.mesh.panels[i];
        let neighbours: Vec<(usize, usize)> = panel
            .neighbours
            .iter()
            .enumerate()
            .filter_map(|(e, n)| n.map(|k| (e, k)))
            .collect();

        match neighbours.len() {
            0 => {
                log::warn!("panel {} has no neighbour, local velocity left at zero", i);
                Fit::Failed
            }
            1 => Fit::CopyFrom(neighbours[0].1),
            _ => {
                let points: Vec<(f64, f64)> = neighbours
                    .iter()
                    .map(|&(e, k)| {
                        let cg = unfolded_cog(panel, &self.mesh.panels[k], e);
                        let local = panel.global_to_local_position(&cg);
                        (local.x, local.y)
                    })
                    .collect();
                let values: Vec<Vec<f64>> = mu
                    .iter()
                    .map(|m| {
                        std::iter::once(m[i])
                            .chain(neighbours.iter().map(|&(_, k)| m[k]))
                            .collect()
                    })
                    .collect();

                if points.len() == 2
                    && let Some(v) = line_fit(&points, &values)
                {
                    return Fit::Solved(v);
                }
                match self.plane_fit(&points, &values) {
                    Ok(v) => Fit::Solved(v),
                    Err(e) => {
                        log::warn!("panel {}: singular plane fit ({}), velocity left at zero", i, e);
                        Fit::Failed
                    }
                }
            }
        }
    }

    /// Least-squares fit of `a + b x + c y` over the panel (origin) and its neighbours
    fn plane_fit(
        &self,
        points: &[(f64, f64)],
        values: &[Vec<f64>],
    ) -> Result<Vec<Vector3>, solvers::SolverError> {
        let rows = points.len() + 1;
        let mut a = Array2::<f64>::zeros((rows, 3));
        a[[0, 0]] = 1.0;
        for (r, (x, y)) in points.iter().enumerate() {
            a[[r + 1, 0]] = 1.0;
            a[[r + 1, 1]] = *x;
            a[[r + 1, 2]] = *y;
        }
        let mut b = Array2::<f64>::zeros((rows, values.len()));
        for (j, vals) in values.iter().enumerate() {
            for (r, v) in vals.iter().enumerate() {
                b[[r, j]] = *v;
            }
        }
        let x = self.solver.least_squares(&a, &b)?;
        Ok((0..values.len())
            .map(|j| Vector3::new(-PI4 * x[[1, j]], -PI4 * x[[2, j]], 0.0))
            .collect())
    }
}

/// Line regression when the panel and its two neighbours are nearly aligned
///
/// `points` are the two neighbour collocation points in the panel frame (the
/// panel itself sits at the origin); `values[j]` holds `[panel, neighbour 1,
/// neighbour 2]` for each density vector. Returns `None` if the three points
/// are not within the alignment tolerance.
pub fn line_fit(points: &[(f64, f64)], values: &[Vec<f64>]) -> Option<Vec<Vector3>> {
    let v01 = Vector3::new(points[0].0, points[0].1, 0.0);
    let v02 = Vector3::new(points[1].0, points[1].1, 0.0);
    let (d1, d2) = (v01.norm(), v02.norm());
    if d1 <= 0.0 || d2 <= 0.0 {
        return None;
    }
    let sin = v01.cross(&v02).norm() / (d1 * d2);
    if sin.abs() >= COLLINEAR_ANGLE_DEG.to_radians().sin() {
        return None;
    }

    let direction = (v02 - v01).normalized()?;
    let s = [v01.dot(&direction), 0.0, v02.dot(&direction)];
    let s_mean = s.iter().sum::<f64>() / 3.0;
    let sxx: f64 = s.iter().map(|x| (x - s_mean).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }

    Some(
        values
            .iter()
            .map(|vals| {
                // vals = [panel, neighbour 1, neighbour 2]
                let y = [vals[1], vals[0], vals[2]];
                let y_mean = y.iter().sum::<f64>() / 3.0;
                let sxy: f64 = s.iter().zip(y.iter()).map(|(x, y)| (x - s_mean) * (y - y_mean)).sum();
                let slope = sxy / sxx;
                Vector3::new(-PI4 * slope * direction.x, -PI4 * slope * direction.y, 0.0)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::generators::flat_plate;
    use crate::core::types::SurfaceKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_unfold_coplanar_is_identity() {
        let mesh = flat_plate(1.0, 1.0, 2, 2, 5.0, 1);
        let p = &mesh.panels[0];
        let (e, k) = (1, mesh.panels[0].neighbours[1].unwrap());
        let cg = unfolded_cog(p, &mesh.panels[k], e);
        assert_eq!(cg, mesh.panels[k].cog());
    }

    #[test]
    fn test_unfold_folded_neighbour_lands_in_plane() {
        // Two unit squares sharing the x = 1 edge, the second folded up by 90°
        let flat = Panel::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        );
        let folded = Panel::new(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let cg = unfolded_cog(&flat, &folded, 1);
        assert_relative_eq!(cg.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(cg.x, 1.5, epsilon = 1e-12);
        assert_relative_eq!(cg.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_line_fit_recovers_slope() {
        let points = [(-1.0, 0.01), (1.0, -0.01)];
        let values = vec![vec![0.0, -2.0, 2.0]];
        let v = line_fit(&points, &values).unwrap();
        assert_relative_eq!(v[0].x, -PI4 * 2.0, max_relative = 1e-3);
        // well spread points are rejected
        assert!(line_fit(&[(-1.0, 0.0), (0.0, 1.0)], &values).is_none());
    }

    #[test]
    fn test_single_neighbour_copies_velocity() {
        // A strip of three panels: the end panels have one neighbour each
        let mut mesh = flat_plate(3.0, 1.0, 3, 1, 5.0, 1);
        for p in mesh.panels.iter_mut() {
            p.kind = SurfaceKind::Mid;
        }
        let xs: Vec<f64> = mesh.panels.iter().map(|p| p.cog().x).collect();
        let mu: Vec<f64> = xs.iter().map(|x| 0.5 * x).collect();
        let config = AnalysisConfig::default();
        let rec = LocalVelocityReconstructor::new(&mesh, &config).unwrap();
        let v = rec.reconstruct_one(&mu).unwrap();
        for vi in &v {
            assert_relative_eq!(vi.x, -PI4 * 0.5, max_relative = 1e-9);
            assert_relative_eq!(vi.y, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_isolated_panel_left_at_zero() {
        let mesh = PanelMesh::new(vec![Panel::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )]);
        let config = AnalysisConfig::default();
        let rec = LocalVelocityReconstructor::new(&mesh, &config).unwrap();
        let v = rec.reconstruct_one(&[1.0]).unwrap();
        assert_eq!(v[0], Vector3::zero());
    }
}
