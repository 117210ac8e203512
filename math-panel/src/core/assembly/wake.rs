//! Wake coupling
//!
//! A wake column carries the doublet-density jump of the trailing panels
//! that shed into it: `µ_wake = µ_top - µ_bot` for a thick surface, or
//! `µ_mid` for a thin one. Its influence on a collocation point is therefore
//! added to the top (or mid) trailing column with a positive sign and to the
//! bottom trailing column with a negative sign.
//!
//! Chain sums never use the far-field approximation: wake panels are long and
//! the multipole switch would be inaccurate along the chain.

use crate::core::assembly::kernels;
use crate::core::cancel::CancellationToken;
use crate::core::config::AnalysisConfig;
use crate::core::error::AnalysisError;
use crate::core::mesh::{Panel, PanelMesh};
use crate::core::types::Vector3;

/// Sign of the wake contribution on the column of a trailing panel
#[inline]
pub fn shed_sign(panel: &Panel) -> f64 {
    if panel.is_bot() { -1.0 } else { 1.0 }
}

/// Velocity of a unit doublet density spread over a whole wake chain
///
/// Returns `None` if cancellation was requested during the walk.
pub fn chain_velocity(
    mesh: &PanelMesh,
    start: Option<usize>,
    c: &Vector3,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Option<Vector3> {
    let mut v = Vector3::zero();
    for (_, wp) in mesh.wake_chain(start) {
        if cancel.poll() {
            return None;
        }
        v += kernels::doublet_velocity(wp, c, config, false);
    }
    Some(v)
}

/// Potential of a unit doublet density spread over a whole wake chain
pub fn chain_potential(
    mesh: &PanelMesh,
    start: Option<usize>,
    c: &Vector3,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Option<f64> {
    let mut phi = 0.0;
    for (_, wp) in mesh.wake_chain(start) {
        if cancel.poll() {
            return None;
        }
        phi += kernels::doublet_potential(wp, c, false, config, false);
    }
    Some(phi)
}

#[derive(Debug, Clone)]
struct ColumnCoupling {
    start: Option<usize>,
    shedders: Vec<(usize, f64)>,
}

/// Trailing panels grouped by the wake column they shed into
#[derive(Debug, Clone, Default)]
pub struct WakeCoupling {
    columns: Vec<ColumnCoupling>,
}

impl WakeCoupling {
    /// Group the trailing panels of `mesh` by wake column
    pub fn new(mesh: &PanelMesh) -> Self {
        let mut columns: Vec<ColumnCoupling> = mesh
            .wake_columns
            .iter()
            .map(|&start| ColumnCoupling {
                start: (start < mesh.n_wake_panels()).then_some(start),
                shedders: Vec::new(),
            })
            .collect();

        for (k, p) in mesh.panels.iter().enumerate() {
            if !p.trailing {
                continue;
            }
            if let Some(col) = p.wake_column.and_then(|c| columns.get_mut(c)) {
                col.shedders.push((k, shed_sign(p)));
            }
        }
        columns.retain(|c| c.start.is_some() && !c.shedders.is_empty());
        Self { columns }
    }

    /// True if no panel sheds a wake
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Add the wake contributions to one row of the influence matrix
    ///
    /// `normal` selects a Neumann row (velocity projected on the row normal);
    /// `None` gives a Dirichlet row (potential).
    pub fn add_to_row(
        &self,
        mesh: &PanelMesh,
        row_index: usize,
        row: &mut [f64],
        c: &Vector3,
        normal: Option<&Vector3>,
        config: &AnalysisConfig,
        cancel: &CancellationToken,
    ) -> Result<(), AnalysisError> {
        for column in &self.columns {
            let value = match normal {
                Some(n) => chain_velocity(mesh, column.start, c, config, cancel)
                    .map(|v| v.dot(n)),
                None => chain_potential(mesh, column.start, c, config, cancel),
            }
            .ok_or(AnalysisError::Cancelled)?;

            for &(k, sign) in &column.shedders {
                row[k] += sign * value;
                if !row[k].is_finite() {
                    log::error!(
                        "numerical error in the wake influence of panel {} on panel {}",
                        k,
                        row_index
                    );
                    return Err(AnalysisError::Numerical {
                        row: row_index,
                        col: k,
                    });
                }
            }
        }
        Ok(())
    }
}
