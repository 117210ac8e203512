//! Vorton wake rows
//!
//! The circulation shed at each trailing-edge station is released at the
//! downstream end of its wake column as a pair of vortons, one per side
//! edge, plus a straight segment that cancels the last transverse edge of
//! the column:
//!
//! ```text
//!   γ = 4π µ_mid              (thin surface)
//!   γ = 4π (µ_top - µ_bot)    (thick surface)
//!
//!   left  vorton at TA + e_l·dl/2,  α = +γ dl e_l
//!   right vorton at TB + e_r·dl/2,  α = -γ dl e_r
//!   segment TA → TB with circulation -γ
//! ```
//!
//! Rows are rebuilt from every new solution and never cached.

use crate::core::assembly::kernels::image_velocity;
use crate::core::config::AnalysisConfig;
use crate::core::constants::{LENGTH_PRECISION, PI4};
use crate::core::error::AnalysisError;
use crate::core::integration::{Vorton, vortex_segment_velocity};
use crate::core::mesh::{Panel, PanelMesh};
use crate::core::types::Vector3;
use serde::{Deserialize, Serialize};

/// Straight vortex filament of constant circulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VortexSegment {
    /// Start point
    pub a: Vector3,
    /// End point
    pub b: Vector3,
    /// Circulation, positive along `a → b`
    pub circulation: f64,
}

impl VortexSegment {
    /// Induced velocity at `c`
    pub fn velocity_at(&self, c: &Vector3, core_radius: f64) -> Vector3 {
        vortex_segment_velocity(&self.a, &self.b, c, core_radius) * self.circulation
    }
}

/// Vortons and closing segment shed at one trailing-edge station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VortonRow {
    /// Body panel the row is shed from (mid or bottom trailing panel)
    pub panel: usize,
    /// Circulation released at the trailing edge
    pub gamma: f64,
    /// Side-edge vortons
    pub vortons: Vec<Vorton>,
    /// Closing segments
    pub segments: Vec<VortexSegment>,
}

/// Circulation leaving `node` through a filament `a → b`
fn filament_outflow(a: &Vector3, b: &Vector3, circulation: f64, node: &Vector3) -> f64 {
    let mut out = 0.0;
    if a.is_same(node, LENGTH_PRECISION) {
        out += circulation;
    }
    if b.is_same(node, LENGTH_PRECISION) {
        out -= circulation;
    }
    out
}

/// Circulation a vorton carries away from the node it is attached to
///
/// A vorton of length `dl` centred `dl/2` past its node stands for a filament
/// of circulation `α·(p - N) / (2 |p - N|²)` leaving that node.
fn vorton_outflow(vorton: &Vorton, node: &Vector3) -> f64 {
    let r = vorton.position - *node;
    let r2 = r.norm_sqr();
    if r2 > 0.0 { vorton.alpha.dot(&r) / (2.0 * r2) } else { 0.0 }
}

impl VortonRow {
    /// Largest circulation imbalance at the two ends of the shed edge
    ///
    /// `end` is the panel whose downstream edge `TA → TB` the row closes and
    /// `wake_circulation` the circulation its side filaments carry (`LA → TA`
    /// and `LB → TB` with opposite signs). Two balances are taken at each end
    /// node: the closing segments must hand over what the vortons carry
    /// away, and the vortons must continue the side filament that arrives
    /// there. Vortons attach to the nearer end node. Zero for a row that
    /// conserves circulation.
    pub fn circulation_residual(&self, end: &Panel, wake_circulation: f64) -> f64 {
        let (ta, tb) = (end.ta(), end.tb());
        let left = end.left_edge();
        let right = end.right_edge();

        [ta, tb]
            .iter()
            .map(|node| {
                let other = if node.is_same(&ta, LENGTH_PRECISION) { tb } else { ta };
                let vortons: f64 = self
                    .vortons
                    .iter()
                    .filter(|v| (v.position - *node).norm() <= (v.position - other).norm())
                    .map(|v| vorton_outflow(v, node))
                    .sum();
                let segments: f64 = self
                    .segments
                    .iter()
                    .map(|s| filament_outflow(&s.a, &s.b, s.circulation, node))
                    .sum();
                let sides = filament_outflow(&left.a, &left.b, wake_circulation, node)
                    + filament_outflow(&right.a, &right.b, -wake_circulation, node);
                (vortons + segments).abs().max((vortons + sides).abs())
            })
            .fold(0.0, f64::max)
    }

    fn direct_velocity(&self, c: &Vector3, config: &AnalysisConfig) -> Vector3 {
        let v: Vector3 = self
            .vortons
            .iter()
            .map(|v| v.velocity_at(c, config.vorton_core_size))
            .sum();
        v + self
            .segments
            .iter()
            .map(|s| s.velocity_at(c, config.core_radius))
            .sum::<Vector3>()
    }

    /// Velocity induced at `c`, including the ground or free-surface image
    pub fn velocity_at(&self, c: &Vector3, config: &AnalysisConfig) -> Vector3 {
        self.direct_velocity(c, config)
            + image_velocity(c, config, |p| self.direct_velocity(p, config))
    }
}

/// Velocity induced at `c` by a set of rows
pub fn rows_velocity_at(rows: &[VortonRow], c: &Vector3, config: &AnalysisConfig) -> Vector3 {
    rows.iter().map(|r| r.velocity_at(c, config)).sum()
}

/// Released circulation and closing panel of the station shed by body panel `k`
///
/// `None` when `k` is not a mid or bottom trailing panel, or when a bottom
/// trailing panel has no top partner.
fn shed_station<'m>(mesh: &'m PanelMesh, mu: &[f64], k: usize) -> Option<(f64, &'m Panel)> {
    let panel = mesh.panels.get(k)?;
    if !panel.trailing || !(panel.is_mid() || panel.is_bot()) {
        return None;
    }
    let (gamma, upper) = if panel.is_mid() {
        (PI4 * mu[k], panel)
    } else {
        let top = mesh.paired_top_trailing(k)?;
        (PI4 * (mu[top] - mu[k]), &mesh.panels[top])
    };

    // Downstream end of the wake column, or the trailing edge itself
    let end = mesh
        .wake_chain(panel.wake)
        .last()
        .map(|(_, wp)| wp)
        .unwrap_or(upper);
    Some((gamma, end))
}

fn check_mu(mesh: &PanelMesh, mu: &[f64]) -> Result<(), AnalysisError> {
    if mu.len() != mesh.n_panels() {
        return Err(AnalysisError::DimensionMismatch {
            expected: mesh.n_panels(),
            got: mu.len(),
        });
    }
    Ok(())
}

/// Build one row per shedding station from the doublet densities `mu`
pub fn build_vorton_rows(
    mesh: &PanelMesh,
    mu: &[f64],
    config: &AnalysisConfig,
) -> Result<Vec<VortonRow>, AnalysisError> {
    check_mu(mesh, mu)?;
    let dl = config.vorton_spacing;

    let mut rows = Vec::new();
    for (k, panel) in mesh.panels.iter().enumerate() {
        if !panel.trailing || !(panel.is_mid() || panel.is_bot()) {
            continue;
        }
        let Some((gamma, end)) = shed_station(mesh, mu, k) else {
            log::warn!("bottom trailing panel {} has no top partner, no vortons shed", k);
            continue;
        };

        let left = end.left_edge().unit_dir();
        let right = end.right_edge().unit_dir();
        let (ta, tb) = (end.ta(), end.tb());

        rows.push(VortonRow {
            panel: k,
            gamma,
            vortons: vec![
                Vorton::new(ta + left * (dl / 2.0), left * (gamma * dl)),
                Vorton::new(tb + right * (dl / 2.0), right * (-gamma * dl)),
            ],
            segments: vec![VortexSegment {
                a: ta,
                b: tb,
                circulation: -gamma,
            }],
        });
    }
    log::debug!("{} vorton rows shed", rows.len());
    Ok(rows)
}

/// Kelvin check of `row` against the wake column it terminates
///
/// The wake circulation is taken from `mu` at the row's station, and the
/// residual is [`VortonRow::circulation_residual`] at the column's last panel.
pub fn kelvin_residual(mesh: &PanelMesh, mu: &[f64], row: &VortonRow) -> Result<f64, AnalysisError> {
    check_mu(mesh, mu)?;
    let (gamma, end) = shed_station(mesh, mu, row.panel).ok_or_else(|| {
        AnalysisError::InvalidMesh(format!("panel {} is not a shedding station", row.panel))
    })?;
    Ok(row.circulation_residual(end, gamma))
}
