//! Panel arena with neighbour and wake-chain topology
//!
//! Panels and wake panels live in two contiguous vectors; every link
//! (neighbour, wake start, downstream wake panel) is an index into one of
//! them.

use crate::core::error::AnalysisError;
use crate::core::mesh::panel::Panel;
use crate::core::types::Vector3;
use std::collections::HashMap;

/// Grid used to match shared corners between panels
const NODE_KEY_RESOLUTION: f64 = 1.0e-7;

type NodeKey = (i64, i64, i64);

fn node_key(p: &Vector3) -> NodeKey {
    (
        (p.x / NODE_KEY_RESOLUTION).round() as i64,
        (p.y / NODE_KEY_RESOLUTION).round() as i64,
        (p.z / NODE_KEY_RESOLUTION).round() as i64,
    )
}

/// Upper and lower trailing panels of one thick trailing edge
fn sheds_between(a: &Panel, b: &Panel) -> bool {
    a.trailing && b.trailing && ((a.is_top() && b.is_bot()) || (a.is_bot() && b.is_top()))
}

/// Body panels, wake panels and the links between them
#[derive(Debug, Clone, Default)]
pub struct PanelMesh {
    /// Body panels; row and column order of the influence matrix
    pub panels: Vec<Panel>,
    /// Wake panels, chained through `downstream`
    pub wake_panels: Vec<Panel>,
    /// Index of the first wake panel of each wake column
    pub wake_columns: Vec<usize>,
}

impl PanelMesh {
    /// Mesh without wake
    pub fn new(panels: Vec<Panel>) -> Self {
        Self {
            panels,
            wake_panels: Vec::new(),
            wake_columns: Vec::new(),
        }
    }

    /// Number of body panels
    pub fn n_panels(&self) -> usize {
        self.panels.len()
    }

    /// Number of wake panels
    pub fn n_wake_panels(&self) -> usize {
        self.wake_panels.len()
    }

    /// True if the mesh contains thin-surface panels
    pub fn has_mid_panels(&self) -> bool {
        self.panels.iter().any(|p| p.is_mid())
    }

    /// Total wetted area
    pub fn area(&self) -> f64 {
        self.panels.iter().map(|p| p.area()).sum()
    }

    /// Append a wake column shed by the given trailing panels
    ///
    /// The column panels are chained in the order given (upstream first).
    /// Returns the column index.
    pub fn add_wake_column(&mut self, column: Vec<Panel>, shed_by: &[usize]) -> usize {
        let icol = self.wake_columns.len();
        let start = self.wake_panels.len();
        let n = column.len();
        for (j, mut wp) in column.into_iter().enumerate() {
            wp.downstream = if j + 1 < n { Some(start + j + 1) } else { None };
            wp.wake_column = Some(icol);
            self.wake_panels.push(wp);
        }
        self.wake_columns.push(start);
        for &k in shed_by {
            if let Some(p) = self.panels.get_mut(k) {
                p.trailing = true;
                p.wake = if n > 0 { Some(start) } else { None };
                p.wake_column = Some(icol);
            }
        }
        icol
    }

    /// Derive the edge neighbours of every body panel from shared corners
    ///
    /// Two panels are neighbours across an edge when they share both of its
    /// end points. Collapsed edges have no neighbour; edges shared by more
    /// than two panels (e.g. a thin surface meeting a thick one) keep the
    /// first match. The upper and lower trailing panels of a thick trailing
    /// edge are never linked: the doublet density jumps across the shed edge.
    pub fn connect_neighbours(&mut self) {
        let mut edges: HashMap<(NodeKey, NodeKey), Vec<(usize, usize)>> = HashMap::new();
        for (k, panel) in self.panels.iter().enumerate() {
            for e in 0..4 {
                if panel.is_collapsed_edge(e) {
                    continue;
                }
                let seg = panel.edge(e);
                let (ka, kb) = (node_key(&seg.a), node_key(&seg.b));
                let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
                edges.entry(key).or_default().push((k, e));
            }
        }

        for panel in self.panels.iter_mut() {
            panel.neighbours = [None; 4];
        }
        for owners in edges.values() {
            for &(k, e) in owners {
                let other = owners
                    .iter()
                    .map(|&(j, _)| j)
                    .find(|&j| j != k && !sheds_between(&self.panels[k], &self.panels[j]));
                self.panels[k].neighbours[e] = other;
            }
        }

        let isolated = self
            .panels
            .iter()
            .filter(|p| p.neighbours.iter().all(|n| n.is_none()))
            .count();
        if isolated > 0 {
            log::warn!("{} panels have no neighbour", isolated);
        }
    }

    /// Iterate over the wake chain starting at `start`
    ///
    /// The walk is bounded by the number of wake panels, so a corrupted
    /// (cyclic) chain still terminates.
    pub fn wake_chain(&self, start: Option<usize>) -> WakeChain<'_> {
        WakeChain {
            wake_panels: &self.wake_panels,
            next: start,
            remaining: self.wake_panels.len(),
        }
    }

    /// Top trailing panel shedding into the same wake column as `k`
    pub fn paired_top_trailing(&self, k: usize) -> Option<usize> {
        let column = self.panels.get(k)?.wake_column?;
        self.panels
            .iter()
            .position(|p| p.trailing && p.is_top() && p.wake_column == Some(column))
    }

    /// Apply the chordwise control-point and bound-vortex fractions to every panel
    pub fn set_point_fractions(&mut self, ctrl_fraction: f64, vortex_fraction: f64) {
        for p in self.panels.iter_mut().chain(self.wake_panels.iter_mut()) {
            p.set_fractions(ctrl_fraction, vortex_fraction);
        }
    }

    /// Check that every index points inside its arena and that wake chains terminate
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.panels.is_empty() {
            return Err(AnalysisError::InvalidMesh("mesh has no panels".into()));
        }
        let n = self.panels.len();
        let nw = self.wake_panels.len();

        for (k, p) in self.panels.iter().enumerate() {
            if !p.normal().is_finite() || !p.cog().is_finite() {
                return Err(AnalysisError::InvalidMesh(format!(
                    "panel {} has non-finite geometry",
                    k
                )));
            }
            if let Some(j) = p.neighbours.iter().flatten().find(|&&j| j >= n) {
                return Err(AnalysisError::InvalidMesh(format!(
                    "panel {} links to neighbour {} out of {}",
                    k, j, n
                )));
            }
            if let Some(w) = p.wake
                && w >= nw
            {
                return Err(AnalysisError::InvalidMesh(format!(
                    "panel {} sheds into wake panel {} out of {}",
                    k, w, nw
                )));
            }
            if p.trailing && p.is_bot() && self.paired_top_trailing(k).is_none() {
                return Err(AnalysisError::InvalidMesh(format!(
                    "bottom trailing panel {} has no top trailing panel in its wake column",
                    k
                )));
            }
        }

        for (w, wp) in self.wake_panels.iter().enumerate() {
            if let Some(d) = wp.downstream
                && d >= nw
            {
                return Err(AnalysisError::InvalidMesh(format!(
                    "wake panel {} links downstream to {} out of {}",
                    w, d, nw
                )));
            }
        }

        for (k, p) in self.panels.iter().enumerate() {
            if p.wake.is_none() {
                continue;
            }
            let mut chain = self.wake_chain(p.wake);
            for _ in chain.by_ref() {}
            if !chain.terminated() {
                return Err(AnalysisError::InvalidMesh(format!(
                    "wake chain of panel {} does not terminate",
                    k
                )));
            }
        }
        Ok(())
    }
}

/// Bounded walk along `downstream` links
#[derive(Debug, Clone)]
pub struct WakeChain<'a> {
    wake_panels: &'a [Panel],
    next: Option<usize>,
    remaining: usize,
}

impl WakeChain<'_> {
    /// True when the walk reached the end of the chain rather than the step bound
    pub fn terminated(&self) -> bool {
        self.next.is_none()
    }
}

impl<'a> Iterator for WakeChain<'a> {
    type Item = (usize, &'a Panel);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        if self.remaining == 0 {
            return None;
        }
        let panel = self.wake_panels.get(index)?;
        self.remaining -= 1;
        self.next = panel.downstream;
        Some((index, panel))
    }
}
