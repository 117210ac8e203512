//! Dense influence matrix assembly
//!
//! `A[i][k]` is the influence of a unit doublet density on panel `k` at the
//! collocation point of panel `i`:
//!
//! - Neumann rows (and every thin-surface row): normal velocity `V_k(C_i)·n_i`
//! - Dirichlet rows: potential `φ_k(C_i)`, with the `2π` self term on the diagonal
//!
//! Each row is built in three passes (direct, image, wake chains) into a
//! scratch row and only copied into the output once complete. Rows are split
//! into `n_blocks` contiguous blocks assembled in parallel; each worker owns
//! its rows exclusively.

use crate::core::assembly::kernels;
use crate::core::assembly::wake::WakeCoupling;
use crate::core::cancel::CancellationToken;
use crate::core::config::{AnalysisConfig, Precision};
use crate::core::error::AnalysisError;
use crate::core::mesh::PanelMesh;
use crate::core::parallel::{block_size, parallel_chunks_mut_map};
use ndarray::Array2;
use solvers::RealField;
use std::sync::atomic::{AtomicBool, Ordering};

/// Assembled influence matrix in the configured precision
#[derive(Debug, Clone, PartialEq)]
pub enum InfluenceMatrix {
    /// f32 storage
    Single(Array2<f32>),
    /// f64 storage
    Double(Array2<f64>),
}

impl InfluenceMatrix {
    /// Number of rows (= columns)
    pub fn dim(&self) -> usize {
        match self {
            InfluenceMatrix::Single(a) => a.nrows(),
            InfluenceMatrix::Double(a) => a.nrows(),
        }
    }

    /// Storage precision
    pub fn precision(&self) -> Precision {
        match self {
            InfluenceMatrix::Single(_) => Precision::Single,
            InfluenceMatrix::Double(_) => Precision::Double,
        }
    }

    /// Entry `(i, k)` widened to f64
    pub fn get(&self, i: usize, k: usize) -> f64 {
        match self {
            InfluenceMatrix::Single(a) => a[[i, k]] as f64,
            InfluenceMatrix::Double(a) => a[[i, k]],
        }
    }

    /// Copy as an f64 matrix
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            InfluenceMatrix::Single(a) => a.mapv(|v| v as f64),
            InfluenceMatrix::Double(a) => a.clone(),
        }
    }
}

/// Builder for the influence matrix of one mesh under one configuration
pub struct InfluenceMatrixBuilder<'a> {
    mesh: &'a PanelMesh,
    config: &'a AnalysisConfig,
    cancel: CancellationToken,
    wake: WakeCoupling,
}

impl<'a> InfluenceMatrixBuilder<'a> {
    /// Create a builder; the wake columns are grouped once here
    pub fn new(mesh: &'a PanelMesh, config: &'a AnalysisConfig) -> Self {
        Self {
            mesh,
            config,
            cancel: CancellationToken::new(),
            wake: WakeCoupling::new(mesh),
        }
    }

    /// Use an externally controlled cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// True if row `i` enforces the Neumann condition
    pub fn row_is_neumann(&self, i: usize) -> bool {
        self.config.is_neumann() || self.mesh.panels[i].is_mid()
    }

    /// Compute row `i` into `row` (length `n`)
    ///
    /// On error the content of `row` is unspecified.
    pub fn influence_row(&self, i: usize, row: &mut [f64]) -> Result<(), AnalysisError> {
        let panels = &self.mesh.panels;
        let target = &panels[i];
        let c = target.cog();
        let normal = target.normal();
        let neumann = self.row_is_neumann(i);

        if self.cancel.poll() {
            return Err(AnalysisError::Cancelled);
        }

        for (k, (panel, value)) in panels.iter().zip(row.iter_mut()).enumerate() {
            if self.cancel.poll() {
                return Err(AnalysisError::Cancelled);
            }
            *value = if neumann {
                kernels::doublet_velocity(panel, &c, self.config, true).dot(&normal)
            } else {
                kernels::doublet_potential(panel, &c, i == k, self.config, true)
            };
            if !value.is_finite() {
                log::error!(
                    "numerical error when calculating the influence of panel {} on panel {}",
                    k,
                    i
                );
                return Err(AnalysisError::Numerical { row: i, col: k });
            }
        }

        self.wake.add_to_row(
            self.mesh,
            i,
            row,
            &c,
            neumann.then_some(&normal),
            self.config,
            &self.cancel,
        )
    }

    /// Assemble into a caller-owned row-major `n × n` buffer
    ///
    /// Rows are written only once complete, so after a cancellation or an
    /// error every row at or beyond the one being processed is untouched.
    pub fn assemble_into<T: RealField>(&self, buffer: &mut [T]) -> Result<(), AnalysisError> {
        let n = self.mesh.n_panels();
        if buffer.len() != n * n {
            return Err(AnalysisError::DimensionMismatch {
                expected: n * n,
                got: buffer.len(),
            });
        }
        if n == 0 {
            return Ok(());
        }

        let block_rows = block_size(n, self.config.n_blocks);
        log::info!(
            "Assembling {}x{} influence matrix ({} blocks of {} rows, {} wake)",
            n,
            n,
            n.div_ceil(block_rows),
            block_rows,
            if self.wake.is_empty() { "no" } else { "with" }
        );

        let failed = AtomicBool::new(false);
        let results = parallel_chunks_mut_map(buffer, block_rows * n, |iblock, chunk| {
            let first = iblock * block_rows;
            let mut scratch = vec![0.0f64; n];
            for (r, out) in chunk.chunks_mut(n).enumerate() {
                if failed.load(Ordering::Acquire) {
                    return Err(AnalysisError::Cancelled);
                }
                if let Err(e) = self.influence_row(first + r, &mut scratch) {
                    failed.store(true, Ordering::Release);
                    return Err(e);
                }
                for (o, v) in out.iter_mut().zip(scratch.iter()) {
                    *o = T::from_f64_lossy(*v);
                }
            }
            Ok(())
        });

        first_error(results)?;
        log::debug!("Influence matrix assembled");
        Ok(())
    }

    /// Assemble a new matrix in the configured precision
    ///
    /// A partially built matrix is dropped on failure.
    pub fn build(&self) -> Result<InfluenceMatrix, AnalysisError> {
        let n = self.mesh.n_panels();
        match self.config.precision {
            Precision::Single => {
                let mut data = vec![0.0f32; n * n];
                self.assemble_into(&mut data)?;
                Ok(InfluenceMatrix::Single(to_square(data, n)?))
            }
            Precision::Double => {
                let mut data = vec![0.0f64; n * n];
                self.assemble_into(&mut data)?;
                Ok(InfluenceMatrix::Double(to_square(data, n)?))
            }
        }
    }
}

fn to_square<T>(data: Vec<T>, n: usize) -> Result<Array2<T>, AnalysisError> {
    let got = data.len();
    Array2::from_shape_vec((n, n), data).map_err(|_| AnalysisError::DimensionMismatch {
        expected: n * n,
        got,
    })
}

/// First real error of the blocks; blocks stopped because another one failed
/// only report `Cancelled`.
pub(crate) fn first_error(results: Vec<Result<(), AnalysisError>>) -> Result<(), AnalysisError> {
    let mut cancelled = false;
    for r in results {
        match r {
            Ok(()) => {}
            Err(AnalysisError::Cancelled) => cancelled = true,
            Err(e) => return Err(e),
        }
    }
    if cancelled {
        Err(AnalysisError::Cancelled)
    } else {
        Ok(())
    }
}
