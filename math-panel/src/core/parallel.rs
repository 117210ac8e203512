//! Portable parallel iteration abstractions
//!
//! This module provides the fork-join primitives used by assembly and
//! post-processing:
//! - `native` feature: Uses rayon
//! - otherwise: Falls back to sequential iteration
//!
//! Every worker owns a disjoint slice of the output, so no locking is needed
//! beyond the implicit join at the end of each call.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::core::parallel::*;
//!
//! // One closure call per block of `block_len` elements
//! let status: Vec<bool> = parallel_chunks_mut_map(&mut buffer, block_len, |iblock, rows| {
//!     fill(iblock, rows)
//! });
//! ```

/// Check if parallel processing is available
#[inline]
pub fn is_parallel_available() -> bool {
    cfg!(feature = "native")
}

/// Parallel map over a range of indices
///
/// When the `native` feature is enabled, uses rayon's parallel iterator.
/// Otherwise, falls back to sequential iteration.
#[cfg(feature = "native")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "native"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    F: Fn(usize) -> U,
{
    (0..count).map(f).collect()
}

/// Split `data` into blocks of `chunk_len` elements and map each block
///
/// The closure receives the block index and exclusive access to the block.
/// Results come back in block order.
#[cfg(feature = "native")]
pub fn parallel_chunks_mut_map<T, U, F>(data: &mut [T], chunk_len: usize, f: F) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn(usize, &mut [T]) -> U + Sync + Send,
{
    use rayon::prelude::*;
    data.par_chunks_mut(chunk_len.max(1))
        .enumerate()
        .map(|(i, chunk)| f(i, chunk))
        .collect()
}

#[cfg(not(feature = "native"))]
pub fn parallel_chunks_mut_map<T, U, F>(data: &mut [T], chunk_len: usize, f: F) -> Vec<U>
where
    F: Fn(usize, &mut [T]) -> U,
{
    data.chunks_mut(chunk_len.max(1))
        .enumerate()
        .map(|(i, chunk)| f(i, chunk))
        .collect()
}

/// Rows per block for `n` rows split in `n_blocks` blocks
///
/// One extra row per block absorbs the rounding of the division.
#[inline]
pub fn block_size(n: usize, n_blocks: usize) -> usize {
    n / n_blocks.max(1) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_follows_native_feature() {
        assert_eq!(is_parallel_available(), cfg!(feature = "native"));
    }

    #[test]
    fn test_parallel_map_indexed() {
        let result = parallel_map_indexed(5, |i| i * 2);
        assert_eq!(result, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_chunks_are_disjoint_and_ordered() {
        let mut data = vec![0usize; 10];
        let firsts = parallel_chunks_mut_map(&mut data, 4, |iblock, chunk| {
            for (j, x) in chunk.iter_mut().enumerate() {
                *x = iblock * 4 + j;
            }
            iblock * 4
        });
        assert_eq!(firsts, vec![0, 4, 8]);
        assert_eq!(data, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_block_size_covers_all_rows() {
        for n in [1, 7, 100, 501] {
            for blocks in [1, 3, 8] {
                assert!(block_size(n, blocks) * blocks >= n);
            }
        }
    }
}
