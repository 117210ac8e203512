//! Cooperative cancellation
//!
//! A [`CancellationToken`] is cloned into every worker. Loops poll it at the
//! outer panel loop, the inner panel loop and every wake-chain step, and exit
//! as soon as it trips.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    polls: AtomicUsize,
    poll_limit: Option<usize>,
}

/// Shared, clonable cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// A token that only trips when [`cancel`](Self::cancel) is called
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips by itself on the `limit`-th poll
    ///
    /// Gives deterministic, budgeted runs: with a single worker the
    /// cancellation point is reproducible to the iteration.
    pub fn with_poll_limit(limit: usize) -> Self {
        Self {
            state: Arc::new(TokenState {
                poll_limit: Some(limit),
                ..Default::default()
            }),
        }
    }

    /// Request cancellation (idempotent)
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// Read the flag without counting a poll
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Poll from a work loop; counts towards the poll limit
    #[inline]
    pub fn poll(&self) -> bool {
        if self.state.cancelled.load(Ordering::Acquire) {
            return true;
        }
        if let Some(limit) = self.state.poll_limit {
            let n = self.state.polls.fetch_add(1, Ordering::AcqRel) + 1;
            if n >= limit {
                self.cancel();
                return true;
            }
        }
        false
    }

    /// Number of polls counted so far (only tracked with a poll limit)
    pub fn poll_count(&self) -> usize {
        self.state.polls.load(Ordering::Acquire)
    }
}
