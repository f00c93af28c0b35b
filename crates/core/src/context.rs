//! Per-operation context supplied by the caller.

use std::time::{Duration, Instant};

/// Caller-supplied context for a single ledger operation.
///
/// The deadline bounds session acquisition and all work up to commit. A commit
/// that has started is always awaited to completion, so a durable commit is
/// never reported as a failure.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct OperationContext {
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Context without a deadline (only the store's own timeouts apply).
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }

    /// The tighter of the caller's remaining time and `limit`.
    pub fn bound(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(limit),
            None => limit,
        }
    }
}
