use std::future::Future;

use tally_core::{LedgerError, LedgerResult, OperationContext};

/// Run `work` under the caller's deadline.
///
/// On expiry the future is dropped, which drops any session it holds and so
/// rolls it back. Commits must happen outside of this wrapper.
pub(crate) async fn before_deadline<T, F>(ctx: &OperationContext, work: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    if ctx.is_expired() {
        return Err(deadline_exceeded());
    }

    match ctx.remaining() {
        None => work.await,
        Some(left) => tokio::time::timeout(left, work)
            .await
            .unwrap_or_else(|_| Err(deadline_exceeded())),
    }
}

fn deadline_exceeded() -> LedgerError {
    LedgerError::unavailable("deadline exceeded")
}
