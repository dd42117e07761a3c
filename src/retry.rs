//! Unbounded doubling backoff for carrier requests.
//!
//! This module provides the [`retry_with_backoff`] helper used by the HTTP
//! carrier to ride out network failures.
//!
//! # Retry Strategy
//!
//! - Only retries errors for which [`TransportError::is_retryable`] is true
//!   (network failures); anything else is returned at once
//! - The first retry waits the configured timeout `T`; each further failure
//!   doubles the wait: `T`, `2T`, `4T`, ...
//! - No attempt limit and no delay cap. Retrying stops only on success, on a
//!   non-retryable error, or when the task running it is aborted
//! - No jitter, so the schedule is exact and observable
//!
//! [`TransportError::is_retryable`]: crate::TransportError::is_retryable

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Doubling delay sequence starting at a base timeout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    current: Duration,
}

impl Backoff {
    /// Start the sequence at `initial`.
    pub fn new(initial: Duration) -> Self {
        Self { current: initial }
    }

    /// Delay to apply if the current attempt fails.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Move to the next, doubled, delay.
    ///
    /// Saturates at `Duration::MAX` rather than overflowing.
    pub fn advance(&mut self) {
        self.current = self.current.saturating_mul(2);
    }
}

/// Retry an async operation with doubling backoff, indefinitely.
///
/// `operation` receives the timeout in force for that attempt: `timeout` on
/// the first call, twice that on the second, and so on. On a retryable
/// failure the helper sleeps for that same timeout before calling again.
///
/// # Example
///
/// ```ignore
/// let payload = retry_with_backoff(session.configured_timeout(), |_| async {
///     post_once(...).await
/// }).await?;
/// ```
pub(crate) async fn retry_with_backoff<F, Fut, T>(
    timeout: Duration,
    mut operation: F,
) -> crate::Result<T>
where
    F: FnMut(Duration) -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let mut backoff = Backoff::new(timeout);

    loop {
        let timeout = backoff.current();

        match operation(timeout).await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() => {
                crate::log_debug!("request failed ({err}), retrying in {timeout:?}");
                sleep(timeout).await;
                backoff.advance();
            }
            Err(err) => {
                // Non-retryable error, fail immediately
                return Err(err);
            }
        }
    }
}
