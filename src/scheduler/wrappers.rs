//! Adapters turning fallible async operations into task bodies

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{ExecuteFn, TaskOutcome};

/// Wraps an operation so that failures retry with exponential backoff and
/// success ends the task.
pub fn retry_wrapper<F, Fut>(op_name: &'static str, mut op: F) -> ExecuteFn
where
    F: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::new(move |token| {
        let fut = op(token);
        Box::pin(async move {
            match fut.await {
                Ok(()) => {
                    info!(op = op_name, "complete");
                    TaskOutcome::Done
                }
                Err(err) => {
                    error!(op = op_name, error = %err, "operation failed");
                    TaskOutcome::Retry
                }
            }
        })
    })
}

/// Wraps an operation into a periodic task: success reschedules after the
/// fixed period (resetting any retry backoff), failure retries with backoff.
pub fn periodic_wrapper<F, Fut>(op_name: &'static str, period: Duration, mut op: F) -> ExecuteFn
where
    F: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::new(move |token| {
        let fut = op(token);
        Box::pin(async move {
            match fut.await {
                Ok(()) => {
                    info!(op = op_name, "complete");
                    TaskOutcome::RetryAfter(period)
                }
                Err(err) => {
                    error!(op = op_name, error = %err, "operation failed");
                    TaskOutcome::Retry
                }
            }
        })
    })
}
