use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::core::AppError;

/// Retry policy for provider calls: fixed attempt count, fixed inter-attempt
/// delay, no backoff growth.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 3 attempts, 500ms apart
        Self::new(3, Duration::from_millis(500))
    }
}

/// Outcome of a retried operation. Callers must handle the exhausted path
/// explicitly; there is no implicit error propagation out of the retry loop.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The operation succeeded within the allowed attempts
    Ok(T),
    /// Every attempt failed; carries the final error
    Exhausted { attempts: u32, last_error: AppError },
}

impl<T> RetryOutcome<T> {
    /// Convert into a Result, mapping the exhausted case to a provider error
    /// that names the operation and the attempt count.
    pub fn into_result(self, operation: &str) -> crate::core::Result<T> {
        match self {
            RetryOutcome::Ok(value) => Ok(value),
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => Err(AppError::provider(format!(
                "{} failed after {} attempts: {}",
                operation, attempts, last_error
            ))),
        }
    }
}

/// Run `op` up to `policy.attempts` times, sleeping `policy.delay` between
/// attempts. Returns an explicit outcome rather than raising on exhaustion.
pub async fn retry_fixed<T, F, Fut>(policy: RetryPolicy, operation: &str, op: F) -> RetryOutcome<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = crate::core::Result<T>>,
{
    let mut last_error: Option<AppError> = None;

    for attempt in 1..=policy.attempts {
        match op().await {
            Ok(value) => return RetryOutcome::Ok(value),
            Err(e) => {
                warn!(
                    operation = operation,
                    attempt = attempt,
                    max_attempts = policy.attempts,
                    error = %e,
                    "Provider call attempt failed"
                );
                last_error = Some(e);

                if attempt < policy.attempts {
                    sleep(policy.delay).await;
                }
            }
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.attempts,
        last_error: last_error
            .unwrap_or_else(|| AppError::internal("retry loop ran zero attempts")),
    }
}
