//! Retry-until-predicate primitive
//!
//! A single routine serves both the role propagation retry on function
//! creation and the throttling retry on web API calls. Each call owns its own
//! attempt counter, so budgets never leak between call sites.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ProvisionError;

/// Injected sleep, so callers (and tests) control how waiting happens
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Sleep on the tokio timer
pub fn tokio_sleep() -> SleepFn {
    Arc::new(|delay| Box::pin(tokio::time::sleep(delay)))
}

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay between two attempts, in milliseconds
    pub delay_ms: u64,

    /// Total number of attempts, including the first one
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
            max_attempts,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Role propagation: 10 attempts, 3 seconds apart
    pub fn role_propagation() -> Self {
        Self::new(Duration::from_millis(3000), 10)
    }

    /// Throttling: the backend paces us, so the budget is generous
    pub fn throttling() -> Self {
        Self::new(Duration::from_millis(3000), 50)
    }
}

/// Run `operation` until it succeeds, fails with a non-retriable error, or
/// the policy runs out of attempts. `on_retry` fires before every wait.
pub async fn retry_with_predicate<T, Op, Fut, P, R>(
    policy: &RetryPolicy,
    mut operation: Op,
    is_retriable: P,
    mut on_retry: R,
    sleep_fn: &SleepFn,
) -> Result<T, ProvisionError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProvisionError>>,
    P: Fn(&ProvisionError) -> bool,
    R: FnMut(),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_retriable(&e) => {
                debug!(
                    "Attempt {}/{} failed with retriable error: {}",
                    attempt, max_attempts, e
                );
                on_retry();
                sleep_fn(policy.delay()).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
