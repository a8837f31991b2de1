//! Retry utilities with exponential backoff and jitter for catalog calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::catalogs::CatalogError;

/// Upper bound of the random jitter, as a fraction of the exponential delay
pub const MAX_JITTER: f64 = 0.3;

/// Status codes retried by every preset
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Retry behaviour for one call chain
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    /// Delay before the first retry, before jitter
    pub initial_delay: Duration,
    /// Cap applied after jitter
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// HTTP statuses that are worth another attempt
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        standard_retry_policy()
    }
}

impl RetryPolicy {
    /// Whether `err` should trigger another attempt under this policy
    pub fn should_retry(&self, err: &CatalogError) -> bool {
        match err {
            CatalogError::Timeout(_) | CatalogError::Network(_) => true,
            CatalogError::RateLimited
            | CatalogError::Server { .. }
            | CatalogError::Client { .. } => err
                .status()
                .is_some_and(|status| self.retryable_status_codes.contains(&status)),
            CatalogError::Malformed(_)
            | CatalogError::Cancelled
            | CatalogError::InvalidRequest(_)
            | CatalogError::NotImplemented => false,
        }
    }

    /// Backoff for a zero-based `attempt` with an explicit jitter fraction.
    ///
    /// `min(initial * multiplier^attempt + jitter * exponential, max_delay)`
    pub fn delay_for(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        let exponential = self.initial_delay.as_secs_f64()
            * self
                .backoff_multiplier
                .max(0.0)
                .powi(attempt.min(i32::MAX as u32) as i32);
        let jitter = jitter_fraction.clamp(0.0, MAX_JITTER) * exponential;
        let capped = (exponential + jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    /// Backoff for a zero-based `attempt` with random jitter
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_for(attempt, rand::random::<f64>() * MAX_JITTER)
    }
}

/// Execute an async operation with retry logic
///
/// `make_call` is invoked once per attempt and is expected to apply its own
/// timeout. Attempts never overlap: the next one starts only after the
/// backoff delay has elapsed. Cancelling `cancel` stops the loop at the next
/// attempt boundary or in the middle of a backoff sleep.
///
/// # Returns
///
/// The first successful result, the first non-retryable error, or the last
/// error once `max_retries` retries have been spent.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut make_call: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        match make_call().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        "Call succeeded on attempt {} after {} transient failures",
                        attempt + 1,
                        attempt
                    );
                }
                return Ok(result);
            }
            Err(error) if !policy.should_retry(&error) => return Err(error),
            Err(error) => {
                if attempt >= policy.max_retries {
                    tracing::warn!(
                        "Call failed after {} attempts: {}",
                        attempt + 1,
                        error
                    );
                    return Err(error);
                }

                let delay = policy.delay(attempt);
                tracing::debug!(
                    "Transient error on attempt {}: {}, retrying in {:?}",
                    attempt + 1,
                    error,
                    delay
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
                    _ = sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

/// Few quick retries, for interactive lookups
pub fn quick_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(300),
        max_delay: Duration::from_secs(2),
        backoff_multiplier: 2.0,
        retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
    }
}

/// Balanced default for catalog searches
pub fn standard_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(10),
        backoff_multiplier: 2.0,
        retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
    }
}

/// More and longer retries, for catalogs with strict rate limits
pub fn patient_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 5,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(30),
        backoff_multiplier: 2.0,
        retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
    }
}

/// Single attempt
pub fn no_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 0,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        backoff_multiplier: 1.0,
        retryable_status_codes: Vec::new(),
    }
}

/// Look up a preset by name (`quick`, `standard`, `patient`, `none`)
pub fn retry_policy_named(name: &str) -> Option<RetryPolicy> {
    match name.trim().to_ascii_lowercase().as_str() {
        "quick" => Some(quick_retry_policy()),
        "standard" => Some(standard_retry_policy()),
        "patient" => Some(patient_retry_policy()),
        "none" | "no_retry" => Some(no_retry_policy()),
        _ => None,
    }
}
