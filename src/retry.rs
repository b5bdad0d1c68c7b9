//! Retry logic with exponential backoff
//!
//! A fetch for one identifier may fail for reasons that go away on their own
//! (timeouts, connection resets, HTTP 503). This module retries those with
//! exponential backoff and optional jitter, and gives up immediately on
//! permanent failures.
//!
//! # Example
//!
//! ```no_run
//! use safe_fetch::config::RetryConfig;
//! use safe_fetch::error::Error;
//! use safe_fetch::retry::fetch_with_retry;
//!
//! # async fn example() {
//! let config = RetryConfig::default();
//! let outcome = fetch_with_retry(&config, || async {
//!     Ok::<_, Error>("record".to_string())
//! })
//! .await;
//! assert_eq!(outcome.attempts, 1);
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, server busy) return `true`.
/// Permanent failures (not found, malformed response, bad identifier) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => {
                if let Some(status) = e.status() {
                    return is_retryable_status(status.as_u16());
                }
                e.is_timeout() || e.is_connect() || e.is_request()
            }
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Collaborators report free-form failures; retry the ones that read as transient
            Error::Fetch(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("temporarily")
                    || msg.contains("service unavailable")
                    || msg.contains("rate limit")
                    || msg.contains("try again")
            }
            Error::Config { .. }
            | Error::InvalidIdentifier(_)
            | Error::InvalidUrl(_)
            | Error::Serialization(_)
            | Error::Other(_) => false,
        }
    }
}

/// 408 Request Timeout, 429 Too Many Requests and every 5xx
fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Final result of an operation run under a retry policy
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Result of the last call
    pub result: Result<T, E>,
    /// Number of times the operation was called
    pub attempts: u32,
}

/// Execute an async operation with exponential backoff retry logic
///
/// The operation is called once, then again after each retryable failure
/// until it succeeds, fails permanently, or `config.max_attempts` retries are
/// used up. The returned [`RetryOutcome`] carries the last result and the
/// number of calls made.
pub async fn fetch_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut retries = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!(attempts = retries + 1, "Fetch succeeded after retry");
                }
                return RetryOutcome {
                    result: Ok(result),
                    attempts: retries + 1,
                };
            }
            Err(e) if e.is_retryable() && retries < config.max_attempts => {
                retries += 1;

                tracing::warn!(
                    error = %e,
                    attempt = retries,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Fetch failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };
                tokio::time::sleep(jittered_delay).await;

                delay = next_delay(delay, config);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = retries + 1,
                        "Fetch failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "Fetch failed with non-retryable error");
                }
                return RetryOutcome {
                    result: Err(e),
                    attempts: retries + 1,
                };
            }
        }
    }
}

/// Grow `delay` by the backoff multiplier, capped at `max_delay`
///
/// A product that does not fit in a `Duration` saturates to `max_delay`.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .map_or(config.max_delay, |next| next.min(config.max_delay))
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The jittered delay lies between `delay` and `2 * delay`. Delays too large
/// to double are returned unchanged.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
        .map_or(delay, |jittered| jittered.max(delay))
}
