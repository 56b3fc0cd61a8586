//! Bounded retry with fixed or exponential backoff

use crate::config::{BackoffKind, GovernorConfig};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: BackoffKind,
}

/// Result of a retried operation plus the number of attempts it took
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &GovernorConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            backoff: config.backoff,
        }
    }

    /// Delay before attempt `failed_attempt + 1`
    ///
    /// Exponential backoff doubles per failed attempt and is capped at
    /// `max_delay`.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Exponential => {
                let exponent = failed_attempt.saturating_sub(1).min(16);
                self.base_delay
                    .saturating_mul(1u32 << exponent)
                    .min(self.max_delay)
            }
        }
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent
    pub async fn run<T, E, F, Fut, P>(&self, what: &str, mut op: F, is_transient: P) -> Retried<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    return Retried {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let delay = self.delay_after(attempt);
                    tracing::debug!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Retried {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}
