//! Request pacing and fault isolation
//!
//! The governor owns the retry policy used for page navigation and
//! classifier calls, the circuit breaker that sits in front of the
//! classifier, and the pause between crawl depths.

pub mod circuit;
pub mod retry;

pub use circuit::{transition, CircuitBreaker, CircuitEvent, CircuitSettings, CircuitState};
pub use retry::{Retried, RetryPolicy};

use crate::config::Config;
use crate::leads::ClassifierError;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a classifier call made through the circuit breaker
#[derive(Debug)]
pub enum Governed<T> {
    /// The call succeeded
    Done(T),
    /// The call failed after retries; counted against the circuit
    Failed(ClassifierError),
    /// The circuit is open; the call was not attempted
    CircuitOpen,
}

/// Shared pacing and fault-isolation state for one session
#[derive(Debug)]
pub struct Governor {
    retry: RetryPolicy,
    breaker: Mutex<CircuitBreaker>,
    inter_depth_delay: Duration,
}

impl Governor {
    pub fn new(retry: RetryPolicy, circuit: CircuitSettings, inter_depth_delay: Duration) -> Self {
        Self {
            retry,
            breaker: Mutex::new(CircuitBreaker::new(circuit)),
            inter_depth_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RetryPolicy::from_config(&config.governor),
            CircuitSettings {
                failure_threshold: config.governor.failure_threshold,
                cooldown: Duration::from_secs(config.governor.cooldown_secs),
            },
            Duration::from_millis(config.crawler.inter_depth_delay_ms),
        )
    }

    /// Runs `op` under the retry policy
    pub async fn retry<T, E, F, Fut, P>(&self, what: &str, op: F, is_transient: P) -> Retried<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        self.retry.run(what, op, is_transient).await
    }

    /// Runs a classifier call behind the circuit breaker
    ///
    /// Transient errors are retried first; a call that still fails counts as
    /// one failure against the circuit. While the circuit is open the call is
    /// skipped and [`Governed::CircuitOpen`] is returned.
    pub async fn call_classifier<T, F, Fut>(&self, what: &str, op: F) -> Governed<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifierError>>,
    {
        if !self.with_breaker(|b| b.allow(Instant::now())) {
            tracing::debug!("Circuit open, skipping {}", what);
            return Governed::CircuitOpen;
        }

        let outcome = self
            .retry
            .run(what, op, ClassifierError::is_transient)
            .await;

        match outcome.result {
            Ok(value) => {
                self.with_breaker(|b| b.record_success(Instant::now()));
                Governed::Done(value)
            }
            Err(e) => {
                tracing::warn!("{} failed after {} attempt(s): {}", what, outcome.attempts, e);
                self.with_breaker(|b| b.record_failure(Instant::now()));
                Governed::Failed(e)
            }
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.with_breaker(|b| b.state())
    }

    /// Sleeps for the configured pause between two crawl depths
    pub async fn pause_between_depths(&self) {
        if !self.inter_depth_delay.is_zero() {
            tracing::debug!("Pausing {:?} before next depth", self.inter_depth_delay);
            tokio::time::sleep(self.inter_depth_delay).await;
        }
    }

    fn with_breaker<R>(&self, f: impl FnOnce(&mut CircuitBreaker) -> R) -> R {
        // A poisoned lock still holds a valid state machine value.
        let mut guard = match self.breaker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackoffKind;
    use std::cell::Cell;

    fn governor(threshold: u32, cooldown: Duration) -> Governor {
        Governor::new(
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
                backoff: BackoffKind::Fixed,
            },
            CircuitSettings {
                failure_threshold: threshold,
                cooldown,
            },
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_opens_after_consecutive_failures() {
        let gov = governor(5, Duration::from_secs(60));
        let calls = Cell::new(0);

        for _ in 0..5 {
            let outcome: Governed<()> = gov
                .call_classifier("classify", || {
                    calls.set(calls.get() + 1);
                    async { Err(ClassifierError::Timeout) }
                })
                .await;
            assert!(matches!(outcome, Governed::Failed(_)));
        }
        assert!(matches!(gov.circuit_state(), CircuitState::Open { .. }));

        // Sixth call never reaches the classifier
        let outcome: Governed<()> = gov
            .call_classifier("classify", || {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            })
            .await;
        assert!(matches!(outcome, Governed::CircuitOpen));
        assert_eq!(calls.get(), 5);
    }

    #[tokio::test]
    async fn test_success_keeps_circuit_closed() {
        let gov = governor(2, Duration::from_secs(60));

        let _: Governed<()> = gov
            .call_classifier("classify", || async { Err(ClassifierError::Timeout) })
            .await;
        let ok = gov.call_classifier("classify", || async { Ok(7) }).await;
        assert!(matches!(ok, Governed::Done(7)));

        let _: Governed<()> = gov
            .call_classifier("classify", || async { Err(ClassifierError::Timeout) })
            .await;
        assert_eq!(
            gov.circuit_state(),
            CircuitState::Closed {
                consecutive_failures: 1
            }
        );
    }

    #[tokio::test]
    async fn test_half_open_trial_closes_circuit() {
        let gov = governor(1, Duration::ZERO);

        let _: Governed<()> = gov
            .call_classifier("classify", || async { Err(ClassifierError::Timeout) })
            .await;
        assert!(matches!(gov.circuit_state(), CircuitState::Open { .. }));

        // Zero cooldown: the next call is the half-open trial
        let ok = gov.call_classifier("classify", || async { Ok("lead") }).await;
        assert!(matches!(ok, Governed::Done("lead")));
        assert_eq!(gov.circuit_state(), CircuitState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_depths_waits() {
        let mut config = Config::default();
        config.crawler.inter_depth_delay_ms = 1500;
        let gov = Governor::from_config(&config);

        let start = tokio::time::Instant::now();
        gov.pause_between_depths().await;
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_half_open_refuses_calls_during_trial() {
        let gov = governor(1, Duration::ZERO);
        let _: Governed<()> = gov
            .call_classifier("classify", || async { Err(ClassifierError::Timeout) })
            .await;

        let trial = gov.call_classifier("trial", || async {
            tokio::task::yield_now().await;
            Ok(1)
        });
        let second = gov.call_classifier("second", || async { Ok(2) });
        let (trial, second) = tokio::join!(trial, second);

        assert!(matches!(trial, Governed::Done(1)));
        assert!(matches!(second, Governed::CircuitOpen));
        assert_eq!(gov.circuit_state(), CircuitState::default());
    }
}
