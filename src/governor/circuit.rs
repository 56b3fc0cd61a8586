//! Circuit breaker state machine
//!
//! The breaker is a plain value with pure transition functions; callers pass
//! the current [`Instant`] in, which keeps every transition testable without
//! sleeping or touching the network.

use std::time::{Duration, Instant};

/// Current breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls go through; counts consecutive failures
    Closed { consecutive_failures: u32 },
    /// Calls are short-circuited until the cooldown elapses
    Open { opened_at: Instant },
    /// The cooldown elapsed; a single trial call may test recovery
    HalfOpen,
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::Closed {
            consecutive_failures: 0,
        }
    }
}

/// Something that happened to a governed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitEvent {
    Success,
    Failure,
    /// Time passed; an open circuit may move to half-open
    Tick,
}

/// Breaker thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSettings {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time the circuit stays open before a trial call
    pub cooldown: Duration,
}

/// Computes the next state for an event
///
/// | From       | Event   | To                                  |
/// |------------|---------|-------------------------------------|
/// | Closed(n)  | Success | Closed(0)                           |
/// | Closed(n)  | Failure | Closed(n+1), or Open at threshold   |
/// | Open       | Tick    | HalfOpen once the cooldown elapsed  |
/// | HalfOpen   | Success | Closed(0)                           |
/// | HalfOpen   | Failure | Open (cooldown restarts)            |
pub fn transition(
    state: CircuitState,
    event: CircuitEvent,
    settings: CircuitSettings,
    now: Instant,
) -> CircuitState {
    match (state, event) {
        (CircuitState::Closed { .. }, CircuitEvent::Success)
        | (CircuitState::HalfOpen, CircuitEvent::Success) => CircuitState::default(),

        (
            CircuitState::Closed {
                consecutive_failures,
            },
            CircuitEvent::Failure,
        ) => {
            let failures = consecutive_failures + 1;
            if failures >= settings.failure_threshold {
                CircuitState::Open { opened_at: now }
            } else {
                CircuitState::Closed {
                    consecutive_failures: failures,
                }
            }
        }

        (CircuitState::HalfOpen, CircuitEvent::Failure) => CircuitState::Open { opened_at: now },

        (CircuitState::Open { opened_at }, CircuitEvent::Tick) => {
            if now.saturating_duration_since(opened_at) >= settings.cooldown {
                CircuitState::HalfOpen
            } else {
                state
            }
        }

        // A late result for a call that started before the circuit opened
        // does not change an open circuit.
        (CircuitState::Open { .. }, _) => state,

        (_, CircuitEvent::Tick) => state,
    }
}

/// Breaker holding its own state
///
/// While half-open, only one trial call is admitted until its outcome is
/// recorded.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    settings: CircuitSettings,
    state: CircuitState,
    trial_in_flight: bool,
}

impl CircuitBreaker {
    pub fn new(settings: CircuitSettings) -> Self {
        Self {
            settings,
            state: CircuitState::default(),
            trial_in_flight: false,
        }
    }

    /// Returns the state without advancing time
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Returns true if a call may be attempted at `now`
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open here and
    /// lets the trial call through. Further calls are refused until the
    /// trial's outcome is recorded.
    pub fn allow(&mut self, now: Instant) -> bool {
        self.state = transition(self.state, CircuitEvent::Tick, self.settings, now);
        match self.state {
            CircuitState::Closed { .. } => true,
            CircuitState::Open { .. } => false,
            CircuitState::HalfOpen if self.trial_in_flight => false,
            CircuitState::HalfOpen => {
                self.trial_in_flight = true;
                true
            }
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.apply(CircuitEvent::Success, now);
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.apply(CircuitEvent::Failure, now);
    }

    fn apply(&mut self, event: CircuitEvent, now: Instant) {
        self.trial_in_flight = false;
        let next = transition(self.state, event, self.settings, now);
        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            match next {
                CircuitState::Open { .. } => tracing::warn!(
                    "Classifier circuit opened; using offline extraction for {:?}",
                    self.settings.cooldown
                ),
                CircuitState::Closed { .. } => tracing::info!("Classifier circuit closed"),
                CircuitState::HalfOpen => {}
            }
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CircuitSettings {
        CircuitSettings {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_failures_below_threshold_stay_closed() {
        let now = Instant::now();
        let mut state = CircuitState::default();
        for _ in 0..2 {
            state = transition(state, CircuitEvent::Failure, settings(), now);
        }
        assert_eq!(
            state,
            CircuitState::Closed {
                consecutive_failures: 2
            }
        );
    }

    #[test]
    fn test_threshold_opens() {
        let now = Instant::now();
        let mut state = CircuitState::default();
        for _ in 0..3 {
            state = transition(state, CircuitEvent::Failure, settings(), now);
        }
        assert_eq!(state, CircuitState::Open { opened_at: now });
    }

    #[test]
    fn test_success_resets_count() {
        let now = Instant::now();
        let state = CircuitState::Closed {
            consecutive_failures: 2,
        };
        let state = transition(state, CircuitEvent::Success, settings(), now);
        assert_eq!(state, CircuitState::default());
    }

    #[test]
    fn test_open_waits_for_cooldown() {
        let opened = Instant::now();
        let state = CircuitState::Open { opened_at: opened };

        let early = transition(
            state,
            CircuitEvent::Tick,
            settings(),
            opened + Duration::from_secs(59),
        );
        assert_eq!(early, state);

        let later = transition(
            state,
            CircuitEvent::Tick,
            settings(),
            opened + Duration::from_secs(60),
        );
        assert_eq!(later, CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_outcomes() {
        let now = Instant::now();
        assert_eq!(
            transition(CircuitState::HalfOpen, CircuitEvent::Success, settings(), now),
            CircuitState::default()
        );
        assert_eq!(
            transition(CircuitState::HalfOpen, CircuitEvent::Failure, settings(), now),
            CircuitState::Open { opened_at: now }
        );
    }

    #[test]
    fn test_open_ignores_late_results() {
        let now = Instant::now();
        let state = CircuitState::Open { opened_at: now };
        assert_eq!(transition(state, CircuitEvent::Success, settings(), now), state);
        assert_eq!(transition(state, CircuitEvent::Failure, settings(), now), state);
    }

    #[test]
    fn test_breaker_full_cycle() {
        let start = Instant::now();
        let mut breaker = CircuitBreaker::new(settings());

        for _ in 0..3 {
            assert!(breaker.allow(start));
            breaker.record_failure(start);
        }
        assert!(!breaker.allow(start + Duration::from_secs(1)));

        let after_cooldown = start + Duration::from_secs(61);
        assert!(breaker.allow(after_cooldown));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success(after_cooldown);
        assert_eq!(breaker.state(), CircuitState::default());
    }

    #[test]
    fn test_half_open_admits_one_trial() {
        let start = Instant::now();
        let mut breaker = CircuitBreaker::new(settings());
        for _ in 0..3 {
            breaker.record_failure(start);
        }

        let after_cooldown = start + Duration::from_secs(60);
        assert!(breaker.allow(after_cooldown));
        assert!(!breaker.allow(after_cooldown));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        // A failed trial reopens; the next trial waits for a new cooldown
        breaker.record_failure(after_cooldown);
        assert!(!breaker.allow(after_cooldown + Duration::from_secs(59)));

        let second_trial = after_cooldown + Duration::from_secs(60);
        assert!(breaker.allow(second_trial));
        breaker.record_success(second_trial);
        assert!(breaker.allow(second_trial));
        assert!(breaker.allow(second_trial));
    }
}
