// Circuit breaker for the vendor endpoint.
//
// Counts consecutive transient failures; at the threshold the breaker
// opens and suppresses calls for a cooldown, after which a single trial
// call is allowed. A failed trial restarts the cooldown, a successful
// one closes the breaker.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    pub fn state(&self) -> BreakerState {
        if self.opened_at.is_some() {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether a call may go out at `now`. Open state allows exactly the
    /// trial call once the cooldown has elapsed.
    pub fn allow_call(&self, now: Instant) -> bool {
        match self.opened_at {
            None => true,
            Some(opened_at) => now.duration_since(opened_at) >= self.cooldown,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    /// Record a transient failure. Opens at the threshold; a failure
    /// while already open (the trial call) restarts the cooldown.
    pub fn record_failure(&mut self, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.threshold {
            self.opened_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(300);

    #[test]
    fn opens_after_threshold_failures() {
        let mut breaker = CircuitBreaker::new(3, COOLDOWN);
        let now = Instant::now();

        breaker.record_failure(now);
        breaker.record_failure(now);
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.allow_call(now));

        breaker.record_failure(now);
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow_call(now));
    }

    #[test]
    fn success_resets_failure_count() {
        let mut breaker = CircuitBreaker::new(3, COOLDOWN);
        let now = Instant::now();

        breaker.record_failure(now);
        breaker.record_failure(now);
        breaker.record_success();
        breaker.record_failure(now);
        breaker.record_failure(now);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn allows_trial_call_after_cooldown() {
        let mut breaker = CircuitBreaker::new(1, COOLDOWN);
        let opened = Instant::now();
        breaker.record_failure(opened);

        assert!(!breaker.allow_call(opened + Duration::from_secs(299)));
        assert!(breaker.allow_call(opened + COOLDOWN));
    }

    #[test]
    fn failed_trial_restarts_cooldown() {
        let mut breaker = CircuitBreaker::new(1, COOLDOWN);
        let opened = Instant::now();
        breaker.record_failure(opened);

        let trial = opened + COOLDOWN;
        assert!(breaker.allow_call(trial));
        breaker.record_failure(trial);

        assert!(!breaker.allow_call(trial + Duration::from_secs(299)));
        assert!(breaker.allow_call(trial + COOLDOWN));
    }

    #[test]
    fn successful_trial_closes_breaker() {
        let mut breaker = CircuitBreaker::new(1, COOLDOWN);
        let opened = Instant::now();
        breaker.record_failure(opened);
        breaker.record_success();

        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }
}
