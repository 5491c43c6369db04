//! Per-endpoint retry ladder.

use std::time::Duration;

use rand::Rng;

use crate::attempt::{AttemptOutcome, FailureKind};

/// What the cascade does after one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Validated success; stop the cascade.
    Accept,
    /// Retry the same endpoint after the given delay.
    Retry(Duration),
    /// Give up on this endpoint and move to the next one.
    Advance,
}

/// Jittered linear backoff: `base + uniform(0..=jitter)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: Duration,
}

impl Backoff {
    pub fn new(base_ms: u64, jitter_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            jitter: Duration::from_millis(jitter_ms),
        }
    }

    pub fn delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.base.saturating_add(Duration::from_millis(extra))
    }
}

/// Decides the next step for an endpoint.
///
/// `attempt` is 0-based; `attempts` is the total budget (`retries + 1`).
/// `accepted` is the validator's verdict and is only read for `Success`.
pub fn next_step(
    outcome: &AttemptOutcome,
    accepted: bool,
    attempt: usize,
    attempts: usize,
    backoff: &Backoff,
) -> Step {
    match outcome {
        AttemptOutcome::Success { .. } if accepted => return Step::Accept,
        AttemptOutcome::RateLimited { .. } => return Step::Advance,
        AttemptOutcome::TransportFailure {
            kind: FailureKind::Timeout,
            ..
        } => return Step::Advance,
        _ => {}
    }

    if attempt + 1 >= attempts {
        Step::Advance
    } else {
        Step::Retry(backoff.delay())
    }
}
