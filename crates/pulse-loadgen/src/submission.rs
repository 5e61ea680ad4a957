//! Per-job retry state machine.
//!
//! ```text
//!            Attempted(Ok)                       Succeeded
//! Pending ──────────────────────────────────────▶
//!    │       Attempted(Err fatal)                Failed
//!    ├──────────────────────────────────────────▶
//!    │       Attempted(Err retryable), budget    RetryWait ── WaitElapsed ──▶ Pending(attempt + 1)
//!    ├──────────────────────────────────────────▶
//!    │       Attempted(Err retryable), no budget Failed
//!    └──────────────────────────────────────────▶
//! ```
//!
//! `transition` is pure: the caller performs the network call and the
//! sleep, then feeds the outcome back in as an event.

use std::time::Duration;

use pulse_core::{JobHandle, SubmitError};

use crate::backoff::{Jitter, RetryPolicy};

/// Why a job ended up permanently failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The service rejected the request in a way retrying cannot fix.
    Fatal(SubmitError),
    /// Every attempt hit a retryable failure.
    RetriesExhausted(SubmitError),
}

impl FailureReason {
    pub fn error(&self) -> &SubmitError {
        match self {
            FailureReason::Fatal(e) | FailureReason::RetriesExhausted(e) => e,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Ready to issue attempt number `attempt` (0-based).
    Pending { attempt: u32 },
    /// Attempt `attempt` failed and is retryable; wait `delay` first.
    RetryWait {
        attempt: u32,
        delay: Duration,
        last_error: SubmitError,
    },
    Succeeded { attempts: u32, handle: JobHandle },
    Failed { attempts: u32, reason: FailureReason },
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Succeeded { .. } | SubmissionState::Failed { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum SubmissionEvent {
    /// The current attempt returned.
    Attempted(Result<JobHandle, SubmitError>),
    /// The backoff delay has passed.
    WaitElapsed,
}

/// Advance `state` by one event. Events that do not apply to the current
/// state leave it unchanged.
pub fn transition(
    state: SubmissionState,
    event: SubmissionEvent,
    policy: &RetryPolicy,
    jitter: &mut impl Jitter,
) -> SubmissionState {
    match (state, event) {
        (SubmissionState::Pending { attempt }, SubmissionEvent::Attempted(Ok(handle))) => {
            SubmissionState::Succeeded {
                attempts: attempt + 1,
                handle,
            }
        }
        (SubmissionState::Pending { attempt }, SubmissionEvent::Attempted(Err(err))) => {
            if !err.is_retryable() {
                SubmissionState::Failed {
                    attempts: attempt + 1,
                    reason: FailureReason::Fatal(err),
                }
            } else if policy.allows_retry(attempt) {
                SubmissionState::RetryWait {
                    attempt,
                    delay: policy.delay_with_jitter(attempt, jitter),
                    last_error: err,
                }
            } else {
                SubmissionState::Failed {
                    attempts: attempt + 1,
                    reason: FailureReason::RetriesExhausted(err),
                }
            }
        }
        (SubmissionState::RetryWait { attempt, .. }, SubmissionEvent::WaitElapsed) => {
            SubmissionState::Pending {
                attempt: attempt + 1,
            }
        }
        (state, _) => state,
    }
}

/// One job's journey through the state machine.
#[derive(Debug, Clone)]
pub struct RetryableSubmission {
    pub index: u64,
    state: SubmissionState,
    total_backoff: Duration,
}

impl RetryableSubmission {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            state: SubmissionState::Pending { attempt: 0 },
            total_backoff: Duration::ZERO,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Feed an event, accumulating any backoff delay it schedules.
    pub fn apply(
        &mut self,
        event: SubmissionEvent,
        policy: &RetryPolicy,
        jitter: &mut impl Jitter,
    ) -> &SubmissionState {
        let current = std::mem::replace(&mut self.state, SubmissionState::Pending { attempt: 0 });
        let scheduled = matches!(current, SubmissionState::Pending { .. });
        self.state = transition(current, event, policy, jitter);
        // Only a Pending -> RetryWait step schedules a new delay.
        if let (true, SubmissionState::RetryWait { delay, .. }) = (scheduled, &self.state) {
            self.total_backoff = self.total_backoff.saturating_add(*delay);
        }
        &self.state
    }

    /// Attempts made so far (including one in flight for `Pending`).
    pub fn attempts(&self) -> u32 {
        match &self.state {
            SubmissionState::Pending { attempt } => *attempt,
            SubmissionState::RetryWait { attempt, .. } => attempt + 1,
            SubmissionState::Succeeded { attempts, .. } | SubmissionState::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Sum of the backoff delays scheduled for this job.
    pub fn total_backoff(&self) -> Duration {
        self.total_backoff
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::{FixedJitter, NoJitter};
    use pulse_core::JobState;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter_ratio: 0.25,
        }
    }

    fn handle() -> JobHandle {
        JobHandle {
            job_name: "CallAnalyticsJob-test".into(),
            state: JobState::InProgress,
        }
    }

    fn throttled() -> SubmitError {
        SubmitError::retryable("LimitExceededException", "slow down")
    }

    fn bad_request() -> SubmitError {
        SubmitError::fatal("BadRequestException", "bad media uri")
    }

    #[test]
    fn pending_success() {
        let next = transition(
            SubmissionState::Pending { attempt: 2 },
            SubmissionEvent::Attempted(Ok(handle())),
            &policy(5),
            &mut NoJitter,
        );
        assert_eq!(
            next,
            SubmissionState::Succeeded {
                attempts: 3,
                handle: handle()
            }
        );
    }

    #[test]
    fn pending_fatal_fails_immediately() {
        let next = transition(
            SubmissionState::Pending { attempt: 0 },
            SubmissionEvent::Attempted(Err(bad_request())),
            &policy(5),
            &mut NoJitter,
        );
        assert_eq!(
            next,
            SubmissionState::Failed {
                attempts: 1,
                reason: FailureReason::Fatal(bad_request())
            }
        );
    }

    #[test]
    fn pending_retryable_with_budget_waits() {
        let next = transition(
            SubmissionState::Pending { attempt: 1 },
            SubmissionEvent::Attempted(Err(throttled())),
            &policy(5),
            &mut FixedJitter(1.0),
        );
        assert_eq!(
            next,
            SubmissionState::RetryWait {
                attempt: 1,
                delay: Duration::from_millis(2500),
                last_error: throttled()
            }
        );
    }

    #[test]
    fn pending_retryable_without_budget_fails() {
        let next = transition(
            SubmissionState::Pending { attempt: 5 },
            SubmissionEvent::Attempted(Err(throttled())),
            &policy(5),
            &mut NoJitter,
        );
        assert_eq!(
            next,
            SubmissionState::Failed {
                attempts: 6,
                reason: FailureReason::RetriesExhausted(throttled())
            }
        );
    }

    #[test]
    fn wait_elapsed_returns_to_pending() {
        let next = transition(
            SubmissionState::RetryWait {
                attempt: 3,
                delay: Duration::from_secs(8),
                last_error: throttled(),
            },
            SubmissionEvent::WaitElapsed,
            &policy(5),
            &mut NoJitter,
        );
        assert_eq!(next, SubmissionState::Pending { attempt: 4 });
    }

    #[test]
    fn inapplicable_events_are_ignored() {
        let p = policy(5);
        let pending = SubmissionState::Pending { attempt: 0 };
        assert_eq!(
            transition(pending.clone(), SubmissionEvent::WaitElapsed, &p, &mut NoJitter),
            pending
        );

        let waiting = SubmissionState::RetryWait {
            attempt: 0,
            delay: Duration::from_secs(1),
            last_error: throttled(),
        };
        assert_eq!(
            transition(
                waiting.clone(),
                SubmissionEvent::Attempted(Ok(handle())),
                &p,
                &mut NoJitter
            ),
            waiting
        );

        let done = SubmissionState::Succeeded {
            attempts: 1,
            handle: handle(),
        };
        for event in [
            SubmissionEvent::WaitElapsed,
            SubmissionEvent::Attempted(Err(throttled())),
        ] {
            assert_eq!(transition(done.clone(), event, &p, &mut NoJitter), done);
        }
    }

    #[test]
    fn ignored_event_during_wait_adds_no_backoff() {
        let p = policy(5);
        let mut sub = RetryableSubmission::new(0);

        sub.apply(SubmissionEvent::Attempted(Err(throttled())), &p, &mut NoJitter);
        assert_eq!(sub.total_backoff(), Duration::from_secs(1));

        let waiting = sub.state().clone();
        sub.apply(SubmissionEvent::Attempted(Ok(handle())), &p, &mut NoJitter);
        sub.apply(SubmissionEvent::Attempted(Err(throttled())), &p, &mut NoJitter);

        assert_eq!(sub.state(), &waiting);
        assert_eq!(sub.total_backoff(), Duration::from_secs(1));
        assert_eq!(sub.attempts(), 1);
    }

    #[test]
    fn submission_accumulates_backoff() {
        let p = policy(5);
        let mut sub = RetryableSubmission::new(0);

        for _ in 0..3 {
            sub.apply(SubmissionEvent::Attempted(Err(throttled())), &p, &mut NoJitter);
            sub.apply(SubmissionEvent::WaitElapsed, &p, &mut NoJitter);
        }
        sub.apply(SubmissionEvent::Attempted(Ok(handle())), &p, &mut NoJitter);

        assert!(sub.is_terminal());
        assert_eq!(sub.attempts(), 4);
        // 1s + 2s + 4s
        assert_eq!(sub.total_backoff(), Duration::from_secs(7));
    }

    #[test]
    fn zero_retries_fails_on_first_retryable_error() {
        let p = policy(0);
        let mut sub = RetryableSubmission::new(0);
        sub.apply(SubmissionEvent::Attempted(Err(throttled())), &p, &mut NoJitter);
        assert!(matches!(
            sub.state(),
            SubmissionState::Failed {
                attempts: 1,
                reason: FailureReason::RetriesExhausted(_)
            }
        ));
        assert_eq!(sub.total_backoff(), Duration::ZERO);
    }
}
