//! Load generator — starts `count` jobs one at a time at a fixed pace.
//!
//! Each job runs the retry state machine to a terminal state before the
//! next job starts. Pacing sleeps sit between job starts; retry backoff
//! sleeps sit between attempts of the same job. One job exhausting its
//! retries never aborts the batch.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use pulse_core::{JobSubmitter, JobTemplate, PulseResult};

use crate::backoff::{Jitter, RetryPolicy};
use crate::submission::{FailureReason, RetryableSubmission, SubmissionEvent, SubmissionState};

/// Log progress every this many jobs.
const PROGRESS_EVERY: u64 = 10;

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub requested: u64,
    /// Jobs that eventually started, on any attempt.
    pub succeeded: u64,
    /// Subset of `succeeded` that needed more than one attempt.
    pub retried: u64,
    /// Jobs that never started.
    pub failed: u64,
    /// Attempts made per job, in job order.
    pub attempts: Vec<u32>,
    /// Sum of every backoff delay slept across the run.
    pub total_backoff: Duration,
}

impl RunSummary {
    /// Jobs with a terminal outcome.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    fn record(&mut self, submission: &RetryableSubmission) {
        let attempts = submission.attempts();
        match submission.state() {
            SubmissionState::Succeeded { .. } => {
                self.succeeded += 1;
                if attempts > 1 {
                    self.retried += 1;
                }
            }
            SubmissionState::Failed { .. } => self.failed += 1,
            // `drive` only returns terminal submissions.
            SubmissionState::Pending { .. } | SubmissionState::RetryWait { .. } => return,
        }
        self.attempts.push(attempts);
        self.total_backoff = self.total_backoff.saturating_add(submission.total_backoff());
    }
}

/// Drives job starts against a [`JobSubmitter`].
pub struct LoadGenerator<S, J> {
    submitter: S,
    jitter: J,
    policy: RetryPolicy,
    pacing: Duration,
}

impl<S: JobSubmitter, J: Jitter> LoadGenerator<S, J> {
    pub fn new(submitter: S, jitter: J, policy: RetryPolicy) -> Self {
        Self {
            submitter,
            jitter,
            policy,
            pacing: Duration::ZERO,
        }
    }

    /// Delay between consecutive job starts.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Start `count` jobs described by `template`.
    ///
    /// Invalid inputs are rejected before any job is submitted. After that
    /// the run always completes: `succeeded + failed == count`.
    pub async fn run(&mut self, template: &JobTemplate, count: u64) -> PulseResult<RunSummary> {
        template.validate()?;
        self.policy.validate()?;

        info!(
            count,
            pacing_ms = self.pacing.as_millis() as u64,
            max_retries = self.policy.max_retries,
            "starting call analytics jobs"
        );

        let mut summary = RunSummary {
            requested: count,
            attempts: Vec::with_capacity(count.min(1 << 16) as usize),
            ..RunSummary::default()
        };

        for index in 0..count {
            let submission = self.drive(index, template).await;
            summary.record(&submission);

            let done = index + 1;
            if done % PROGRESS_EVERY == 0 || done == count {
                info!(
                    done,
                    total = count,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "progress"
                );
            }

            if done < count && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        info!(
            succeeded = summary.succeeded,
            retried = summary.retried,
            failed = summary.failed,
            "job submission complete"
        );
        Ok(summary)
    }

    /// Run one job's state machine to a terminal state.
    async fn drive(&mut self, index: u64, template: &JobTemplate) -> RetryableSubmission {
        let mut submission = RetryableSubmission::new(index);

        loop {
            match submission.state() {
                SubmissionState::Pending { attempt } => {
                    let attempt = *attempt;
                    let request = template.request();
                    if attempt > 0 {
                        info!(
                            index,
                            attempt,
                            max_retries = self.policy.max_retries,
                            job = %request.job_name,
                            "retrying job start"
                        );
                    }
                    let result = self.submitter.start_job(&request).await;
                    submission.apply(
                        SubmissionEvent::Attempted(result),
                        &self.policy,
                        &mut self.jitter,
                    );
                }
                SubmissionState::RetryWait {
                    delay, last_error, ..
                } => {
                    warn!(
                        index,
                        code = %last_error.code,
                        error = %last_error.message,
                        backoff_ms = delay.as_millis() as u64,
                        "retryable failure; backing off"
                    );
                    tokio::time::sleep(*delay).await;
                    submission.apply(SubmissionEvent::WaitElapsed, &self.policy, &mut self.jitter);
                }
                SubmissionState::Succeeded { handle, attempts } => {
                    debug!(index, job = %handle.job_name, state = %handle.state, attempts, "job started");
                    return submission;
                }
                SubmissionState::Failed { reason, attempts } => {
                    match reason {
                        FailureReason::Fatal(e) => {
                            error!(index, code = %e.code, error = %e.message, "job rejected; not retrying")
                        }
                        FailureReason::RetriesExhausted(e) => {
                            error!(index, attempts, code = %e.code, error = %e.message, "max retries reached")
                        }
                    }
                    return submission;
                }
            }
        }
    }
}
