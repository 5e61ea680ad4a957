//! pulse-loadgen — load generation against the job-submission API.
//!
//! Issues a configurable number of job starts, strictly one after another,
//! with a fixed pacing delay between starts. Retryable failures are retried
//! with capped exponential backoff plus jitter; fatal failures end the job
//! at once. Every job ends either started or permanently failed.
//!
//! # Architecture
//!
//! ```text
//! LoadGenerator::run(template, count)
//!   └── for index in 0..count
//!         ├── RetryableSubmission (Pending → RetryWait → … → Succeeded | Failed)
//!         │     ├── JobSubmitter::start_job()
//!         │     └── RetryPolicy::delay_with_jitter() ← Jitter
//!         ├── RunSummary::record()
//!         └── sleep(pacing)
//! ```

pub mod backoff;
pub mod generator;
pub mod submission;

pub use backoff::{FixedJitter, Jitter, NoJitter, RetryPolicy, RngJitter};
pub use generator::{LoadGenerator, RunSummary};
pub use submission::{
    transition, FailureReason, RetryableSubmission, SubmissionEvent, SubmissionState,
};
