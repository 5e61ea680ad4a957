//! Ports to the remote services.
//!
//! The sampler and the generator only ever talk to these traits; the
//! `pulse-aws` crate provides the production implementations and tests
//! substitute in-memory fakes.

use std::future::Future;

use crate::error::{PulseResult, SubmitError};
use crate::types::{JobHandle, JobPage, JobRequest, JobState, MetricPoint};

/// Paginated job listing filtered by status.
pub trait JobLister {
    /// Fetch one page. `cursor` is `None` for the first page.
    fn list_jobs(
        &self,
        state: JobState,
        cursor: Option<&str>,
    ) -> impl Future<Output = PulseResult<JobPage>> + Send;
}

/// Metrics ingestion.
pub trait MetricsSink {
    /// Publish the given points. Success carries no content.
    fn publish(&self, points: &[MetricPoint]) -> impl Future<Output = PulseResult<()>> + Send;
}

/// Job submission. Every failure is classified as retryable or fatal.
pub trait JobSubmitter {
    fn start_job(
        &self,
        request: &JobRequest,
    ) -> impl Future<Output = Result<JobHandle, SubmitError>> + Send;
}

impl<T: JobLister + Sync> JobLister for &T {
    fn list_jobs(
        &self,
        state: JobState,
        cursor: Option<&str>,
    ) -> impl Future<Output = PulseResult<JobPage>> + Send {
        (**self).list_jobs(state, cursor)
    }
}

impl<T: MetricsSink + Sync> MetricsSink for &T {
    fn publish(&self, points: &[MetricPoint]) -> impl Future<Output = PulseResult<()>> + Send {
        (**self).publish(points)
    }
}

impl<T: JobSubmitter + Sync> JobSubmitter for &T {
    fn start_job(
        &self,
        request: &JobRequest,
    ) -> impl Future<Output = Result<JobHandle, SubmitError>> + Send {
        (**self).start_job(request)
    }
}
