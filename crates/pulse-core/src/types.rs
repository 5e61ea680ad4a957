//! Domain types shared by the sampler and the load generator.
//!
//! These mirror the shapes exchanged with the remote transcription
//! service (job listings, job starts) and the metrics backend (metric
//! points). None of them are persisted by this system.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::error::{PulseError, PulseResult};

/// Dimension set attached to a metric point, ordered by key.
pub type Dimensions = BTreeMap<String, String>;

// ── Jobs ───────────────────────────────────────────────────────────

/// Remote-tracked status of a transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    /// Wire spelling used by the job-listing API.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "QUEUED",
            JobState::InProgress => "IN_PROGRESS",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job record from a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub state: JobState,
}

/// One page of a job listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobSummary>,
    /// Continuation cursor. `None` (or empty) marks the end of results.
    pub next_cursor: Option<String>,
}

impl JobPage {
    /// A final page holding `jobs`.
    pub fn last(jobs: Vec<JobSummary>) -> Self {
        Self {
            jobs,
            next_cursor: None,
        }
    }

    /// The cursor for the following page, if the backend signalled one.
    pub fn continuation(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// A fully-formed job-start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_name: String,
    /// `s3://bucket/key` of the input media.
    pub media_uri: String,
    /// `s3://bucket/prefix/` where results are written.
    pub output_location: String,
    /// Access role the service assumes to read input and write output.
    pub role_arn: String,
}

/// Returned by a successful job start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_name: String,
    pub state: JobState,
}

/// Where jobs read from and write to. Mints a [`JobRequest`] per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub input_bucket: String,
    pub input_key: String,
    pub output_bucket: String,
    pub role_arn: String,
}

/// Prefix for generated call-analytics job names.
pub const JOB_NAME_PREFIX: &str = "CallAnalyticsJob";

/// Output prefix inside the output bucket.
pub const OUTPUT_PREFIX: &str = "transcribe-results/";

impl JobTemplate {
    pub fn validate(&self) -> PulseResult<()> {
        for (field, value) in [
            ("input bucket", &self.input_bucket),
            ("input file", &self.input_key),
            ("output bucket", &self.output_bucket),
            ("role arn", &self.role_arn),
        ] {
            if value.trim().is_empty() {
                return Err(PulseError::InvalidInput(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn media_uri(&self) -> String {
        format!("s3://{}/{}", self.input_bucket, self.input_key)
    }

    pub fn output_location(&self) -> String {
        format!("s3://{}/{OUTPUT_PREFIX}", self.output_bucket)
    }

    /// Build a request with a fresh, unique job name.
    ///
    /// Every attempt gets its own name, so a name conflict on one attempt
    /// cannot repeat on the next.
    pub fn request(&self) -> JobRequest {
        JobRequest {
            job_name: format!("{JOB_NAME_PREFIX}-{}", uuid::Uuid::new_v4()),
            media_uri: self.media_uri(),
            output_location: self.output_location(),
            role_arn: self.role_arn.clone(),
        }
    }
}

// ── Samples and metrics ────────────────────────────────────────────

/// Count of in-progress jobs at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub count: u64,
    pub taken_at: SystemTime,
}

impl Sample {
    pub fn now(count: u64) -> Self {
        Self {
            count,
            taken_at: SystemTime::now(),
        }
    }
}

/// Unit attached to a published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Count,
}

/// Statistic the downstream evaluator applies over a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Maximum,
}

/// Identifies what a sample is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTarget {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Dimensions,
}

impl MetricTarget {
    pub fn new(
        namespace: impl Into<String>,
        metric_name: impl Into<String>,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions,
        }
    }

    /// Reject empty identifiers and empty dimension sets.
    pub fn validate(&self) -> PulseResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(PulseError::InvalidInput("namespace must not be empty".into()));
        }
        if self.metric_name.trim().is_empty() {
            return Err(PulseError::InvalidInput("metric name must not be empty".into()));
        }
        if self.dimensions.is_empty() {
            return Err(PulseError::InvalidInput(
                "at least one dimension is required".into(),
            ));
        }
        if let Some((k, v)) = self
            .dimensions
            .iter()
            .find(|(k, v)| k.trim().is_empty() || v.trim().is_empty())
        {
            return Err(PulseError::InvalidInput(format!(
                "dimension {k:?}={v:?} has an empty key or value"
            )));
        }
        Ok(())
    }
}

/// One timestamped observation for the metrics backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Dimensions,
    pub value: f64,
    pub unit: MetricUnit,
    pub statistic: Statistic,
    pub timestamp: SystemTime,
}

impl MetricPoint {
    pub fn from_sample(target: &MetricTarget, sample: &Sample) -> Self {
        Self {
            namespace: target.namespace.clone(),
            metric_name: target.metric_name.clone(),
            dimensions: target.dimensions.clone(),
            value: sample.count as f64,
            unit: MetricUnit::Count,
            statistic: Statistic::Maximum,
            timestamp: sample.taken_at,
        }
    }
}
