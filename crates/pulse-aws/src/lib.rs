//! pulse-aws — AWS adapters for the pulse ports.
//!
//! [`TranscribeClient`] lists transcription jobs and starts call analytics
//! jobs; [`CloudWatchSink`] publishes metric points. Both are built from a
//! shared [`aws_config::SdkConfig`] loaded with [`load_sdk_config`].
//!
//! # Architecture
//!
//! ```text
//! load_sdk_config(region)
//!   ├── TranscribeClient
//!   │     ├── JobLister::list_jobs()     → ListTranscriptionJobs
//!   │     └── JobSubmitter::start_job()  → StartCallAnalyticsJob
//!   └── CloudWatchSink
//!         └── MetricsSink::publish()     → PutMetricData (one call per namespace)
//! ```

pub mod cloudwatch;
pub mod transcribe;

pub use cloudwatch::CloudWatchSink;
pub use transcribe::TranscribeClient;

use aws_config::{BehaviorVersion, Region};

/// Load credentials and settings from the default provider chain.
///
/// `region` overrides whatever the environment or profile names.
pub async fn load_sdk_config(region: Option<&str>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
