//! pulse-core — shared vocabulary for the transcription concurrency tools.
//!
//! Holds the domain types, the ports the sampler and load generator are
//! written against, the error taxonomy, `pulse.toml` parsing, and the local
//! model of the concurrency alarm.

pub mod alarm;
pub mod config;
pub mod error;
pub mod ports;
pub mod types;

pub use alarm::{AlarmState, AlarmThreshold};
pub use config::PulseConfig;
pub use error::{classify_code, ErrorClass, PulseError, PulseResult, SubmitError};
pub use ports::{JobLister, JobSubmitter, MetricsSink};
pub use types::*;
