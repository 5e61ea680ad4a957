//! pulse-sampler — periodic concurrency sampling.
//!
//! Counts transcription jobs in the in-progress state and publishes the
//! count as a single metric point per invocation. The sampler keeps no
//! state between invocations; the external scheduler re-invokes it.
//!
//! # Architecture
//!
//! ```text
//! ConcurrencySampler
//!   ├── JobPages (cursor walk over JobLister, one page at a time)
//!   ├── running count → Sample → MetricPoint
//!   ├── MetricsSink::publish() (exactly once, only after a full walk)
//!   └── optional AlarmThreshold (log when at/above threshold)
//! ```

pub mod pages;
pub mod sampler;

#[cfg(test)]
mod testing;

pub use pages::JobPages;
pub use sampler::{ConcurrencySampler, PublishResult};
