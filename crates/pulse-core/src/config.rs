//! pulse.toml configuration parser.
//!
//! Every section is optional. Missing values fall back to the defaults
//! below; command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{PulseError, PulseResult};
use crate::types::Dimensions;

pub const DEFAULT_NAMESPACE: &str = "TranscribeMonitoring";
pub const DEFAULT_METRIC_NAME: &str = "ConcurrentTranscribeJobs";
pub const DEFAULT_REGION: &str = "us-west-2";
/// Largest page the job-listing API returns.
pub const MAX_PAGE_SIZE: i32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(default)]
    pub sampler: SamplerConfig,
    pub alarm: Option<AlarmConfig>,
    #[serde(default)]
    pub loadgen: LoadgenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub namespace: String,
    pub metric_name: String,
    pub page_size: i32,
    pub timeout: String,
    pub dimensions: Dimensions,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        let mut dimensions = Dimensions::new();
        dimensions.insert("Service".to_string(), "Transcribe".to_string());
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            page_size: MAX_PAGE_SIZE,
            timeout: "60s".to_string(),
            dimensions,
        }
    }
}

impl SamplerConfig {
    /// Page size clamped to what the listing API accepts.
    pub fn page_size(&self) -> i32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn timeout(&self) -> PulseResult<Duration> {
        parse_duration(&self.timeout)
    }
}

/// Alarm parameters. The quota has no default: it is an account- and
/// region-specific service limit supplied by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub quota: u64,
    #[serde(default = "default_threshold_ratio")]
    pub threshold_ratio: f64,
    #[serde(default = "default_period")]
    pub period: String,
}

impl AlarmConfig {
    /// Alarm for `quota` with the default ratio and period.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            quota,
            threshold_ratio: default_threshold_ratio(),
            period: default_period(),
        }
    }
}

fn default_threshold_ratio() -> f64 {
    0.8
}

fn default_period() -> String {
    "60s".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadgenConfig {
    pub region: String,
    pub count: u64,
    pub delay: String,
    pub max_retries: u32,
    pub base_delay: String,
    pub max_delay: String,
    pub jitter_ratio: f64,
}

impl Default for LoadgenConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            count: 10_000,
            delay: "100ms".to_string(),
            max_retries: 5,
            base_delay: "1s".to_string(),
            max_delay: "60s".to_string(),
            jitter_ratio: 0.25,
        }
    }
}

impl PulseConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PulseConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Parse a duration string like "500ms", "5s", "1.5s", "1m", or "30".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> PulseResult<Duration> {
    let s = s.trim();
    let invalid = || PulseError::Config(format!("invalid duration: {s:?}"));
    let parse_number = |n: &str| n.trim().parse::<f64>().map_err(|_| invalid());

    let secs = if let Some(ms) = s.strip_suffix("ms") {
        parse_number(ms)? / 1000.0
    } else if let Some(secs) = s.strip_suffix('s') {
        parse_number(secs)?
    } else if let Some(mins) = s.strip_suffix('m') {
        parse_number(mins)? * 60.0
    } else {
        parse_number(s)?
    };

    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}
