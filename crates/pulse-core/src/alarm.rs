//! Concurrency alarm threshold.
//!
//! The real alarm is evaluated downstream by the metrics backend. This is
//! the same rule applied locally so the sampler can log when a sample is
//! close to the service quota: statistic maximum, comparison
//! greater-than-or-equal, and missing data never breaching.

use std::time::Duration;

use crate::config::{parse_duration, AlarmConfig};
use crate::error::{PulseError, PulseResult};

/// Outcome of evaluating one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Ok,
    Breaching,
    /// No sample for the period. Treated as not breaching.
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmThreshold {
    quota: u64,
    ratio: f64,
    period: Duration,
}

impl AlarmThreshold {
    pub fn new(quota: u64, ratio: f64) -> PulseResult<Self> {
        if quota == 0 {
            return Err(PulseError::InvalidInput("alarm quota must be positive".into()));
        }
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(PulseError::InvalidInput(format!(
                "alarm threshold ratio must be in (0, 1], got {ratio}"
            )));
        }
        Ok(Self {
            quota,
            ratio,
            period: Duration::from_secs(60),
        })
    }

    pub fn from_config(config: &AlarmConfig) -> PulseResult<Self> {
        let mut alarm = Self::new(config.quota, config.threshold_ratio)?;
        alarm.period = parse_duration(&config.period)?;
        Ok(alarm)
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Smallest sample that breaches, `ceil(quota * ratio)`.
    pub fn threshold(&self) -> u64 {
        ((self.quota as f64) * self.ratio).ceil() as u64
    }

    /// Evaluate the maximum sample seen in a period.
    pub fn evaluate(&self, maximum: Option<u64>) -> AlarmState {
        match maximum {
            None => AlarmState::InsufficientData,
            Some(v) if v >= self.threshold() => AlarmState::Breaching,
            Some(_) => AlarmState::Ok,
        }
    }

    /// Evaluate a period from every sample published in it.
    pub fn evaluate_period(&self, samples: &[u64]) -> AlarmState {
        self.evaluate(samples.iter().copied().max())
    }
}
