use std::path::PathBuf;
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::Args;
use tracing::info;

use pulse_aws::{load_sdk_config, CloudWatchSink, TranscribeClient};
use pulse_core::config::AlarmConfig;
use pulse_core::{AlarmThreshold, MetricTarget, PulseConfig};
use pulse_sampler::ConcurrencySampler;

use super::{load_config, parse_dimension, parse_seconds};

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Path to pulse.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Metric namespace
    #[arg(long, env = "CLOUDWATCH_NAMESPACE", value_parser = NonEmptyStringValueParser::new())]
    pub namespace: Option<String>,
    /// Metric name
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub metric_name: Option<String>,
    /// Extra metric dimension (repeatable). Overrides a file dimension
    /// with the same key.
    #[arg(long = "dimension", value_name = "KEY=VALUE", value_parser = parse_dimension)]
    pub dimensions: Vec<(String, String)>,
    /// AWS region (default: from the environment)
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub region: Option<String>,
    /// Abandon the sample after this long, in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub timeout: Option<Duration>,
    /// Concurrent job quota; enables the local alarm check
    #[arg(long)]
    pub quota: Option<u64>,
    /// Fraction of the quota at which the alarm breaches
    #[arg(long)]
    pub threshold_ratio: Option<f64>,
}

/// Everything one sample needs, after file values and flags are merged.
#[derive(Debug)]
pub struct SamplePlan {
    pub target: MetricTarget,
    pub timeout: Duration,
    pub page_size: i32,
    pub alarm: Option<AlarmThreshold>,
}

impl SampleArgs {
    pub fn resolve(&self, config: &PulseConfig) -> anyhow::Result<SamplePlan> {
        let sampler = &config.sampler;

        let mut dimensions = sampler.dimensions.clone();
        dimensions.extend(self.dimensions.iter().cloned());

        let target = MetricTarget::new(
            self.namespace.as_deref().unwrap_or(&sampler.namespace),
            self.metric_name.as_deref().unwrap_or(&sampler.metric_name),
            dimensions,
        );
        target.validate()?;

        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => sampler.timeout()?,
        };

        let alarm = match (self.quota, &config.alarm) {
            (None, None) => None,
            (Some(quota), None) => Some(AlarmConfig::with_quota(quota)),
            (Some(quota), Some(file)) => Some(AlarmConfig {
                quota,
                ..file.clone()
            }),
            (None, Some(file)) => Some(file.clone()),
        };
        let alarm = alarm
            .map(|mut alarm| {
                if let Some(ratio) = self.threshold_ratio {
                    alarm.threshold_ratio = ratio;
                }
                AlarmThreshold::from_config(&alarm)
            })
            .transpose()?;

        Ok(SamplePlan {
            target,
            timeout,
            page_size: sampler.page_size(),
            alarm,
        })
    }
}

pub async fn run(args: SampleArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let plan = args.resolve(&config)?;

    let sdk_config = load_sdk_config(args.region.as_deref()).await;
    let lister = TranscribeClient::new(&sdk_config).with_page_size(plan.page_size);
    let sink = CloudWatchSink::new(&sdk_config);

    let mut sampler = ConcurrencySampler::new(lister, sink);
    if let Some(alarm) = plan.alarm {
        info!(quota = alarm.quota(), threshold = alarm.threshold(), "alarm check enabled");
        sampler = sampler.with_alarm(alarm);
    }

    let result = sampler.sample_with_timeout(&plan.target, plan.timeout).await?;
    println!(
        "✓ Published {}/{} = {} ({} page{})",
        plan.target.namespace,
        plan.target.metric_name,
        result.count,
        result.pages,
        if result.pages == 1 { "" } else { "s" }
    );
    if let Some(state) = result.alarm {
        println!("  Alarm: {state:?}");
    }
    Ok(())
}
