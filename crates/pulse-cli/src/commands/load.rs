use std::path::PathBuf;
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use pulse_aws::{load_sdk_config, TranscribeClient};
use pulse_core::config::parse_duration;
use pulse_core::{JobTemplate, PulseConfig};
use pulse_loadgen::{LoadGenerator, RetryPolicy, RngJitter, RunSummary};

use super::{load_config, parse_seconds};

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Bucket holding the input recording
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub input_bucket: String,
    /// Key of the input recording within the bucket
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub input_file: String,
    /// Bucket that receives analysis results
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub output_bucket: String,
    /// IAM role the service assumes to read and write the buckets
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub role_arn: String,
    /// Number of jobs to start [default: 10000]
    #[arg(long)]
    pub count: Option<u64>,
    /// Delay between job starts, in seconds [default: 0.1]
    #[arg(long, value_parser = parse_seconds)]
    pub delay: Option<Duration>,
    /// AWS region [default: us-west-2]
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub region: Option<String>,
    /// Retries per job after the first attempt [default: 5]
    #[arg(long)]
    pub max_retries: Option<u32>,
    /// First backoff delay, in seconds [default: 1.0]
    #[arg(long, value_parser = parse_seconds)]
    pub base_delay: Option<Duration>,
    /// Backoff ceiling, in seconds [default: 60.0]
    #[arg(long, value_parser = parse_seconds)]
    pub max_delay: Option<Duration>,
    /// Largest jitter as a fraction of the backoff [default: 0.25]
    #[arg(long)]
    pub jitter_ratio: Option<f64>,
    /// Path to pulse.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Summary format: text or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// A resolved run: what to start, how many, and how to pace and retry.
#[derive(Debug)]
pub struct LoadPlan {
    pub template: JobTemplate,
    pub region: String,
    pub count: u64,
    pub pacing: Duration,
    pub policy: RetryPolicy,
}

impl LoadArgs {
    pub fn resolve(&self, config: &PulseConfig) -> anyhow::Result<LoadPlan> {
        let file = &config.loadgen;

        let template = JobTemplate {
            input_bucket: self.input_bucket.clone(),
            input_key: self.input_file.clone(),
            output_bucket: self.output_bucket.clone(),
            role_arn: self.role_arn.clone(),
        };
        template.validate()?;

        let policy = RetryPolicy {
            max_retries: self.max_retries.unwrap_or(file.max_retries),
            base_delay: or_file(self.base_delay, &file.base_delay)?,
            max_delay: or_file(self.max_delay, &file.max_delay)?,
            jitter_ratio: self.jitter_ratio.unwrap_or(file.jitter_ratio),
        };
        policy.validate()?;

        Ok(LoadPlan {
            template,
            region: self.region.clone().unwrap_or_else(|| file.region.clone()),
            count: self.count.unwrap_or(file.count),
            pacing: or_file(self.delay, &file.delay)?,
            policy,
        })
    }
}

fn or_file(flag: Option<Duration>, file: &str) -> anyhow::Result<Duration> {
    match flag {
        Some(d) => Ok(d),
        None => Ok(parse_duration(file)?),
    }
}

pub async fn run(args: LoadArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let plan = args.resolve(&config)?;

    let sdk_config = load_sdk_config(Some(&plan.region)).await;
    let submitter = TranscribeClient::new(&sdk_config);
    let mut generator = LoadGenerator::new(
        submitter,
        RngJitter(StdRng::from_entropy()),
        plan.policy,
    )
    .with_pacing(plan.pacing);

    tokio::select! {
        result = generator.run(&plan.template, plan.count) => {
            print_summary(&result?, &args.format)
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; stopping job submission");
            println!("Interrupted. Jobs already started keep running.");
            Ok(())
        }
    }
}

fn print_summary(summary: &RunSummary, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(summary)?),
        _ => {
            println!("✓ Job submission complete ({} requested)", summary.requested);
            println!("  Started: {}", summary.succeeded);
            println!("  Retried: {}", summary.retried);
            println!("  Failed:  {}", summary.failed);
            println!("  Backoff: {:.1}s", summary.total_backoff.as_secs_f64());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LoadArgs {
        LoadArgs {
            input_bucket: "in".into(),
            input_file: "call.wav".into(),
            output_bucket: "out".into(),
            role_arn: "arn:aws:iam::123456789012:role/transcribe".into(),
            count: None,
            delay: None,
            region: None,
            max_retries: None,
            base_delay: None,
            max_delay: None,
            jitter_ratio: None,
            config: None,
            format: "text".into(),
        }
    }

    #[test]
    fn defaults() {
        let plan = args().resolve(&PulseConfig::default()).unwrap();
        assert_eq!(plan.count, 10_000);
        assert_eq!(plan.pacing, Duration::from_millis(100));
        assert_eq!(plan.region, "us-west-2");
        assert_eq!(plan.policy, RetryPolicy::default());
        assert_eq!(plan.template.media_uri(), "s3://in/call.wav");
    }

    #[test]
    fn flags_override_file() {
        let mut config = PulseConfig::default();
        config.loadgen.count = 50;
        config.loadgen.max_retries = 2;
        config.loadgen.region = "eu-west-1".into();

        let plan = LoadArgs {
            count: Some(3),
            delay: Some(Duration::ZERO),
            max_delay: Some(Duration::from_secs(10)),
            ..args()
        }
        .resolve(&config)
        .unwrap();

        assert_eq!(plan.count, 3);
        assert_eq!(plan.pacing, Duration::ZERO);
        assert_eq!(plan.policy.max_retries, 2);
        assert_eq!(plan.policy.max_delay, Duration::from_secs(10));
        assert_eq!(plan.region, "eu-west-1");
    }

    #[test]
    fn max_delay_below_base_is_rejected() {
        let result = LoadArgs {
            base_delay: Some(Duration::from_secs(10)),
            max_delay: Some(Duration::from_secs(1)),
            ..args()
        }
        .resolve(&PulseConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn blank_template_field_is_rejected() {
        let result = LoadArgs {
            role_arn: "  ".into(),
            ..args()
        }
        .resolve(&PulseConfig::default());
        assert!(result.is_err());
    }
}
