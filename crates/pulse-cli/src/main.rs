//! pulse — Amazon Transcribe concurrency tools.
//!
//! `sample` counts in-progress transcription jobs and publishes the count
//! to CloudWatch once; run it from an external scheduler (cron, an event
//! rule) for a periodic series. `load` starts call analytics jobs at a
//! fixed pace to drive concurrency up.
//!
//! # Usage
//!
//! ```text
//! pulse sample --namespace TranscribeMonitoring --dimension Stage=prod --quota 250
//! pulse load --input-bucket calls --input-file two-channel.wav \
//!            --output-bucket results --role-arn arn:aws:iam::123456789012:role/transcribe \
//!            --count 500 --delay 0.2
//! ```

use clap::{Parser, Subcommand};

mod commands;

use commands::load::LoadArgs;
use commands::sample::SampleArgs;

#[derive(Parser, Debug)]
#[command(
    name = "pulse",
    about = "Transcribe pulse — concurrency sampling and load generation",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count in-progress transcription jobs and publish the count once
    Sample(SampleArgs),
    /// Start call analytics jobs at a fixed pace, retrying throttled starts
    Load(LoadArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pulse=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample(args) => commands::sample::run(args).await,
        Commands::Load(args) => commands::load::run(args).await,
    }
}
