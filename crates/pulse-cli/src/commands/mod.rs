pub mod load;
pub mod sample;

use std::path::Path;
use std::time::Duration;

use pulse_core::config::parse_duration;
use pulse_core::PulseConfig;

/// Read `pulse.toml` when one is given, otherwise start from defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PulseConfig> {
    match path {
        Some(path) => PulseConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display())),
        None => Ok(PulseConfig::default()),
    }
}

/// Parse a `--delay`-style flag: seconds as a number, or a duration
/// string such as `250ms`.
pub fn parse_seconds(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

/// Parse a `KEY=VALUE` dimension flag.
pub fn parse_dimension(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}
