use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid --log-level '{value}': {source}")]
    LogLevel { value: String, source: ParseError },

    #[error("logging setup failed: {0}")]
    Install(Box<dyn std::error::Error + Send + Sync>),
}

fn level_filter(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(log_level).map_err(|source| TelemetryError::LogLevel {
        value: log_level.to_string(),
        source,
    })
}

/// Install a compact stderr subscriber. `RUST_LOG` wins over `--log-level`
/// so stdout stays reserved for command output.
pub fn init(log_level: &str) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}
