use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration. `RUST_LOG`, when set, overrides the filter built here.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for every target.
    pub level: String,
    /// Per-module level overrides (e.g. "soundpost_server" => "debug").
    pub module_levels: BTreeMap<String, String>,
    /// Emit one JSON object per line instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            module_levels: BTreeMap::new(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),
    #[error("global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Render the directive string for an [`EnvFilter`] from config.
pub fn filter_directives(config: &LoggingConfig) -> Result<String, TelemetryError> {
    let mut directives = parse_level(&config.level)?.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        let level = parse_level(level)?;
        directives.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    Ok(directives)
}

fn parse_level(s: &str) -> Result<Level, TelemetryError> {
    Level::from_str(s).map_err(|_| TelemetryError::InvalidLevel(s.to_string()))
}

/// Install the global tracing subscriber. Call once at startup.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let directives = filter_directives(config)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))
}
