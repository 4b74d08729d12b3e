//! Station configuration.
//!
//! Loading flow:
//! 1. Start with compiled [`ServerConfig::default()`]
//! 2. If a config file exists (`~/.soundpost/config.json` unless overridden),
//!    deep-merge its values over the defaults
//! 3. Apply `SOUNDPOST_*` environment overrides (highest priority)
//!
//! Deep merge rules: objects merge per key, arrays and primitives are
//! replaced, and `null` in the file keeps the default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use soundpost_telemetry::LoggingConfig;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Placeholder Spotify client settings, served as-is to the web client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: "your_spotify_client_id_placeholder".into(),
            client_secret: "your_spotify_client_secret_placeholder".into(),
            redirect_uri: "http://localhost:3000/callback".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Outbound frames buffered per connection before broadcasts start waiting.
    pub max_send_queue: usize,
    /// Deadline for enqueueing a frame and for each socket write.
    pub write_timeout_ms: u64,
    pub heartbeat_interval_secs: u64,
    /// Largest inbound WebSocket message accepted.
    pub max_message_size: usize,
    pub max_upload_bytes: usize,
    pub uploads_dir: PathBuf,
    pub database_path: PathBuf,
    pub spotify: SpotifyConfig,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let home = soundpost_home();
        Self {
            host: "0.0.0.0".into(),
            port: 8001,
            max_send_queue: 256,
            write_timeout_ms: 250,
            heartbeat_interval_secs: 30,
            max_message_size: 16 * 1024 * 1024,
            max_upload_bytes: 50 * 1024 * 1024,
            uploads_dir: home.join("uploads"),
            database_path: home.join("database").join("soundpost.db"),
            spotify: SpotifyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn soundpost_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".soundpost")
}

/// `~/.soundpost/config.json`.
pub fn config_path() -> PathBuf {
    soundpost_home().join("config.json")
}

/// Load from `path` (or the default location) and apply env overrides.
///
/// A missing file yields defaults. A file with invalid JSON is an error.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let mut config = load_config_file(&path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Defaults deep-merged with the file at `path`, without env overrides.
pub fn load_config_file(path: &Path) -> Result<ServerConfig> {
    let defaults = serde_json::to_value(ServerConfig::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading config from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "config file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `SOUNDPOST_*` overrides read through `lookup`. Invalid or empty
/// values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("SOUNDPOST_HOST") {
        config.host = v;
    }
    if let Some(v) = read("SOUNDPOST_PORT") {
        match parse_u64_range(&v, 1, u64::from(u16::MAX)) {
            Some(port) => config.port = port as u16,
            None => warn!(key = "SOUNDPOST_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }
    if let Some(v) = read("SOUNDPOST_UPLOADS_DIR") {
        config.uploads_dir = PathBuf::from(v);
    }
    if let Some(v) = read("SOUNDPOST_DB_PATH") {
        config.database_path = PathBuf::from(v);
    }
    if let Some(v) = read("SOUNDPOST_WRITE_TIMEOUT_MS") {
        match parse_u64_range(&v, 1, 60_000) {
            Some(ms) => config.write_timeout_ms = ms,
            None => {
                warn!(key = "SOUNDPOST_WRITE_TIMEOUT_MS", value = %v, "invalid timeout env var, ignoring");
            }
        }
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8001);
        assert_eq!(cfg.max_send_queue, 256);
        assert_eq!(cfg.write_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.max_message_size, 16 * 1024 * 1024);
        assert!(cfg.uploads_dir.ends_with(".soundpost/uploads"));
        assert!(cfg.database_path.ends_with("database/soundpost.db"));
        assert_eq!(cfg.spotify.redirect_uri, "http://localhost:3000/callback");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8001");
    }

    #[test]
    fn deep_merge_nested_and_skips_null() {
        let target = json!({"a": 1, "nested": {"x": 1, "y": 2}, "keep": "yes"});
        let source = json!({"nested": {"y": 20, "z": 30}, "keep": null, "new": [1]});
        let merged = deep_merge(target, source);
        assert_eq!(
            merged,
            json!({"a": 1, "nested": {"x": 1, "y": 20, "z": 30}, "keep": "yes", "new": [1]})
        );
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let merged = deep_merge(json!({"list": [1, 2, 3]}), json!({"list": [9]}));
        assert_eq!(merged, json!({"list": [9]}));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.port, 8001);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"port": 9100, "spotify": {"client_id": "real-id"}, "logging": {"level": "debug"}, "host": null}"#,
        )
        .unwrap();

        let cfg = load_config_file(&path).unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.spotify.client_id, "real-id");
        assert_eq!(cfg.spotify.redirect_uri, "http://localhost:3000/callback");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn zero_durations_from_file_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"write_timeout_ms": 0, "heartbeat_interval_secs": 0}"#).unwrap();

        let cfg = load_config_file(&path).unwrap();
        assert_eq!(cfg.write_timeout_ms, 0);
        assert_eq!(cfg.write_timeout(), Duration::from_millis(1));
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(1));
    }

    #[test]
    fn invalid_json_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{port: nope").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = ServerConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("SOUNDPOST_HOST", "127.0.0.1"),
                ("SOUNDPOST_PORT", "9000"),
                ("SOUNDPOST_UPLOADS_DIR", "/srv/uploads"),
                ("SOUNDPOST_DB_PATH", "/srv/station.db"),
                ("SOUNDPOST_WRITE_TIMEOUT_MS", "100"),
            ]),
        );
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.uploads_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(cfg.database_path, PathBuf::from("/srv/station.db"));
        assert_eq!(cfg.write_timeout_ms, 100);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut cfg = ServerConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("SOUNDPOST_HOST", ""),
                ("SOUNDPOST_PORT", "99999"),
                ("SOUNDPOST_WRITE_TIMEOUT_MS", "soon"),
            ]),
        );
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8001);
        assert_eq!(cfg.write_timeout_ms, 250);
    }

    #[test]
    fn parse_range() {
        assert_eq!(parse_u64_range("42", 1, 100), Some(42));
        assert_eq!(parse_u64_range(" 7 ", 1, 100), Some(7));
        assert_eq!(parse_u64_range("0", 1, 100), None);
        assert_eq!(parse_u64_range("-3", 1, 100), None);
    }
}
