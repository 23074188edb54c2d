//! Configuration module for uptrail.
//!
//! Runtime settings come from environment variables with sensible defaults;
//! the list of endpoints comes from a YAML checks file.

use crate::probe::Endpoint;

use ::config::{Config, File};
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ::config::ConfigError,
    },
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("no checks defined in {0}")]
    NoChecks(PathBuf),
}

/// Runtime settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Path to the checks file (default: "checks.yml")
    pub checks_path: PathBuf,
    /// Whole-request timeout for HTTP probes (default: 10s)
    pub http_timeout: Duration,
    /// Reply timeout for ICMP probes (default: 1s)
    pub icmp_timeout: Duration,
    /// Write logs here instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            checks_path: PathBuf::from("checks.yml"),
            http_timeout: Duration::from_secs(10),
            icmp_timeout: Duration::from_secs(1),
            log_file: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Environment variables:
    /// - `UPTRAIL_CONFIG`: checks file path (default: "checks.yml")
    /// - `UPTRAIL_HTTP_TIMEOUT`: HTTP timeout, e.g. "10s" (default: 10s)
    /// - `UPTRAIL_ICMP_TIMEOUT`: ping timeout, e.g. "1s" (default: 1s)
    /// - `UPTRAIL_LOG_FILE`: log file path (default: stderr)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(path) = lookup("UPTRAIL_CONFIG") {
            cfg.checks_path = PathBuf::from(path);
        }

        if let Some(timeout) = lookup("UPTRAIL_HTTP_TIMEOUT") {
            if let Ok(timeout) = parse_duration(&timeout) {
                cfg.http_timeout = timeout;
            }
        }

        if let Some(timeout) = lookup("UPTRAIL_ICMP_TIMEOUT") {
            if let Ok(timeout) = parse_duration(&timeout) {
                cfg.icmp_timeout = timeout;
            }
        }

        if let Some(path) = lookup("UPTRAIL_LOG_FILE") {
            cfg.log_file = Some(PathBuf::from(path));
        }

        cfg
    }
}

/// One entry of the checks file.
#[derive(Debug, Clone, Deserialize)]
struct CheckDef {
    name: String,
    #[serde(rename = "type")]
    probe_type: String,
    dest: String,
    #[serde(deserialize_with = "deserialize_duration")]
    repeat: Duration,
}

#[derive(Debug, Deserialize)]
struct ChecksFile {
    #[serde(default)]
    checks: Vec<CheckDef>,
}

/// Load the endpoint list, assigning each endpoint its stable index.
pub fn load_endpoints(path: &Path) -> Result<Vec<Arc<Endpoint>>, ConfigError> {
    let load_err = |source: ::config::ConfigError| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    };

    let file: ChecksFile = Config::builder()
        .add_source(File::from(path))
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(load_err)?;

    if file.checks.is_empty() {
        return Err(ConfigError::NoChecks(path.to_path_buf()));
    }

    Ok(file
        .checks
        .into_iter()
        .enumerate()
        .map(|(index, def)| {
            Arc::new(Endpoint {
                index,
                name: def.name,
                probe_type: def.probe_type,
                destination: def.dest,
                repeat: def.repeat,
            })
        })
        .collect())
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Suffix to nanoseconds multiplier (longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("h", 3_600_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Parse duration strings like "500ms", "5s", "1m30s" or "1.5h".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid());
    }

    if let Ok(secs) = s.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|_| invalid());
    }

    let mut rest = s;
    let mut nanos = 0.0;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(split);
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let (suffix, multiplier) = UNITS
            .iter()
            .find(|(suffix, _)| tail.starts_with(suffix))
            .ok_or_else(invalid)?;
        nanos += value * multiplier;
        rest = &tail[suffix.len()..];
    }

    Ok(Duration::from_nanos(nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn checks_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_settings() {
        let cfg = Settings::default();
        assert_eq!(cfg.checks_path, PathBuf::from("checks.yml"));
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.icmp_timeout, Duration::from_secs(1));
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn test_settings_from_env() {
        let cfg = Settings::from_lookup(|key| match key {
            "UPTRAIL_CONFIG" => Some("/etc/uptrail/checks.yaml".to_string()),
            "UPTRAIL_HTTP_TIMEOUT" => Some("3s".to_string()),
            "UPTRAIL_ICMP_TIMEOUT" => Some("bogus".to_string()),
            _ => None,
        });
        assert_eq!(cfg.checks_path, PathBuf::from("/etc/uptrail/checks.yaml"));
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
        // Unparsable values keep the default
        assert_eq!(cfg.icmp_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("5 parsecs").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("-1").is_err());
    }

    #[test]
    fn test_load_endpoints() {
        let file = checks_file(
            r#"
checks:
  - name: homepage
    type: http
    dest: https://example.com
    repeat: 30s
  - name: gateway
    type: icmp
    dest: 192.168.1.1
    repeat: 500ms
"#,
        );

        let endpoints = load_endpoints(file.path()).unwrap();
        assert_eq!(endpoints.len(), 2);

        assert_eq!(endpoints[0].index, 0);
        assert_eq!(endpoints[0].name, "homepage");
        assert_eq!(endpoints[0].probe_type, "http");
        assert_eq!(endpoints[0].destination, "https://example.com");
        assert_eq!(endpoints[0].repeat, Duration::from_secs(30));

        assert_eq!(endpoints[1].index, 1);
        assert_eq!(endpoints[1].repeat, Duration::from_millis(500));
    }

    #[test]
    fn test_load_keeps_unknown_probe_type() {
        let file = checks_file(
            r#"
checks:
  - name: resolver
    type: dns
    dest: 1.1.1.1
    repeat: 5s
"#,
        );

        let endpoints = load_endpoints(file.path()).unwrap();
        assert_eq!(endpoints[0].probe_type, "dns");
        assert!(endpoints[0].kind().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_endpoints(Path::new("/nonexistent/checks.yml"));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn test_load_bad_duration() {
        let file = checks_file(
            r#"
checks:
  - name: homepage
    type: http
    dest: https://example.com
    repeat: soon
"#,
        );
        assert!(matches!(load_endpoints(file.path()), Err(ConfigError::Load { .. })));
    }

    #[test]
    fn test_load_empty_checks() {
        let file = checks_file("checks: []\n");
        assert!(matches!(load_endpoints(file.path()), Err(ConfigError::NoChecks(_))));
    }
}
