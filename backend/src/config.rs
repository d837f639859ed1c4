//! Configuration file and environment variable handling.
//!
//! Settings are read from a `results.toml` file when one exists and then
//! overridden by environment variables. Every setting has a default, so an
//! empty file (or no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ResultsError, ResultsResult};

/// How the first row of a source is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// Header when the first row's elapsed-time cell is not a time
    #[default]
    Auto,
    Present,
    Absent,
}

/// Ingestion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// WHATWG label of the encoding retried after a decode failure
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,
    /// Below this confidence the detector falls back to UTF-8
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Lines sampled for delimiter sniffing
    #[serde(default = "default_sample_lines")]
    pub sample_lines: usize,
    #[serde(default)]
    pub header: HeaderMode,
    /// Forces a delimiter instead of sniffing it
    #[serde(default)]
    pub delimiter: Option<char>,
}

/// Query settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Size of the champions view
    #[serde(default = "default_podium_size")]
    pub podium_size: usize,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Results file loaded at startup and on reload
    #[serde(default)]
    pub results_path: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_fallback_encoding() -> String {
    "windows-1252".to_string()
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_sample_lines() -> usize {
    50
}

fn default_podium_size() -> usize {
    3
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fallback_encoding: default_fallback_encoding(),
            min_confidence: default_min_confidence(),
            sample_lines: default_sample_lines(),
            header: HeaderMode::default(),
            delimiter: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            podium_size: default_podium_size(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            results_path: None,
        }
    }
}

impl IngestConfig {
    /// Resolve the fallback encoding label.
    pub fn fallback(&self) -> ResultsResult<&'static encoding_rs::Encoding> {
        encoding_rs::Encoding::for_label(self.fallback_encoding.trim().as_bytes()).ok_or_else(
            || {
                ResultsError::Config(format!(
                    "Unknown fallback encoding '{}'",
                    self.fallback_encoding
                ))
            },
        )
    }
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ResultsResult<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| ResultsError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ResultsResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ResultsError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the default location, or defaults if none exists.
    ///
    /// Searches for `results.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> ResultsResult<Self> {
        let search_paths = [
            PathBuf::from("results.toml"),
            PathBuf::from("backend/results.toml"),
            PathBuf::from("../results.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Apply environment variable overrides.
    ///
    /// # Environment Variables
    /// - `RESULTS_FILE`: results file loaded by the server
    /// - `HOST`: server host
    /// - `PORT`: server port
    /// - `RESULTS_FALLBACK_ENCODING`: fallback encoding label
    /// - `RESULTS_PODIUM_SIZE`: size of the champions view
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value.
    pub fn apply_env(mut self) -> ResultsResult<Self> {
        if let Ok(path) = env::var("RESULTS_FILE") {
            if !path.trim().is_empty() {
                self.server.results_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ResultsError::Config("PORT must be a valid port number".into()))?;
        }
        if let Ok(label) = env::var("RESULTS_FALLBACK_ENCODING") {
            self.ingest.fallback_encoding = label;
        }
        if let Ok(size) = env::var("RESULTS_PODIUM_SIZE") {
            self.query.podium_size = size.parse().map_err(|_| {
                ResultsError::Config("RESULTS_PODIUM_SIZE must be a positive integer".into())
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Default location plus environment overrides.
    pub fn load() -> ResultsResult<Self> {
        Self::from_default_location()?.apply_env()
    }

    fn validate(&self) -> ResultsResult<()> {
        self.ingest.fallback()?;
        if !(0.0..=1.0).contains(&self.ingest.min_confidence) {
            return Err(ResultsError::Config(
                "ingest.min_confidence must be between 0 and 1".into(),
            ));
        }
        if self.ingest.sample_lines == 0 {
            return Err(ResultsError::Config(
                "ingest.sample_lines must be positive".into(),
            ));
        }
        if self.query.podium_size == 0 {
            return Err(ResultsError::Config(
                "query.podium_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ingest.fallback_encoding, "windows-1252");
        assert_eq!(config.query.podium_size, 3);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [ingest]
            header = "absent"
            delimiter = ";"

            [server]
            results_path = "resultados.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.ingest.header, HeaderMode::Absent);
        assert_eq!(config.ingest.delimiter, Some(';'));
        assert_eq!(config.ingest.sample_lines, 50);
        assert_eq!(
            config.server.results_path,
            Some(PathBuf::from("resultados.csv"))
        );
    }

    #[test]
    fn test_unknown_fallback_encoding_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [ingest]
            fallback_encoding = "klingon"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ResultsError::Config(_)));
    }

    #[test]
    fn test_latin1_label_resolves() {
        let ingest = IngestConfig {
            fallback_encoding: "latin1".to_string(),
            ..IngestConfig::default()
        };
        assert_eq!(ingest.fallback().unwrap(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_zero_podium_rejected() {
        let err = AppConfig::from_toml_str("[query]\npodium_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("podium_size"));
    }
}
