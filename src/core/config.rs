//! Logger configuration
//!
//! Keys accept both the Rust spellings and the camelCase/uppercase spellings
//! used by existing deployments (`outputWays`, `serviceName`, `LEVEL`, `MODE`).

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_ENV: &str = "development";
pub const DEFAULT_SERVICE_NAME: &str = "localhost";
pub const DEFAULT_LOG_PATH: &str = "/home/ubuntu";
pub const DEFAULT_ROTATION_PERIOD: &str = "6h";
pub const DEFAULT_ROTATION_COUNT: usize = 10;

/// Destination family requested in `output_ways`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputWay {
    #[serde(alias = "file", alias = "FILE")]
    File,
    #[serde(alias = "stdout", alias = "STDOUT")]
    Stdout,
}

/// Console rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMode {
    /// `HH:MM:SS.mmmZ LEVEL name: msg`
    #[default]
    Short,
    /// `[time] LEVEL: name/pid on hostname: msg`
    Long,
    /// `LEVEL: msg`
    Simple,
    /// Raw JSON record
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub enabled: bool,
    /// Period string such as `6h`, `1d` or `daily`
    pub period: String,
    /// Number of rotated files to keep
    pub count: Option<usize>,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: DEFAULT_ROTATION_PERIOD.to_string(),
            count: None,
            compress: false,
        }
    }
}

impl RotationConfig {
    pub fn retained(&self) -> usize {
        self.count.unwrap_or(DEFAULT_ROTATION_COUNT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Identifier used in file names and as the record `name`
    pub domain: String,

    #[serde(default = "default_env")]
    pub env: String,

    #[serde(default = "default_output_ways")]
    pub output_ways: Vec<OutputWay>,

    /// Written as the record `hostname`
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default, alias = "LEVEL")]
    pub level: LogLevel,

    #[serde(default, alias = "MODE")]
    pub mode: ConsoleMode,

    #[serde(default = "default_log_path", alias = "log_path")]
    pub log_path: PathBuf,

    #[serde(default)]
    pub rotation: RotationConfig,

    /// Stream name to match pattern
    #[serde(default)]
    pub matches: BTreeMap<String, String>,
}

fn default_env() -> String {
    DEFAULT_ENV.to_string()
}

fn default_output_ways() -> Vec<OutputWay> {
    vec![OutputWay::File, OutputWay::Stdout]
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

impl LoggerConfig {
    /// Configuration with every default except the required domain
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            env: default_env(),
            output_ways: default_output_ways(),
            service_name: default_service_name(),
            level: LogLevel::default(),
            mode: ConsoleMode::default(),
            log_path: default_log_path(),
            rotation: RotationConfig::default(),
            matches: BTreeMap::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_output_ways<I: IntoIterator<Item = OutputWay>>(mut self, ways: I) -> Self {
        self.output_ways = ways.into_iter().collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_mode(mut self, mode: ConsoleMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    /// Attach a match pattern to the stream called `stream`
    #[must_use = "builder methods return a new value"]
    pub fn with_match(mut self, stream: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.matches.insert(stream.into(), pattern.into());
        self
    }

    /// Output ways in first-seen order without duplicates
    pub fn unique_output_ways(&self) -> Vec<OutputWay> {
        let mut ways = Vec::with_capacity(self.output_ways.len());
        for way in &self.output_ways {
            if !ways.contains(way) {
                ways.push(*way);
            }
        }
        ways
    }

    /// Check fields that do not depend on the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(LoggerError::config("domain", "domain must not be empty"));
        }
        if self.env.trim().is_empty() {
            return Err(LoggerError::config("env", "env must not be empty"));
        }
        let invalid_char = |s: &str| s.contains(['/', '\\']);
        if invalid_char(&self.domain) || invalid_char(&self.env) {
            return Err(LoggerError::config(
                "domain",
                "domain and env are used in file names and must not contain path separators",
            ));
        }
        if self.output_ways.contains(&OutputWay::File) && self.log_path.as_os_str().is_empty() {
            return Err(LoggerError::config("log_path", "log path must not be empty"));
        }
        if self.rotation.enabled && self.rotation.count == Some(0) {
            return Err(LoggerError::config("rotation", "count must be at least 1"));
        }
        Ok(())
    }

    /// `{log_path}/{domain}_{env}.log`
    pub fn all_log_path(&self) -> PathBuf {
        self.log_path.join(format!("{}_{}.log", self.domain, self.env))
    }

    /// `{log_path}/{domain}_{env}.error.log`
    pub fn error_log_path(&self) -> PathBuf {
        self.log_path.join(format!("{}_{}.error.log", self.domain, self.env))
    }
}
