//! Stream registry built from configuration
//!
//! Each [`OutputWay`] maps to a constructor producing its streams:
//!
//! | output way | streams |
//! |------------|---------|
//! | `Stdout`   | `stdout` at the configured level |
//! | `File`     | `file-errors` at `error`, `file-all` at the configured level |
//! | `File` + rotation | `rotation-errors` at `error`, `rotation-all` at the configured level |

use super::config::{LoggerConfig, OutputWay};
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::serializers::SerializerSet;
use super::stream::Stream;
use crate::appenders::{ConsoleAppender, FileAppender, RotatingFileAppender, RotationPolicy};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const STDOUT_STREAM: &str = "stdout";
pub const FILE_ERRORS_STREAM: &str = "file-errors";
pub const FILE_ALL_STREAM: &str = "file-all";
pub const ROTATION_ERRORS_STREAM: &str = "rotation-errors";
pub const ROTATION_ALL_STREAM: &str = "rotation-all";

type StreamBuilder = fn(&LoggerConfig, &Arc<SerializerSet>) -> Result<Vec<Stream>>;

impl OutputWay {
    fn stream_builder(self) -> StreamBuilder {
        match self {
            OutputWay::Stdout => console_streams,
            OutputWay::File => file_streams,
        }
    }
}

fn console_streams(config: &LoggerConfig, serializers: &Arc<SerializerSet>) -> Result<Vec<Stream>> {
    let sink = ConsoleAppender::new(config.mode);
    Ok(vec![
        Stream::new(STDOUT_STREAM, config.level, sink).with_serializers(Arc::clone(serializers))
    ])
}

fn file_streams(config: &LoggerConfig, serializers: &Arc<SerializerSet>) -> Result<Vec<Stream>> {
    ensure_log_dir(&config.log_path)?;
    let error_path = config.error_log_path();
    let all_path = config.all_log_path();

    let streams = if config.rotation.enabled {
        let policy = RotationPolicy::from_config(&config.rotation)?;
        let errors = RotatingFileAppender::with_policy(&error_path, policy.clone())
            .map_err(|e| unusable_path(&error_path, e))?;
        let all = RotatingFileAppender::with_policy(&all_path, policy.clone())
            .map_err(|e| unusable_path(&all_path, e))?;
        vec![
            Stream::new(ROTATION_ERRORS_STREAM, LogLevel::Error, errors).with_rotation(policy.clone()),
            Stream::new(ROTATION_ALL_STREAM, config.level, all).with_rotation(policy),
        ]
    } else {
        let errors = FileAppender::new(&error_path).map_err(|e| unusable_path(&error_path, e))?;
        let all = FileAppender::new(&all_path).map_err(|e| unusable_path(&all_path, e))?;
        vec![
            Stream::new(FILE_ERRORS_STREAM, LogLevel::Error, errors),
            Stream::new(FILE_ALL_STREAM, config.level, all),
        ]
    };

    Ok(streams
        .into_iter()
        .map(|stream| stream.with_serializers(Arc::clone(serializers)))
        .collect())
}

fn ensure_log_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        LoggerError::config(
            "log_path",
            format!("cannot create log directory '{}': {}", path.display(), e),
        )
    })?;
    if !path.is_dir() {
        return Err(LoggerError::config(
            "log_path",
            format!("'{}' is not a directory", path.display()),
        ));
    }
    Ok(())
}

fn unusable_path(path: &Path, source: LoggerError) -> LoggerError {
    LoggerError::config("log_path", format!("cannot open '{}': {}", path.display(), source))
}

/// Streams of one logger, fixed after construction
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: Vec<Stream>,
}

impl StreamRegistry {
    /// Build the configured streams
    pub fn build(config: &LoggerConfig, serializers: Arc<SerializerSet>) -> Result<Self> {
        Self::build_with(config, serializers, Vec::new())
    }

    /// Build the configured streams followed by caller-supplied ones
    ///
    /// Match patterns from the configuration apply to both.
    pub fn build_with(
        config: &LoggerConfig,
        serializers: Arc<SerializerSet>,
        extra: Vec<Stream>,
    ) -> Result<Self> {
        config.validate()?;

        let mut streams = Vec::new();
        for way in config.unique_output_ways() {
            streams.extend((way.stream_builder())(config, &serializers)?);
        }
        streams.extend(extra);

        let mut registry = Self::from_streams(streams)?;
        for (name, pattern) in &config.matches {
            registry.attach_match(name, pattern)?;
        }
        Ok(registry)
    }

    /// Wrap ready-made streams, rejecting duplicate names
    pub fn from_streams(streams: Vec<Stream>) -> Result<Self> {
        for (i, stream) in streams.iter().enumerate() {
            if streams[..i].iter().any(|s| s.name() == stream.name()) {
                return Err(LoggerError::config(
                    "streams",
                    format!("duplicate stream name '{}'", stream.name()),
                ));
            }
        }
        Ok(Self { streams })
    }

    fn attach_match(&mut self, name: &str, pattern: &str) -> Result<()> {
        let index = self
            .streams
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| {
                LoggerError::config("matches", format!("no stream named '{}'", name))
            })?;
        let stream = self.streams.remove(index);
        self.streams.insert(index, stream.with_match(pattern)?);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stream> {
        self.streams.iter()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(Stream::name).collect()
    }

    /// Whether any stream needs the rendered record text
    pub fn has_matchers(&self) -> bool {
        self.streams.iter().any(Stream::has_matcher)
    }
}

impl<'a> IntoIterator for &'a StreamRegistry {
    type Item = &'a Stream;
    type IntoIter = std::slice::Iter<'a, Stream>;

    fn into_iter(self) -> Self::IntoIter {
        self.streams.iter()
    }
}
