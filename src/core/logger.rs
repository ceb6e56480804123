//! Logger facade: normalize call arguments, fan the record out to streams

use super::{
    config::LoggerConfig,
    error::Result,
    log_entry::LogEntry,
    log_level::LogLevel,
    log_record::{LogArg, LogRecord},
    metrics::LoggerMetrics,
    registry::StreamRegistry,
    serializers::SerializerSet,
    stream::{Dispatch, Stream},
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Structured logger writing every call to all configured streams
///
/// # Example
///
/// ```no_run
/// use structured_logger::prelude::*;
/// use serde_json::json;
///
/// let config = LoggerConfig::new("billing").with_log_path("/var/log/billing");
/// let logger = Logger::new(config)?;
///
/// logger.info(["invoice created", "for customer"]);
/// logger.warn([LogArg::from("slow request"), LogArg::from(json!({ "ms": 1200 }))]);
/// # Ok::<(), LoggerError>(())
/// ```
pub struct Logger {
    /// Record `name`, the configured domain
    name: String,
    /// Record `hostname`, the configured service name
    hostname: String,
    registry: StreamRegistry,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Build a logger and its streams from `config`
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or a file stream cannot be
    /// opened.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    /// Normalize `args` and dispatch the record at `level`
    pub fn log<I>(&self, level: LogLevel, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log_record(level, &LogRecord::normalize(args));
    }

    /// Dispatch an already normalized record
    ///
    /// Streams whose match predicate rejects the record are skipped. A
    /// stream that fails or panics is reported and counted; the remaining
    /// streams still receive the record.
    pub fn log_record(&self, level: LogLevel, record: &LogRecord) {
        self.metrics.record_call();

        let safe_text = self.registry.has_matchers().then(|| record.safe_text());
        let entry = LogEntry::new(level, record.message()).with_origin(&self.name, &self.hostname);

        for stream in &self.registry {
            if let Some(ref text) = safe_text {
                if !stream.matches(text) {
                    self.metrics.record_filtered();
                    continue;
                }
            }
            self.dispatch_isolated(stream, &entry, record);
        }
    }

    fn dispatch_isolated(&self, stream: &Stream, entry: &LogEntry, record: &LogRecord) {
        let result = catch_unwind(AssertUnwindSafe(|| stream.dispatch(entry, record)));

        match result {
            Ok(Ok(Dispatch::Written)) => self.metrics.record_written(),
            Ok(Ok(Dispatch::BelowThreshold)) => {}
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Stream '{}' failed: {}", stream.name(), e);
                self.metrics.record_failure();
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[LOGGER CRITICAL] Stream '{}' panicked: {}. \
                     Other streams continue to function.",
                    stream.name(),
                    panic_msg
                );
                self.metrics.record_failure();
            }
        }
    }

    #[inline]
    pub fn trace<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log(LogLevel::Trace, args);
    }

    #[inline]
    pub fn debug<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log(LogLevel::Debug, args);
    }

    #[inline]
    pub fn info<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log(LogLevel::Info, args);
    }

    #[inline]
    pub fn warn<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log(LogLevel::Warn, args);
    }

    #[inline]
    pub fn error<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log(LogLevel::Error, args);
    }

    #[inline]
    pub fn fatal<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        self.log(LogLevel::Fatal, args);
    }

    /// Flush every stream, returning the first error after trying all of them
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for stream in &self.registry {
            if let Err(e) = stream.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.registry
    }

    /// Get the logger metrics
    ///
    /// # Example
    ///
    /// ```
    /// use structured_logger::prelude::*;
    ///
    /// let logger = Logger::new(LoggerConfig::new("svc").with_output_ways([])).unwrap();
    /// logger.info(["ready"]);
    ///
    /// assert_eq!(logger.metrics().total_calls(), 1);
    /// assert_eq!(logger.metrics().failure_count(), 0);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Shared handle to the metrics, usable after the logger is dropped
    pub fn metrics_handle(&self) -> Arc<LoggerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let failures = self.metrics.failure_count();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} failed writes (failure rate: {:.2}%)",
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

/// Builder for a [`Logger`]
///
/// # Example
/// ```
/// use structured_logger::prelude::*;
///
/// let logger = Logger::builder(LoggerConfig::new("svc").with_output_ways([]))
///     .stream(Stream::new("console", LogLevel::Debug, ConsoleAppender::new(ConsoleMode::Simple)))
///     .build()
///     .unwrap();
///
/// assert_eq!(logger.streams().names(), vec!["console"]);
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    serializers: SerializerSet,
    streams: Vec<Stream>,
}

impl LoggerBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            serializers: SerializerSet::new(),
            streams: Vec::new(),
        }
    }

    /// Replace the serializers used by configured streams
    #[must_use = "builder methods return a new value"]
    pub fn serializers(mut self, serializers: SerializerSet) -> Self {
        self.serializers = serializers;
        self
    }

    /// Add a caller-built stream after the configured ones
    #[must_use = "builder methods return a new value"]
    pub fn stream(mut self, stream: Stream) -> Self {
        self.streams.push(stream);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Result<Logger> {
        let registry =
            StreamRegistry::build_with(&self.config, Arc::new(self.serializers), self.streams)?;

        Ok(Logger {
            name: self.config.domain,
            hostname: self.config.service_name,
            registry,
            metrics: Arc::new(LoggerMetrics::new()),
        })
    }
}
