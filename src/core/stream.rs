//! Named output destination wrapping a sink

use super::appender::Appender;
use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::serializers::SerializerSet;
use crate::appenders::RotationPolicy;
use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Outcome of handing a record to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Written,
    BelowThreshold,
}

/// A sink plus its minimum level, serializers and optional match predicate
///
/// Streams are built once and never reconfigured; the sink sits behind its
/// own lock so a shared logger can write from several threads.
pub struct Stream {
    name: String,
    threshold: LogLevel,
    sink: Mutex<Box<dyn Appender>>,
    serializers: Arc<SerializerSet>,
    matcher: Option<Regex>,
    rotation: Option<RotationPolicy>,
}

impl Stream {
    pub fn new<A: Appender + 'static>(name: impl Into<String>, threshold: LogLevel, sink: A) -> Self {
        Self::from_boxed(name, threshold, Box::new(sink))
    }

    pub fn from_boxed(name: impl Into<String>, threshold: LogLevel, sink: Box<dyn Appender>) -> Self {
        Self {
            name: name.into(),
            threshold,
            sink: Mutex::new(sink),
            serializers: Arc::new(SerializerSet::new()),
            matcher: None,
            rotation: None,
        }
    }

    #[must_use]
    pub fn with_serializers(mut self, serializers: Arc<SerializerSet>) -> Self {
        self.serializers = serializers;
        self
    }

    /// Only accept records whose safe text matches `pattern`
    pub fn with_match(self, pattern: &str) -> Result<Self> {
        let matcher = Regex::new(pattern).map_err(|e| LoggerError::pattern(&self.name, e))?;
        Ok(self.with_matcher(matcher))
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Regex) -> Self {
        self.matcher = Some(matcher);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, policy: RotationPolicy) -> Self {
        self.rotation = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub fn rotation(&self) -> Option<&RotationPolicy> {
        self.rotation.as_ref()
    }

    pub fn has_matcher(&self) -> bool {
        self.matcher.is_some()
    }

    /// Whether the match predicate (if any) accepts the rendered record
    pub fn matches(&self, safe_text: &str) -> bool {
        self.matcher.as_ref().map_or(true, |m| m.is_match(safe_text))
    }

    /// Serialize `record` and write it if `entry.level` passes the threshold
    ///
    /// `entry` carries the envelope (level, time, origin, message) shared
    /// by every stream for one call.
    pub fn dispatch(&self, entry: &LogEntry, record: &LogRecord) -> Result<Dispatch> {
        if !entry.level.passes(self.threshold) {
            return Ok(Dispatch::BelowThreshold);
        }

        let entry = entry
            .clone()
            .with_fields(self.serializers.apply(&record.to_fields()));
        self.sink.lock().append(&entry)?;
        Ok(Dispatch::Written)
    }

    pub fn flush(&self) -> Result<()> {
        self.sink.lock().flush()
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .field("matcher", &self.matcher.as_ref().map(Regex::as_str))
            .field("rotation", &self.rotation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Collector(Arc<Mutex<Vec<LogEntry>>>);

    impl Appender for Collector {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.0.lock().push(entry.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "collector"
        }
    }

    #[test]
    fn test_threshold() {
        let collector = Collector::default();
        let stream = Stream::new("errors", LogLevel::Error, collector.clone());
        let record = LogRecord::normalize(["disk full"]);

        let warn = LogEntry::new(LogLevel::Warn, record.message());
        assert_eq!(stream.dispatch(&warn, &record).unwrap(), Dispatch::BelowThreshold);

        let error = LogEntry::new(LogLevel::Error, record.message());
        assert_eq!(stream.dispatch(&error, &record).unwrap(), Dispatch::Written);
        assert_eq!(collector.0.lock().len(), 1);
    }

    #[test]
    fn test_serializers_applied_on_write() {
        let collector = Collector::default();
        let stream = Stream::new("all", LogLevel::Info, collector.clone());
        let record = LogRecord::normalize([json!({
            "req": { "url": "/", "headers": { "cookie": "sid=1", "host": "a" } }
        })]);

        stream
            .dispatch(&LogEntry::new(LogLevel::Info, record.message()), &record)
            .unwrap();

        let written = collector.0.lock();
        assert_eq!(written[0].fields["req"]["headers"], json!({ "host": "a" }));
        // The record itself is untouched
        assert_eq!(record.fields["req"]["headers"]["cookie"], "sid=1");
    }

    #[test]
    fn test_matcher() {
        let stream = Stream::new("boom", LogLevel::Info, Collector::default())
            .with_match("boom")
            .unwrap();

        assert!(stream.has_matcher());
        assert!(stream.matches("big boom "));
        assert!(!stream.matches("all quiet "));

        let plain = Stream::new("plain", LogLevel::Info, Collector::default());
        assert!(plain.matches("anything"));
    }

    #[test]
    fn test_invalid_match_pattern() {
        let err = Stream::new("bad", LogLevel::Info, Collector::default())
            .with_match("(")
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
