//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod redactor;
pub mod registry;
pub mod serializers;
pub mod stream;

pub use appender::Appender;
pub use config::{ConsoleMode, LoggerConfig, OutputWay, RotationConfig};
pub use error::{LoggerError, Result};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use log_record::{ErrorRecord, LogArg, LogRecord};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use redactor::Redactor;
pub use registry::StreamRegistry;
pub use serializers::SerializerSet;
pub use stream::{Dispatch, Stream};
