//! # Structured Logger
//!
//! A structured logging facade that routes each log call to several named
//! output streams (console, file, rotating file) and redacts sensitive
//! fields before anything reaches a sink.
//!
//! ## Features
//!
//! - **Heterogeneous arguments**: text, JSON objects and errors in one call
//!   are folded into a single record
//! - **Redaction**: `password`, `authorization`, `cookie` and `pin` keys are
//!   stripped from request and response payloads at any depth
//! - **Per-stream isolation**: a failing or panicking sink never stops the
//!   other streams or the caller
//! - **Bunyan-compatible output**: one JSON object per line in files
//!
//! ## Example
//!
//! ```no_run
//! use structured_logger::prelude::*;
//! use serde_json::json;
//!
//! let config = LoggerConfig::new("checkout")
//!     .with_env("production")
//!     .with_log_path("/var/log/checkout");
//! let logger = Logger::new(config)?;
//!
//! logger.info([LogArg::from("order placed"), LogArg::from(json!({ "orderId": 81 }))]);
//! # Ok::<(), LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileAppender, RotatingFileAppender, RotationPolicy};
    pub use crate::core::{
        Appender, ConsoleMode, ErrorRecord, LogArg, LogEntry, LogLevel, LogRecord, Logger,
        LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, OutputWay, Redactor, Result,
        RotationConfig, SerializerSet, Stream,
    };
}

pub use appenders::{ConsoleAppender, FileAppender, RotatingFileAppender, RotationPolicy};
pub use core::{
    Appender, ConsoleMode, Dispatch, ErrorRecord, LogArg, LogEntry, LogLevel, LogRecord, Logger,
    LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, OutputWay, Redactor, Result,
    RotationConfig, SerializerSet, Stream, StreamRegistry,
};
