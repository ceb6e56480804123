//! Logging macros accepting heterogeneous arguments.
//!
//! Each argument is converted with [`LogArg::from`](crate::LogArg), so
//! strings, numbers, JSON values and [`ErrorRecord`](crate::ErrorRecord)s
//! can be mixed in one call.
//!
//! # Examples
//!
//! ```
//! use structured_logger::prelude::*;
//! use structured_logger::info;
//! use serde_json::json;
//!
//! let logger = Logger::new(LoggerConfig::new("api").with_output_ways([])).unwrap();
//!
//! info!(logger, "server started");
//! info!(logger, "listening on port", 8080);
//! info!(logger, "request done", json!({ "status": 200, "ms": 12 }));
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use structured_logger::prelude::*;
/// # let logger = Logger::new(LoggerConfig::new("api").with_output_ways([])).unwrap();
/// use structured_logger::log;
/// log!(logger, LogLevel::Info, "simple message");
/// log!(logger, LogLevel::Error, ErrorRecord::new("timeout").with_code("E_TIMEOUT"));
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr) => {
        $logger.log($level, ::std::vec::Vec::<$crate::LogArg>::new())
    };
    ($logger:expr, $level:expr, $($arg:expr),+ $(,)?) => {
        $logger.log($level, [$($crate::LogArg::from($arg)),+])
    };
}

/// Log at trace level.
#[macro_export]
macro_rules! trace {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Trace $(, $arg)*)
    };
}

/// Log at debug level.
#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Debug $(, $arg)*)
    };
}

/// Log at info level.
///
/// # Examples
///
/// ```
/// # use structured_logger::prelude::*;
/// # let logger = Logger::new(LoggerConfig::new("api").with_output_ways([])).unwrap();
/// use structured_logger::info;
/// info!(logger, "processing", 100, "items");
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Info $(, $arg)*)
    };
}

/// Log at warn level.
#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Warn $(, $arg)*)
    };
}

/// Log at error level.
///
/// # Examples
///
/// ```
/// # use structured_logger::prelude::*;
/// # let logger = Logger::new(LoggerConfig::new("api").with_output_ways([])).unwrap();
/// use structured_logger::error;
/// let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// error!(logger, "write failed", LogArg::error(&io_err));
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Error $(, $arg)*)
    };
}

/// Log at fatal level.
#[macro_export]
macro_rules! fatal {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Fatal $(, $arg)*)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{
        Appender, LogEntry, LogLevel, Logger, LoggerConfig, Result, Stream,
    };
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

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

    fn logger_with(collector: &Collector) -> Logger {
        Logger::builder(LoggerConfig::new("macros").with_output_ways([]))
            .stream(Stream::new("all", LogLevel::Trace, collector.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_log_macro() {
        let collector = Collector::default();
        let logger = logger_with(&collector);
        log!(logger, LogLevel::Info, "count", 42);
        log!(logger, LogLevel::Warn);

        let entries = collector.0.lock();
        assert_eq!(entries[0].message, "count 42 ");
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert_eq!(entries[1].message, "");
    }

    #[test]
    fn test_level_macros() {
        let collector = Collector::default();
        let logger = logger_with(&collector);
        trace!(logger, "t");
        debug!(logger, "d");
        info!(logger, "i");
        warn!(logger, "w");
        error!(logger, "e");
        fatal!(logger, "f");

        let levels: Vec<LogLevel> = collector.0.lock().iter().map(|e| e.level).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
    }

    #[test]
    fn test_mixed_arguments() {
        let collector = Collector::default();
        let logger = logger_with(&collector);
        info!(logger, "user", json!({ "id": 7 }), true,);

        let entries = collector.0.lock();
        assert_eq!(entries[0].message, "user true ");
        assert_eq!(entries[0].fields["id"], 7);
    }
}
