//! Injected logging interface.
//!
//! Pipeline components never configure or reach for a process-wide logger.
//! They hold an `Arc<dyn Logger>` handed to them at construction time and
//! log through the `log_*!` macros. The binary wires in [`TracingLogger`];
//! tests use [`MemoryLogger`] to assert on what was reported, or
//! [`NoOpLogger`] to stay quiet.
//!
//! ```
//! use hips_common::log::{Logger, NoOpLogger};
//! use hips_common::log_info;
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_info!(logger, "processing {} maps", 3);
//! ```

mod adapters;

pub use adapters::{MemoryLogger, NoOpLogger, TracingLogger};

use std::fmt::Arguments;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Logging sink shared by the pipeline components.
pub trait Logger: Send + Sync {
    /// Record one message. All convenience methods funnel through here.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_macros_route_to_level() {
        let logger = MemoryLogger::new();
        log_debug!(logger, "d {}", 1);
        log_warn!(logger, "w {}", 2);
        log_error!(logger, "e");

        let records = logger.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], (LogLevel::Debug, "d 1".to_string()));
        assert_eq!(records[1], (LogLevel::Warn, "w 2".to_string()));
        assert_eq!(records[2].0, LogLevel::Error);
    }
}
