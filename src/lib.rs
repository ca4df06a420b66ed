//! # fanlog
//!
//! A leveled logger that fans every record out to named writers, each with
//! its own threshold, queue and background thread.
//!
//! ## Features
//!
//! - **Non-blocking**: a log call never waits on I/O; a full queue drops the record
//! - **Console and rotating file writers**: rotation by line count, byte size and day
//! - **Configurable**: build a logger from JSON or INI-style key/value pairs
//! - **Bounded shutdown**: closing waits at most a fixed timeout per writer
//!
//! ```no_run
//! use fanlog::{info, LogLevel, Logger, RotatingFileWriter};
//!
//! let logger = Logger::new();
//! let file = RotatingFileWriter::builder("app.log")
//!     .max_bytes(10 * 1024 * 1024)
//!     .build()?;
//! logger.add_filter("file", LogLevel::Info, Box::new(file));
//!
//! info!(logger, "listening on {}", 8080);
//! logger.close();
//! # Ok::<(), fanlog::LoggerError>(())
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::config::LogOptions;
    pub use crate::core::{LogLevel, LogRecord, LogWriter, Logger, LoggerError, Result};
    pub use crate::writers::{ConsoleWriter, RotatingFileWriter};
}

pub use config::{ConsoleOptions, FileOptions, LogOptions};
pub use core::{
    format_record, ConsoleFormatter, Filter, LogLevel, LogRecord, LogWriter, Logger, LoggerError,
    PatternFormatter, Result, WriterMetrics, DEFAULT_CLOSE_TIMEOUT, DEFAULT_FILE_FORMAT,
    DEFAULT_QUEUE_CAPACITY,
};
pub use writers::{ConsoleWriter, ConsoleWriterBuilder, FileWriterBuilder, RotatingFileWriter};
