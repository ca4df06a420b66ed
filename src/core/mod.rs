//! Core logger types and traits

pub mod error;
pub mod filter;
pub mod format;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod worker;
pub mod writer;

pub use error::{LoggerError, Result};
pub use filter::Filter;
pub use format::{format_record, ConsoleFormatter, PatternFormatter, DEFAULT_FILE_FORMAT};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::Logger;
pub use metrics::WriterMetrics;
pub use worker::{DEFAULT_CLOSE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
pub use writer::LogWriter;
