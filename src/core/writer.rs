//! Writer trait for log output destinations

use super::{log_record::LogRecord, metrics::WriterMetrics};

/// An asynchronous log sink.
///
/// Implementations own a bounded queue and a single background worker.
pub trait LogWriter: Send + Sync {
    /// Enqueue `record` for persistence. Never blocks: when the queue is full
    /// (or the writer is closed) the record is dropped.
    fn write(&self, record: LogRecord);

    /// Stop accepting records, flush pending output and release resources.
    ///
    /// Waits for the worker for a bounded time only. Returns `true` when the
    /// worker finished in time. Calling it again is harmless.
    fn close(&self) -> bool;

    fn name(&self) -> &str;

    fn metrics(&self) -> &WriterMetrics;
}
