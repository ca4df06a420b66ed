//! Main logger implementation
//!
//! The [`Logger`] is a dispatcher: a map from name to [`Filter`]. A log call
//! builds one record and hands a copy to every writer whose threshold it
//! meets. The logger does no background work itself; each writer enqueues
//! without blocking and persists on its own thread.

use super::{filter::Filter, log_level::LogLevel, log_record::LogRecord, writer::LogWriter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::thread;

pub struct Logger {
    filters: RwLock<HashMap<String, Filter>>,
}

impl Logger {
    /// A logger with no filters; every call is a no-op until one is added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(HashMap::new()),
        }
    }

    /// Register `writer` under `name`, receiving records at `threshold` or above.
    ///
    /// A writer already registered under the same name is closed.
    pub fn add_filter(&self, name: impl Into<String>, threshold: LogLevel, writer: Box<dyn LogWriter>) {
        let previous = self
            .filters
            .write()
            .insert(name.into(), Filter::new(threshold, writer));

        if let Some(previous) = previous {
            previous.writer().close();
        }
    }

    /// Close and unregister the writer under `name`.
    pub fn remove_filter(&self, name: &str) -> bool {
        let removed = self.filters.write().remove(name);
        match removed {
            Some(filter) => {
                filter.writer().close();
                true
            }
            None => false,
        }
    }

    pub fn filter_names(&self) -> Vec<String> {
        self.filters.read().keys().cloned().collect()
    }

    pub fn threshold(&self, name: &str) -> Option<LogLevel> {
        self.filters.read().get(name).map(Filter::threshold)
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }

    /// Lowest threshold over all filters, `None` without filters.
    pub fn min_level(&self) -> Option<LogLevel> {
        self.filters.read().values().map(Filter::threshold).min()
    }

    /// Whether a record at `level` would reach at least one writer.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.filters.read().values().any(|filter| filter.accepts(level))
    }

    /// Send a message with an explicit source.
    pub fn log(&self, level: LogLevel, source: impl Into<String>, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.dispatch(LogRecord::new(level, source, message));
    }

    /// Send a formatted message; the source is the caller location.
    ///
    /// This is what the `log!`, `info!`, ... macros expand to.
    #[track_caller]
    pub fn logf(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let message = match args.as_str() {
            Some(literal) => literal.to_string(),
            None => args.to_string(),
        };
        self.dispatch(LogRecord::new(level, caller_source(), message));
    }

    /// Send a lazily built message. `message` runs at most once, and only
    /// when some writer accepts `level`.
    #[track_caller]
    pub fn logc<F>(&self, level: LogLevel, message: F)
    where
        F: FnOnce() -> String,
    {
        if !self.enabled(level) {
            return;
        }
        self.dispatch(LogRecord::new(level, caller_source(), message()));
    }

    #[track_caller]
    fn log_here(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.dispatch(LogRecord::new(level, caller_source(), message));
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Warning, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Error, message);
    }

    fn dispatch(&self, record: LogRecord) {
        let filters = self.filters.read();
        for filter in filters.values() {
            if filter.accepts(record.level()) {
                filter.writer().write(record.clone());
            }
        }
    }

    /// Close every writer and clear the map.
    ///
    /// Writers are closed concurrently, so the wait is bounded by the slowest
    /// writer's close timeout rather than their sum. Returns `true` when every
    /// writer finished in time.
    pub fn close(&self) -> bool {
        let filters: Vec<Filter> = self.filters.write().drain().map(|(_, filter)| filter).collect();
        if filters.is_empty() {
            return true;
        }

        thread::scope(|scope| {
            let handles: Vec<_> = filters
                .iter()
                .map(|filter| scope.spawn(move || filter.writer().close()))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(false))
                .fold(true, |all, finished| all && finished)
        })
    }
}

#[track_caller]
fn caller_source() -> String {
    let location = Location::caller();
    format!("{}:{}", location.file(), location.line())
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.filters.read().iter()).finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if !self.close() {
            eprintln!("[LOGGER WARNING] Logger dropped before every writer finished. Some logs may be lost.");
        }
    }
}
