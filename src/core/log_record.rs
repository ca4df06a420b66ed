//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local};

/// A single log event as handed to writers.
///
/// Records are immutable once built; the dispatcher clones one per accepting
/// writer so every queue owns its copy.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    level: LogLevel,
    source: String,
    message: String,
    created: DateTime<Local>,
}

impl LogRecord {
    pub fn new(level: LogLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            created: Local::now(),
        }
    }

    /// Replace the creation timestamp.
    #[must_use]
    pub fn with_created(mut self, created: DateTime<Local>) -> Self {
        self.created = created;
        self
    }

    /// A record carrying only a timestamp, used to render file headers and trailers.
    pub(crate) fn blank(created: DateTime<Local>) -> Self {
        Self {
            level: LogLevel::default(),
            source: String::new(),
            message: String::new(),
            created,
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn created(&self) -> DateTime<Local> {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_record() {
        let before = Local::now();
        let record = LogRecord::new(LogLevel::Info, "main.rs:10", "started");
        assert_eq!(record.level(), LogLevel::Info);
        assert_eq!(record.source(), "main.rs:10");
        assert_eq!(record.message(), "started");
        assert!(record.created() >= before);
    }

    #[test]
    fn test_with_created() {
        let ts = Local
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .expect("valid datetime");
        let record = LogRecord::new(LogLevel::Error, "src", "boom").with_created(ts);
        assert_eq!(record.created(), ts);
    }
}
