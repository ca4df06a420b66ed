//! Level threshold paired with a writer

use super::{log_level::LogLevel, writer::LogWriter};
use std::fmt;

/// A writer together with the lowest level it receives.
pub struct Filter {
    threshold: LogLevel,
    writer: Box<dyn LogWriter>,
}

impl Filter {
    pub fn new(threshold: LogLevel, writer: Box<dyn LogWriter>) -> Self {
        Self { threshold, writer }
    }

    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }

    #[inline]
    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub fn writer(&self) -> &dyn LogWriter {
        self.writer.as_ref()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("threshold", &self.threshold)
            .field("writer", &self.writer.name())
            .finish()
    }
}
