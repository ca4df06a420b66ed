//! Record formatting
//!
//! Two layouts are supported:
//!
//! - pattern formatting for file output, driven by `%` placeholders
//! - the fixed console layout `[HH:MM:SS.mmm] [LEVEL] [source] message`
//!
//! Both cache their second-granularity date/time strings and only rebuild
//! them when the record timestamp moves to another second.
//!
//! | Placeholder | Output |
//! |-------------|--------|
//! | `%T` | time, `HH:MM:SS` |
//! | `%t` | short time, `HH:MM` |
//! | `%D` | date, `YYYY/MM/DD` |
//! | `%d` | short date, `DD/MM/YY` |
//! | `%L` | level name |
//! | `%S` | full source |
//! | `%s` | source after its last `/` |
//! | `%M` | message |
//! | `%%` | a literal `%` |

use super::log_record::LogRecord;
use chrono::{DateTime, Local, Timelike};

/// Default pattern used by file writers.
pub const DEFAULT_FILE_FORMAT: &str = "[%D %T] [%L] (%S) %M";

/// Longest source tail shown by the console layout.
pub const CONSOLE_SOURCE_WIDTH: usize = 46;

#[derive(Debug, Clone)]
struct DateParts {
    second: i64,
    long_time: String,
    short_time: String,
    long_date: String,
    short_date: String,
}

impl DateParts {
    fn empty() -> Self {
        Self {
            second: i64::MIN,
            long_time: String::new(),
            short_time: String::new(),
            long_date: String::new(),
            short_date: String::new(),
        }
    }

    fn refresh(&mut self, created: &DateTime<Local>) {
        let second = created.timestamp();
        if second == self.second {
            return;
        }
        self.second = second;
        self.long_time = created.format("%H:%M:%S").to_string();
        self.short_time = created.format("%H:%M").to_string();
        self.long_date = created.format("%Y/%m/%d").to_string();
        self.short_date = created.format("%d/%m/%y").to_string();
    }
}

/// Renders records through a `%` pattern.
///
/// # Example
///
/// ```
/// use fanlog::{LogLevel, LogRecord, PatternFormatter};
///
/// let mut formatter = PatternFormatter::new("%L %M");
/// let line = formatter.format(&LogRecord::new(LogLevel::Info, "main.rs:3", "ready"));
/// assert_eq!(line, "INFO ready\n");
/// ```
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    parts: DateParts,
}

impl PatternFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            parts: DateParts::empty(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format `record`, terminated by a single newline.
    ///
    /// An empty pattern yields an empty string.
    pub fn format(&mut self, record: &LogRecord) -> String {
        if self.pattern.is_empty() {
            return String::new();
        }
        self.parts.refresh(&record.created());
        let parts = &self.parts;

        let mut out = String::with_capacity(self.pattern.len() + record.message().len() + 32);
        let mut chars = self.pattern.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('T') => out.push_str(&parts.long_time),
                Some('t') => out.push_str(&parts.short_time),
                Some('D') => out.push_str(&parts.long_date),
                Some('d') => out.push_str(&parts.short_date),
                Some('L') => out.push_str(record.level().to_str()),
                Some('S') => out.push_str(record.source()),
                Some('s') => out.push_str(short_source(record.source())),
                Some('M') => out.push_str(record.message()),
                Some('%') => out.push('%'),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }
        out.push('\n');
        out
    }
}

/// Format a single record with a throwaway [`PatternFormatter`].
pub fn format_record(pattern: &str, record: &LogRecord) -> String {
    PatternFormatter::new(pattern).format(record)
}

fn short_source(source: &str) -> &str {
    source.rsplit('/').next().unwrap_or(source)
}

/// Keep the last `width` characters of `source`, marking the cut with `..`.
pub(crate) fn truncate_source(source: &str, width: usize) -> std::borrow::Cow<'_, str> {
    let len = source.chars().count();
    if len <= width {
        return std::borrow::Cow::Borrowed(source);
    }
    let cut = source
        .char_indices()
        .nth(len - width)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    std::borrow::Cow::Owned(format!("..{}", &source[cut..]))
}

/// Fixed console layout: `[HH:MM:SS.mmm] [LEVEL] [source] message`.
#[derive(Debug, Clone)]
pub struct ConsoleFormatter {
    second: i64,
    time: String,
    use_colors: bool,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self {
            second: i64::MIN,
            time: String::new(),
            use_colors,
        }
    }

    pub fn format(&mut self, record: &LogRecord) -> String {
        let created = record.created();
        let second = created.timestamp();
        if second != self.second {
            self.second = second;
            self.time = created.format("%H:%M:%S").to_string();
        }
        let millis = created.nanosecond() % 1_000_000_000 / 1_000_000;

        format!(
            "[{}.{:03}] [{}] [{}] {}\n",
            self.time,
            millis,
            self.level_tag(record),
            truncate_source(record.source(), CONSOLE_SOURCE_WIDTH),
            record.message()
        )
    }

    #[cfg(feature = "console")]
    fn level_tag(&self, record: &LogRecord) -> String {
        use colored::Colorize;
        if self.use_colors {
            record
                .level()
                .to_str()
                .color(record.level().color())
                .to_string()
        } else {
            record.level().to_str().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_tag(&self, record: &LogRecord) -> String {
        record.level().to_str().to_string()
    }
}

impl Default for ConsoleFormatter {
    fn default() -> Self {
        Self::new(false)
    }
}
