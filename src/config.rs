//! Building a [`Logger`] from configuration
//!
//! Configuration arrives as a plain [`LogOptions`] value, either deserialized
//! from JSON or assembled from INI-style `key = value` pairs. A single
//! resolver turns it into registered filters. Unknown writer names and
//! unknown levels are errors; nothing here exits the process.
//!
//! ```
//! use fanlog::{LogLevel, LogOptions, Logger};
//!
//! let options = LogOptions::from_key_values([
//!     ("type", "stdout"),
//!     ("stdout.enabled", "true"),
//!     ("stdout.level", "INFO"),
//! ])
//! .unwrap();
//!
//! let logger = Logger::from_options(&options).unwrap();
//! assert_eq!(logger.threshold("stdout"), Some(LogLevel::Info));
//! ```

use crate::core::error::{LoggerError, Result};
use crate::core::format::DEFAULT_FILE_FORMAT;
use crate::core::{LogLevel, LogWriter, Logger};
use crate::writers::{ConsoleWriter, RotatingFileWriter};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Multiplier used for `K`/`M`/`G` suffixes on line counts.
pub const LINE_UNIT: u64 = 1000;

/// Multiplier used for `K`/`M`/`G` suffixes on byte sizes.
pub const BYTE_UNIT: u64 = 1024;

/// Options for every writer type, plus the comma separated list of the
/// writer types to set up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogOptions {
    /// Writer types, e.g. `"stdout,file"`
    #[serde(rename = "type")]
    pub kinds: String,
    pub stdout: ConsoleOptions,
    pub file: FileOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleOptions {
    pub enabled: bool,
    /// Empty means `DEBUG`
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileOptions {
    pub enabled: bool,
    /// Empty means `DEBUG`
    pub level: String,
    /// Empty means `<executable dir>/../log/<executable name>`
    pub filename: String,
    /// Empty means [`DEFAULT_FILE_FORMAT`]
    pub format: String,
    #[serde(deserialize_with = "lines_quantity")]
    pub maxlines: u64,
    #[serde(deserialize_with = "bytes_quantity")]
    pub maxsize: u64,
    pub daily: bool,
    /// Keep numbered backups
    pub rotate: bool,
    /// Append `-YYYYMMDD.log` to the filename
    pub suffix: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            level: String::new(),
            filename: String::new(),
            format: String::new(),
            maxlines: 0,
            maxsize: 0,
            daily: true,
            rotate: true,
            suffix: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(u64),
    Text(String),
}

fn quantity<'de, D: Deserializer<'de>>(deserializer: D, unit: u64) -> std::result::Result<u64, D::Error> {
    match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Number(n) => Ok(n),
        RawQuantity::Text(text) => parse_quantity(&text, unit).map_err(serde::de::Error::custom),
    }
}

fn lines_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    quantity(deserializer, LINE_UNIT)
}

fn bytes_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    quantity(deserializer, BYTE_UNIT)
}

/// Parse a number with an optional `K`, `M` or `G` suffix (any case), each
/// step multiplying by `unit`. Blank input is 0.
///
/// ```
/// use fanlog::config::{parse_quantity, BYTE_UNIT};
///
/// assert_eq!(parse_quantity("10M", BYTE_UNIT).unwrap(), 10 * 1024 * 1024);
/// ```
pub fn parse_quantity(text: &str, unit: u64) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }

    let (digits, power) = match text.char_indices().last() {
        Some((idx, suffix)) if idx > 0 => match suffix.to_ascii_uppercase() {
            'K' => (&text[..idx], 1),
            'M' => (&text[..idx], 2),
            'G' => (&text[..idx], 3),
            _ => (text, 0),
        },
        _ => (text, 0),
    };

    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| unit.checked_pow(power).and_then(|m| n.checked_mul(m)))
        .ok_or_else(|| LoggerError::config("quantity", format!("cannot parse '{}'", text)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(LoggerError::config(
            key,
            format!("expected a boolean, found '{}'", other),
        )),
    }
}

/// Empty or blank means `DEBUG`; anything else must be an exact level name.
pub fn parse_level(text: &str) -> Result<LogLevel> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(LogLevel::Debug);
    }
    LogLevel::from_str(text).map_err(|_| LoggerError::InvalidLevel(text.to_string()))
}

impl LogOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Assemble options from the keys of an INI `[logtype]` style section:
    /// `type`, `stdout.level`, `stdout.enabled`, `file.level`, `file.enabled`,
    /// `file.filename`, `file.format`, `file.maxlines`, `file.maxsize`,
    /// `file.daily`, `file.rotate` and `file.suffix`. Other keys are ignored.
    pub fn from_key_values<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = LogOptions::default();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();
            match key {
                "type" => options.kinds = value.to_string(),
                "stdout.level" => options.stdout.level = value.to_string(),
                "stdout.enabled" => options.stdout.enabled = parse_bool(key, value)?,
                "file.level" => options.file.level = value.to_string(),
                "file.enabled" => options.file.enabled = parse_bool(key, value)?,
                "file.filename" => options.file.filename = value.to_string(),
                "file.format" => options.file.format = value.to_string(),
                "file.maxlines" => options.file.maxlines = parse_quantity(value, LINE_UNIT)?,
                "file.maxsize" => options.file.maxsize = parse_quantity(value, BYTE_UNIT)?,
                "file.daily" => options.file.daily = parse_bool(key, value)?,
                "file.rotate" => options.file.rotate = parse_bool(key, value)?,
                "file.suffix" => options.file.suffix = parse_bool(key, value)?,
                _ => {}
            }
        }
        Ok(options)
    }

    /// Validate every listed writer and return the enabled ones with their
    /// thresholds, in listing order.
    fn plan(&self) -> Result<Vec<(WriterKind, LogLevel)>> {
        let mut plan = Vec::new();
        for name in self.kinds.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let kind: WriterKind = name.parse()?;
            let (enabled, level) = match kind {
                WriterKind::Stdout => (self.stdout.enabled, parse_level(&self.stdout.level)?),
                WriterKind::File => (self.file.enabled, parse_level(&self.file.level)?),
            };
            if enabled {
                plan.push((kind, level));
            }
        }
        Ok(plan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterKind {
    Stdout,
    File,
}

impl WriterKind {
    fn name(&self) -> &'static str {
        match self {
            WriterKind::Stdout => "stdout",
            WriterKind::File => "file",
        }
    }

    fn build(&self, options: &LogOptions) -> Result<Box<dyn LogWriter>> {
        match self {
            WriterKind::Stdout => Ok(Box::new(ConsoleWriter::new()?)),
            WriterKind::File => Ok(Box::new(build_file_writer(&options.file)?)),
        }
    }
}

impl FromStr for WriterKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stdout" => Ok(WriterKind::Stdout),
            "file" => Ok(WriterKind::File),
            other => Err(LoggerError::UnknownWriter(other.to_string())),
        }
    }
}

/// `<parent of the executable's directory>/log/<executable name>`, with the
/// directory created.
pub fn default_log_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| {
        LoggerError::io_operation("locating executable", "cannot derive a default log path", e)
    })?;
    let name = exe
        .file_name()
        .ok_or_else(|| LoggerError::config("file", "executable path has no file name"))?;
    let base = exe
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));

    let dir = base.join("log");
    fs::create_dir_all(&dir).map_err(|e| {
        LoggerError::io_operation(
            "creating log directory",
            format!("Failed to create directory '{}'", dir.display()),
            e,
        )
    })?;
    Ok(dir.join(name))
}

fn build_file_writer(options: &FileOptions) -> Result<RotatingFileWriter> {
    let filename = options.filename.trim();
    let path = if filename.is_empty() {
        default_log_path()?
    } else {
        PathBuf::from(filename)
    };

    let format = match options.format.trim() {
        "" => DEFAULT_FILE_FORMAT,
        format => format,
    };

    RotatingFileWriter::builder(path)
        .format(format)
        .max_lines(options.maxlines)
        .max_bytes(options.maxsize)
        .daily(options.daily)
        .keep_backups(options.rotate)
        .date_suffix(options.suffix)
        .build()
}

impl Logger {
    /// A logger populated from `options`.
    pub fn from_options(options: &LogOptions) -> Result<Self> {
        let logger = Logger::new();
        logger.load_options(options)?;
        Ok(logger)
    }

    /// Replace every filter with the writers described by `options`.
    ///
    /// The whole writer list is validated before anything is closed, so an
    /// unknown writer or level leaves the current filters untouched. A writer
    /// that fails to build (e.g. the log file cannot be opened) is reported
    /// after the old filters are closed; the writers built before it stay
    /// registered.
    pub fn load_options(&self, options: &LogOptions) -> Result<()> {
        let plan = options.plan()?;
        self.close();

        for (kind, level) in plan {
            let writer = kind.build(options)?;
            self.add_filter(kind.name(), level, writer);
        }
        Ok(())
    }
}
