//! Rotating file writer
//!
//! A file writer with its own bounded queue and background thread. The
//! thread is the only owner of the open file, so writing and rotating are
//! strictly serialized without locks.
//!
//! Rotation happens when
//!
//! - the open file reached `max_lines` lines or `max_bytes` bytes,
//! - daily rotation is on and a record arrives from a later calendar day,
//! - or a caller asks for it with [`RotatingFileWriter::rotate`].
//!
//! Each rotation writes the trailer and closes the current file, optionally
//! moves it aside to the lowest free `<path>.NNN` backup name, then reopens
//! the target in append mode and writes the header.

use crate::core::error::{LoggerError, Result};
use crate::core::format::{PatternFormatter, DEFAULT_FILE_FORMAT};
use crate::core::worker::{Worker, DEFAULT_CLOSE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
use crate::core::{LogRecord, LogWriter, WriterMetrics};
use chrono::{DateTime, Local, NaiveDate};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::RwLock;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Highest numbered backup suffix probed before giving up.
pub const MAX_BACKUP_INDEX: u32 = 999;

/// What caused a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// First open, performed while building the writer
    Open,
    /// Line or byte limit reached
    Limit,
    /// Record from a later calendar day
    Day,
    /// Explicit [`RotatingFileWriter::rotate`] call
    Request,
}

/// Path of the `index`-th backup of `path`: `<path>.NNN`.
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{:03}", index));
    PathBuf::from(name)
}

/// Path of the date-suffixed log file for `day`: `<prefix>-YYYYMMDD.log`.
pub fn dated_path(prefix: &Path, day: NaiveDate) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!("-{}.log", day.format("%Y%m%d")));
    PathBuf::from(name)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Rotation state. Lives on the caller thread for the initial open, then
/// moves into the worker thread for good.
struct FileState {
    path: PathBuf,
    current_path: Arc<RwLock<PathBuf>>,
    writer: Option<BufWriter<File>>,
    formatter: PatternFormatter,
    header: PatternFormatter,
    trailer: PatternFormatter,
    max_lines: u64,
    current_lines: u64,
    max_bytes: u64,
    current_bytes: u64,
    daily: bool,
    last_opened_day: Option<NaiveDate>,
    keep_backups: bool,
    date_suffix: bool,
    metrics: Arc<WriterMetrics>,
}

impl FileState {
    fn display_path(&self) -> String {
        self.current_path.read().display().to_string()
    }

    fn target_path(&self, day: NaiveDate) -> PathBuf {
        if self.date_suffix {
            dated_path(&self.path, day)
        } else {
            self.path.clone()
        }
    }

    /// Write the trailer, flush and drop the open file, if any.
    fn close_file(&mut self, now: DateTime<Local>) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        let trailer = self.trailer.format(&LogRecord::blank(now));
        if !trailer.is_empty() {
            writer.write_all(trailer.as_bytes()).map_err(|e| {
                LoggerError::io_operation(
                    "writing log trailer",
                    format!("cannot write trailer to '{}'", self.display_path()),
                    e,
                )
            })?;
        }
        writer.flush().map_err(|e| {
            LoggerError::io_operation(
                "flushing log file",
                format!("cannot flush '{}'", self.display_path()),
                e,
            )
        })
        // Dropping `writer` closes the file before any rename below.
    }

    /// Move `target` to the lowest unused `<target>.NNN`.
    fn move_to_backup(&self, target: &Path) -> Result<PathBuf> {
        let slot = (1..=MAX_BACKUP_INDEX)
            .map(|index| backup_path(target, index))
            .find(|candidate| !exists(candidate))
            .ok_or_else(|| LoggerError::no_free_slot(target.display().to_string()))?;

        fs::rename(target, &slot).map_err(|e| {
            LoggerError::file_rotation(
                target.display().to_string(),
                format!("Failed to rename to '{}': {}", slot.display(), e),
            )
        })?;
        Ok(slot)
    }

    fn rotate(&mut self, now: DateTime<Local>, trigger: Trigger) -> Result<()> {
        self.close_file(now)?;

        // The file's day never moves backwards, whatever the trigger.
        let today = match self.last_opened_day {
            Some(opened) if opened > now.date_naive() => opened,
            _ => now.date_naive(),
        };
        let target = self.target_path(today);
        let day_changed = self.daily && self.last_opened_day != Some(today);

        if self.keep_backups && (trigger == Trigger::Limit || day_changed) && exists(&target) {
            self.move_to_backup(&target)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", target.display()),
                    e,
                )
            })?;
        let mut writer = BufWriter::new(file);

        let header = self.header.format(&LogRecord::blank(now));
        if !header.is_empty() {
            writer.write_all(header.as_bytes()).map_err(|e| {
                LoggerError::io_operation(
                    "writing log header",
                    format!("cannot write header to '{}'", target.display()),
                    e,
                )
            })?;
        }

        self.writer = Some(writer);
        self.current_lines = 0;
        self.current_bytes = 0;
        self.last_opened_day = Some(today);
        *self.current_path.write() = target;

        if trigger != Trigger::Open {
            self.metrics.record_rotation();
        }
        Ok(())
    }

    /// Which rotation, if any, must happen before `record` is written.
    fn pending_trigger(&self, record: &LogRecord) -> Option<Trigger> {
        let lines_exceeded = self.max_lines > 0 && self.current_lines >= self.max_lines;
        let bytes_exceeded = self.max_bytes > 0 && self.current_bytes >= self.max_bytes;
        if lines_exceeded || bytes_exceeded {
            return Some(Trigger::Limit);
        }

        // Only a later day counts; producers racing across midnight must not
        // bounce the file back and forth.
        let day = record.created().date_naive();
        match self.last_opened_day {
            Some(opened) if self.daily && day > opened => Some(Trigger::Day),
            _ => None,
        }
    }

    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        if let Some(trigger) = self.pending_trigger(record) {
            self.rotate(record.created(), trigger)?;
        }

        let line = self.formatter.format(record);
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer_closed("file"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::io_operation(
                "writing log record",
                format!("cannot write to '{}'", self.current_path.read().display()),
                e,
            )
        })?;

        self.current_lines += 1;
        self.current_bytes += line.len() as u64;
        self.metrics.record_written();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation(
                    "flushing log file",
                    format!("cannot flush '{}'", self.current_path.read().display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn serve(&mut self, records: &Receiver<LogRecord>, requests: &Receiver<()>) -> Result<()> {
        loop {
            select! {
                recv(requests) -> request => match request {
                    Ok(()) => self.rotate(Local::now(), Trigger::Request)?,
                    Err(_) => {
                        for record in records.iter() {
                            self.write_record(&record)?;
                        }
                        return Ok(());
                    }
                },
                recv(records) -> record => match record {
                    Ok(record) => {
                        self.write_record(&record)?;
                        if records.is_empty() {
                            self.flush()?;
                        }
                    }
                    Err(_) => return Ok(()),
                },
            }
        }
    }

    fn run(mut self, records: Receiver<LogRecord>, requests: Receiver<()>) {
        if let Err(e) = self.serve(&records, &requests) {
            eprintln!(
                "[LOGGER ERROR] RotatingFileWriter('{}'): {}",
                self.display_path(),
                e
            );
        }
        if let Err(e) = self.close_file(Local::now()) {
            eprintln!(
                "[LOGGER ERROR] RotatingFileWriter('{}'): {}",
                self.display_path(),
                e
            );
        }
    }
}

/// File writer with line, size and daily rotation.
///
/// # Example
///
/// ```no_run
/// use fanlog::{LogLevel, LogRecord, LogWriter, RotatingFileWriter};
///
/// let writer = RotatingFileWriter::builder("/var/log/app.log")
///     .max_lines(100_000)
///     .max_bytes(64 * 1024 * 1024)
///     .header("--- opened %D %T ---")
///     .build()
///     .unwrap();
///
/// writer.write(LogRecord::new(LogLevel::Info, "main.rs:12", "ready"));
/// writer.close();
/// ```
pub struct RotatingFileWriter {
    worker: Worker<LogRecord>,
    requests: Sender<()>,
    path: PathBuf,
    current_path: Arc<RwLock<PathBuf>>,
}

impl RotatingFileWriter {
    /// Writer with default settings for `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder(path).build()
    }

    #[must_use]
    pub fn builder<P: AsRef<Path>>(path: P) -> FileWriterBuilder {
        FileWriterBuilder::new(path)
    }

    /// Ask the worker to rotate now. Blocks until the worker has taken the
    /// request, not until the rotation finished.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::WriterClosed`] when the worker is gone
    pub fn rotate(&self) -> Result<()> {
        self.requests
            .send(())
            .map_err(|_| LoggerError::writer_closed(self.path.display().to_string()))
    }

    /// The configured path (the prefix when date suffixing is on).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the file currently open.
    pub fn current_path(&self) -> PathBuf {
        self.current_path.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }
}

impl LogWriter for RotatingFileWriter {
    fn write(&self, record: LogRecord) {
        self.worker.try_send(record);
    }

    fn close(&self) -> bool {
        self.worker.close()
    }

    fn name(&self) -> &str {
        "file"
    }

    fn metrics(&self) -> &WriterMetrics {
        self.worker.metrics()
    }
}

/// Builder for [`RotatingFileWriter`]
#[derive(Debug, Clone)]
pub struct FileWriterBuilder {
    path: PathBuf,
    format: String,
    header: String,
    trailer: String,
    max_lines: u64,
    max_bytes: u64,
    daily: bool,
    keep_backups: bool,
    date_suffix: bool,
    queue_capacity: usize,
    close_timeout: Duration,
}

impl FileWriterBuilder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format: DEFAULT_FILE_FORMAT.to_string(),
            header: String::new(),
            trailer: String::new(),
            max_lines: 0,
            max_bytes: 0,
            daily: true,
            keep_backups: true,
            date_suffix: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    /// Record pattern, see [`crate::core::format`].
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Pattern written at the top of every opened file.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Pattern written before a file is closed.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn trailer(mut self, trailer: impl Into<String>) -> Self {
        self.trailer = trailer.into();
        self
    }

    /// Rotate after this many records; 0 disables.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn max_lines(mut self, max_lines: u64) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Rotate after this many bytes of records; 0 disables.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn daily(mut self, daily: bool) -> Self {
        self.daily = daily;
        self
    }

    /// Keep old files as numbered backups instead of appending to them.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn keep_backups(mut self, keep_backups: bool) -> Self {
        self.keep_backups = keep_backups;
        self
    }

    /// Append `-YYYYMMDD.log` to the path of every opened file.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn date_suffix(mut self, date_suffix: bool) -> Self {
        self.date_suffix = date_suffix;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Open the first file and start the worker.
    ///
    /// # Errors
    ///
    /// Returns error if the path is empty, the directory cannot be created or
    /// the file cannot be opened
    pub fn build(self) -> Result<RotatingFileWriter> {
        if self.path.as_os_str().is_empty() {
            return Err(LoggerError::config("file", "log file path is empty"));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "creating log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let metrics = Arc::new(WriterMetrics::new());
        let current_path = Arc::new(RwLock::new(self.path.clone()));
        let mut state = FileState {
            path: self.path.clone(),
            current_path: Arc::clone(&current_path),
            writer: None,
            formatter: PatternFormatter::new(self.format),
            header: PatternFormatter::new(self.header),
            trailer: PatternFormatter::new(self.trailer),
            max_lines: self.max_lines,
            current_lines: 0,
            max_bytes: self.max_bytes,
            current_bytes: 0,
            daily: self.daily,
            last_opened_day: None,
            keep_backups: self.keep_backups,
            date_suffix: self.date_suffix,
            metrics: Arc::clone(&metrics),
        };
        state.rotate(Local::now(), Trigger::Open)?;

        let (requests, request_rx) = bounded(0);
        let worker = Worker::spawn(
            "file",
            self.queue_capacity,
            self.close_timeout,
            metrics,
            move |records| state.run(records, request_rx),
        )?;

        Ok(RotatingFileWriter {
            worker,
            requests,
            path: self.path,
            current_path,
        })
    }
}
