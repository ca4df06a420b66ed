//! Console writer implementation

use crate::core::format::ConsoleFormatter;
use crate::core::worker::{Worker, DEFAULT_CLOSE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
use crate::core::{LogRecord, LogWriter, Result, WriterMetrics};
use crossbeam_channel::Receiver;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

/// Writes `[HH:MM:SS.mmm] [LEVEL] [source] message` lines to standard output
/// (or any other byte sink) from a background thread.
///
/// # Example
///
/// ```
/// use fanlog::{ConsoleWriter, LogLevel, LogRecord, LogWriter};
///
/// let console = ConsoleWriter::new().unwrap();
/// console.write(LogRecord::new(LogLevel::Info, "main.rs:5", "hello"));
/// console.close();
/// ```
pub struct ConsoleWriter {
    worker: Worker<LogRecord>,
}

impl ConsoleWriter {
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ConsoleWriterBuilder {
        ConsoleWriterBuilder::new()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    fn run(
        records: Receiver<LogRecord>,
        mut output: Box<dyn Write + Send>,
        mut formatter: ConsoleFormatter,
        metrics: Arc<WriterMetrics>,
    ) {
        for record in records.iter() {
            let line = formatter.format(&record);
            if let Err(e) = output.write_all(line.as_bytes()) {
                eprintln!("[LOGGER ERROR] ConsoleWriter: {}", e);
                return;
            }
            metrics.record_written();

            if records.is_empty() {
                if let Err(e) = output.flush() {
                    eprintln!("[LOGGER ERROR] ConsoleWriter flush failed: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = output.flush() {
            eprintln!("[LOGGER ERROR] ConsoleWriter flush failed: {}", e);
        }
    }
}

impl LogWriter for ConsoleWriter {
    fn write(&self, record: LogRecord) {
        self.worker.try_send(record);
    }

    fn close(&self) -> bool {
        self.worker.close()
    }

    fn name(&self) -> &str {
        "stdout"
    }

    fn metrics(&self) -> &WriterMetrics {
        self.worker.metrics()
    }
}

/// Builder for [`ConsoleWriter`]
pub struct ConsoleWriterBuilder {
    use_colors: bool,
    queue_capacity: usize,
    close_timeout: Duration,
    output: Option<Box<dyn Write + Send>>,
}

impl ConsoleWriterBuilder {
    pub fn new() -> Self {
        Self {
            use_colors: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            output: None,
        }
    }

    /// Colour the level tag (only with the `console` feature).
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Send output somewhere other than standard output.
    #[must_use = "builder methods return a new value"]
    pub fn output<W: Write + Send + 'static>(mut self, output: W) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn build(self) -> Result<ConsoleWriter> {
        let output = self
            .output
            .unwrap_or_else(|| Box::new(BufWriter::new(io::stdout())));
        let formatter = ConsoleFormatter::new(self.use_colors);
        let metrics = Arc::new(WriterMetrics::new());
        let worker_metrics = Arc::clone(&metrics);

        let worker = Worker::spawn(
            "console",
            self.queue_capacity,
            self.close_timeout,
            metrics,
            move |records| ConsoleWriter::run(records, output, formatter, worker_metrics),
        )?;

        Ok(ConsoleWriter { worker })
    }
}

impl Default for ConsoleWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lines_in_fifo_order() {
        let buffer = SharedBuffer::default();
        let console = ConsoleWriter::builder()
            .output(buffer.clone())
            .build()
            .unwrap();

        for i in 0..10 {
            console.write(LogRecord::new(LogLevel::Info, "main.rs:1", format!("line {}", i)));
        }
        assert!(console.close());

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 10);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.ends_with(&format!("[INFO] [main.rs:1] line {}", i)), "{}", line);
        }
        assert_eq!(console.metrics().written(), 10);
    }

    #[test]
    fn test_write_error_stops_worker() {
        let console = ConsoleWriter::builder().output(BrokenPipe).build().unwrap();
        console.write(LogRecord::new(LogLevel::Error, "main.rs:1", "lost"));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while console.is_running() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!console.is_running());
        assert!(console.close());
    }

    #[test]
    fn test_close_twice_is_safe() {
        let console = ConsoleWriter::builder()
            .output(SharedBuffer::default())
            .build()
            .unwrap();
        assert!(console.close());
        assert!(console.close());
        console.write(LogRecord::new(LogLevel::Info, "main.rs:1", "after close"));
        assert_eq!(console.metrics().dropped(), 1);
    }
}
