//! Stress tests for the writer queues
//!
//! These tests verify:
//! - A blocked sink makes producers drop records instead of waiting
//! - Concurrent producers neither deadlock nor lose records when there is room
//! - Closing is bounded and idempotent

use crossbeam_channel::{bounded, Receiver, Sender};
use fanlog::writers::{ConsoleWriter, RotatingFileWriter};
use fanlog::{LogLevel, LogRecord, LogWriter, Logger};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Sink that stalls on its first write until the gate is dropped.
struct GatedSink {
    entered: Option<Sender<()>>,
    gate: Receiver<()>,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for GatedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(entered) = self.entered.take() {
            let _ = entered.send(());
            let _ = self.gate.recv();
        }
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_blocked_sink_drops_beyond_capacity() {
    const CAPACITY: usize = 8;
    const EXTRA: usize = 25;

    let (entered_tx, entered_rx) = bounded(1);
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let buffer = Arc::new(Mutex::new(Vec::new()));

    let writer = ConsoleWriter::builder()
        .queue_capacity(CAPACITY)
        .output(GatedSink {
            entered: Some(entered_tx),
            gate: gate_rx,
            buffer: Arc::clone(&buffer),
        })
        .build()
        .expect("Failed to create writer");

    // The worker takes the plug off the queue and stalls writing it.
    writer.write(LogRecord::new(LogLevel::Info, "stress", "plug"));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Worker never started writing");

    let start = Instant::now();
    for i in 0..CAPACITY + EXTRA {
        writer.write(LogRecord::new(LogLevel::Info, "stress", format!("flood {}", i)));
    }
    assert!(start.elapsed() < Duration::from_secs(1), "Producer was blocked");

    assert_eq!(writer.metrics().enqueued(), (CAPACITY + 1) as u64);
    assert_eq!(writer.metrics().dropped(), EXTRA as u64);

    drop(gate_tx);
    assert!(writer.close());

    let output = String::from_utf8(buffer.lock().clone()).expect("Output is not UTF-8");
    assert_eq!(output.lines().count(), CAPACITY + 1);
    assert!(output.contains("plug"));
    assert!(output.contains(&format!("flood {}", CAPACITY - 1)));
    assert!(!output.contains(&format!("flood {}", CAPACITY)));
}

#[test]
fn test_stuck_sink_close_is_bounded() {
    let (entered_tx, entered_rx) = bounded(1);
    let (gate_tx, gate_rx) = bounded::<()>(0);

    let writer = ConsoleWriter::builder()
        .close_timeout(Duration::from_millis(100))
        .output(GatedSink {
            entered: Some(entered_tx),
            gate: gate_rx,
            buffer: Arc::new(Mutex::new(Vec::new())),
        })
        .build()
        .expect("Failed to create writer");

    writer.write(LogRecord::new(LogLevel::Info, "stress", "stuck"));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Worker never started writing");

    let start = Instant::now();
    assert!(!writer.close());
    assert!(start.elapsed() < Duration::from_secs(2));

    drop(gate_tx);
}

#[test]
fn test_concurrent_producers() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("concurrent.log");

    let logger = Arc::new(Logger::new());
    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .queue_capacity(THREADS * PER_THREAD)
        .build()
        .expect("Failed to create writer");
    logger.add_filter("file", LogLevel::Trace, Box::new(writer));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("thread {} message {}", t, i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Producer panicked");
    }
    assert!(logger.close());

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), THREADS * PER_THREAD);

    // Per-producer order is preserved.
    for t in 0..THREADS {
        let prefix = format!("thread {} message ", t);
        let sequence: Vec<usize> = content
            .lines()
            .filter_map(|line| line.strip_prefix(&prefix))
            .map(|n| n.parse().expect("Bad message number"))
            .collect();
        assert_eq!(sequence, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn test_logging_while_closing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("closing.log");

    let logger = Arc::new(Logger::new());
    let writer = RotatingFileWriter::new(&log_file).expect("Failed to create writer");
    logger.add_filter("file", LogLevel::Trace, Box::new(writer));

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..5_000 {
                logger.debug(format!("message {}", i));
            }
        })
    };

    thread::sleep(Duration::from_millis(5));
    assert!(logger.close());
    producer.join().expect("Producer panicked");

    assert!(logger.is_empty());
    assert!(logger.close());
}

#[test]
fn test_close_twice_and_write_after_close() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("twice.log");

    let writer = RotatingFileWriter::new(&log_file).expect("Failed to create writer");
    writer.write(LogRecord::new(LogLevel::Info, "stress", "before"));

    assert!(writer.close());
    assert!(writer.close());

    writer.write(LogRecord::new(LogLevel::Info, "stress", "after"));
    assert_eq!(writer.metrics().dropped(), 1);

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("before"));
    assert!(!content.contains("after"));
}
