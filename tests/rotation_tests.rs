//! Rotation tests for the file writer
//!
//! These tests verify:
//! - Line limits move full files to numbered backups
//! - A later calendar day rotates exactly once
//! - Existing backups are never overwritten
//! - Explicit rotation on the same day reopens without a backup

use chrono::{Duration as ChronoDuration, Local};
use fanlog::writers::{backup_path, RotatingFileWriter};
use fanlog::{LogLevel, LogRecord, LogWriter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(str::to_string)
        .collect()
}

fn record(message: &str) -> LogRecord {
    LogRecord::new(LogLevel::Info, "rotation_tests.rs", message)
}

#[test]
fn test_line_limit_rotation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("lines.log");

    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .max_lines(3)
        .daily(false)
        .build()
        .expect("Failed to create writer");

    for i in 1..=7 {
        writer.write(record(&format!("line {}", i)));
    }
    assert!(writer.close());

    assert_eq!(
        read_lines(&backup_path(&log_file, 1)),
        vec!["line 1", "line 2", "line 3"]
    );
    assert_eq!(
        read_lines(&backup_path(&log_file, 2)),
        vec!["line 4", "line 5", "line 6"]
    );
    assert_eq!(read_lines(&log_file), vec!["line 7"]);
    assert!(!backup_path(&log_file, 3).exists());
    assert_eq!(writer.metrics().rotations(), 2);
}

#[test]
fn test_size_limit_rotation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("bytes.log");

    // Each line is "12345\n", six bytes
    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .max_bytes(10)
        .daily(false)
        .build()
        .expect("Failed to create writer");

    for _ in 0..3 {
        writer.write(record("12345"));
    }
    assert!(writer.close());

    assert_eq!(read_lines(&backup_path(&log_file, 1)), vec!["12345", "12345"]);
    assert_eq!(read_lines(&log_file), vec!["12345"]);
}

#[test]
fn test_day_change_rotates_once() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("daily.log");

    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .build()
        .expect("Failed to create writer");

    let today = Local::now();
    let tomorrow = today + ChronoDuration::days(1);

    writer.write(record("today").with_created(today));
    writer.write(record("tomorrow 1").with_created(tomorrow));
    writer.write(record("tomorrow 2").with_created(tomorrow));
    // A late record from the previous day must not rotate back.
    writer.write(record("late").with_created(today));
    assert!(writer.close());

    assert_eq!(read_lines(&backup_path(&log_file, 1)), vec!["today"]);
    assert_eq!(read_lines(&log_file), vec!["tomorrow 1", "tomorrow 2", "late"]);
    assert!(!backup_path(&log_file, 2).exists());
    assert_eq!(writer.metrics().rotations(), 1);
}

#[test]
fn test_existing_backups_are_kept() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("busy.log");

    fs::write(&log_file, "previous run\n").expect("Failed to seed log file");
    for index in 1..=5 {
        fs::write(backup_path(&log_file, index), format!("backup {}\n", index))
            .expect("Failed to seed backup");
    }

    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .build()
        .expect("Failed to create writer");
    writer.write(record("fresh"));
    assert!(writer.close());

    assert_eq!(read_lines(&backup_path(&log_file, 6)), vec!["previous run"]);
    for index in 1..=5 {
        assert_eq!(
            read_lines(&backup_path(&log_file, index)),
            vec![format!("backup {}", index)]
        );
    }
    assert_eq!(read_lines(&log_file), vec!["fresh"]);
}

#[test]
fn test_without_backups_the_file_is_appended() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("append.log");
    fs::write(&log_file, "previous run\n").expect("Failed to seed log file");

    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .keep_backups(false)
        .build()
        .expect("Failed to create writer");
    writer.write(record("this run"));
    assert!(writer.close());

    assert_eq!(read_lines(&log_file), vec!["previous run", "this run"]);
    assert!(!backup_path(&log_file, 1).exists());
}

#[test]
fn test_same_day_rotate_reopens_without_backup() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("reopen.log");

    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .header("BEGIN")
        .trailer("END")
        .build()
        .expect("Failed to create writer");

    writer.rotate().expect("Failed to request rotation");
    assert!(writer.close());

    assert_eq!(read_lines(&log_file), vec!["BEGIN", "END", "BEGIN", "END"]);
    assert!(!backup_path(&log_file, 1).exists());
    assert_eq!(writer.metrics().rotations(), 1);
    assert!(writer.rotate().is_err());
}

#[test]
fn test_date_suffix_names_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let prefix = temp_dir.path().join("service");

    let writer = RotatingFileWriter::builder(&prefix)
        .format("%M")
        .date_suffix(true)
        .build()
        .expect("Failed to create writer");

    let current = writer.current_path();
    let name = current
        .file_name()
        .expect("Dated path has a file name")
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with("service-"));
    assert!(name.ends_with(".log"));
    assert_eq!(name.len(), "service-YYYYMMDD.log".len());
    assert_eq!(writer.path(), prefix.as_path());

    writer.write(record("dated"));
    assert!(writer.close());
    assert_eq!(read_lines(&current), vec!["dated"]);
}

#[test]
fn test_late_record_at_limit_keeps_the_current_day() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("late.log");

    let writer = RotatingFileWriter::builder(&log_file)
        .format("%M")
        .max_lines(2)
        .build()
        .expect("Failed to create writer");

    let today = Local::now();
    let tomorrow = today + ChronoDuration::days(1);

    writer.write(record("tomorrow 1").with_created(tomorrow));
    writer.write(record("tomorrow 2").with_created(tomorrow));
    // Hits the line limit while stamped with the previous day.
    writer.write(record("late").with_created(today));
    writer.write(record("tomorrow 3").with_created(tomorrow));
    assert!(writer.close());

    assert_eq!(writer.metrics().rotations(), 2);
    assert_eq!(read_lines(&backup_path(&log_file, 1)), Vec::<String>::new());
    assert_eq!(
        read_lines(&backup_path(&log_file, 2)),
        vec!["tomorrow 1", "tomorrow 2"]
    );
    assert!(!backup_path(&log_file, 3).exists());
    assert_eq!(read_lines(&log_file), vec!["late", "tomorrow 3"]);
}

#[test]
fn test_late_record_never_reopens_previous_dated_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let prefix = temp_dir.path().join("dated");

    let writer = RotatingFileWriter::builder(&prefix)
        .format("%M")
        .max_lines(1)
        .date_suffix(true)
        .build()
        .expect("Failed to create writer");

    let today = Local::now();
    let tomorrow = today + ChronoDuration::days(1);
    let today_file = writer.current_path();
    let tomorrow_file = fanlog::writers::dated_path(&prefix, tomorrow.date_naive());

    writer.write(record("tomorrow 1").with_created(tomorrow));
    writer.write(record("late").with_created(today));
    writer.write(record("tomorrow 2").with_created(tomorrow));
    assert!(writer.close());

    assert_eq!(writer.current_path(), tomorrow_file);
    assert_eq!(read_lines(&today_file), Vec::<String>::new());
    assert!(!backup_path(&today_file, 1).exists());
    assert_eq!(read_lines(&backup_path(&tomorrow_file, 1)), vec!["tomorrow 1"]);
    assert_eq!(read_lines(&backup_path(&tomorrow_file, 2)), vec!["late"]);
    assert_eq!(read_lines(&tomorrow_file), vec!["tomorrow 2"]);
}
