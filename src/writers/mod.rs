//! Writer implementations
//!
//! Each writer owns a bounded queue and one background thread.

pub mod console;
pub mod rotating_file;

pub use console::{ConsoleWriter, ConsoleWriterBuilder};
pub use rotating_file::{backup_path, dated_path, FileWriterBuilder, RotatingFileWriter, MAX_BACKUP_INDEX};
