//! Rolling Logger
//!
//! Installs a global `tracing` subscriber that writes every event to a
//! size-capped log file and keeps the most recent lines in memory so the
//! UI can show them. `log` records are bridged into the same subscriber.

mod ring;
mod rolling_file;

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;

pub use ring::LineRing;
pub use rolling_file::RollingFile;

/// Live file size before rotation
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
/// Lines kept in memory for `recent_lines`
pub const DEFAULT_RING_CAPACITY: usize = 500;
const KEEP_BACKUPS: usize = 3;

static HANDLE: OnceLock<LogHandle> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("log file error: {0}")]
    Io(#[from] io::Error),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

struct Sink {
    file: RollingFile,
    ring: LineRing,
}

/// Shared handle to the file + ring buffer. Cheap to clone.
#[derive(Clone)]
pub struct LogHandle {
    sink: Arc<Mutex<Sink>>,
}

impl LogHandle {
    pub fn open(
        log_dir: &Path,
        app_name: &str,
        max_file_bytes: u64,
        ring_capacity: usize,
    ) -> Result<Self, LoggerError> {
        let file = RollingFile::open(log_dir, app_name, max_file_bytes, KEEP_BACKUPS)?;
        Ok(Self {
            sink: Arc::new(Mutex::new(Sink {
                file,
                ring: LineRing::new(ring_capacity),
            })),
        })
    }

    fn record(&self, bytes: &[u8]) {
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        if let Err(e) = sink.file.write_line(bytes) {
            eprintln!("[rolling-logger] write failed: {}", e);
        }
        let _ = sink.file.flush();
        for line in String::from_utf8_lossy(bytes).lines() {
            if !line.is_empty() {
                sink.ring.push(line.to_string());
            }
        }
    }

    pub fn recent(&self, limit: usize) -> Vec<String> {
        self.sink
            .lock()
            .map(|sink| sink.ring.recent(limit))
            .unwrap_or_default()
    }
}

/// Per-event writer handed out by `MakeWriter`; commits on drop.
pub struct EventWriter {
    handle: LogHandle,
    buf: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.handle.record(&self.buf);
        }
    }
}

impl<'a> MakeWriter<'a> for LogHandle {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            handle: self.clone(),
            buf: Vec::new(),
        }
    }
}

/// Initialize the global logger, writing to `<log_dir>/<app_name>.log`.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    if HANDLE.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let handle = LogHandle::open(
        log_dir.as_ref(),
        app_name,
        DEFAULT_MAX_FILE_BYTES,
        DEFAULT_RING_CAPACITY,
    )?;

    tracing_subscriber::fmt()
        .with_writer(handle.clone().and(io::stderr))
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    HANDLE
        .set(handle)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    log::info!("{} logger initialized", app_name);
    Ok(())
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    HANDLE.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!(target: "app", "{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    HANDLE.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!(target: "app", "{}", message);
    Ok(())
}

/// Last `limit` formatted log lines, oldest first. Empty before `init_logger`.
pub fn recent_lines(limit: usize) -> Vec<String> {
    HANDLE
        .get()
        .map(|handle| handle.recent(limit))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_event_writer_commits_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LogHandle::open(dir.path(), "test", 4096, 16).unwrap();

        {
            let mut writer = handle.make_writer();
            writer.write_all(b"first event\n").unwrap();
        }
        {
            let mut writer = handle.make_writer();
            writer.write_all(b"second ").unwrap();
            writer.write_all(b"event\n").unwrap();
        }

        let recent = handle.recent(10);
        assert_eq!(recent.last().map(String::as_str), Some("second event"));
        assert!(recent.iter().any(|line| line == "first event"));

        let on_disk = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
        assert!(on_disk.contains("first event"));
        assert!(on_disk.contains("second event"));
    }

    #[test]
    fn test_helpers_require_init() {
        if HANDLE.get().is_none() {
            assert!(matches!(info("hello"), Err(LoggerError::NotInitialized)));
            assert!(recent_lines(5).is_empty());
        }
    }
}
