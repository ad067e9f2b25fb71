//! Console/file log sink.
//!
//! Every write produces one `HH:MM:SS [LEVEL] component: message` line,
//! colorized on the console and serialized under a single lock. With file
//! persistence enabled, the identical line is appended to a per-day file by
//! a fire-and-forget task holding the same lock, so concurrent writers
//! never interleave partial lines.

use std::fmt;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use serde::{Deserialize, Serialize};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";

/// Minimum severity written by the sink. Runtime-configurable so debug
/// output can be switched on without a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Line category: the four severities plus ingested transport trace,
/// which is tagged and colored separately and never level-filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Debug,
    Info,
    Warn,
    Error,
    Trace,
}

impl Category {
    fn severity(self) -> Option<LogLevel> {
        match self {
            Category::Debug => Some(LogLevel::Debug),
            Category::Info => Some(LogLevel::Info),
            Category::Warn => Some(LogLevel::Warn),
            Category::Error => Some(LogLevel::Error),
            Category::Trace => None,
        }
    }

    fn color(self) -> &'static str {
        match self {
            Category::Error => RED,
            Category::Debug => GREEN,
            Category::Warn => BLUE,
            Category::Trace => MAGENTA,
            Category::Info => "",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Debug => "DEBUG",
            Category::Info => "INFO",
            Category::Warn => "WARN",
            Category::Error => "ERROR",
            Category::Trace => "TRACE",
        };
        f.write_str(label)
    }
}

/// Sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Minimum level written.
    pub level: LogLevel,
    /// Also append every line to a per-day file under `log_dir`.
    pub log_to_file: bool,
    /// Directory for the dated log files.
    pub log_dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_to_file: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// The process-wide log writer. Cheap to share behind an `Arc`; all
/// methods take `&self` and callers need no synchronization of their own.
pub struct LogSink {
    level: LogLevel,
    use_color: bool,
    lock: Arc<Mutex<()>>,
    file_dir: Option<PathBuf>,
}

impl LogSink {
    /// Build a sink from config. A log directory that cannot be created
    /// reports exactly one error line and permanently disables file
    /// persistence; it is never fatal.
    pub fn new(config: LogConfig) -> Self {
        let mut sink = Self {
            level: config.level,
            use_color: supports_color(),
            lock: Arc::new(Mutex::new(())),
            file_dir: None,
        };

        if config.log_to_file {
            match std::fs::create_dir_all(&config.log_dir) {
                Ok(()) => sink.file_dir = Some(config.log_dir),
                Err(err) => sink.write_error(
                    "Logging",
                    &format!("Unable to create log directory: {err}"),
                ),
            }
        }

        sink
    }

    pub fn write_debug(&self, component: &str, message: &str) {
        self.write(Category::Debug, component, message);
    }

    pub fn write_info(&self, component: &str, message: &str) {
        self.write(Category::Info, component, message);
    }

    pub fn write_warn(&self, component: &str, message: &str) {
        self.write(Category::Warn, component, message);
    }

    pub fn write_error(&self, component: &str, message: &str) {
        self.write(Category::Error, component, message);
    }

    /// Ingest one raw transport trace line (see [`crate::trace`]).
    pub(crate) fn write_trace(&self, component: &str, message: &str) {
        self.write(Category::Trace, component, message);
    }

    fn write(&self, category: Category, component: &str, message: &str) {
        if let Some(severity) = category.severity() {
            if severity < self.level {
                return;
            }
        }

        let now = Local::now();
        let line = format!(
            "{} [{}] {}: {}\n",
            now.format("%H:%M:%S"),
            category,
            component,
            message
        );

        {
            let _guard = self
                .lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut out = std::io::stdout().lock();
            let _ = if self.use_color && !category.color().is_empty() {
                write!(out, "{}{line}{RESET}", category.color())
            } else {
                write!(out, "{line}")
            };
        }

        let Some(dir) = &self.file_dir else {
            return;
        };

        // One file per calendar day; the append re-acquires the sink lock
        // so file lines stay whole relative to every other writer.
        let path = dir.join(format!("{}.log", now.format("%B_%d_%Y")));
        let lock = Arc::clone(&self.lock);
        let append = move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut file| file.write_all(line.as_bytes()));
        };

        // Fire-and-forget: no back-pressure, no ordering promise beyond
        // line atomicity. Synchronous callers without a runtime append
        // inline instead.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(append);
            }
            Err(_) => append(),
        }
    }
}

fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn file_sink(dir: &std::path::Path, level: LogLevel) -> LogSink {
        LogSink::new(LogConfig {
            level,
            log_to_file: true,
            log_dir: dir.to_path_buf(),
        })
    }

    fn dated_file(dir: &std::path::Path) -> PathBuf {
        dir.join(format!("{}.log", Local::now().format("%B_%d_%Y")))
    }

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn writes_one_dated_line_per_message() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let sink = file_sink(&dir, LogLevel::Debug);

        // No runtime here, so appends happen inline.
        sink.write_info("Session", "logged on");
        sink.write_warn("Session", "rate limited");

        let lines = read_lines(&dated_file(&dir));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO] Session: logged on"));
        assert!(lines[1].contains("[WARN] Session: rate limited"));
    }

    #[test]
    fn level_filter_drops_lines_below_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let sink = file_sink(&dir, LogLevel::Warn);

        sink.write_debug("Jobs", "noise");
        sink.write_info("Jobs", "also noise");
        sink.write_error("Jobs", "kept");

        let lines = read_lines(&dated_file(&dir));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[ERROR] Jobs: kept"));
    }

    #[test]
    fn unusable_log_dir_disables_persistence_without_panicking() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let sink = file_sink(&blocker, LogLevel::Debug);
        sink.write_info("Session", "still alive");

        assert!(sink.file_dir.is_none());
        assert!(std::fs::read_dir(&blocker).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_writers_never_interleave_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let sink = std::sync::Arc::new(file_sink(&dir, LogLevel::Debug));

        let mut handles = Vec::new();
        for i in 0..50 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                sink.write_info(&format!("worker-{i}"), &format!("message {i}"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Appends are fire-and-forget; poll until they all land.
        let path = dated_file(&dir);
        let mut lines = Vec::new();
        for _ in 0..100 {
            lines = read_lines(&path);
            if lines.len() == 50 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(lines.len(), 50);
        for i in 0..50 {
            let tag = format!("[INFO] worker-{i}: message {i}");
            assert_eq!(
                lines.iter().filter(|l| l.contains(&tag)).count(),
                1,
                "exactly one complete line for writer {i}"
            );
        }
    }
}
