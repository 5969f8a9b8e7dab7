use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use settings::Settings;

const LOG_FILE: &str = "nandin.log";
const DEBUG_ENV: &str = "NANDIN_DEBUG";

// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// File logger for resolution runs. Candidates dropped by the pipeline are
/// recorded here rather than surfaced per-file to the user.
pub struct Logger {
    log_path: Option<PathBuf>,
    min_level: LogLevel,
}

impl Logger {
    pub fn new(settings: &Settings) -> Result<Self, String> {
        Self::with_dir(&settings.log_dir)
    }

    // Create logger with custom directory
    pub fn with_dir(log_dir: &str) -> Result<Self, String> {
        let log_dir = PathBuf::from(log_dir);
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;

        let min_level = if std::env::var(DEBUG_ENV).is_ok() {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };

        Ok(Logger {
            log_path: Some(log_dir.join(LOG_FILE)),
            min_level,
        })
    }

    /// A logger that records nothing; the fallback when the log directory
    /// cannot be created.
    pub fn disabled() -> Self {
        Logger {
            log_path: None,
            min_level: LogLevel::Error,
        }
    }

    // Log a message at the specified level
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }
        let Some(log_path) = &self.log_path else {
            return;
        };

        let log_line = format!(
            "[{}] [{}] {}\n",
            Self::timestamp(),
            level.as_str(),
            message
        );
        if let Err(e) = Self::append(log_path, &log_line) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    // Convenience methods
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn append(path: &PathBuf, content: &str) -> Result<(), String> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open log file: {}", e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| format!("Failed to write to log: {}", e))
    }

    // Seconds since the epoch; good enough for a local trace file.
    fn timestamp() -> String {
        match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => String::from("UNKNOWN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_lines_above_the_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_dir(dir.path().to_str().unwrap()).unwrap();

        logger.info("kept line");
        logger.error("error line");

        let contents = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(contents.contains("[INFO] kept line"));
        assert!(contents.contains("[ERROR] error line"));
    }

    #[test]
    fn debug_lines_are_filtered_by_default() {
        if std::env::var(DEBUG_ENV).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_dir(dir.path().to_str().unwrap()).unwrap();

        logger.debug("hidden line");
        logger.info("visible line");

        let contents = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(!contents.contains("hidden line"));
        assert!(contents.contains("visible line"));
    }

    #[test]
    fn disabled_logger_writes_nothing() {
        let logger = Logger::disabled();
        logger.error("goes nowhere");
    }
}
