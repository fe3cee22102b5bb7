use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// Severity of a log record. The discriminants are the numeric thresholds
/// accepted by `--log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl LogLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logging capability handed to the parser and the extractor.
///
/// A record is emitted when its level is at or above `threshold()`, so a
/// threshold of 10 shows everything and 40 only errors and criticals.
pub trait Log {
    fn threshold(&self) -> u8;

    /// Emit a record. Callers go through `debug`/`info`/... which filter first.
    fn write(&self, level: LogLevel, message: &str);

    fn enabled(&self, level: LogLevel) -> bool {
        level.as_u8() >= self.threshold()
    }

    fn log(&self, level: LogLevel, message: &str) {
        if self.enabled(level) {
            self.write(level, message);
        }
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl Log for NullLog {
    fn threshold(&self) -> u8 {
        u8::MAX
    }

    fn write(&self, _level: LogLevel, _message: &str) {}
}

/// Keeps records in memory; used when embedding the splitter and in tests.
#[derive(Debug)]
pub struct CaptureLog {
    threshold: u8,
    records: RefCell<Vec<(LogLevel, String)>>,
}

impl CaptureLog {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            records: RefCell::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.borrow().clone()
    }

    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Default for CaptureLog {
    fn default() -> Self {
        Self::new(LogLevel::Debug.as_u8())
    }
}

impl Log for CaptureLog {
    fn threshold(&self) -> u8 {
        self.threshold
    }

    fn write(&self, level: LogLevel, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}
