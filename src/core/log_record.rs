//! Immutable log record

use super::log_level::LogLevel;
use super::timestamp::LineFormatter;
use chrono::{DateTime, Utc};
use std::cell::RefCell;

// Thread-local cache so repeated log calls on one thread do not re-allocate the label
thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Name of the current thread, or its id when unnamed
fn current_thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                thread
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{:?}", thread.id()))
            })
            .clone()
    })
}

/// One log event, fully formatted on the producing thread.
///
/// A record never changes after construction; sinks only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    level: LogLevel,
    message: String,
    timestamp: DateTime<Utc>,
    thread_name: String,
    line: String,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so one call always produces exactly one output line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    /// Capture the current time and thread, then render the output line.
    pub fn new(level: LogLevel, message: impl Into<String>, formatter: &LineFormatter) -> Self {
        Self::at(level, message, Utc::now(), formatter)
    }

    /// Build a record with an explicit capture time.
    pub fn at(
        level: LogLevel,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        formatter: &LineFormatter,
    ) -> Self {
        let message = Self::sanitize_message(&message.into());
        let thread_name = current_thread_label();
        let line = formatter.render(level, &timestamp, &thread_name, &message);
        Self {
            level,
            message,
            timestamp,
            thread_name,
            line,
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// The rendered output line, without a trailing newline.
    #[inline]
    pub fn line(&self) -> &str {
        &self.line
    }
}
