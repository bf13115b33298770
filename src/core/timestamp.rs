//! Timestamp formatting and line layout
//!
//! Timestamps are captured on the producing thread when a record is created
//! and rendered into the output line right away, so the text a sink receives
//! reflects call time rather than delivery time.

use super::log_level::LogLevel;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use rust_async_logger::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// assert!(format.format(&Utc::now()).ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    ///
    /// Provides higher precision for ordering concurrent log entries.
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// C `ctime()` layout in local time: `Wed Jan  8 10:30:45 2025`
    Ctime,

    /// Custom strftime format
    ///
    /// ```
    /// use rust_async_logger::TimestampFormat;
    ///
    /// let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Ctime => datetime
                .with_timezone(&Local)
                .format("%a %b %e %H:%M:%S %Y")
                .to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}

/// Renders the single output line for a record.
///
/// Layout: `[<timestamp>] [<LEVEL>] <message>`, with an extra `[<thread>]`
/// column when thread names are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFormatter {
    pub timestamp_format: TimestampFormat,
    pub include_thread_name: bool,
}

impl LineFormatter {
    pub fn new(timestamp_format: TimestampFormat) -> Self {
        Self {
            timestamp_format,
            include_thread_name: false,
        }
    }

    #[must_use]
    pub fn with_thread_name(mut self, include: bool) -> Self {
        self.include_thread_name = include;
        self
    }

    pub fn render(
        &self,
        level: LogLevel,
        timestamp: &DateTime<Utc>,
        thread_name: &str,
        message: &str,
    ) -> String {
        let timestamp_str = self.timestamp_format.format(timestamp);
        if self.include_thread_name {
            format!("[{}] [{}] [{}] {}", timestamp_str, level, thread_name, message)
        } else {
            format!("[{}] [{}] {}", timestamp_str, level, message)
        }
    }
}
