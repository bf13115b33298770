//! Console sink implementation

use crate::core::{LogLevel, LogRecord, Result, Sink};
use colored::Colorize;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

pub struct ConsoleSink {
    target: ConsoleTarget,
    use_colors: bool,
    route_errors_to_stderr: bool,
    lock: Mutex<()>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_target(ConsoleTarget::Stdout)
    }

    pub fn stdout() -> Self {
        Self::with_target(ConsoleTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Self::with_target(ConsoleTarget::Stderr)
    }

    pub fn with_target(target: ConsoleTarget) -> Self {
        Self {
            target,
            use_colors: true,
            route_errors_to_stderr: false,
            lock: Mutex::new(()),
        }
    }

    /// Enable or disable ANSI colors by level
    ///
    /// ```
    /// use rust_async_logger::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::stdout().with_colors(false);
    /// ```
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Send Error and Fatal records to stderr whatever the target is
    #[must_use]
    pub fn route_errors_to_stderr(mut self, enabled: bool) -> Self {
        self.route_errors_to_stderr = enabled;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn target_for(&self, level: LogLevel) -> ConsoleTarget {
        if self.route_errors_to_stderr && level >= LogLevel::Error {
            ConsoleTarget::Stderr
        } else {
            self.target
        }
    }

    fn render(&self, record: &LogRecord) -> String {
        if self.use_colors {
            record.line().color(record.level().color()).to_string()
        } else {
            record.line().to_string()
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let output = self.render(record);
        let _guard = self.lock.lock();
        match self.target_for(record.level()) {
            ConsoleTarget::Stdout => writeln!(io::stdout().lock(), "{}", output)?,
            ConsoleTarget::Stderr => writeln!(io::stderr().lock(), "{}", output)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let _guard = self.lock.lock();
        // Flush both streams since error routing may write to either
        io::stdout().flush()?;
        io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        match self.target {
            ConsoleTarget::Stdout => "console:stdout",
            ConsoleTarget::Stderr => "console:stderr",
        }
    }
}
