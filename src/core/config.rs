//! Serializable logger configuration
//!
//! ```
//! use rust_async_logger::{LoggerConfig, LogLevel, OverflowPolicy};
//!
//! let config = LoggerConfig::from_json_str(r#"{
//!     "name": "net",
//!     "level": "warning",
//!     "async": { "capacity": 256, "workers": 2, "overflow_policy": "discard_new" }
//! }"#).unwrap();
//!
//! assert_eq!(config.level, LogLevel::Warning);
//! let dispatch = config.dispatch.as_ref().unwrap();
//! assert_eq!(dispatch.overflow_policy, OverflowPolicy::DiscardNew);
//! ```

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::logger::LoggerBuilder;
use super::overflow_policy::OverflowPolicy;
use super::timestamp::TimestampFormat;
use super::worker_pool::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Queue and pool settings for async delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AsyncConfig {
    pub capacity: usize,
    pub workers: usize,
    pub overflow_policy: OverflowPolicy,
}

impl AsyncConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(LoggerError::config("async", "capacity must be at least 1"));
        }
        if self.workers == 0 {
            return Err(LoggerError::config("async", "workers must be at least 1"));
        }
        Ok(())
    }
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            workers: 1,
            overflow_policy: OverflowPolicy::Block,
        }
    }
}

/// Everything needed to build one logger, minus its sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub name: String,
    pub level: LogLevel,
    pub timestamp_format: TimestampFormat,
    pub include_thread_name: bool,
    /// Async delivery settings; `None` means synchronous delivery
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<AsyncConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            level: LogLevel::Info,
            timestamp_format: TimestampFormat::default(),
            include_thread_name: false,
            dispatch: None,
        }
    }
}

impl LoggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger config",
                path.display().to_string(),
                e,
            )
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::config("logger", "name must not be empty"));
        }
        match self.dispatch {
            Some(ref dispatch) => dispatch.validate(),
            None => Ok(()),
        }
    }

    /// Turn the configuration into a builder; sinks are added by the caller
    pub fn builder(&self) -> LoggerBuilder {
        let builder = LoggerBuilder::new()
            .name(self.name.clone())
            .min_level(self.level)
            .timestamp_format(self.timestamp_format.clone())
            .include_thread_name(self.include_thread_name);

        match self.dispatch {
            Some(dispatch) => builder.async_config(dispatch),
            None => builder,
        }
    }
}
