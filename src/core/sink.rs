//! Sink trait for log output destinations

use super::{error::Result, log_record::LogRecord};
use std::sync::Arc;

/// A destination for formatted records.
///
/// Methods take `&self`: every implementation serializes its own `write` and
/// `flush` calls behind its own lock, so one sink can be shared by several
/// loggers and written from several worker threads without interleaving
/// partial lines.
pub trait Sink: Send + Sync {
    fn write(&self, record: &LogRecord) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
}

/// Shared handle to a sink; loggers never own sinks exclusively
pub type SharedSink = Arc<dyn Sink>;
