//! Core logger types and traits

pub mod bounded_queue;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod registry;
pub mod sink;
pub mod timestamp;
pub mod worker_pool;

pub use bounded_queue::{BoundedQueue, SubmitResult};
pub use config::{AsyncConfig, LoggerConfig};
pub use diagnostics::{Diagnostics, ErrorHandler};
pub use error::{LoggerError, Result};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{Delivery, LogOutcome, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use registry::LoggerRegistry;
pub use sink::{SharedSink, Sink};
pub use timestamp::{LineFormatter, TimestampFormat};
pub use worker_pool::{Job, WorkerPool, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT};
