//! # Rust Async Logger
//!
//! Log dispatch that decouples producers from slow output.
//!
//! A [`Logger`] filters records by level and fans each one out to a set of
//! shared [`Sink`]s. With async delivery the record is formatted on the
//! caller's thread and handed to a [`WorkerPool`] through a
//! [`BoundedQueue`] whose [`OverflowPolicy`] decides what a full queue does:
//! block the producer, evict the oldest pending record, or discard the new
//! one.
//!
//! ## Features
//!
//! - **Backpressure choices**: `block`, `overrun_oldest`, `discard_new`
//! - **Lossless shutdown**: everything accepted is drained before workers exit
//! - **Independent sinks**: console, file and generic writer sinks, each with
//!   its own lock so lines never interleave
//! - **Fault isolation**: a failing or panicking sink never stops a worker

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        AsyncConfig, BoundedQueue, LogLevel, LogOutcome, LogRecord, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerMetrics, LoggerRegistry, OverflowCallback,
        OverflowPolicy, Result, SharedSink, Sink, SubmitResult, TimestampFormat, WorkerPool,
    };
    pub use crate::sinks::{ConsoleSink, FileMode, FileSink, StreamSink};
}

pub use crate::core::{
    AsyncConfig, BoundedQueue, Delivery, Diagnostics, ErrorHandler, Job, LineFormatter, LogLevel,
    LogOutcome, LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
    LoggerRegistry, OverflowCallback, OverflowPolicy, Result, SharedSink, Sink, SubmitResult,
    TimestampFormat, WorkerPool, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use sinks::{ConsoleSink, ConsoleTarget, FileMode, FileSink, StreamSink};
