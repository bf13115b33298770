//! Main logger implementation
//!
//! A [`Logger`] filters by level and fans each record out to its sinks.
//! How the fan-out runs is fixed at construction: on the calling thread
//! ([`Delivery::Sync`]) or as a unit of work on a [`WorkerPool`]
//! ([`Delivery::Async`]).

use super::{
    bounded_queue::{BoundedQueue, SubmitResult},
    config::AsyncConfig,
    diagnostics::{panic_message, Diagnostics, ErrorHandler},
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::LoggerMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
    sink::{SharedSink, Sink},
    timestamp::{LineFormatter, TimestampFormat},
    worker_pool::{WorkerPool, DEFAULT_SHUTDOWN_TIMEOUT},
};
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What happened to one `log` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOutcome {
    /// Sync delivery: the record was handed to every sink
    Written,
    /// Sync delivery: below the threshold, nothing happened
    Filtered,
    /// Async delivery: a unit of work was queued. Filtering happens when it
    /// executes.
    Queued,
    /// Async delivery: the queue was full under `DiscardNew`
    Dropped,
    /// The logger has been shut down
    Rejected,
}

impl LogOutcome {
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, LogOutcome::Rejected)
    }

    /// Whether the call went through without being dropped or rejected
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            LogOutcome::Written | LogOutcome::Filtered | LogOutcome::Queued
        )
    }
}

impl From<SubmitResult> for LogOutcome {
    fn from(result: SubmitResult) -> Self {
        match result {
            SubmitResult::Accepted => LogOutcome::Queued,
            SubmitResult::DroppedFull => LogOutcome::Dropped,
            SubmitResult::RejectedStopped => LogOutcome::Rejected,
        }
    }
}

/// Delivery strategy selected at construction
pub enum Delivery {
    /// Write to sinks on the calling thread
    Sync,
    /// Queue a unit of work for the pool
    Async(WorkerPool),
}

/// State shared between the logger and its queued units of work
struct Shared {
    level: AtomicU8,
    sinks: RwLock<Vec<SharedSink>>,
    metrics: Arc<LoggerMetrics>,
    diagnostics: Diagnostics,
}

impl Shared {
    #[inline]
    fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    fn snapshot_sinks(&self) -> Vec<SharedSink> {
        self.sinks.read().clone()
    }

    /// Filter against the current threshold, then write to each sink.
    ///
    /// The sink list is copied under its lock and written outside it, so a
    /// slow sink never holds up `add_sink` or `set_level`. Each sink is
    /// isolated: an error or panic in one does not skip the others.
    fn deliver(&self, record: &LogRecord) -> bool {
        if record.level() < self.level() {
            self.metrics.record_filtered();
            return false;
        }

        let mut has_error = false;
        for sink in self.snapshot_sinks() {
            let write_result = panic::catch_unwind(AssertUnwindSafe(|| sink.write(record)));

            match write_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    has_error = true;
                    self.metrics.record_sink_failure();
                    self.diagnostics
                        .error(&LoggerError::sink_write(sink.name(), e.to_string()));
                }
                Err(payload) => {
                    has_error = true;
                    self.metrics.record_sink_failure();
                    self.diagnostics.critical(&LoggerError::sink_write(
                        sink.name(),
                        format!("panicked: {}", panic_message(&*payload)),
                    ));
                }
            }
        }

        if !has_error {
            self.metrics.record_delivered();
        }
        true
    }

    /// Flush every sink, reporting failures; returns the first error
    fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for sink in self.snapshot_sinks() {
            if let Err(e) = sink.flush() {
                self.diagnostics
                    .error(&LoggerError::sink_write(sink.name(), format!("flush failed: {}", e)));
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

pub struct Logger {
    name: String,
    shared: Arc<Shared>,
    formatter: LineFormatter,
    delivery: Delivery,
    /// Set as soon as a shutdown is requested; `log` rejects from then on
    stopped: AtomicBool,
    /// Set once a shutdown drained the pool and released the sinks
    closed: AtomicBool,
    shutdown_lock: Mutex<()>,
}

impl Logger {
    /// Synchronous logger with no sinks and an `Info` threshold
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(
            name.into(),
            LogLevel::Info,
            LineFormatter::default(),
            Arc::new(LoggerMetrics::new()),
            Diagnostics::default(),
            Delivery::Sync,
        )
    }

    /// Asynchronous logger with one worker and the `Block` policy
    pub fn with_async(name: impl Into<String>, capacity: usize) -> Result<Self> {
        Self::builder().name(name).async_mode(capacity).build()
    }

    fn from_parts(
        name: String,
        level: LogLevel,
        formatter: LineFormatter,
        metrics: Arc<LoggerMetrics>,
        diagnostics: Diagnostics,
        delivery: Delivery,
    ) -> Self {
        Self {
            name,
            shared: Arc::new(Shared {
                level: AtomicU8::new(level.as_u8()),
                sinks: RwLock::new(Vec::new()),
                metrics,
                diagnostics,
            }),
            formatter,
            delivery,
            stopped: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            shutdown_lock: Mutex::new(()),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_async_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("app")
    ///     .min_level(LogLevel::Warning)
    ///     .async_mode(1000)
    ///     .workers(2)
    ///     .build()
    ///     .unwrap();
    /// assert!(logger.is_async());
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_sink(&self, sink: SharedSink) {
        self.shared.sinks.write().push(sink);
    }

    /// Remove the first sink whose `name()` matches
    pub fn remove_sink(&self, name: &str) -> Option<SharedSink> {
        let mut sinks = self.shared.sinks.write();
        let index = sinks.iter().position(|s| s.name() == name)?;
        Some(sinks.remove(index))
    }

    pub fn sinks(&self) -> Vec<SharedSink> {
        self.shared.snapshot_sinks()
    }

    pub fn sink_count(&self) -> usize {
        self.shared.sinks.read().len()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.shared.level.store(level.as_u8(), Ordering::Release);
    }

    pub fn level(&self) -> LogLevel {
        self.shared.level()
    }

    /// Would a record at `level` pass the current threshold?
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    pub fn is_async(&self) -> bool {
        matches!(self.delivery, Delivery::Async(_))
    }

    pub fn is_shut_down(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Units queued but not yet picked up (always 0 for sync delivery)
    pub fn pending(&self) -> usize {
        match self.delivery {
            Delivery::Sync => 0,
            Delivery::Async(ref pool) => pool.pending(),
        }
    }

    pub fn worker_count(&self) -> usize {
        match self.delivery {
            Delivery::Sync => 0,
            Delivery::Async(ref pool) => pool.worker_count(),
        }
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use rust_async_logger::Logger;
    ///
    /// let logger = Logger::with_async("app", 100).unwrap();
    /// logger.info("hello");
    /// logger.shutdown();
    ///
    /// let metrics = logger.metrics();
    /// println!("Queued: {}", metrics.submitted_count());
    /// println!("Lost: {}", metrics.lost_count());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    /// Format `message` now and deliver it according to the delivery mode.
    ///
    /// Sync delivery checks the threshold before formatting. Async delivery
    /// formats on the caller's thread and defers the threshold check to
    /// when the unit executes, so a level change made in between applies.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) -> LogOutcome {
        if self.is_shut_down() {
            self.shared.metrics.record_rejected();
            return LogOutcome::Rejected;
        }

        match self.delivery {
            Delivery::Sync => {
                if level < self.level() {
                    self.shared.metrics.record_filtered();
                    return LogOutcome::Filtered;
                }
                let record = LogRecord::new(level, message, &self.formatter);
                if self.shared.deliver(&record) {
                    LogOutcome::Written
                } else {
                    LogOutcome::Filtered
                }
            }
            Delivery::Async(ref pool) => {
                let record = LogRecord::new(level, message, &self.formatter);
                let shared = Arc::clone(&self.shared);
                pool.submit(move || {
                    shared.deliver(&record);
                })
                .into()
            }
        }
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) -> LogOutcome {
        self.log(LogLevel::Trace, message)
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) -> LogOutcome {
        self.log(LogLevel::Debug, message)
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) -> LogOutcome {
        self.log(LogLevel::Info, message)
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) -> LogOutcome {
        self.log(LogLevel::Warning, message)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) -> LogOutcome {
        self.log(LogLevel::Error, message)
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) -> LogOutcome {
        self.log(LogLevel::Fatal, message)
    }

    /// Flush every sink from the calling thread.
    ///
    /// This does not wait for queued units; use [`Logger::shutdown`] for a
    /// full drain.
    pub fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    /// Stop accepting records, drain every accepted unit, flush and release
    /// the sinks.
    ///
    /// Idempotent. Concurrent callers all return after the drain finished.
    /// Subsequent `log` calls return [`LogOutcome::Rejected`].
    pub fn shutdown(&self) {
        self.shutdown_inner(None);
    }

    /// Gracefully shutdown the logger with a custom timeout
    ///
    /// Returns `true` if the drain completed within `timeout`. On timeout
    /// the sinks stay attached so the units still running can finish.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_async_logger::Logger;
    /// use std::time::Duration;
    ///
    /// let logger = Logger::with_async("app", 1000).unwrap();
    /// logger.info("Important message");
    ///
    /// if !logger.shutdown_timeout(Duration::from_secs(10)) {
    ///     eprintln!("Warning: Logger shutdown timed out");
    /// }
    /// ```
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        self.shutdown_inner(Some(timeout))
    }

    fn shutdown_inner(&self, timeout: Option<Duration>) -> bool {
        // A unit of work cannot wait for its own worker, and must not queue
        // behind a caller that is already joining it
        if let Delivery::Async(ref pool) = self.delivery {
            if pool.is_worker_thread() {
                self.stopped.store(true, Ordering::Release);
                pool.queue().request_stop();
                return false;
            }
        }

        let _guard = self.shutdown_lock.lock();
        self.stopped.store(true, Ordering::Release);

        let drained = match self.delivery {
            Delivery::Sync => true,
            Delivery::Async(ref pool) => match timeout {
                Some(timeout) => pool.shutdown_timeout(timeout),
                None => {
                    pool.shutdown();
                    pool.is_shut_down()
                }
            },
        };

        if !drained {
            return false;
        }

        let flushed = self.shared.flush().is_ok();
        self.shared.sinks.write().clear();
        self.closed.store(true, Ordering::Release);
        flushed
    }

    /// True once a shutdown drained every accepted unit and released the
    /// sinks. A stop requested from inside a unit of work is not enough.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if !self.is_closed() {
            self.shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        // Report any records lost to overflow
        let metrics = &self.shared.metrics;
        let lost = metrics.lost_count();
        if lost > 0 {
            self.shared.diagnostics.warning(&format!(
                "Logger '{}' shutting down with {} records lost to overflow (drop rate: {:.2}%)",
                self.name,
                lost,
                metrics.drop_rate()
            ));
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_async_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .name("net")
///     .min_level(LogLevel::Debug)
///     .sink(ConsoleSink::stdout())
///     .async_mode(1000)
///     .overflow_policy(OverflowPolicy::DiscardNew)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} records dropped", count);
///     }))
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    name: String,
    min_level: LogLevel,
    sinks: Vec<SharedSink>,
    async_config: Option<AsyncConfig>,
    formatter: LineFormatter,
    on_error: Option<ErrorHandler>,
    on_overflow: Option<OverflowCallback>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: "default".to_string(),
            min_level: LogLevel::Info,
            sinks: Vec::new(),
            async_config: None,
            formatter: LineFormatter::default(),
            on_error: None,
            on_overflow: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add a sink owned by this logger alone
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add a sink that other loggers may share
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }

    fn async_config_mut(&mut self) -> &mut AsyncConfig {
        self.async_config.get_or_insert_with(AsyncConfig::default)
    }

    /// Enable async mode with the given queue capacity
    ///
    /// If not called, the logger uses synchronous delivery.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, capacity: usize) -> Self {
        self.async_config_mut().capacity = capacity;
        self
    }

    /// Replace the whole async configuration
    #[must_use = "builder methods return a new value"]
    pub fn async_config(mut self, config: AsyncConfig) -> Self {
        self.async_config = Some(config);
        self
    }

    /// Number of pool workers; enables async mode with the default capacity
    /// if it is not enabled yet
    #[must_use = "builder methods return a new value"]
    pub fn workers(mut self, workers: usize) -> Self {
        self.async_config_mut().workers = workers;
        self
    }

    /// Set the overflow policy for async logging; enables async mode with
    /// the default capacity if it is not enabled yet
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.async_config_mut().overflow_policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.formatter.timestamp_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn include_thread_name(mut self, include: bool) -> Self {
        self.formatter.include_thread_name = include;
        self
    }

    /// Receive internal errors (sink failures, panics) and warnings (slow
    /// shutdown, records lost at drop) instead of stderr
    ///
    /// Warnings arrive as [`LoggerError::Other`]. Overflow alerts still go
    /// to stderr and to the [`LoggerBuilder::on_overflow`] callback.
    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// The callback is invoked when records are lost to overflow.
    /// The parameter is the total count of lost records.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Build the Logger, spawning the worker pool for async mode
    pub fn build(self) -> Result<Logger> {
        let metrics = Arc::new(LoggerMetrics::new());
        let diagnostics = Diagnostics::new(self.on_error, self.on_overflow);

        let delivery = match self.async_config {
            None => Delivery::Sync,
            Some(config) => {
                config.validate()?;
                let queue = BoundedQueue::with_metrics(
                    config.capacity,
                    config.overflow_policy,
                    Arc::clone(&metrics),
                )?;
                Delivery::Async(WorkerPool::spawn(config.workers, queue, diagnostics.clone())?)
            }
        };

        let logger = Logger::from_parts(
            self.name,
            self.min_level,
            self.formatter,
            metrics,
            diagnostics,
            delivery,
        );
        for sink in self.sinks {
            logger.add_sink(sink);
        }

        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
