//! Fixed pool of worker threads draining a [`BoundedQueue`]

use super::bounded_queue::{BoundedQueue, SubmitResult};
use super::diagnostics::{panic_message, Diagnostics};
use super::error::{LoggerError, Result};
use super::metrics::LoggerMetrics;
use super::overflow_policy::OverflowPolicy;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Default shutdown timeout used when a pool is dropped without an explicit
/// shutdown (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default queue capacity for async loggers
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// One schedulable unit of work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    queue: Arc<BoundedQueue<Job>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
    metrics: Arc<LoggerMetrics>,
    diagnostics: Diagnostics,
}

impl WorkerPool {
    /// Spawn `workers` threads over a fresh queue
    pub fn new(workers: usize, capacity: usize, policy: OverflowPolicy) -> Result<Self> {
        let queue = BoundedQueue::new(capacity, policy)?;
        Self::spawn(workers, queue, Diagnostics::default())
    }

    /// Spawn `workers` threads draining `queue`
    ///
    /// The pool shares the queue's metrics. If any thread fails to start,
    /// the threads already running are stopped and joined before the error
    /// is returned.
    pub fn spawn(
        workers: usize,
        queue: BoundedQueue<Job>,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(LoggerError::config(
                "WorkerPool",
                "worker count must be at least 1",
            ));
        }

        let metrics = Arc::clone(queue.metrics());
        let queue = Arc::new(queue.with_diagnostics(diagnostics.clone()));
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let name = format!("log-worker-{}", index);
            let worker_queue = Arc::clone(&queue);
            let worker_metrics = Arc::clone(&metrics);
            let worker_diagnostics = diagnostics.clone();

            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                Self::run_worker(&worker_queue, &worker_metrics, &worker_diagnostics)
            });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    queue.request_stop();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(LoggerError::WorkerSpawn { name, source });
                }
            }
        }

        let worker_ids = handles.iter().map(|h| h.thread().id()).collect();

        Ok(Self {
            queue,
            workers: Mutex::new(handles),
            worker_ids,
            metrics,
            diagnostics,
        })
    }

    /// Worker loop: execute units until the queue reports stopped-and-empty
    ///
    /// A panicking unit is contained here so the worker keeps draining.
    fn run_worker(
        queue: &BoundedQueue<Job>,
        metrics: &LoggerMetrics,
        diagnostics: &Diagnostics,
    ) {
        while let Some(job) = queue.take() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                metrics.record_panicked_job();
                diagnostics.critical(&LoggerError::JobPanicked {
                    message: panic_message(&*payload),
                });
            }
        }
    }

    /// Queue a unit of work. Never blocks unless the policy is `Block`.
    pub fn submit<F>(&self, job: F) -> SubmitResult
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.submit(Box::new(job))
    }

    /// Like [`WorkerPool::submit`], with failures as errors
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        match self.submit(job) {
            SubmitResult::Accepted => Ok(()),
            SubmitResult::DroppedFull => Err(LoggerError::queue_full(
                self.queue.len(),
                self.queue.capacity(),
            )),
            SubmitResult::RejectedStopped => Err(LoggerError::LoggerStopped),
        }
    }

    /// Stop accepting work, drain everything already queued, join workers.
    ///
    /// Safe to call more than once and from several threads; every caller
    /// returns only after the drain finished. Called from inside a unit of
    /// work it only requests the stop, since a worker cannot join itself.
    pub fn shutdown(&self) {
        self.shutdown_inner(None);
    }

    /// Bounded variant of [`WorkerPool::shutdown`]
    ///
    /// Returns `true` if every worker finished within `timeout`. Workers
    /// still running are kept so a later shutdown call can join them.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        self.shutdown_inner(Some(timeout))
    }

    fn shutdown_inner(&self, timeout: Option<Duration>) -> bool {
        self.queue.request_stop();

        if self.is_worker_thread() {
            return false;
        }

        let mut workers = self.workers.lock();
        let start = Instant::now();
        let mut clean = true;
        let mut unfinished = Vec::new();

        for handle in workers.drain(..) {
            if let Some(timeout) = timeout {
                while !handle.is_finished() && start.elapsed() < timeout {
                    thread::sleep(Duration::from_millis(10));
                }
                if !handle.is_finished() {
                    unfinished.push(handle);
                    continue;
                }
            }

            if let Err(payload) = handle.join() {
                clean = false;
                self.diagnostics.critical(&LoggerError::other(format!(
                    "worker thread panicked during shutdown: {}",
                    panic_message(&*payload)
                )));
            }
        }

        if !unfinished.is_empty() {
            self.diagnostics.warning(&format!(
                "{} worker thread(s) did not finish within {:?}; {} unit(s) still pending",
                unfinished.len(),
                timeout.unwrap_or_default(),
                self.queue.len()
            ));
            *workers = unfinished;
            clean = false;
        }

        clean
    }

    /// Whether the calling thread is one of this pool's workers
    pub(crate) fn is_worker_thread(&self) -> bool {
        let current = thread::current().id();
        self.worker_ids.contains(&current)
    }

    /// True once stop was requested and every worker has been joined
    pub fn is_shut_down(&self) -> bool {
        self.queue.is_stopped() && self.workers.lock().is_empty()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.worker_ids.len()
    }

    /// Units queued but not yet picked up by a worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &BoundedQueue<Job> {
        &self.queue
    }

    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT) && !self.is_worker_thread() {
            self.diagnostics
                .warning("worker pool dropped before its queue drained; some records may be lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_zero_workers_rejected() {
        let result = WorkerPool::new(0, 10, OverflowPolicy::Block);
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_workers_are_named() {
        let pool = WorkerPool::new(2, 10, OverflowPolicy::Block).unwrap();
        let names = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..4 {
            let names = Arc::clone(&names);
            let _ = pool.submit(move || {
                let name = thread::current().name().map(String::from);
                names.lock().push(name);
            });
        }
        pool.shutdown();

        let names = names.lock();
        assert_eq!(names.len(), 4);
        assert!(names
            .iter()
            .all(|n| n.as_deref().is_some_and(|n| n.starts_with("log-worker-"))));
    }

    #[test]
    fn test_shutdown_drains_all_jobs() {
        let pool = WorkerPool::new(3, 1000, OverflowPolicy::Block).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..500 {
            let counter = Arc::clone(&counter);
            assert!(pool
                .submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .is_accepted());
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 500);
        assert!(pool.is_shut_down());
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_submit_after_shutdown_fails_cleanly() {
        let pool = WorkerPool::new(1, 10, OverflowPolicy::DiscardNew).unwrap();
        pool.shutdown();
        pool.shutdown();

        assert_eq!(pool.submit(|| {}), SubmitResult::RejectedStopped);
        assert!(matches!(pool.execute(|| {}), Err(LoggerError::LoggerStopped)));
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::new(1, 10, OverflowPolicy::Block).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let _ = pool.submit(|| panic!("unit of work failed"));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            let _ = pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(pool.metrics().panicked_jobs(), 1);
    }

    #[test]
    fn test_single_worker_preserves_order() {
        let pool = WorkerPool::new(1, 4, OverflowPolicy::Block).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let seen = Arc::clone(&seen);
            let _ = pool.submit(move || seen.lock().push(i));
        }
        pool.shutdown();

        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_shutdown_from_inside_job_does_not_deadlock() {
        let pool = Arc::new(WorkerPool::new(1, 4, OverflowPolicy::Block).unwrap());
        let inner = Arc::clone(&pool);
        let _ = pool.submit(move || inner.shutdown());

        pool.shutdown();
        assert!(pool.is_shut_down());
    }

    #[test]
    fn test_shutdown_timeout_reports_slow_worker() {
        let pool = WorkerPool::new(1, 4, OverflowPolicy::Block).unwrap();
        let _ = pool.submit(|| thread::sleep(Duration::from_millis(300)));

        assert!(!pool.shutdown_timeout(Duration::from_millis(20)));
        assert!(!pool.is_shut_down());

        // A later unbounded shutdown joins the remaining worker
        pool.shutdown();
        assert!(pool.is_shut_down());
    }
}
