//! Bounded FIFO shared between log producers and pool workers
//!
//! One mutex guards the pending items and the stop flag. Consumers wait on
//! `not_empty`; producers blocked by the `Block` policy wait on `not_full`.
//! Both condition variables are always used with the same mutex.

use super::diagnostics::Diagnostics;
use super::error::{LoggerError, Result};
use super::metrics::LoggerMetrics;
use super::overflow_policy::OverflowPolicy;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Outcome of offering an item to a [`BoundedQueue`]
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitResult {
    /// Queued; a worker will execute it. Under `OverrunOldest` this may have
    /// evicted the oldest pending item.
    Accepted,
    /// Queue was full under `DiscardNew`; the item was not queued.
    DroppedFull,
    /// Stop was requested; nothing is accepted any more.
    RejectedStopped,
}

impl SubmitResult {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResult::Accepted)
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    stopped: bool,
}

pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
    metrics: Arc<LoggerMetrics>,
    diagnostics: Diagnostics,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Result<Self> {
        Self::with_metrics(capacity, policy, Arc::new(LoggerMetrics::new()))
    }

    pub fn with_metrics(
        capacity: usize,
        policy: OverflowPolicy,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(LoggerError::config(
                "BoundedQueue",
                "capacity must be at least 1",
            ));
        }

        Ok(Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(4096)),
                stopped: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            policy,
            metrics,
            diagnostics: Diagnostics::default(),
        })
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Offer an item, applying the overflow policy if the queue is full.
    ///
    /// Under `Block` this suspends the caller until a worker frees a slot or
    /// stop is requested, in which case the item is rejected.
    pub fn submit(&self, item: T) -> SubmitResult {
        let mut state = self.state.lock();

        if state.stopped {
            drop(state);
            self.metrics.record_rejected();
            return SubmitResult::RejectedStopped;
        }

        let mut evicted = None;
        let mut lost_total = 0;
        if state.items.len() >= self.capacity {
            self.metrics.record_queue_full();

            match self.policy {
                OverflowPolicy::Block => {
                    self.metrics.record_block();
                    while !state.stopped && state.items.len() >= self.capacity {
                        self.not_full.wait(&mut state);
                    }
                    if state.stopped {
                        drop(state);
                        self.metrics.record_rejected();
                        return SubmitResult::RejectedStopped;
                    }
                }
                OverflowPolicy::OverrunOldest => {
                    // Exactly one eviction per overflowing submission
                    evicted = state.items.pop_front();
                    lost_total = self.metrics.record_evicted() + 1;
                }
                OverflowPolicy::DiscardNew => {
                    drop(state);
                    let lost_total = self.metrics.record_dropped() + 1;
                    self.diagnostics.overflow(lost_total, self.policy);
                    drop(item);
                    return SubmitResult::DroppedFull;
                }
            }
        }

        state.items.push_back(item);
        drop(state);

        self.metrics.record_submitted();
        self.not_empty.notify_one();

        if evicted.is_some() {
            self.diagnostics.overflow(lost_total, self.policy);
            // The evicted unit's destructor runs outside the lock
            drop(evicted);
        }

        SubmitResult::Accepted
    }

    /// Remove the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` only once stop has been requested *and* every pending
    /// item has been handed out.
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.stopped {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Non-blocking variant of [`BoundedQueue::take`].
    pub fn try_take(&self) -> Option<T> {
        let item = self.state.lock().items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Stop accepting submissions. Pending items stay queued for draining.
    ///
    /// Returns `true` for the call that performed the transition.
    pub fn request_stop(&self) -> bool {
        let transitioned = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.stopped, true)
        };
        self.not_empty.notify_all();
        self.not_full.notify_all();
        transitioned
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Stopped and empty: `take` will return `None` from now on.
    pub fn is_drained(&self) -> bool {
        let state = self.state.lock();
        state.stopped && state.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedQueue")
            .field("len", &state.items.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("stopped", &state.stopped)
            .finish()
    }
}
