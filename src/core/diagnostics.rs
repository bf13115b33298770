//! Out-of-band reporting for faults inside the logger itself
//!
//! The logger cannot log its own failures through its sinks, so sink errors,
//! panicking units of work and overflow losses go to a user callback when
//! one is installed, and to stderr otherwise.

use super::error::LoggerError;
use super::overflow_policy::{OverflowCallback, OverflowPolicy};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Callback receiving internal logger errors
pub type ErrorHandler = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Alert on the first loss and every 1000th after that
const OVERFLOW_ALERT_INTERVAL: u64 = 1000;

#[derive(Clone, Default)]
pub struct Diagnostics {
    on_error: Option<ErrorHandler>,
    on_overflow: Option<OverflowCallback>,
}

impl Diagnostics {
    pub fn new(on_error: Option<ErrorHandler>, on_overflow: Option<OverflowCallback>) -> Self {
        Self {
            on_error,
            on_overflow,
        }
    }

    /// Report a recoverable fault (a sink write failure, a failed flush)
    pub fn error(&self, err: &LoggerError) {
        if !self.dispatch(err) {
            eprintln!("[LOGGER ERROR] {}", err);
        }
    }

    /// Report a fault that interrupted a unit of work
    pub fn critical(&self, err: &LoggerError) {
        if !self.dispatch(err) {
            eprintln!(
                "[LOGGER CRITICAL] {}. Worker continues with the next unit.",
                err
            );
        }
    }

    /// Report a condition that lost or may lose records (slow shutdown,
    /// records lost by the time the logger is dropped)
    pub fn warning(&self, message: &str) {
        if !self.dispatch(&LoggerError::other(message)) {
            eprintln!("[LOGGER WARNING] {}", message);
        }
    }

    /// Called with the running total of records lost to overflow
    pub fn overflow(&self, lost_total: u64, policy: OverflowPolicy) {
        if lost_total != 1 && lost_total % OVERFLOW_ALERT_INTERVAL != 0 {
            return;
        }

        eprintln!(
            "[LOGGER WARNING] Queue full under '{}', {} records lost. \
             Consider increasing capacity or using the 'block' policy.",
            policy, lost_total
        );

        if let Some(ref callback) = self.on_overflow {
            let callback = Arc::clone(callback);
            if panic::catch_unwind(AssertUnwindSafe(|| callback(lost_total))).is_err() {
                eprintln!("[LOGGER ERROR] Overflow callback panicked");
            }
        }
    }

    /// Hand the error to the user handler. Returns false when there is none
    /// or when the handler itself panicked.
    fn dispatch(&self, err: &LoggerError) -> bool {
        match self.on_error {
            Some(ref handler) => panic::catch_unwind(AssertUnwindSafe(|| handler(err))).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("on_error", &self.on_error.is_some())
            .field("on_overflow", &self.on_overflow.is_some())
            .finish()
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_error_goes_to_handler() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        let diagnostics = Diagnostics::new(
            Some(Arc::new(move |_err: &LoggerError| {
                seen_clone.fetch_add(1, Ordering::Relaxed);
            })),
            None,
        );

        diagnostics.error(&LoggerError::other("boom"));
        diagnostics.critical(&LoggerError::other("bang"));
        assert_eq!(seen.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_warning_goes_to_handler() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let diagnostics = Diagnostics::new(
            Some(Arc::new(move |err: &LoggerError| {
                seen_clone.lock().push(err.to_string());
            })),
            None,
        );

        diagnostics.warning("2 worker thread(s) did not finish");
        assert_eq!(*seen.lock(), vec!["2 worker thread(s) did not finish"]);
    }

    #[test]
    fn test_overflow_alert_interval() {
        let calls = Arc::new(AtomicU64::new(0));
        let calls_clone = Arc::clone(&calls);
        let diagnostics = Diagnostics::new(
            None,
            Some(Arc::new(move |_total| {
                calls_clone.fetch_add(1, Ordering::Relaxed);
            })),
        );

        for total in 1..=2500 {
            diagnostics.overflow(total, OverflowPolicy::DiscardNew);
        }
        // 1, 1000, 2000
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let diagnostics = Diagnostics::new(
            Some(Arc::new(|_err: &LoggerError| panic!("handler exploded"))),
            None,
        );
        diagnostics.error(&LoggerError::other("still reported on stderr"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(&*payload), "static message");

        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(&*payload), "formatted 42");
    }
}
