//! Overflow policies for the bounded dispatch queue
//!
//! When the queue is full, these policies determine what happens to the
//! unit of work being submitted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Policy for handling queue overflow in async logging
///
/// # Example
///
/// ```
/// use rust_async_logger::OverflowPolicy;
///
/// // Default behavior: backpressure the producer
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
///
/// let policy: OverflowPolicy = "overrun_oldest".parse().unwrap();
/// assert_eq!(policy, OverflowPolicy::OverrunOldest);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Block the submitting thread until a worker frees a slot
    ///
    /// No record is ever lost. The producer may wait indefinitely if the
    /// workers stall.
    #[default]
    Block,

    /// Evict the oldest pending unit to make room for the new one
    ///
    /// Submission never blocks and never fails while the queue is open.
    OverrunOldest,

    /// Reject the incoming unit, leaving the queue untouched
    DiscardNew,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Block => "block",
            OverflowPolicy::OverrunOldest => "overrun_oldest",
            OverflowPolicy::DiscardNew => "discard_new",
        }
    }

    /// Whether a full queue can make this policy lose records
    pub fn is_lossy(&self) -> bool {
        !matches!(self, OverflowPolicy::Block)
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "block" => Ok(OverflowPolicy::Block),
            "overrun_oldest" | "drop_oldest" => Ok(OverflowPolicy::OverrunOldest),
            "discard_new" | "drop_newest" => Ok(OverflowPolicy::DiscardNew),
            _ => Err(format!("Invalid overflow policy: '{}'", s)),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when records are lost to overflow (discarded or evicted).
/// The parameter is the total count of lost records so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
