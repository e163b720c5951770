use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::QueryError;

/// Caller-supplied cancellation check. Long traversals consult it
/// periodically and abort by propagating [`QueryError::Cancelled`]; there is
/// no timeout concept, callers bound latency by cancelling.
pub trait Monitor: Send + Sync {
    fn is_cancelled(&self) -> bool;

    fn check_cancelled(&self) -> Result<(), QueryError> {
        if self.is_cancelled() {
            Err(QueryError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Monitor that never cancels.
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Flag-backed monitor for hosts that cancel from another thread.
#[derive(Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

impl Monitor for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
