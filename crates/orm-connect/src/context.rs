//! Cancellation- and deadline-bearing operation context.
//!
//! An `Arc<AtomicBool>` flipped by a signal handler and checked at
//! backend-call boundaries, rather than a tokio cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ConnectError, Result};

/// Carries cancellation and an optional deadline across a `DataSource`
/// call chain. Cheap to clone; the cancellation flag is shared.
#[derive(Clone)]
pub struct OpContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context that never cancels and never expires.
    pub fn background() -> Self {
        OpContext {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Builds a context sharing an externally-owned cancellation flag, e.g.
    /// one flipped by a process signal handler.
    pub fn with_cancel_flag(flag: Arc<AtomicBool>) -> Self {
        OpContext {
            cancelled: flag,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checked at every backend-call boundary. Cancellation takes priority
    /// over an expired deadline when both are true.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ConnectError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ConnectError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn background_never_cancels() {
        let ctx = OpContext::background();
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn cancel_is_observed() {
        let ctx = OpContext::background();
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(ConnectError::Cancelled)));
    }

    #[test]
    fn shared_flag_propagates_to_clones() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = OpContext::with_cancel_flag(flag.clone());
        let clone = ctx.clone();
        flag.store(true, Ordering::SeqCst);
        assert!(clone.check().is_err());
    }

    #[test]
    fn expired_deadline_is_observed() {
        let ctx = OpContext::background().with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(matches!(ctx.check(), Err(ConnectError::DeadlineExceeded)));
    }

    #[test]
    fn future_deadline_passes() {
        let ctx = OpContext::background().with_deadline(Instant::now() + Duration::from_secs(60));
        assert!(ctx.check().is_ok());
    }
}
