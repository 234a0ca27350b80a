use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{SplitError, SplitResult};

/// Cooperative progress reporting and cancellation.
///
/// Every loop that can run unboundedly polls `check_for_cancel`; an
/// `Err(Cancelled)` unwinds the operation without publishing partial results.
pub trait ProgressListener {
    fn set_maximum(&mut self, _steps: u64) {}

    fn increment(&mut self) {}

    fn check_for_cancel(&mut self) -> SplitResult<()> {
        Ok(())
    }

    fn task_completed(&mut self) {}
}

/// Listener that reports nothing and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {}

/// Cancellation flag that can be shared with another thread; the owning side
/// calls `cancel`, the computation observes it at the next poll.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl ProgressListener for CancelFlag {
    fn check_for_cancel(&mut self) -> SplitResult<()> {
        if self.is_cancelled() {
            Err(SplitError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_progress_never_cancels() {
        let mut p = NoProgress;
        p.set_maximum(10);
        p.increment();
        assert!(p.check_for_cancel().is_ok());
        p.task_completed();
    }

    #[test]
    fn cancel_flag_observed() {
        let mut flag = CancelFlag::new();
        assert!(flag.check_for_cancel().is_ok());
        flag.cancel();
        assert!(matches!(
            flag.check_for_cancel(),
            Err(SplitError::Cancelled)
        ));
    }

    #[test]
    fn cancel_flag_shared_clone() {
        let mut a = CancelFlag::new();
        let b = a.clone();
        b.cancel();
        assert!(a.check_for_cancel().is_err());
    }
}
