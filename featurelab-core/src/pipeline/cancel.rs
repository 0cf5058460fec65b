//! Cooperative cancellation checked at stage boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::PipelineError;

/// Shared cancel flag with an optional deadline.
///
/// Clones share the flag, so a caller can keep one handle and trip it while the
/// fetch runs on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips by itself once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`PipelineError::Cancelled`] if the token has tripped.
    pub fn check(&self, stage: &str) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled {
                stage: stage.to_string(),
            })
        } else {
            Ok(())
        }
    }
}
