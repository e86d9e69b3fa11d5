//! Cooperative cancellation for long-running octree builds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Clones observe the same flag. Builders poll [`is_cancelled`](Self::is_cancelled)
/// at the top of every recursive step and unwind once it is set; a cancelled
/// build leaves its octree in a discard-only state.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation of every build polling this token.
  pub fn cancel(&self) {
    self.flag.store(true, Ordering::Relaxed);
  }

  /// Re-arm the token for the next build.
  pub fn reset(&self) {
    self.flag.store(false, Ordering::Relaxed);
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::Relaxed)
  }
}
