//! Bounded worker pool for the local phase.
//!
//! Wraps a dedicated rayon pool so the engine never competes with, or
//! reconfigures, the caller's global pool.

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Fixed-size rayon pool.
pub struct WorkerPool {
  pool: ThreadPool,
}

impl WorkerPool {
  /// Pool with `threads` workers, or rayon's default count for `None`.
  pub fn new(threads: Option<usize>) -> Result<Self> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("topology-worker-{i}"));
    if let Some(threads) = threads {
      builder = builder.num_threads(threads);
    }
    Ok(Self {
      pool: builder.build()?,
    })
  }

  pub fn num_threads(&self) -> usize {
    self.pool.current_num_threads()
  }

  /// Run `op` inside the pool; returns once every task it spawned finished.
  pub fn scope<'scope, OP, R>(&self, op: OP) -> R
  where
    OP: FnOnce(&Scope<'scope>) -> R + Send,
    R: Send,
  {
    self.pool.scope(op)
  }
}

impl std::fmt::Debug for WorkerPool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WorkerPool")
      .field("threads", &self.num_threads())
      .finish()
  }
}

// =============================================================================
// Tests
// =============================================================================
