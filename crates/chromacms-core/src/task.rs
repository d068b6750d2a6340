//! One-shot worker tasks
//!
//! The transform engine fans a kernel out over disjoint pixel slabs, one
//! OS thread per slab, and joins them before returning. Workers are scoped
//! so slab borrows need no `'static` lifetime; there is no pool and no
//! queue, a task runs exactly one closure.

use std::thread::{Scope, ScopedJoinHandle};

/// A running worker. Created running; joined exactly once.
pub struct Task<'scope, T = ()> {
    handle: ScopedJoinHandle<'scope, T>,
}

impl<'scope, T> Task<'scope, T> {
    /// Start a worker immediately. The closure may borrow anything that
    /// outlives `scope`.
    pub fn spawn<'env, F>(scope: &'scope Scope<'scope, 'env>, f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        Self {
            handle: scope.spawn(f),
        }
    }

    /// Block until the worker finishes. A panicking worker re-raises on
    /// the joining thread.
    pub fn join(self) -> T {
        match self.handle.join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
