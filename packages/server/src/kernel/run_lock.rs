//! Process-wide "one run at a time" lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// At most one collection run may be in flight per process.
///
/// Cloning shares the same flag. Acquisition never waits: a second caller is
/// turned away while a [`RunGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct RunLock {
    active: Arc<AtomicBool>,
}

impl RunLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or `None` if a run is already active.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                active: self.active.clone(),
            })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Held for the duration of a run; releases the lock on drop, including when
/// the run panics or errors out.
#[derive(Debug)]
pub struct RunGuard {
    active: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
