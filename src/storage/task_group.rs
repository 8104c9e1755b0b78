//! Completion counter for fan-out traversals.
//!
//! Work units are counted *before* they are spawned and uncounted by the unit
//! itself when it finishes, so the count can only reach zero once every unit
//! that will ever run has run. Pruned branches are never counted in the first
//! place, so the tree's shape does not matter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::Error;

#[derive(Debug, Default)]
pub struct TaskGroup {
    pending: AtomicUsize,
    notify: Notify,
    stopped: AtomicBool,
    error: Mutex<Option<Error>>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one unit and return its guard. Create the guard before spawning
    /// and move it into the task; dropping it (also on panic) uncounts it.
    pub fn unit(self: &Arc<Self>) -> WorkUnit {
        self.add(1);
        WorkUnit { group: Arc::clone(self) }
    }

    /// Account for `n` units about to be spawned.
    pub fn add(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Mark one unit finished.
    pub fn done(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "TaskGroup::done without matching add");
        if previous == 1 {
            // notify_one stores a permit if the waiter has not parked yet.
            self.notify.notify_one();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait until every counted unit has called [`done`](Self::done).
    pub async fn wait(&self) {
        while self.pending() > 0 {
            self.notify.notified().await;
        }
    }

    /// Record a failure and stop further fan-out. Only the first error is kept.
    pub fn fail(&self, err: Error) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
        self.stopped.store(true, Ordering::Release);
    }

    /// Stop further fan-out without an error (the consumer went away).
    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Take the recorded error, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.error.lock().take()
    }
}

/// One counted unit of work in a [`TaskGroup`].
#[must_use = "dropping a WorkUnit immediately marks it finished"]
#[derive(Debug)]
pub struct WorkUnit {
    group: Arc<TaskGroup>,
}

impl Drop for WorkUnit {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.group.fail(Error::Execution("worker task panicked".into()));
        }
        self.group.done();
    }
}
