use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters shared by the pool and its workers.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
    live_workers: AtomicUsize,
    lost_workers: AtomicUsize,
}

impl Counters {
    pub fn job_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    // undo `job_submitted` for a job the queue refused
    pub fn job_rejected(&self) {
        self.submitted.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn job_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn job_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::SeqCst);
    }

    pub fn worker_started(&self) {
        self.live_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub fn worker_exited(&self, lost: bool) {
        self.live_workers.fetch_sub(1, Ordering::SeqCst);
        if lost {
            self.lost_workers.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            panicked: self.panicked.load(Ordering::SeqCst),
            live_workers: self.live_workers.load(Ordering::SeqCst),
            lost_workers: self.lost_workers.load(Ordering::SeqCst),
        }
    }
}

/// A point-in-time copy of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    /// jobs accepted by `execute`
    pub submitted: usize,
    /// jobs that returned normally
    pub completed: usize,
    /// jobs that panicked
    pub panicked: usize,
    /// worker threads spawned and not yet exited
    pub live_workers: usize,
    /// workers that died outside a job
    pub lost_workers: usize,
}

impl PoolStats {
    /// Jobs submitted but not yet finished, either way.
    pub fn pending(&self) -> usize {
        self.submitted
            .saturating_sub(self.completed + self.panicked)
    }
}
