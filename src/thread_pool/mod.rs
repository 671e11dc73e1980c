use crate::error::Result;

mod pool;
pub mod queue;
mod stats;
mod worker;
pub use pool::{PoolState, WorkerPool};
pub use stats::PoolStats;

pub trait ThreadPool {
    fn new(size: usize) -> Result<Self>
    where
        Self: Sized;

    fn execute<F>(&self, job: F) -> Result<()>
    where
        // since function works in a thread, it must have static lifetime
        F: Send + FnOnce() + 'static;

    /// Stop accepting jobs, let the queued ones drain, then join every worker.
    fn shutdown(&self);
}

pub type Job = Box<dyn Send + FnOnce() + 'static>;

pub enum Message {
    NewJob(Job),
    Terminate,
}
