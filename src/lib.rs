//! A fixed-size worker pool.
//!
//! Jobs go into one shared FIFO queue and are picked up by whichever worker
//! is idle. Shutdown is a message in that same queue, so it never overtakes
//! work that was submitted before it.

pub mod config;
pub mod error;
pub mod logger;
pub mod thread_pool;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use thread_pool::{PoolState, PoolStats, ThreadPool, WorkerPool};
