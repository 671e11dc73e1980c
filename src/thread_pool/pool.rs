use super::{
    queue::{queue, JobSender},
    stats::{Counters, PoolStats},
    worker::Worker,
    Message, ThreadPool,
};
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use crate::logger;
use slog::{error, info, warn, Logger};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

const ACTIVE: u8 = 0;
const SHUTTING_DOWN: u8 = 1;
const STOPPED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// accepting jobs
    Active,
    /// terminate messages are queued, workers are draining
    ShuttingDown,
    /// every worker has been joined
    Stopped,
}

/// A fixed set of worker threads fed from one shared FIFO queue.
///
/// Shutdown pushes one `Terminate` per worker behind whatever is already
/// queued, so every job accepted before `shutdown` runs before the workers
/// exit.
///
/// # Example
///
/// ```
/// use wpool::thread_pool::{ThreadPool, WorkerPool};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = WorkerPool::new(4).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     pool.execute(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
/// }
/// pool.shutdown();
/// assert_eq!(counter.load(Ordering::SeqCst), 10);
/// ```
pub struct WorkerPool {
    // `None` once shutdown has begun
    sender: RwLock<Option<JobSender>>,
    workers: Mutex<Vec<Worker>>,
    // fixed once construction finishes
    worker_threads: Vec<ThreadId>,
    counters: Arc<Counters>,
    state: AtomicU8,
    size: usize,
    logger: Logger,
}

impl WorkerPool {
    pub fn with_config(config: &Config, logger: Logger) -> Result<Self> {
        config.validate()?;
        let size = config.workers;
        let (sender, receiver) = queue(config.queue_capacity);

        let mut pool = WorkerPool {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(Vec::with_capacity(size)),
            worker_threads: Vec::with_capacity(size),
            counters: Arc::new(Counters::default()),
            state: AtomicU8::new(ACTIVE),
            size,
            logger,
        };

        for id in 0..size {
            // on error the partly built pool is dropped, which shuts down
            // the workers spawned so far
            let worker = Worker::new(
                id,
                receiver.clone(),
                Arc::clone(&pool.counters),
                &config.thread_name,
                &pool.logger,
            )?;
            pool.worker_threads.extend(worker.thread_id());
            pool.lock_workers().push(worker);
        }

        info!(pool.logger, "worker pool started";
            "workers" => size,
            "capacity" => config.queue_capacity.map(|c| c.to_string()).unwrap_or_else(|| "unbounded".to_string())
        );
        Ok(pool)
    }

    /// Number of workers the pool was built with.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn state(&self) -> PoolState {
        match self.state.load(Ordering::SeqCst) {
            ACTIVE => PoolState::Active,
            SHUTTING_DOWN => PoolState::ShuttingDown,
            _ => PoolState::Stopped,
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<Worker>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_worker_thread(&self) -> bool {
        self.worker_threads.contains(&thread::current().id())
    }

    // every worker is gone: nothing queued from now on can run
    fn transport_lost(&self) {
        let mut sender = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        if sender.take().is_some() {
            self.state.store(STOPPED, Ordering::SeqCst);
            error!(self.logger, "job queue lost, every worker is gone");
        }
    }

    // queue one terminate per worker and close the sending side
    fn begin_shutdown(&self) {
        let mut sender = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        let sender = match sender.take() {
            Some(sender) => sender,
            None => return,
        };
        self.state.store(SHUTTING_DOWN, Ordering::SeqCst);

        let workers = self.lock_workers().len();
        info!(self.logger, "shutting down";
            "workers" => workers,
            "pending" => sender.pending()
        );
        for _ in 0..workers {
            if sender.send(Message::Terminate).is_err() {
                // every worker is already gone, nobody is left to tell
                error!(self.logger, "job queue lost before shutdown");
                break;
            }
        }
    }
}

impl ThreadPool for WorkerPool {
    fn new(size: usize) -> Result<Self> {
        let config = Config {
            workers: size,
            ..Config::default()
        };
        WorkerPool::with_config(&config, logger::discard())
    }

    fn execute<F>(&self, job: F) -> Result<()>
    where
        F: Send + FnOnce() + 'static,
    {
        let sent = {
            let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
            let sender = sender.as_ref().ok_or(ErrorKind::Disconnected)?;
            self.counters.job_submitted();
            sender.send(Message::NewJob(Box::new(job)))
        };
        if sent.is_err() {
            self.counters.job_rejected();
            self.transport_lost();
        }
        sent
    }

    fn shutdown(&self) {
        self.begin_shutdown();

        // a worker cannot join itself, and the owner may already be joining
        // it while holding the workers lock
        if self.on_worker_thread() {
            warn!(self.logger, "shutdown called from a worker thread, joining is left to the owner");
            return;
        }

        // a concurrent caller waits here until the first one has joined all
        let mut workers = self.lock_workers();
        for worker in workers.iter_mut() {
            if let Some(thread) = worker.take_thread() {
                if thread.join().is_err() {
                    error!(self.logger, "worker thread panicked"; "worker" => worker.id());
                }
            }
        }

        if self.state.swap(STOPPED, Ordering::SeqCst) != STOPPED {
            let stats = self.counters.snapshot();
            info!(self.logger, "worker pool stopped";
                "completed" => stats.completed,
                "panicked" => stats.panicked,
                "lost_workers" => stats.lost_workers
            );
        }
    }
}

// destroy threads when pool is dead
impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn zero_workers_is_rejected() {
        match WorkerPool::new(0) {
            Err(e) => assert!(matches!(e.kind(), ErrorKind::InvalidSize(0))),
            Ok(_) => panic!("zero-sized pool was built"),
        }
    }

    #[test]
    fn state_moves_forward_only() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.state(), PoolState::Active);
        assert_eq!(pool.size(), 2);
        pool.shutdown();
        assert_eq!(pool.state(), PoolState::Stopped);
        pool.shutdown();
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn all_workers_count_as_live_right_after_construction() {
        let pool = WorkerPool::new(4).unwrap();
        assert_eq!(pool.stats().live_workers, pool.size());
        pool.shutdown();
        assert_eq!(pool.stats().live_workers, 0);
    }

    #[test]
    fn losing_every_worker_stops_the_pool() {
        let pool = WorkerPool::new(2).unwrap();
        // retire the workers behind the pool's back
        {
            let sender = pool.sender.read().unwrap();
            for _ in 0..2 {
                sender.as_ref().unwrap().send(Message::Terminate).unwrap();
            }
        }
        for worker in pool.lock_workers().iter_mut() {
            worker.take_thread().unwrap().join().unwrap();
        }
        assert_eq!(pool.state(), PoolState::Active);

        let err = pool.execute(|| {}).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Disconnected));
        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(pool.stats().submitted, 0);

        // later calls neither block nor panic
        assert!(pool.execute(|| {}).is_err());
        pool.shutdown();
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn workers_report_live_then_exit() {
        let pool = WorkerPool::new(3).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        pool.execute(move || {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        pool.shutdown();

        let stats = pool.stats();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.live_workers, 0);
        assert_eq!(stats.pending(), 0);
    }

    #[test]
    fn shutdown_from_another_thread_drains_queue() {
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let r = Arc::clone(&ran);
            pool.execute(move || {
                thread::sleep(Duration::from_millis(5));
                r.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        let p = Arc::clone(&pool);
        thread::spawn(move || p.shutdown()).join().unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 5);
        assert!(matches!(
            pool.execute(|| {}).unwrap_err().kind(),
            ErrorKind::Disconnected
        ));
    }
}
