use super::{queue::JobReceiver, stats::Counters, Job, Message};
use crate::error::{ErrorKind, Result};
use slog::{debug, error, o, warn, Logger};
use std::any::Any;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

pub struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn new(
        id: usize,
        receiver: JobReceiver,
        counters: Arc<Counters>,
        thread_name: &str,
        logger: &Logger,
    ) -> Result<Worker> {
        let logger = logger.new(o!("worker" => id));
        // counted from spawn, not from when the thread gets scheduled
        counters.worker_started();
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", thread_name, id))
            .spawn({
                let counters = Arc::clone(&counters);
                move || run(receiver, counters, logger)
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                counters.worker_exited(false);
                return Err(ErrorKind::Spawn(e).into());
            }
        };

        Ok(Worker {
            id,
            thread: Some(thread),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Id of the worker's thread, while the handle is still held.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread.as_ref().map(|t| t.thread().id())
    }

    /// Hand out the thread handle. Only the first call gets it.
    pub fn take_thread(&mut self) -> Option<JoinHandle<()>> {
        self.thread.take()
    }
}

// listen to the queue until told to stop
fn run(receiver: JobReceiver, counters: Arc<Counters>, logger: Logger) {
    let _sentinel = Sentinel::new(Arc::clone(&counters), logger.clone());
    debug!(logger, "worker started");

    loop {
        match receiver.recv() {
            Some(Message::NewJob(job)) => execute(job, &counters, &logger),
            Some(Message::Terminate) => {
                debug!(logger, "worker terminating");
                break;
            }
            None => {
                warn!(logger, "job queue disconnected without terminate");
                break;
            }
        }
    }
}

// a panicking job must not take the worker down with it
fn execute(job: Job, counters: &Counters, logger: &Logger) {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => counters.job_completed(),
        Err(payload) => {
            counters.job_panicked();
            error!(logger, "job panicked"; "reason" => panic_message(payload.as_ref()));
            // the payload's own Drop may panic as well
            if let Err(nested) = panic::catch_unwind(AssertUnwindSafe(move || drop(payload))) {
                error!(logger, "job panic payload panicked while dropped");
                mem::forget(nested);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Lives on the worker thread's stack. Dropped during an unwind, it reports
/// the worker as lost; the pool runs one worker short from then on.
struct Sentinel {
    counters: Arc<Counters>,
    logger: Logger,
}

impl Sentinel {
    fn new(counters: Arc<Counters>, logger: Logger) -> Self {
        Sentinel { counters, logger }
    }
}

impl Drop for Sentinel {
    fn drop(&mut self) {
        let lost = thread::panicking();
        if lost {
            error!(self.logger, "worker thread died outside a job");
        }
        self.counters.worker_exited(lost);
    }
}
