//! The transport between the pool and its workers.
//!
//! Any number of [`JobSender`]s may enqueue concurrently. All workers share a
//! single [`JobReceiver`]; its lock is held for one dequeue and released
//! before the message is handled, so jobs still run in parallel.

use super::Message;
use crate::error::Result;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Create a FIFO queue. `None` gives an unbounded queue whose senders never
/// block; `Some(n)` makes senders wait while `n` messages are pending.
pub fn queue(capacity: Option<usize>) -> (JobSender, JobReceiver) {
    let (sender, receiver) = match capacity {
        Some(cap) => bounded::<Message>(cap),
        None => unbounded::<Message>(),
    };
    (
        JobSender { sender },
        JobReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

#[derive(Clone)]
pub struct JobSender {
    sender: Sender<Message>,
}

impl JobSender {
    pub fn send(&self, message: Message) -> Result<()> {
        self.sender.send(message)?;
        Ok(())
    }

    /// Number of messages waiting to be picked up.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

#[derive(Clone)]
pub struct JobReceiver {
    receiver: Arc<Mutex<Receiver<Message>>>,
}

impl JobReceiver {
    /// Block until the next message arrives. Returns `None` once every sender
    /// is gone and nothing is left to deliver.
    pub fn recv(&self) -> Option<Message> {
        // nothing inside the lock can leave the receiver half-updated
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        receiver.recv().ok()
    }
}
