use crate::thread_pool::Message;
use crossbeam::channel::SendError;
use failure::{Context, Fail};
use std::fmt::Display;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}

#[derive(Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "{}", _0)]
    IO(#[cause] io::Error),

    /// a pool needs at least one worker
    #[fail(display = "invalid pool size {}: at least one worker is required", _0)]
    InvalidSize(usize),

    /// the pool is shutting down, stopped, or has lost every worker
    #[fail(display = "pool is disconnected: no longer accepting jobs")]
    Disconnected,

    #[fail(display = "unable to spawn worker thread: {}", _0)]
    Spawn(#[cause] io::Error),

    #[fail(display = "invalid config: {}", _0)]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error {
            inner: Context::new(ErrorKind::IO(err)),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(err: ErrorKind) -> Self {
        Error {
            inner: Context::new(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            inner: Context::new(ErrorKind::Config(err.to_string())),
        }
    }
}

// the message is dropped here: every receiver is gone
impl From<SendError<Message>> for Error {
    fn from(_: SendError<Message>) -> Self {
        Error {
            inner: Context::new(ErrorKind::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_conversion() {
        let err = Error::from(ErrorKind::InvalidSize(0));
        assert!(matches!(err.kind(), ErrorKind::InvalidSize(0)));
        assert_eq!(
            err.to_string(),
            "invalid pool size 0: at least one worker is required"
        );
    }

    #[test]
    fn send_error_means_disconnected() {
        let err = Error::from(SendError(Message::Terminate));
        assert!(matches!(err.kind(), ErrorKind::Disconnected));
    }
}
