use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;

/// Settings for a [`WorkerPool`](crate::thread_pool::WorkerPool).
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "workers": 8, "queue_capacity": 256 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub workers: usize,
    /// `None` means unbounded; with `Some(n)` submitters block while `n` jobs wait
    pub queue_capacity: Option<usize>,
    /// worker threads are named `<thread_name>-<id>`
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            queue_capacity: None,
            thread_name: "wpool-worker".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ErrorKind::InvalidSize(self.workers).into());
        }
        if self.thread_name.is_empty() {
            return Err(ErrorKind::Config("thread_name must not be empty".to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert!(config.workers > 0);
        assert!(config.queue_capacity.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "workers": 3 }"#).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.thread_name, "wpool-worker");
    }

    #[test]
    fn empty_thread_name_is_rejected() {
        let config = Config {
            thread_name: String::new(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "threads": 3 }"#).is_err());
    }
}
