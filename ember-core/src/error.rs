//! Error types for the scheduler and configuration.

use std::any::Any;
use std::io;
use std::path::PathBuf;

/// Reasons a deferred callback was refused.
///
/// A refused callback is never enqueued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The requested delay was below zero.
    #[error("delay must not be negative, got {0}")]
    NegativeDelay(i32),
    /// The requested delay exceeds the configured maximum.
    #[error("delay of {delay} ticks exceeds the maximum of {max}")]
    DelayTooLong {
        /// The requested delay.
        delay: u32,
        /// The configured maximum.
        max: u32,
    },
    /// The pending queue is at capacity.
    #[error("scheduler queue is full ({0} pending tasks)")]
    QueueFull(usize),
}

/// Errors raised while loading or validating [`crate::CoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("failed to access config file {path}: {source}")]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The config file is not valid JSON5 or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
