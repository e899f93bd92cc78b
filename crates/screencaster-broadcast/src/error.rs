//! Error types for broadcast sessions
//!
//! Provides typed errors that library users can match and handle specifically.
//!
//! Configuration problems are fatal and surface from
//! [`BroadcastSession::start`](crate::BroadcastSession::start). Sink failures
//! during streaming are not retried; they are reported on the session's error
//! channel while the broadcast keeps running.

use thiserror::Error;

/// Errors reported by a [`FrameSink`](crate::FrameSink)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink refused the submission
    #[error("Sink rejected submission: {0}")]
    Rejected(String),

    /// The sink has shut down and accepts nothing further
    #[error("Sink closed")]
    Closed,
}

impl SinkError {
    /// Create a rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Errors that can occur while running a broadcast
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use screencaster_broadcast::{BroadcastConfig, BroadcastError, BroadcastSession, ChannelSink};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (sink, _events) = ChannelSink::new();
/// let config = BroadcastConfig::builder().stream_url("not a url").build();
///
/// match BroadcastSession::start(config, Arc::new(sink)) {
///     Err(BroadcastError::InvalidUrl(reason)) => eprintln!("bad url: {reason}"),
///     Err(e) => eprintln!("other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum BroadcastError {
    /// The stream URL cannot be used
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sink could not be prepared at session start
    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),

    /// The sink failed a submission during streaming
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// The session has been finished or aborted
    #[error("Broadcast session is not running")]
    NotRunning,

    /// The pipeline worker could not be started or stopped cleanly
    #[error("Pipeline worker error: {0}")]
    Worker(String),
}

/// Result type for broadcast operations
pub type Result<T> = std::result::Result<T, BroadcastError>;

// Helper implementations for common error patterns
impl BroadcastError {
    /// Create an invalid URL error
    pub(crate) fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    /// Create an invalid config error
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a sink unavailable error
    pub(crate) fn sink_unavailable(msg: impl Into<String>) -> Self {
        Self::SinkUnavailable(msg.into())
    }

    /// Create a worker error
    pub(crate) fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}
