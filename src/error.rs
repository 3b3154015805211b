// Error types for collection, polling and sinks

use crate::exposition::ParseError;
use thiserror::Error;

/// Non-fatal failure of one poll cycle. Reported, never retried early.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed exposition text: {0}")]
    Parse(#[from] ParseError),

    #[error("container engine request failed: {0}")]
    Engine(#[from] bollard::errors::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure writing to a metrics sink. Fatal to the run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink used before fields were registered")]
    NotRegistered,

    #[error("{0}")]
    Other(String),
}

/// Failure before any poller starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no metrics sink configured")]
    MissingSink,

    #[error("no nodes configured")]
    NoNodes,

    #[error("failed to register sink fields: {0}")]
    Register(#[source] SinkError),
}
