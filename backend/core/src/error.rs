use thiserror::Error;

/// Top-level error type for the relaybot backend.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("session lost: {0}")]
    SessionLost(String),

    #[error("channel closed: {0}")]
    ChannelClosed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
