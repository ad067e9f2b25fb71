use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlation token assigned by the remote network layer when an
/// asynchronous operation is issued.
///
/// Uniqueness among concurrently pending operations is the network layer's
/// contract and is not validated here. The token carries no meaning once
/// its operation completes or the session is replaced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a tracked operation originated (channel, sender, message text).
///
/// Attached to a job purely for diagnostic attribution; never used for
/// correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandContext {
    pub channel: String,
    pub sender: String,
    pub message: String,
}

impl CommandContext {
    pub fn new(
        channel: impl Into<String>,
        sender: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender: sender.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>: {}", self.channel, self.sender, self.message)
    }
}
