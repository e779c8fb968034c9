//! Receive-side channel signals

use crate::error::ErrorKind;

/// The channel is disconnected and fully drained
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("channel disconnected")]
pub struct RecvError;

impl RecvError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ChannelDisconnected
    }
}

/// Outcome of a non-blocking receive that produced no item
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    /// Nothing buffered, but the producer is still alive
    #[error("channel empty")]
    Empty,
    /// Nothing buffered and nothing will ever arrive
    #[error("channel disconnected")]
    Disconnected,
}

impl TryRecvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TryRecvError::Empty => ErrorKind::ChannelNoData,
            TryRecvError::Disconnected => ErrorKind::ChannelDisconnected,
        }
    }
}

/// Outcome of a bounded-time receive that produced no item
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecvTimeoutError {
    #[error("timed out waiting on channel")]
    Timeout,
    #[error("channel disconnected")]
    Disconnected,
}

impl RecvTimeoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecvTimeoutError::Timeout => ErrorKind::ChannelNoData,
            RecvTimeoutError::Disconnected => ErrorKind::ChannelDisconnected,
        }
    }
}

impl From<RecvError> for TryRecvError {
    fn from(_: RecvError) -> Self {
        TryRecvError::Disconnected
    }
}

impl From<RecvError> for RecvTimeoutError {
    fn from(_: RecvError) -> Self {
        RecvTimeoutError::Disconnected
    }
}
