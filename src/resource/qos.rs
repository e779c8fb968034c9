//! Quality of service metadata attached to every message

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Message priority, 1 is the highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    RealTime = 1,
    InteractiveHigh = 2,
    InteractiveLow = 3,
    DataHigh = 4,
    #[default]
    Data = 5,
    DataLow = 6,
    Background = 7,
}

impl Priority {
    /// Highest priority
    pub const MAX: Priority = Priority::RealTime;
    /// Lowest priority
    pub const MIN: Priority = Priority::Background;
}

impl TryFrom<u8> for Priority {
    type Error = RelayError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Priority::RealTime),
            2 => Ok(Priority::InteractiveHigh),
            3 => Ok(Priority::InteractiveLow),
            4 => Ok(Priority::DataHigh),
            5 => Ok(Priority::Data),
            6 => Ok(Priority::DataLow),
            7 => Ok(Priority::Background),
            other => Err(RelayError::invalid_argument(
                "priority",
                format!("{} is outside 1..=7", other),
            )),
        }
    }
}

/// Behavior of the network layer when it is congested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CongestionControl {
    /// Drop the message
    #[default]
    Drop,
    /// Block the sender until the message can be sent
    Block,
}

impl CongestionControl {
    /// Default for publications
    pub const DEFAULT_PUSH: CongestionControl = CongestionControl::Drop;
    /// Default for replies, which must not be lost silently
    pub const DEFAULT_RESPONSE: CongestionControl = CongestionControl::Block;
}

/// Kind of a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleKind {
    #[default]
    Put,
    Delete,
}

/// QoS bundle carried by samples and outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QoS {
    pub priority: Priority,
    pub congestion_control: CongestionControl,
    /// Send immediately instead of waiting for batching
    pub express: bool,
}

impl QoS {
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_congestion_control(mut self, congestion_control: CongestionControl) -> Self {
        self.congestion_control = congestion_control;
        self
    }

    pub fn with_express(mut self, express: bool) -> Self {
        self.express = express;
        self
    }
}
