//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_QUERY_TIMEOUT, MAX_CHANNEL_CAPACITY},
    error::{RelayError, Result},
    query::ConsolidationMode,
};

/// Configuration for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session identifier; random when absent
    pub id: Option<u128>,
    /// Timeout applied to a `get` that does not set one
    #[serde(with = "millis")]
    pub query_timeout: Duration,
    /// Stamp outbound publications and replies from the session clock
    pub timestamping: bool,
    /// Capacity of channels built by [`crate::Session::default_handler`]
    pub channel_capacity: usize,
    /// Consolidation applied to a `get` that does not set one
    pub consolidation: ConsolidationMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            timestamping: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            consolidation: ConsolidationMode::default(),
        }
    }
}

impl Config {
    /// Set the session identifier
    pub fn with_id(mut self, id: u128) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the default query timeout
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Enable or disable timestamping
    pub fn with_timestamping(mut self, timestamping: bool) -> Self {
        self.timestamping = timestamping;
        self
    }

    /// Set the default channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the default consolidation mode
    pub fn with_consolidation(mut self, mode: ConsolidationMode) -> Self {
        self.consolidation = mode;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.id == Some(0) {
            return Err(RelayError::invalid_argument("id", "Session id cannot be zero"));
        }

        if self.query_timeout.is_zero() {
            return Err(RelayError::invalid_argument(
                "query_timeout",
                "Query timeout cannot be zero",
            ));
        }

        if self.channel_capacity == 0 {
            return Err(RelayError::invalid_argument(
                "channel_capacity",
                "Channel capacity cannot be zero",
            ));
        }

        if self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(RelayError::invalid_argument(
                "channel_capacity",
                format!("Channel capacity cannot exceed {}", MAX_CHANNEL_CAPACITY),
            ));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
