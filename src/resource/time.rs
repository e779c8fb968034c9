//! Session identifiers, NTP64 timestamps and a monotonic clock

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// 128-bit non-zero identifier of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u128);

impl SessionId {
    /// Wrap a raw identifier; zero is reserved
    pub fn new(raw: u128) -> Result<Self> {
        if raw == 0 {
            return Err(RelayError::invalid_argument("id", "session id must be non-zero"));
        }
        Ok(Self(raw))
    }

    /// Random identifier
    pub fn rand() -> Self {
        Self(rand::random::<u128>().max(1))
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Source of a timestamp
pub type TimestampId = SessionId;

/// 64-bit fixed point time since the UNIX epoch: 32 bits of seconds, 32 bits of fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NTP64(pub u64);

impl NTP64 {
    const FRAC_PER_SEC: u64 = 1 << 32;

    /// Current wall-clock time
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from(since_epoch)
    }

    pub fn as_secs(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn subsec_nanos(&self) -> u32 {
        (((self.0 & 0xFFFF_FFFF) * 1_000_000_000) / Self::FRAC_PER_SEC) as u32
    }

    pub fn to_duration(&self) -> Duration {
        Duration::new(u64::from(self.as_secs()), self.subsec_nanos())
    }
}

impl From<Duration> for NTP64 {
    fn from(duration: Duration) -> Self {
        let secs = duration.as_secs() << 32;
        let frac = (u64::from(duration.subsec_nanos()) * Self::FRAC_PER_SEC) / 1_000_000_000;
        NTP64(secs | frac)
    }
}

impl fmt::Display for NTP64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time paired with the id of the clock that produced it.
///
/// Ordered by time first, then by source id, which makes timestamps from
/// different sources totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    time: NTP64,
    id: TimestampId,
}

impl Timestamp {
    pub fn new(time: NTP64, id: TimestampId) -> Self {
        Self { time, id }
    }

    pub fn time(&self) -> NTP64 {
        self.time
    }

    pub fn id(&self) -> TimestampId {
        self.id
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.time, self.id)
    }
}

/// Issues strictly increasing timestamps for one source
#[derive(Debug)]
pub struct Clock {
    id: TimestampId,
    last: Mutex<NTP64>,
}

impl Clock {
    pub fn new(id: TimestampId) -> Self {
        Self {
            id,
            last: Mutex::new(NTP64::default()),
        }
    }

    pub fn id(&self) -> TimestampId {
        self.id
    }

    /// Next timestamp, later than every one issued or observed before.
    ///
    /// Once the clock has been pushed to `NTP64(u64::MAX)` it stays there:
    /// timestamps are then equal rather than increasing.
    pub fn new_timestamp(&self) -> Timestamp {
        let now = NTP64::now();
        let mut last = self.last.lock();
        *last = if now > *last {
            now
        } else {
            NTP64(last.0.saturating_add(1))
        };
        Timestamp::new(*last, self.id)
    }

    /// Advance past a timestamp received from elsewhere
    pub fn observe(&self, timestamp: &Timestamp) {
        let mut last = self.last.lock();
        if timestamp.time > *last {
            *last = timestamp.time;
        }
    }
}
