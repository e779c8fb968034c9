//! Channel statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a channel's counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Items admitted into the queue
    pub pushed: u64,
    /// Items handed to the consumer
    pub received: u64,
    /// Items dropped by a ring channel to make room
    pub evicted: u64,
    /// Pushes that had to wait for a free slot
    pub blocked_pushes: u64,
    /// Pushes discarded because the channel was already torn down
    pub rejected: u64,
}

impl ChannelStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Default::default()
    }

    /// Fraction of admitted items that were later evicted (0.0 to 1.0)
    pub fn eviction_rate(&self) -> f64 {
        if self.pushed == 0 {
            return 0.0;
        }
        self.evicted as f64 / self.pushed as f64
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "ChannelStats {{ pushed: {}, received: {}, evicted: {}, blocked: {}, rejected: {} }}",
            self.pushed, self.received, self.evicted, self.blocked_pushes, self.rejected
        )
    }
}

/// Thread-safe counters behind [`ChannelStats`]
#[derive(Debug, Default)]
pub(crate) struct AtomicChannelStats {
    pushed: AtomicU64,
    received: AtomicU64,
    evicted: AtomicU64,
    blocked_pushes: AtomicU64,
    rejected: AtomicU64,
}

impl AtomicChannelStats {
    pub fn record_push(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_receive(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked_push(&self) {
        self.blocked_pushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ChannelStats {
        ChannelStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            blocked_pushes: self.blocked_pushes.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
