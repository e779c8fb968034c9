//! Statistics for a session

use std::sync::atomic::{AtomicU64, Ordering};

/// Session-wide counters
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Publications sent (puts and deletes)
    pub publications: AtomicU64,
    /// Samples handed to local subscribers
    pub deliveries: AtomicU64,
    /// Gets issued
    pub queries_sent: AtomicU64,
    /// Queries handed to local queryables
    pub queries_received: AtomicU64,
    /// Replies sent by local queryables
    pub replies_sent: AtomicU64,
    /// Replies received for local gets, before consolidation
    pub replies_received: AtomicU64,
    /// Entities declared
    pub declarations: AtomicU64,
    /// Entities undeclared
    pub undeclarations: AtomicU64,
}

impl SessionStats {
    /// Create new statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities currently declared
    pub fn active_declarations(&self) -> u64 {
        let declared = self.declarations.load(Ordering::Relaxed);
        let undeclared = self.undeclarations.load(Ordering::Relaxed);
        declared.saturating_sub(undeclared)
    }

    pub fn total_publications(&self) -> u64 {
        self.publications.load(Ordering::Relaxed)
    }

    pub fn total_deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    pub(crate) fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_n(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}
