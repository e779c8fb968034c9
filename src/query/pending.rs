//! Bookkeeping for one in-flight `get`

use std::fmt;

use parking_lot::Mutex;

use crate::{channels::Callback, resource::Reply};

use super::consolidation::{ConsolidationMode, Consolidator};

struct Progress {
    consolidator: Consolidator,
    /// Announced responders minus finished ones. May dip below zero while
    /// dispatching, when a responder finishes before it is counted.
    outstanding: isize,
    dispatching: bool,
    closed: bool,
}

/// Replies of one `get`, routed through its consolidator into the caller's
/// handler. Closing flushes held replies and disconnects the handler.
pub struct PendingGet {
    id: u64,
    progress: Mutex<Progress>,
    callback: Callback<Reply>,
}

impl PendingGet {
    /// A get still being dispatched; call [`PendingGet::dispatched`] once
    /// every responder has been counted
    pub fn new(id: u64, mode: ConsolidationMode, callback: Callback<Reply>) -> Self {
        Self {
            id,
            progress: Mutex::new(Progress {
                consolidator: Consolidator::new(mode),
                outstanding: 0,
                dispatching: true,
                closed: false,
            }),
            callback,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn add_responders(&self, count: usize) {
        let mut progress = self.progress.lock();
        if !progress.closed {
            progress.outstanding += count as isize;
        }
    }

    pub fn on_reply(&self, reply: Reply) {
        let forward = {
            let mut progress = self.progress.lock();
            if progress.closed {
                log::trace!("get {}: reply after close dropped", self.id);
                return;
            }
            progress.consolidator.admit(reply)
        };
        if let Some(reply) = forward {
            self.callback.call(reply);
        }
    }

    /// One responder finished. Returns `true` if this closed the get.
    pub fn responder_done(&self) -> bool {
        let mut progress = self.progress.lock();
        if progress.closed {
            return false;
        }
        progress.outstanding -= 1;
        self.close_if_settled(progress)
    }

    /// Every responder has been counted. Returns `true` if this closed the get.
    pub fn dispatched(&self) -> bool {
        let mut progress = self.progress.lock();
        if progress.closed {
            return false;
        }
        progress.dispatching = false;
        self.close_if_settled(progress)
    }

    fn close_if_settled(&self, progress: parking_lot::MutexGuard<'_, Progress>) -> bool {
        if progress.dispatching || progress.outstanding > 0 {
            return false;
        }
        self.close_locked(progress);
        true
    }

    /// Close regardless of outstanding responders (timeout, teardown).
    /// Returns `true` if this closed the get.
    pub fn close(&self) -> bool {
        let progress = self.progress.lock();
        if progress.closed {
            return false;
        }
        self.close_locked(progress);
        true
    }

    fn close_locked(&self, mut progress: parking_lot::MutexGuard<'_, Progress>) {
        progress.closed = true;
        let held = progress.consolidator.flush();
        drop(progress);

        log::debug!("get {} closed, flushing {} held replies", self.id, held.len());
        for reply in held {
            self.callback.call(reply);
        }
        self.callback.close();
    }

    pub fn is_closed(&self) -> bool {
        self.progress.lock().closed
    }
}

impl fmt::Debug for PendingGet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingGet")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
