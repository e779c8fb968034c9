//! Bounded single-producer queue shared by the ring and fifo policies
//!
//! The queue is guarded by a `parking_lot::Mutex`; blocking on either side
//! waits on a condition variable. `parking_lot` locks do not poison, so a
//! panic elsewhere never leaves the queue unusable.

use std::{
    collections::VecDeque,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use super::{
    error::{RecvError, RecvTimeoutError, TryRecvError},
    stats::{AtomicChannelStats, ChannelStats},
};

/// What a push does when the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverflowPolicy {
    /// Wait for the consumer to free a slot (fifo)
    Block,
    /// Evict the oldest buffered item (ring)
    DropOldest,
}

struct State<T> {
    queue: VecDeque<T>,
    producer_alive: bool,
    consumer_alive: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
    stats: AtomicChannelStats,
}

/// Create a bounded channel; a zero capacity is raised to one
pub fn bounded<T>(capacity: usize, policy: OverflowPolicy) -> (Producer<T>, Consumer<T>) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::with_capacity(capacity),
            producer_alive: true,
            consumer_alive: true,
        }),
        not_empty: Condvar::new(),
        not_full: Condvar::new(),
        capacity,
        policy,
        stats: AtomicChannelStats::default(),
    });
    (
        Producer {
            shared: shared.clone(),
        },
        Consumer { shared },
    )
}

/// Sending half; exactly one exists per channel
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Producer<T> {
    /// Move an item into the channel.
    ///
    /// Returns `false` when the item was discarded because either side is
    /// gone. Never panics.
    pub fn push(&self, item: T) -> bool {
        let shared = &*self.shared;
        let mut state = shared.state.lock();

        if !(state.producer_alive && state.consumer_alive) {
            drop(state);
            shared.stats.record_rejected();
            return false;
        }

        let mut evicted = None;
        if state.queue.len() >= shared.capacity {
            match shared.policy {
                OverflowPolicy::DropOldest => {
                    evicted = state.queue.pop_front();
                    shared.stats.record_eviction();
                }
                OverflowPolicy::Block => {
                    shared.stats.record_blocked_push();
                    while state.queue.len() >= shared.capacity
                        && state.producer_alive
                        && state.consumer_alive
                    {
                        shared.not_full.wait(&mut state);
                    }
                    if !(state.producer_alive && state.consumer_alive) {
                        drop(state);
                        shared.stats.record_rejected();
                        return false;
                    }
                }
            }
        }

        state.queue.push_back(item);
        drop(state);
        shared.stats.record_push();
        shared.not_empty.notify_one();
        // Dropped outside the lock: an item's destructor may run user code.
        drop(evicted);
        true
    }

    /// Disconnect the channel. Buffered items stay available to the consumer.
    pub fn close(&self) {
        let shared = &*self.shared;
        let mut state = shared.state.lock();
        if !state.producer_alive {
            return;
        }
        state.producer_alive = false;
        drop(state);
        log::trace!("channel producer closed");
        shared.not_empty.notify_all();
        shared.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        let state = self.shared.state.lock();
        !(state.producer_alive && state.consumer_alive)
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("policy", &self.shared.policy)
            .field("capacity", &self.shared.capacity)
            .finish()
    }
}

/// Receiving half.
///
/// Meant for one consumer thread. Concurrent receivers each get distinct
/// items, but the interleaving between them is unspecified.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Consumer<T> {
    fn take(&self, state: parking_lot::MutexGuard<'_, State<T>>, item: T) -> T {
        drop(state);
        self.shared.stats.record_receive();
        self.shared.not_full.notify_one();
        item
    }

    /// Block until an item arrives or the channel is disconnected and drained
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Ok(self.take(state, item));
            }
            if !state.producer_alive {
                return Err(RecvError);
            }
            self.shared.not_empty.wait(&mut state);
        }
    }

    /// Never blocks
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.shared.state.lock();
        let next = state.queue.pop_front();
        match next {
            Some(item) => Ok(self.take(state, item)),
            None if state.producer_alive => Err(TryRecvError::Empty),
            None => Err(TryRecvError::Disconnected),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.recv_deadline(deadline),
            None => self.recv().map_err(Into::into),
        }
    }

    pub fn recv_deadline(&self, deadline: Instant) -> Result<T, RecvTimeoutError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Ok(self.take(state, item));
            }
            if !state.producer_alive {
                return Err(RecvTimeoutError::Disconnected);
            }
            if self
                .shared
                .not_empty
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                let next = state.queue.pop_front();
                return match next {
                    Some(item) => Ok(self.take(state, item)),
                    None if state.producer_alive => Err(RecvTimeoutError::Timeout),
                    None => Err(RecvTimeoutError::Disconnected),
                };
            }
        }
    }

    /// Blocking iterator that ends once the channel is disconnected and drained
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { consumer: self }
    }

    /// Iterator over the items currently buffered
    pub fn try_iter(&self) -> TryIter<'_, T> {
        TryIter { consumer: self }
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.shared.policy
    }

    /// Whether the producer is gone; buffered items may remain
    pub fn is_disconnected(&self) -> bool {
        !self.shared.state.lock().producer_alive
    }

    pub fn stats(&self) -> ChannelStats {
        self.shared.stats.snapshot()
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.consumer_alive = false;
        let pending = std::mem::take(&mut state.queue);
        drop(state);
        self.shared.not_full.notify_all();
        drop(pending);
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("policy", &self.shared.policy)
            .field("capacity", &self.shared.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a Consumer<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    consumer: &'a Consumer<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.consumer.recv().ok()
    }
}

pub struct TryIter<'a, T> {
    consumer: &'a Consumer<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.consumer.try_recv().ok()
    }
}
