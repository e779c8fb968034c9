//! Background thread expiring `get` operations at their deadline

use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use parking_lot::{Condvar, Mutex};

use crate::error::{RelayError, Result};

#[derive(Debug, PartialEq, Eq)]
struct Deadline {
    at: Instant,
    get_id: u64,
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap; the earliest deadline must come out first
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.get_id.cmp(&self.get_id))
    }
}

struct TimerState {
    deadlines: BinaryHeap<Deadline>,
    shutdown: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    wakeup: Condvar,
}

/// Calls `on_expire(get_id)` on a dedicated thread once each scheduled
/// deadline passes. Expiring an already finished get must be a no-op for the
/// callee; the timer never cancels entries.
pub struct QueryTimer {
    shared: Arc<TimerShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueryTimer {
    pub fn start<F>(on_expire: F) -> Result<Self>
    where
        F: Fn(u64) + Send + 'static,
    {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                deadlines: BinaryHeap::new(),
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("keyrelay-query-timer".to_string())
            .spawn(move || run_timer_loop(&worker_shared, on_expire))
            .map_err(|err| RelayError::from_io(err, "failed to spawn query timer"))?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn schedule(&self, get_id: u64, at: Instant) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return;
        }
        let earliest = state.deadlines.peek().map_or(true, |first| at < first.at);
        state.deadlines.push(Deadline { at, get_id });
        drop(state);
        if earliest {
            self.shared.wakeup.notify_one();
        }
    }

    /// Number of deadlines not yet reached
    pub fn scheduled(&self) -> usize {
        self.shared.state.lock().deadlines.len()
    }

    /// Stop the thread; pending deadlines are discarded. Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.deadlines.clear();
        }
        self.shared.wakeup.notify_all();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            // The timer thread itself may end up here through `on_expire`.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                log::warn!("query timer thread panicked");
            }
        }
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_timer_loop<F: Fn(u64)>(shared: &TimerShared, on_expire: F) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        let now = Instant::now();
        match state.deadlines.peek() {
            Some(first) if first.at <= now => {
                let get_id = state.deadlines.pop().map(|deadline| deadline.get_id);
                drop(state);
                if let Some(get_id) = get_id {
                    log::trace!("get {} reached its deadline", get_id);
                    on_expire(get_id);
                }
                state = shared.state.lock();
            }
            Some(first) => {
                let at = first.at;
                shared.wakeup.wait_until(&mut state, at);
            }
            None => shared.wakeup.wait(&mut state),
        }
    }
}
