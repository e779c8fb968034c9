//! Consumption modes for declarations: callbacks or channels

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::config::DEFAULT_CHANNEL_CAPACITY;

use super::bounded::{bounded, Consumer, OverflowPolicy, Producer};

type CallFn<T> = dyn Fn(T) + Send + Sync;
type CloseFn = dyn Fn() + Send + Sync;

/// Function invoked on the delivering thread for every item.
///
/// A panic inside the function is caught and logged; it never unwinds into
/// the delivering thread.
pub struct Callback<T> {
    call: Arc<CallFn<T>>,
    on_close: Option<Arc<CloseFn>>,
}

impl<T> Callback<T> {
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(call),
            on_close: None,
        }
    }

    /// Run `on_close` when the owning declaration is torn down
    pub fn with_close<F>(mut self, on_close: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(on_close));
        self
    }

    pub fn call(&self, value: T) {
        if panic::catch_unwind(AssertUnwindSafe(|| (self.call)(value))).is_err() {
            log::warn!("user callback panicked; the item was dropped");
        }
    }

    pub(crate) fn close(&self) {
        if let Some(on_close) = &self.on_close {
            if panic::catch_unwind(AssertUnwindSafe(|| on_close())).is_err() {
                log::warn!("close callback panicked");
            }
        }
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
            on_close: self.on_close.clone(),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("has_close", &self.on_close.is_some())
            .finish()
    }
}

/// Turns a handler description into the callback the session drives and the
/// value handed back to the application.
pub trait IntoHandler<T> {
    type Handler;

    fn into_handler(self) -> (Callback<T>, Self::Handler);
}

impl<T, F> IntoHandler<T> for F
where
    F: Fn(T) + Send + Sync + 'static,
{
    type Handler = ();

    fn into_handler(self) -> (Callback<T>, ()) {
        (Callback::new(self), ())
    }
}

impl<T> IntoHandler<T> for Callback<T> {
    type Handler = ();

    fn into_handler(self) -> (Callback<T>, ()) {
        (self, ())
    }
}

fn channel_handler<T>(capacity: usize, policy: OverflowPolicy) -> (Callback<T>, Consumer<T>)
where
    T: Send + 'static,
{
    let (producer, consumer) = bounded(capacity, policy);
    let producer: Arc<Producer<T>> = Arc::new(producer);
    let closer = producer.clone();
    let callback = Callback::new(move |item| {
        if !producer.push(item) {
            log::trace!("item discarded by a closed channel");
        }
    })
    .with_close(move || closer.close());
    (callback, consumer)
}

/// Channel that blocks the delivering thread while full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoChannel {
    capacity: usize,
}

impl FifoChannel {
    /// A zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FifoChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl<T: Send + 'static> IntoHandler<T> for FifoChannel {
    type Handler = FifoChannelHandler<T>;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        channel_handler(self.capacity, OverflowPolicy::Block)
    }
}

/// Channel that evicts its oldest item while full, never blocking the
/// delivering thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingChannel {
    capacity: usize,
}

impl RingChannel {
    /// A zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RingChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl<T: Send + 'static> IntoHandler<T> for RingChannel {
    type Handler = RingChannelHandler<T>;

    fn into_handler(self) -> (Callback<T>, Self::Handler) {
        channel_handler(self.capacity, OverflowPolicy::DropOldest)
    }
}

pub type FifoChannelHandler<T> = Consumer<T>;
pub type RingChannelHandler<T> = Consumer<T>;

/// Handler used when the application does not pick one
pub type DefaultHandler = FifoChannel;
