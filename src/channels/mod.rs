//! Delivery channels between the transport thread and application code
//!
//! Every declaration consumes its items either through a [`Callback`] run on
//! the delivering thread, or through a bounded channel:
//! - [`FifoChannel`] blocks the producer while full (backpressure)
//! - [`RingChannel`] evicts the oldest item while full (never blocks)
//!
//! A channel is open until its producer is closed or dropped, then drains
//! whatever is buffered and reports disconnection.

pub mod bounded;
pub mod error;
pub mod handler;
pub mod stats;

#[cfg(test)]
mod tests;

pub use bounded::{bounded, Consumer, Iter, OverflowPolicy, Producer, TryIter};
pub use error::{RecvError, RecvTimeoutError, TryRecvError};
pub use handler::{
    Callback, DefaultHandler, FifoChannel, FifoChannelHandler, IntoHandler, RingChannel,
    RingChannelHandler,
};
pub use stats::ChannelStats;
