//! Session facade: declarations, publications, gets and liveliness
//!
//! A [`Session`] routes everything published or queried through it to the
//! matching local entities, and hands outbound traffic to its
//! [`Transport`](crate::transport::Transport). Inbound traffic from the
//! transport enters through the `handle_*` methods.

pub mod config;
pub mod entity;
pub mod liveliness;
pub mod options;
pub mod publisher;
pub mod querier;
pub mod queryable;
mod registry;
#[allow(clippy::module_inception)]
pub mod session;
mod sinks;
pub mod stats;
pub mod subscriber;

pub use config::Config;
pub use entity::EntityState;
pub use liveliness::{Liveliness, LivelinessToken};
pub use options::{GetOptions, PublisherOptions, PutOptions, QuerierOptions, QueryableOptions};
pub use publisher::Publisher;
pub use querier::Querier;
pub use queryable::Queryable;
pub use session::Session;
pub use stats::SessionStats;
pub use subscriber::Subscriber;
