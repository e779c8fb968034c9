//! # Keyrelay - key-expression publish/subscribe/query core
//!
//! Keyrelay routes publications and queries between declared entities by
//! matching hierarchical key expressions such as `robot/*/pose` or
//! `building/**`.
//!
//! ## Features
//!
//! - **Key expressions**: canonical forms, `*`, `**` and `$*` wildcards, inclusion and intersection
//! - **Payloads**: segmented, cheaply clonable [`Bytes`] with zero-copy slices
//! - **Pub/sub**: subscribers and publishers with encoding, QoS, timestamps and attachments
//! - **Queries**: `get` against queryables with target selection, consolidation and timeouts
//! - **Delivery**: callbacks, blocking [`FifoChannel`]s and lossy [`RingChannel`]s
//! - **Liveliness**: tokens, liveliness subscribers and liveliness gets
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Session                     │
//! │  publishers  subscribers  queryables  gets   │
//! ├──────────────────────────────────────────────┤
//! │  registry (key expression matching)          │
//! │  consolidation + query timer                 │
//! └──────────────────────────────────────────────┘
//!           │                         ▲
//!           ▼ push/request/respond    │ handle_*
//! ┌──────────────────────────────────────────────┐
//! │                 Transport                    │
//! └──────────────────────────────────────────────┘
//! ```

pub mod buffers;
pub mod channels;
pub mod error;
pub mod key_expr;
pub mod logging;
pub mod query;
pub mod resource;
pub mod session;
pub mod transport;

// Main API re-exports
pub use buffers::{Bytes, BytesReader, BytesWriter};
pub use channels::{
    Callback, DefaultHandler, FifoChannel, FifoChannelHandler, IntoHandler, RingChannel,
    RingChannelHandler,
};
pub use error::{ErrorKind, RelayError, Result};
pub use key_expr::KeyExpr;
pub use logging::{init_log_from_env, try_init_log_from_env};
pub use query::{ConsolidationMode, QueryTarget};
pub use resource::{
    CongestionControl, Encoding, Parameters, Priority, QoS, Query, Reply, ReplyError, Sample,
    SampleKind, Selector, SessionId, Timestamp,
};
pub use session::{
    Config, EntityState, GetOptions, Liveliness, LivelinessToken, Publisher, PublisherOptions,
    PutOptions, Querier, QuerierOptions, Queryable, QueryableOptions, Session, SessionStats,
    Subscriber,
};
pub use transport::{
    Declaration, LocalTransport, PushMessage, RequestMessage, ResponseMessage, Transport,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Default configuration constants
pub mod config {
    use std::time::Duration;

    /// Timeout of a get that sets none (10s)
    pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

    /// Capacity of channels built from the session configuration
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

    /// Largest channel capacity a configuration accepts
    pub const MAX_CHANNEL_CAPACITY: usize = 1 << 20;
}
