//! Message entities: samples, queries, replies and their metadata

pub mod encoding;
pub mod qos;
pub mod query;
pub mod reply;
pub mod sample;
pub mod selector;
pub mod time;


pub use encoding::Encoding;
pub use qos::{CongestionControl, Priority, QoS, SampleKind};
pub use query::Query;
pub(crate) use query::{QueryBody, ReplySink};
pub use reply::{Reply, ReplyError};
pub use sample::Sample;
pub use selector::{Parameters, Selector};
pub use time::{Clock, SessionId, Timestamp, TimestampId, NTP64};
