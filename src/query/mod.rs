//! Query/reply machinery: consolidation, in-flight gets and their deadlines

pub mod consolidation;
pub mod pending;
pub mod timer;


use serde::{Deserialize, Serialize};

pub use consolidation::{ConsolidationMode, Consolidator};
pub use pending::PendingGet;
pub use timer::QueryTimer;

/// Which queryables a `get` is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueryTarget {
    /// Complete queryables if any match, otherwise every matching queryable
    #[default]
    BestMatching,
    /// Every matching queryable
    All,
    /// Only complete queryables
    AllComplete,
}
