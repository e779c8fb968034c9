//! Reply consolidation for one `get`

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{RelayError, Result},
    key_expr::KeyExpr,
    resource::{Reply, Timestamp},
};

/// Policy reducing the replies of a `get` to the ones surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationMode {
    /// Forward every reply
    None,
    /// Forward a reply unless a newer one for the same key was already forwarded
    Monotonic,
    /// Hold replies until the get closes, then forward the newest per key
    Latest,
    /// Resolves to `Monotonic`
    #[default]
    Auto,
}

impl ConsolidationMode {
    /// The concrete mode applied; only `Auto` changes
    pub fn resolve(self) -> ConsolidationMode {
        match self {
            ConsolidationMode::Auto => ConsolidationMode::Monotonic,
            other => other,
        }
    }
}

impl fmt::Display for ConsolidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsolidationMode::None => "none",
            ConsolidationMode::Monotonic => "monotonic",
            ConsolidationMode::Latest => "latest",
            ConsolidationMode::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for ConsolidationMode {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ConsolidationMode::None),
            "monotonic" => Ok(ConsolidationMode::Monotonic),
            "latest" => Ok(ConsolidationMode::Latest),
            "auto" => Ok(ConsolidationMode::Auto),
            _ => Err(RelayError::parse(s, "expected none, monotonic, latest or auto")),
        }
    }
}

/// Per-get consolidation state.
///
/// Replies are grouped by the key expression of their sample. Timestamps
/// order replies within a group; a reply without timestamp is older than any
/// reply with one. Untimed replies cannot be ordered among themselves, so
/// `Monotonic` forwards each of them until a timed reply has been forwarded
/// on that key. Error replies are never consolidated.
#[derive(Debug)]
pub struct Consolidator {
    mode: ConsolidationMode,
    forwarded: BTreeMap<KeyExpr, Option<Timestamp>>,
    held: BTreeMap<KeyExpr, Reply>,
}

impl Consolidator {
    pub fn new(mode: ConsolidationMode) -> Self {
        Self {
            mode: mode.resolve(),
            forwarded: BTreeMap::new(),
            held: BTreeMap::new(),
        }
    }

    /// The resolved mode
    pub fn mode(&self) -> ConsolidationMode {
        self.mode
    }

    /// Returns the reply if it must be forwarded now
    pub fn admit(&mut self, reply: Reply) -> Option<Reply> {
        let (key_expr, timestamp) = match reply.result() {
            Ok(sample) => (sample.key_expr().clone(), sample.timestamp().copied()),
            Err(_) => return Some(reply),
        };

        match self.mode {
            ConsolidationMode::Monotonic => match self.forwarded.get_mut(&key_expr) {
                Some(newest) if newest.is_some() && timestamp <= *newest => {
                    log::trace!("suppressing outdated reply on {}", key_expr);
                    None
                }
                Some(newest) => {
                    *newest = timestamp;
                    Some(reply)
                }
                None => {
                    self.forwarded.insert(key_expr, timestamp);
                    Some(reply)
                }
            },
            ConsolidationMode::Latest => {
                let newer = match self.held.get(&key_expr) {
                    Some(held) => timestamp > held_timestamp(held),
                    None => true,
                };
                if newer {
                    self.held.insert(key_expr, reply);
                }
                None
            }
            ConsolidationMode::None | ConsolidationMode::Auto => Some(reply),
        }
    }

    /// Replies held back until the get closes, ordered by key
    pub fn flush(&mut self) -> Vec<Reply> {
        std::mem::take(&mut self.held).into_values().collect()
    }

    /// Number of replies currently held back
    pub fn held(&self) -> usize {
        self.held.len()
    }
}

fn held_timestamp(reply: &Reply) -> Option<Timestamp> {
    reply
        .result()
        .ok()
        .and_then(|sample| sample.timestamp().copied())
}
