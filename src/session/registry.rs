//! Local declarations and in-flight gets of a session
//!
//! Lookups clone the matching entries out under a read lock; callbacks are
//! always invoked after the lock is released.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use parking_lot::RwLock;

use crate::{
    channels::Callback,
    key_expr::KeyExpr,
    query::{PendingGet, QueryTarget},
    resource::{Query, Sample},
};

#[derive(Debug)]
pub(crate) struct SubscriberEntry {
    pub key_expr: KeyExpr,
    pub callback: Callback<Sample>,
}

#[derive(Debug)]
pub(crate) struct QueryableEntry {
    pub key_expr: KeyExpr,
    pub complete: bool,
    pub callback: Callback<Query>,
}

/// Everything torn down at once when the session closes
#[derive(Debug, Default)]
pub(crate) struct Drained {
    pub subscribers: Vec<Arc<SubscriberEntry>>,
    pub queryables: Vec<Arc<QueryableEntry>>,
    pub gets: Vec<Arc<PendingGet>>,
    pub tokens: Vec<(u64, KeyExpr)>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    subscribers: RwLock<HashMap<u64, Arc<SubscriberEntry>>>,
    liveliness_subscribers: RwLock<HashMap<u64, Arc<SubscriberEntry>>>,
    queryables: RwLock<HashMap<u64, Arc<QueryableEntry>>>,
    tokens: RwLock<HashMap<u64, KeyExpr>>,
    /// Alive tokens announced by the transport, with their announcement count
    remote_tokens: RwLock<BTreeMap<KeyExpr, usize>>,
    gets: RwLock<HashMap<u64, Arc<PendingGet>>>,
}

impl Registry {
    pub fn insert_subscriber(&self, id: u64, entry: SubscriberEntry) {
        self.subscribers.write().insert(id, Arc::new(entry));
    }

    pub fn remove_subscriber(&self, id: u64) -> Option<Arc<SubscriberEntry>> {
        self.subscribers.write().remove(&id)
    }

    pub fn matching_subscribers(&self, key_expr: &KeyExpr) -> Vec<Arc<SubscriberEntry>> {
        matching(&self.subscribers.read(), key_expr)
    }

    pub fn insert_liveliness_subscriber(&self, id: u64, entry: SubscriberEntry) {
        self.liveliness_subscribers.write().insert(id, Arc::new(entry));
    }

    pub fn remove_liveliness_subscriber(&self, id: u64) -> Option<Arc<SubscriberEntry>> {
        self.liveliness_subscribers.write().remove(&id)
    }

    pub fn matching_liveliness_subscribers(&self, key_expr: &KeyExpr) -> Vec<Arc<SubscriberEntry>> {
        matching(&self.liveliness_subscribers.read(), key_expr)
    }

    pub fn insert_queryable(&self, id: u64, entry: QueryableEntry) {
        self.queryables.write().insert(id, Arc::new(entry));
    }

    pub fn remove_queryable(&self, id: u64) -> Option<Arc<QueryableEntry>> {
        self.queryables.write().remove(&id)
    }

    /// Queryables that receive a query on `key_expr` under `target`.
    ///
    /// A complete queryable claims to hold every key it declares, so it only
    /// counts as complete for queries its key expression includes.
    pub fn targeted_queryables(
        &self,
        key_expr: &KeyExpr,
        target: QueryTarget,
    ) -> Vec<Arc<QueryableEntry>> {
        let queryables = self.queryables.read();
        let mut ids: Vec<_> = queryables
            .iter()
            .filter(|(_, entry)| entry.key_expr.intersects(key_expr))
            .map(|(id, entry)| (*id, entry))
            .collect();
        // Declaration order, so routing does not depend on hash order
        ids.sort_by_key(|(id, _)| *id);

        let is_complete =
            |entry: &QueryableEntry| entry.complete && entry.key_expr.includes(key_expr);
        let selected: Vec<_> = match target {
            QueryTarget::All => ids.into_iter().map(|(_, entry)| entry.clone()).collect(),
            QueryTarget::AllComplete => ids
                .into_iter()
                .filter(|(_, entry)| is_complete(entry))
                .map(|(_, entry)| entry.clone())
                .collect(),
            QueryTarget::BestMatching => {
                match ids.iter().find(|(_, entry)| is_complete(entry)) {
                    Some((_, entry)) => vec![(*entry).clone()],
                    None => ids.into_iter().map(|(_, entry)| entry.clone()).collect(),
                }
            }
        };
        selected
    }

    /// Add a local token; `true` when `key_expr` was not visible before.
    ///
    /// Visibility is decided under the token lock so that concurrent
    /// declarations on one key report a single appearance.
    pub fn insert_token(&self, id: u64, key_expr: KeyExpr) -> bool {
        let mut tokens = self.tokens.write();
        let visible = tokens.values().any(|token| *token == key_expr)
            || self.remote_tokens.read().contains_key(&key_expr);
        tokens.insert(id, key_expr);
        !visible
    }

    /// Remove a local token, with whether its key stopped being visible
    pub fn remove_token(&self, id: u64) -> Option<(KeyExpr, bool)> {
        let mut tokens = self.tokens.write();
        let key_expr = tokens.remove(&id)?;
        let vanished = !tokens.values().any(|token| *token == key_expr)
            && !self.remote_tokens.read().contains_key(&key_expr);
        Some((key_expr, vanished))
    }

    /// Record a remote token change; `true` when the token's visibility
    /// flipped, taking local tokens on the same key into account
    pub fn update_remote_token(&self, key_expr: &KeyExpr, alive: bool) -> bool {
        // tokens before remote_tokens, as everywhere else
        let tokens = self.tokens.read();
        let mut remote = self.remote_tokens.write();
        let flipped = if alive {
            let count = remote.entry(key_expr.clone()).or_insert(0);
            *count += 1;
            *count == 1
        } else {
            match remote.get_mut(key_expr) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    false
                }
                Some(_) => {
                    remote.remove(key_expr);
                    true
                }
                None => false,
            }
        };
        flipped && !tokens.values().any(|token| token == key_expr)
    }

    /// Distinct alive tokens, local and remote, intersecting `key_expr`
    pub fn alive_tokens(&self, key_expr: &KeyExpr) -> Vec<KeyExpr> {
        let mut alive: Vec<KeyExpr> = self
            .tokens
            .read()
            .values()
            .chain(self.remote_tokens.read().keys())
            .filter(|token| token.intersects(key_expr))
            .cloned()
            .collect();
        alive.sort();
        alive.dedup();
        alive
    }

    pub fn insert_get(&self, get: Arc<PendingGet>) {
        self.gets.write().insert(get.id(), get);
    }

    pub fn get(&self, id: u64) -> Option<Arc<PendingGet>> {
        self.gets.read().get(&id).cloned()
    }

    pub fn remove_get(&self, id: u64) -> Option<Arc<PendingGet>> {
        self.gets.write().remove(&id)
    }

    pub fn pending_gets(&self) -> usize {
        self.gets.read().len()
    }

    /// Empty every table
    pub fn drain(&self) -> Drained {
        let mut subscribers: Vec<_> = self.subscribers.write().drain().map(|(_, e)| e).collect();
        subscribers.extend(self.liveliness_subscribers.write().drain().map(|(_, e)| e));
        self.remote_tokens.write().clear();
        Drained {
            subscribers,
            queryables: self.queryables.write().drain().map(|(_, e)| e).collect(),
            gets: self.gets.write().drain().map(|(_, g)| g).collect(),
            tokens: self.tokens.write().drain().collect(),
        }
    }
}

fn matching(
    entries: &HashMap<u64, Arc<SubscriberEntry>>,
    key_expr: &KeyExpr,
) -> Vec<Arc<SubscriberEntry>> {
    entries
        .values()
        .filter(|entry| entry.key_expr.intersects(key_expr))
        .cloned()
        .collect()
}
