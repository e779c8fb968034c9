//! Subscriber handle

use std::{
    fmt,
    ops::Deref,
    sync::{Arc, Weak},
};

use crate::{error::Result, key_expr::KeyExpr};

use super::{
    entity::{EntityState, Lifecycle},
    session::SessionInner,
};

/// A declared subscriber; samples reach the handler it was declared with.
///
/// Dropping it undeclares the subscription.
pub struct Subscriber<H> {
    id: u64,
    key_expr: KeyExpr,
    liveliness: bool,
    session: Weak<SessionInner>,
    lifecycle: Lifecycle,
    handler: H,
}

impl<H> Subscriber<H> {
    pub(crate) fn new(
        id: u64,
        key_expr: KeyExpr,
        liveliness: bool,
        session: &Arc<SessionInner>,
        handler: H,
    ) -> Self {
        let lifecycle = Lifecycle::new("subscriber");
        lifecycle.activate();
        Self {
            id,
            key_expr,
            liveliness,
            session: Arc::downgrade(session),
            lifecycle,
            handler,
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    pub fn state(&self) -> EntityState {
        self.lifecycle.state()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Stop receiving samples; the handler is disconnected. Safe to repeat.
    pub fn undeclare(&self) -> Result<()> {
        if self.lifecycle.undeclare() {
            if let Some(session) = self.session.upgrade() {
                if self.liveliness {
                    session.undeclare_liveliness_subscriber(self.id, &self.key_expr);
                } else {
                    session.undeclare_subscriber(self.id, &self.key_expr);
                }
            }
        }
        Ok(())
    }
}

impl<H> Deref for Subscriber<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handler
    }
}

impl<H> Drop for Subscriber<H> {
    fn drop(&mut self) {
        let _ = self.undeclare();
    }
}

impl<H> fmt::Debug for Subscriber<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("key_expr", &self.key_expr)
            .field("liveliness", &self.liveliness)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
