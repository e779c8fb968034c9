//! Queryable handle

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

/// A declared queryable; queries reach the handler it was declared with
pub struct Queryable<H> {
    id: u64,
    key_expr: KeyExpr,
    complete: bool,
    session: Weak<SessionInner>,
    lifecycle: Lifecycle,
    handler: H,
}

impl<H> Queryable<H> {
    pub(crate) fn new(
        id: u64,
        key_expr: KeyExpr,
        complete: bool,
        session: &Arc<SessionInner>,
        handler: H,
    ) -> Self {
        let lifecycle = Lifecycle::new("queryable");
        lifecycle.activate();
        Self {
            id,
            key_expr,
            complete,
            session: Arc::downgrade(session),
            lifecycle,
            handler,
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn state(&self) -> EntityState {
        self.lifecycle.state()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Stop receiving queries. Queries already handed out can still be
    /// answered until dropped.
    pub fn undeclare(&self) -> Result<()> {
        if self.lifecycle.undeclare() {
            if let Some(session) = self.session.upgrade() {
                session.undeclare_queryable(self.id, &self.key_expr, self.complete);
            }
        }
        Ok(())
    }
}

impl<H> Deref for Queryable<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handler
    }
}

impl<H> Drop for Queryable<H> {
    fn drop(&mut self) {
        let _ = self.undeclare();
    }
}

impl<H> fmt::Debug for Queryable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("id", &self.id)
            .field("key_expr", &self.key_expr)
            .field("complete", &self.complete)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
