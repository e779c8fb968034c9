//! Querier handle

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    buffers::Bytes,
    channels::IntoHandler,
    error::{RelayError, Result},
    key_expr::KeyExpr,
    resource::{Parameters, Reply, Selector},
    transport::Declaration,
};

use super::{
    entity::{EntityState, Lifecycle},
    options::{GetOptions, QuerierOptions},
    session::SessionInner,
};

/// Issues gets on one key expression with fixed target, consolidation and timeout
pub struct Querier {
    id: u64,
    key_expr: KeyExpr,
    options: QuerierOptions,
    session: Weak<SessionInner>,
    lifecycle: Lifecycle,
}

impl Querier {
    pub(crate) fn declare(
        session: &Arc<SessionInner>,
        key_expr: KeyExpr,
        options: QuerierOptions,
    ) -> Result<Self> {
        let id = session.next_id();
        let querier = Self {
            id,
            key_expr,
            options,
            session: Arc::downgrade(session),
            lifecycle: Lifecycle::new("querier"),
        };
        session.register(&querier.declaration(), |_| {}, |_| {})?;
        querier.lifecycle.activate();
        Ok(querier)
    }

    fn declaration(&self) -> Declaration {
        Declaration::Querier {
            id: self.id,
            key_expr: self.key_expr.clone(),
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    pub fn options(&self) -> &QuerierOptions {
        &self.options
    }

    pub fn state(&self) -> EntityState {
        self.lifecycle.state()
    }

    pub fn get<H: IntoHandler<Reply>>(&self, handler: H) -> Result<H::Handler> {
        self.get_with(Parameters::empty(), None, handler)
    }

    pub fn get_with<H: IntoHandler<Reply>>(
        &self,
        parameters: impl Into<Parameters>,
        payload: Option<Bytes>,
        handler: H,
    ) -> Result<H::Handler> {
        self.lifecycle.ensure_active()?;
        let session = self.session.upgrade().ok_or(RelayError::SessionClosed)?;
        let selector = Selector::new(self.key_expr.clone(), parameters.into());
        let options = GetOptions {
            target: self.options.target,
            consolidation: self.options.consolidation,
            timeout: self.options.timeout,
            payload,
            ..GetOptions::default()
        };
        let (callback, handler) = handler.into_handler();
        session.get(selector, callback, options)?;
        Ok(handler)
    }

    pub fn undeclare(&self) -> Result<()> {
        if self.lifecycle.undeclare() {
            if let Some(session) = self.session.upgrade() {
                session.unregister(&self.declaration());
            }
        }
        Ok(())
    }
}

impl Drop for Querier {
    fn drop(&mut self) {
        let _ = self.undeclare();
    }
}

impl fmt::Debug for Querier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Querier")
            .field("id", &self.id)
            .field("key_expr", &self.key_expr)
            .field("options", &self.options)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
