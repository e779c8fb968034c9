//! Publisher handle

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    buffers::Bytes,
    error::{RelayError, Result},
    key_expr::KeyExpr,
    resource::SampleKind,
    transport::Declaration,
};

use super::{
    entity::{EntityState, Lifecycle},
    options::{PublisherOptions, PutOptions},
    session::SessionInner,
};

/// Publishes on one key expression with fixed default options
pub struct Publisher {
    id: u64,
    key_expr: KeyExpr,
    options: PublisherOptions,
    session: Weak<SessionInner>,
    lifecycle: Lifecycle,
}

impl Publisher {
    pub(crate) fn declare(
        session: &Arc<SessionInner>,
        key_expr: KeyExpr,
        options: PublisherOptions,
    ) -> Result<Self> {
        let id = session.next_id();
        let publisher = Self {
            id,
            key_expr,
            options,
            session: Arc::downgrade(session),
            lifecycle: Lifecycle::new("publisher"),
        };
        session.register(&publisher.declaration(), |_| {}, |_| {})?;
        publisher.lifecycle.activate();
        Ok(publisher)
    }

    fn declaration(&self) -> Declaration {
        Declaration::Publisher {
            id: self.id,
            key_expr: self.key_expr.clone(),
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    pub fn options(&self) -> &PublisherOptions {
        &self.options
    }

    pub fn state(&self) -> EntityState {
        self.lifecycle.state()
    }

    /// Publish `payload`, which is moved into the sample
    pub fn put(&self, payload: impl Into<Bytes>) -> Result<()> {
        self.put_with(payload, PutOptions::default())
    }

    pub fn put_with(&self, payload: impl Into<Bytes>, options: PutOptions) -> Result<()> {
        self.publish(SampleKind::Put, payload.into(), options)
    }

    pub fn delete(&self) -> Result<()> {
        self.delete_with(PutOptions::default())
    }

    pub fn delete_with(&self, options: PutOptions) -> Result<()> {
        self.publish(SampleKind::Delete, Bytes::empty(), options)
    }

    fn publish(&self, kind: SampleKind, payload: Bytes, options: PutOptions) -> Result<()> {
        self.lifecycle.ensure_active()?;
        let session = self.session.upgrade().ok_or(RelayError::SessionClosed)?;
        let sample = options.into_sample(self.key_expr.clone(), kind, payload, &self.options);
        session.publish(sample)
    }

    /// Later publications fail with a disposed error. Safe to repeat.
    pub fn undeclare(&self) -> Result<()> {
        if self.lifecycle.undeclare() {
            if let Some(session) = self.session.upgrade() {
                session.unregister(&self.declaration());
            }
        }
        Ok(())
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        let _ = self.undeclare();
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("id", &self.id)
            .field("key_expr", &self.key_expr)
            .field("options", &self.options)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
