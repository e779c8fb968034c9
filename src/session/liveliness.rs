//! Liveliness tokens and the subscribers and gets that observe them
//!
//! A token is alive while it is declared. Liveliness subscribers see a `Put`
//! sample when a matching token appears and a `Delete` sample when it goes
//! away, whether the token is local or announced by the transport.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    channels::IntoHandler,
    error::{RelayError, Result},
    key_expr::KeyExpr,
    resource::{Reply, Sample},
};

use super::{
    entity::{EntityState, Lifecycle},
    session::{to_key_expr, Session, SessionInner},
    subscriber::Subscriber,
};

/// Entry point returned by [`Session::liveliness`]
#[derive(Debug, Clone, Copy)]
pub struct Liveliness<'a> {
    session: &'a Session,
}

impl<'a> Liveliness<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Declare a token, alive until it is undeclared or dropped
    pub fn declare_token<K>(&self, key_expr: K) -> Result<LivelinessToken>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let inner = &self.session.inner;
        let id = inner.declare_token(&key_expr)?;
        Ok(LivelinessToken::new(id, key_expr, inner))
    }

    /// Observe token changes from now on
    pub fn declare_subscriber<K, H>(&self, key_expr: K, handler: H) -> Result<Subscriber<H::Handler>>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
        H: IntoHandler<Sample>,
    {
        self.declare_subscriber_with_history(key_expr, handler, false)
    }

    /// With `history`, every token already alive is first delivered as a `Put`
    pub fn declare_subscriber_with_history<K, H>(
        &self,
        key_expr: K,
        handler: H,
        history: bool,
    ) -> Result<Subscriber<H::Handler>>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
        H: IntoHandler<Sample>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let (callback, handler) = handler.into_handler();
        let inner = &self.session.inner;
        let id = inner.declare_liveliness_subscriber(&key_expr, callback, history)?;
        Ok(Subscriber::new(id, key_expr, true, inner, handler))
    }

    /// One `Ok` reply per alive token intersecting `key_expr`, then the
    /// handler is disconnected
    pub fn get<K, H>(&self, key_expr: K, handler: H) -> Result<H::Handler>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
        H: IntoHandler<Reply>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let (callback, handler) = handler.into_handler();
        self.session.inner.liveliness_get(&key_expr, callback)?;
        Ok(handler)
    }
}

/// Keeps a liveliness key alive
pub struct LivelinessToken {
    id: u64,
    key_expr: KeyExpr,
    session: Weak<SessionInner>,
    lifecycle: Lifecycle,
}

impl LivelinessToken {
    fn new(id: u64, key_expr: KeyExpr, session: &Arc<SessionInner>) -> Self {
        let lifecycle = Lifecycle::new("liveliness token");
        lifecycle.activate();
        Self {
            id,
            key_expr,
            session: Arc::downgrade(session),
            lifecycle,
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    pub fn state(&self) -> EntityState {
        self.lifecycle.state()
    }

    pub fn undeclare(&self) -> Result<()> {
        if self.lifecycle.undeclare() {
            if let Some(session) = self.session.upgrade() {
                session.undeclare_token(self.id);
            }
        }
        Ok(())
    }
}

impl Drop for LivelinessToken {
    fn drop(&mut self) {
        let _ = self.undeclare();
    }
}

impl fmt::Debug for LivelinessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivelinessToken")
            .field("id", &self.id)
            .field("key_expr", &self.key_expr)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
