//! Boundary with the network layer
//!
//! The session hands every outbound operation to a [`Transport`]; the
//! transport feeds inbound traffic back through the `handle_*` methods of
//! [`crate::Session`].

use std::{fmt, time::Duration};

use crate::{
    buffers::Bytes,
    error::Result,
    key_expr::KeyExpr,
    query::{ConsolidationMode, QueryTarget},
    resource::{Encoding, QoS, Reply, Sample, SampleKind, Selector, Timestamp},
};

/// Outbound or inbound publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub key_expr: KeyExpr,
    pub payload: Bytes,
    pub kind: SampleKind,
    pub encoding: Encoding,
    pub timestamp: Option<Timestamp>,
    pub qos: QoS,
    pub attachment: Option<Bytes>,
}

impl PushMessage {
    pub fn put(key_expr: KeyExpr, payload: impl Into<Bytes>) -> Self {
        Self {
            key_expr,
            payload: payload.into(),
            kind: SampleKind::Put,
            encoding: Encoding::default(),
            timestamp: None,
            qos: QoS::default(),
            attachment: None,
        }
    }

    pub fn into_sample(self) -> Sample {
        let mut sample = match self.kind {
            SampleKind::Put => Sample::put(self.key_expr, self.payload),
            SampleKind::Delete => Sample::delete(self.key_expr),
        }
        .with_encoding(self.encoding)
        .with_qos(self.qos);
        if let Some(timestamp) = self.timestamp {
            sample = sample.with_timestamp(timestamp);
        }
        if let Some(attachment) = self.attachment {
            sample = sample.with_attachment(attachment);
        }
        sample
    }
}

impl From<&Sample> for PushMessage {
    fn from(sample: &Sample) -> Self {
        Self {
            key_expr: sample.key_expr().clone(),
            payload: sample.payload().clone(),
            kind: sample.kind(),
            encoding: sample.encoding().clone(),
            timestamp: sample.timestamp().copied(),
            qos: sample.qos(),
            attachment: sample.attachment().cloned(),
        }
    }
}

/// A `get` leaving this session, or a remote one arriving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMessage {
    /// Identifier chosen by the requesting session
    pub id: u64,
    pub selector: Selector,
    pub target: QueryTarget,
    pub consolidation: ConsolidationMode,
    pub timeout: Duration,
    pub payload: Option<Bytes>,
    pub encoding: Option<Encoding>,
    pub attachment: Option<Bytes>,
}

impl RequestMessage {
    pub fn new(id: u64, selector: Selector) -> Self {
        Self {
            id,
            selector,
            target: QueryTarget::default(),
            consolidation: ConsolidationMode::default(),
            timeout: Duration::ZERO,
            payload: None,
            encoding: None,
            attachment: None,
        }
    }
}

/// One reply to a remote request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    pub request_id: u64,
    pub reply: Reply,
}

/// Entity announced to the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Publisher { id: u64, key_expr: KeyExpr },
    Subscriber { id: u64, key_expr: KeyExpr },
    Queryable { id: u64, key_expr: KeyExpr, complete: bool },
    Querier { id: u64, key_expr: KeyExpr },
    LivelinessToken { id: u64, key_expr: KeyExpr },
    LivelinessSubscriber { id: u64, key_expr: KeyExpr },
}

impl Declaration {
    pub fn id(&self) -> u64 {
        match self {
            Declaration::Publisher { id, .. }
            | Declaration::Subscriber { id, .. }
            | Declaration::Queryable { id, .. }
            | Declaration::Querier { id, .. }
            | Declaration::LivelinessToken { id, .. }
            | Declaration::LivelinessSubscriber { id, .. } => *id,
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        match self {
            Declaration::Publisher { key_expr, .. }
            | Declaration::Subscriber { key_expr, .. }
            | Declaration::Queryable { key_expr, .. }
            | Declaration::Querier { key_expr, .. }
            | Declaration::LivelinessToken { key_expr, .. }
            | Declaration::LivelinessSubscriber { key_expr, .. } => key_expr,
        }
    }
}

/// Network collaborator of a session.
///
/// Calls may come from any application thread and must not call back into
/// the session synchronously.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send a publication to remote subscribers
    fn push(&self, message: PushMessage) -> Result<()>;

    /// Send a query; returns how many remote responders will answer it, each
    /// of which ends with [`crate::Session::handle_response_final`]
    fn request(&self, message: RequestMessage) -> Result<usize>;

    /// Send one reply to a remote request
    fn respond(&self, message: ResponseMessage) -> Result<()>;

    /// This session is done answering a remote request
    fn respond_final(&self, request_id: u64) -> Result<()>;

    fn declare(&self, _declaration: &Declaration) -> Result<()> {
        Ok(())
    }

    fn undeclare(&self, _declaration: &Declaration) -> Result<()> {
        Ok(())
    }
}

/// Transport with no peers: everything stays inside the session
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn push(&self, _message: PushMessage) -> Result<()> {
        Ok(())
    }

    fn request(&self, _message: RequestMessage) -> Result<usize> {
        Ok(0)
    }

    fn respond(&self, _message: ResponseMessage) -> Result<()> {
        Ok(())
    }

    fn respond_final(&self, _request_id: u64) -> Result<()> {
        Ok(())
    }
}
