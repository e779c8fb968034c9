//! Reply routing for queries delivered to local queryables

use std::sync::{Arc, Weak};

use crate::{
    error::{RelayError, Result},
    query::PendingGet,
    resource::{Reply, ReplySink, SessionId},
    transport::ResponseMessage,
};

use super::{session::SessionInner, stats::SessionStats};

/// Replies from a local queryable to a get issued by the same session
pub(crate) struct LocalReplySink {
    pub session: Weak<SessionInner>,
    pub get: Arc<PendingGet>,
    pub replier_id: SessionId,
}

impl ReplySink for LocalReplySink {
    fn send_reply(&self, mut reply: Reply) -> Result<()> {
        let session = self.session.upgrade().ok_or(RelayError::SessionClosed)?;
        session.stamp_reply(&mut reply);
        SessionStats::record(&session.stats.replies_sent);
        SessionStats::record(&session.stats.replies_received);
        self.get.on_reply(reply.with_replier_id(self.replier_id));
        Ok(())
    }

    fn finalize(&self) {
        if self.get.responder_done() {
            if let Some(session) = self.session.upgrade() {
                session.registry.remove_get(self.get.id());
            }
        }
    }
}

/// One remote request being answered by this session's queryables.
///
/// Shared by every query built for the request; when the last one is gone
/// the requester is told this session is done.
pub(crate) struct RemoteRequest {
    pub session: Weak<SessionInner>,
    pub request_id: u64,
}

impl Drop for RemoteRequest {
    fn drop(&mut self) {
        if let Some(session) = self.session.upgrade() {
            if let Err(err) = session.transport.respond_final(self.request_id) {
                log::warn!("failed to finalize request {}: {}", self.request_id, err);
            }
        }
    }
}

pub(crate) struct RemoteReplySink {
    pub request: Arc<RemoteRequest>,
}

impl ReplySink for RemoteReplySink {
    fn send_reply(&self, mut reply: Reply) -> Result<()> {
        let session = self
            .request
            .session
            .upgrade()
            .ok_or(RelayError::SessionClosed)?;
        session.stamp_reply(&mut reply);
        SessionStats::record(&session.stats.replies_sent);
        session.transport.respond(ResponseMessage {
            request_id: self.request.request_id,
            reply: reply.with_replier_id(session.zid),
        })
    }

    fn finalize(&self) {}
}
