//! Inbound queries handed to queryables

use std::{fmt, sync::Arc};

use crate::{
    buffers::Bytes,
    error::{RelayError, Result},
    key_expr::KeyExpr,
};

use super::{
    encoding::Encoding,
    reply::{Reply, ReplyError},
    sample::Sample,
    selector::{Parameters, Selector},
};

/// Where the replies of one query go.
///
/// `finalize` is called exactly once, when the last handle on the query is
/// dropped, and tells the requester that this responder is done.
pub(crate) trait ReplySink: Send + Sync {
    fn send_reply(&self, reply: Reply) -> Result<()>;
    fn finalize(&self);
}

/// Request data carried by a query
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryBody {
    pub payload: Option<Bytes>,
    pub encoding: Option<Encoding>,
    pub attachment: Option<Bytes>,
}

struct QueryInner {
    selector: Selector,
    body: QueryBody,
    sink: Box<dyn ReplySink>,
}

impl Drop for QueryInner {
    fn drop(&mut self) {
        self.sink.finalize();
    }
}

/// A request received by a queryable.
///
/// Replies may be sent while any clone of the query is alive. Dropping the
/// last clone closes the query for this responder; a callback that does not
/// keep the query therefore answers it by returning.
#[derive(Clone)]
pub struct Query {
    inner: Arc<QueryInner>,
}

impl Query {
    pub(crate) fn new(selector: Selector, body: QueryBody, sink: Box<dyn ReplySink>) -> Self {
        Self {
            inner: Arc::new(QueryInner {
                selector,
                body,
                sink,
            }),
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.inner.selector
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.inner.selector.key_expr
    }

    pub fn parameters(&self) -> &Parameters {
        &self.inner.selector.parameters
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.inner.body.payload.as_ref()
    }

    pub fn encoding(&self) -> Option<&Encoding> {
        self.inner.body.encoding.as_ref()
    }

    pub fn attachment(&self) -> Option<&Bytes> {
        self.inner.body.attachment.as_ref()
    }

    /// Reply with a `Put` sample
    pub fn reply<K>(&self, key_expr: K, payload: impl Into<Bytes>) -> Result<()>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = key_expr.try_into().map_err(Into::into)?;
        self.reply_sample(Sample::put(key_expr, payload))
    }

    /// Reply with a `Delete` sample
    pub fn reply_delete<K>(&self, key_expr: K) -> Result<()>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = key_expr.try_into().map_err(Into::into)?;
        self.reply_sample(Sample::delete(key_expr))
    }

    /// Reply with a fully built sample; its key must intersect the query's
    pub fn reply_sample(&self, sample: Sample) -> Result<()> {
        if !self.key_expr().intersects(sample.key_expr()) {
            return Err(RelayError::invalid_argument(
                "key_expr",
                format!(
                    "reply key '{}' does not intersect query key '{}'",
                    sample.key_expr(),
                    self.key_expr()
                ),
            ));
        }
        self.inner.sink.send_reply(Reply::ok(sample))
    }

    /// Reply with an error payload using the default encoding
    pub fn reply_err(&self, payload: impl Into<Bytes>) -> Result<()> {
        self.reply_error(ReplyError::new(payload, Encoding::default()))
    }

    pub fn reply_error(&self, error: ReplyError) -> Result<()> {
        self.inner.sink.send_reply(Reply::err(error))
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("selector", &self.inner.selector)
            .field("body", &self.inner.body)
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.selector)
    }
}
