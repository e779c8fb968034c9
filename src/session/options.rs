//! Per-operation and per-declaration options

use std::time::Duration;

use crate::{
    buffers::Bytes,
    key_expr::KeyExpr,
    query::{ConsolidationMode, QueryTarget},
    resource::{Encoding, QoS, Sample, SampleKind, Timestamp},
};

/// Options of one put or delete
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub encoding: Option<Encoding>,
    pub timestamp: Option<Timestamp>,
    pub qos: Option<QoS>,
    pub attachment: Option<Bytes>,
}

impl PutOptions {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = Some(qos);
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<Bytes>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    /// Build the sample, filling unset fields from the publisher's defaults
    pub(crate) fn into_sample(
        self,
        key_expr: KeyExpr,
        kind: SampleKind,
        payload: Bytes,
        defaults: &PublisherOptions,
    ) -> Sample {
        let sample = match kind {
            SampleKind::Put => Sample::put(key_expr, payload),
            SampleKind::Delete => Sample::delete(key_expr),
        };
        let mut sample = sample
            .with_encoding(self.encoding.unwrap_or_else(|| defaults.encoding.clone()))
            .with_qos(self.qos.unwrap_or(defaults.qos));
        if let Some(timestamp) = self.timestamp {
            sample = sample.with_timestamp(timestamp);
        }
        if let Some(attachment) = self.attachment {
            sample = sample.with_attachment(attachment);
        }
        sample
    }
}

/// Options of one get
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub target: QueryTarget,
    /// Session default when unset
    pub consolidation: Option<ConsolidationMode>,
    /// Zero means the session's default query timeout
    pub timeout: Duration,
    pub payload: Option<Bytes>,
    pub encoding: Option<Encoding>,
    pub attachment: Option<Bytes>,
}

impl GetOptions {
    pub fn with_target(mut self, target: QueryTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_consolidation(mut self, mode: ConsolidationMode) -> Self {
        self.consolidation = Some(mode);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<Bytes>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

/// Defaults applied to every publication of a publisher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherOptions {
    pub encoding: Encoding,
    pub qos: QoS,
}

impl PublisherOptions {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }
}

/// Defaults applied to every get of a querier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuerierOptions {
    pub target: QueryTarget,
    pub consolidation: Option<ConsolidationMode>,
    /// Zero means the session's default query timeout
    pub timeout: Duration,
}

impl QuerierOptions {
    pub fn with_target(mut self, target: QueryTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_consolidation(mut self, mode: ConsolidationMode) -> Self {
        self.consolidation = Some(mode);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryableOptions {
    /// The queryable holds every key its expression covers
    pub complete: bool,
}

impl QueryableOptions {
    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }
}
