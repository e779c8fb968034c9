//! One arrived publication

use crate::{buffers::Bytes, key_expr::KeyExpr};

use super::{
    encoding::Encoding,
    qos::{CongestionControl, Priority, QoS, SampleKind},
    time::Timestamp,
};

/// A put or delete on a key, with its payload and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    key_expr: KeyExpr,
    payload: Bytes,
    kind: SampleKind,
    encoding: Encoding,
    timestamp: Option<Timestamp>,
    qos: QoS,
    attachment: Option<Bytes>,
}

impl Sample {
    /// A `Put` sample
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

    /// A `Delete` sample with an empty payload
    pub fn delete(key_expr: KeyExpr) -> Self {
        Self {
            kind: SampleKind::Delete,
            ..Self::put(key_expr, Bytes::empty())
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<Bytes>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    pub(crate) fn set_timestamp_if_absent(&mut self, timestamp: impl FnOnce() -> Timestamp) {
        if self.timestamp.is_none() {
            self.timestamp = Some(timestamp());
        }
    }

    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Take the payload, dropping the rest of the sample
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn priority(&self) -> Priority {
        self.qos.priority
    }

    pub fn congestion_control(&self) -> CongestionControl {
        self.qos.congestion_control
    }

    pub fn express(&self) -> bool {
        self.qos.express
    }

    pub fn attachment(&self) -> Option<&Bytes> {
        self.attachment.as_ref()
    }
}
