//! Replies to a query: a sample or an error, never both

use std::fmt;

use crate::buffers::Bytes;

use super::{encoding::Encoding, sample::Sample, time::SessionId};

/// Error payload sent by a queryable instead of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyError {
    payload: Bytes,
    encoding: Encoding,
}

impl ReplyError {
    pub fn new(payload: impl Into<Bytes>, encoding: Encoding) -> Self {
        Self {
            payload: payload.into(),
            encoding,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reply error ({}): {}", self.encoding, self.payload.to_string_lossy())
    }
}

impl std::error::Error for ReplyError {}

/// One answer received by a `get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    result: Result<Sample, ReplyError>,
    replier_id: Option<SessionId>,
}

impl Reply {
    pub fn ok(sample: Sample) -> Self {
        Self {
            result: Ok(sample),
            replier_id: None,
        }
    }

    pub fn err(error: ReplyError) -> Self {
        Self {
            result: Err(error),
            replier_id: None,
        }
    }

    pub fn with_replier_id(mut self, replier_id: SessionId) -> Self {
        self.replier_id = Some(replier_id);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn result(&self) -> Result<&Sample, &ReplyError> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Result<Sample, ReplyError> {
        self.result
    }

    /// Session that produced this reply, when known
    pub fn replier_id(&self) -> Option<SessionId> {
        self.replier_id
    }

    pub(crate) fn result_mut(&mut self) -> Result<&mut Sample, &mut ReplyError> {
        self.result.as_mut()
    }
}

impl From<Sample> for Reply {
    fn from(sample: Sample) -> Self {
        Reply::ok(sample)
    }
}

impl From<ReplyError> for Reply {
    fn from(error: ReplyError) -> Self {
        Reply::err(error)
    }
}
