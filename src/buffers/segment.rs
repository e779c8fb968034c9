//! Reference-counted contiguous segments backing a [`Bytes`](super::Bytes)

use std::{fmt, sync::Arc};

use parking_lot::Mutex;

/// Caller-owned memory handed over without copying
trait ForeignBuffer: Send + Sync {
    fn as_slice(&self) -> &[u8];
}

/// Foreign memory plus the callback that gives it back to its owner
struct Released<B, F>
where
    B: AsRef<[u8]> + Send + Sync,
    F: FnOnce(B) + Send,
{
    buffer: Option<B>,
    on_release: Mutex<Option<F>>,
}

impl<B, F> ForeignBuffer for Released<B, F>
where
    B: AsRef<[u8]> + Send + Sync,
    F: FnOnce(B) + Send,
{
    fn as_slice(&self) -> &[u8] {
        self.buffer.as_ref().map(AsRef::as_ref).unwrap_or(&[])
    }
}

impl<B, F> Drop for Released<B, F>
where
    B: AsRef<[u8]> + Send + Sync,
    F: FnOnce(B) + Send,
{
    fn drop(&mut self) {
        if let (Some(buffer), Some(on_release)) = (self.buffer.take(), self.on_release.get_mut().take()) {
            on_release(buffer);
        }
    }
}

enum Backing {
    Owned(Vec<u8>),
    Foreign(Box<dyn ForeignBuffer>),
}

/// One contiguous run of bytes, shared between clones
#[derive(Clone)]
pub(crate) struct Segment {
    inner: Arc<Backing>,
}

impl Segment {
    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(Backing::Owned(data)),
        }
    }

    /// Wrap caller memory; `on_release` runs once, when the last clone drops
    pub(crate) fn from_foreign<B, F>(buffer: B, on_release: F) -> Self
    where
        B: AsRef<[u8]> + Send + Sync + 'static,
        F: FnOnce(B) + Send + 'static,
    {
        let released = Released {
            buffer: Some(buffer),
            on_release: Mutex::new(Some(on_release)),
        };
        Self {
            inner: Arc::new(Backing::Foreign(Box::new(released))),
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match &*self.inner {
            Backing::Owned(data) => data,
            Backing::Foreign(foreign) => foreign.as_slice(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether this is the only handle to a growable owned buffer
    pub(crate) fn is_exclusive_vec(&mut self) -> bool {
        matches!(Arc::get_mut(&mut self.inner), Some(Backing::Owned(_)))
    }

    pub(crate) fn vec_mut(&mut self) -> Option<&mut Vec<u8>> {
        match Arc::get_mut(&mut self.inner) {
            Some(Backing::Owned(data)) => Some(data),
            _ => None,
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.inner {
            Backing::Owned(_) => "owned",
            Backing::Foreign(_) => "foreign",
        };
        f.debug_struct("Segment")
            .field("kind", &kind)
            .field("len", &self.len())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
