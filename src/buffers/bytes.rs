//! Opaque, possibly segmented, reference-counted payload container

use std::{borrow::Cow, fmt};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{RelayError, Result};

use super::{
    reader::BytesReader,
    segment::Segment,
    writer::BytesWriter,
};

/// An ordered sequence of octets backed by zero or more shared segments.
///
/// Cloning bumps reference counts and never copies payload memory. Mutation
/// goes through [`Bytes::make_exclusive`], which deep-copies only when the
/// content is shared or split over several segments.
#[derive(Clone, Default)]
pub struct Bytes {
    segments: Vec<Segment>,
}

impl Bytes {
    /// An empty container; allocates nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copy `data` into a new container
    pub fn from_buffer(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Take ownership of `data` without copying
    pub fn from_vec(data: Vec<u8>) -> Self {
        if data.is_empty() {
            return Self::empty();
        }
        Self {
            segments: vec![Segment::from_vec(data)],
        }
    }

    /// Wrap caller memory without copying.
    ///
    /// `on_release` receives the buffer back exactly once, when the last
    /// clone referencing it is dropped.
    pub fn from_buffer_with_release<B, F>(buffer: B, on_release: F) -> Self
    where
        B: AsRef<[u8]> + Send + Sync + 'static,
        F: FnOnce(B) + Send + 'static,
    {
        Self {
            segments: vec![Segment::from_foreign(buffer, on_release)],
        }
    }

    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total length across all segments
    pub fn len(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Check if there are no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-contiguous segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over contiguous spans without copying.
    ///
    /// The iterator borrows; a fresh one starts again from the first span.
    pub fn slices(&self) -> SliceIter<'_> {
        SliceIter {
            inner: self.segments.iter(),
        }
    }

    /// Positioned read view
    pub fn reader(&self) -> BytesReader<'_> {
        BytesReader::new(self)
    }

    /// Start building a new container
    pub fn writer() -> BytesWriter {
        BytesWriter::new()
    }

    /// Contiguous view; borrows when there is at most one segment
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self.segments.as_slice() {
            [] => Cow::Borrowed(&[]),
            [single] => Cow::Borrowed(single.as_slice()),
            _ => Cow::Owned(self.to_vec()),
        }
    }

    /// Copy all bytes into a vector
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for slice in self.slices() {
            out.extend_from_slice(slice);
        }
        out
    }

    /// Decode as UTF-8; invalid content is an error, never an empty string
    pub fn try_to_string(&self) -> Result<Cow<'_, str>> {
        match self.to_bytes() {
            Cow::Borrowed(bytes) => Ok(Cow::Borrowed(std::str::from_utf8(bytes)?)),
            Cow::Owned(bytes) => Ok(Cow::Owned(String::from_utf8(bytes)?)),
        }
    }

    /// Decode as UTF-8, replacing invalid sequences
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    /// Get a mutable buffer holding this content, copying if shared
    pub fn make_exclusive(&mut self) -> &mut Vec<u8> {
        let exclusive = self.segments.len() == 1
            && self.segments.first_mut().map_or(false, Segment::is_exclusive_vec);
        if !exclusive {
            let data = self.to_vec();
            self.segments = vec![Segment::from_vec(data)];
        }
        match self.segments[0].vec_mut() {
            Some(data) => data,
            None => unreachable!("a freshly built segment has a single owner"),
        }
    }

    /// Encode a serde value through the writer view
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let mut writer = BytesWriter::new();
        bincode::serialize_into(&mut writer, value)
            .map_err(|e| RelayError::generic(format!("Serialization failed: {}", e)))?;
        Ok(writer.finish())
    }

    /// Decode a serde value through the reader view
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(bincode::deserialize_from(self.reader())?)
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bytes")
            .field("len", &self.len())
            .field("segments", &self.segments.len())
            .finish()
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Bytes {}

impl From<Vec<u8>> for Bytes {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for Bytes {
    fn from(data: &[u8]) -> Self {
        Self::from_buffer(data)
    }
}

impl<const N: usize> From<&[u8; N]> for Bytes {
    fn from(data: &[u8; N]) -> Self {
        Self::from_buffer(data)
    }
}

impl From<String> for Bytes {
    fn from(data: String) -> Self {
        Self::from_vec(data.into_bytes())
    }
}

impl From<&str> for Bytes {
    fn from(data: &str) -> Self {
        Self::from_buffer(data.as_bytes())
    }
}

/// Lazily yields the contiguous spans of a [`Bytes`]
#[derive(Debug, Clone)]
pub struct SliceIter<'a> {
    inner: std::slice::Iter<'a, Segment>,
}

impl<'a> Iterator for SliceIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Segment::as_slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
