//! Append-only builder producing a [`Bytes`]

use std::io;

use super::{bytes::Bytes, segment::Segment};

/// Builds a [`Bytes`] from copied slices and zero-copy appended containers
#[derive(Debug, Default)]
pub struct BytesWriter {
    segments: Vec<Segment>,
    tail: Vec<u8>,
}

impl BytesWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another container without copying its content
    pub fn append(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.flush_tail();
        self.segments.extend(bytes.segments().iter().cloned());
    }

    /// Copy `buf` at the end
    pub fn write_all(&mut self, buf: &[u8]) {
        self.tail.extend_from_slice(buf);
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.segments.iter().map(Segment::len).sum::<usize>() + self.tail.len()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seal the writer into an immutable container
    pub fn finish(mut self) -> Bytes {
        self.flush_tail();
        Bytes::from_segments(self.segments)
    }

    fn flush_tail(&mut self) {
        if !self.tail.is_empty() {
            let tail = std::mem::take(&mut self.tail);
            self.segments.push(Segment::from_vec(tail));
        }
    }
}

impl io::Write for BytesWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tail.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
