//! Positioned read view over a [`Bytes`]

use std::io::{self, Read, Seek, SeekFrom};

use super::bytes::Bytes;

/// Cursor over the logical byte sequence of a [`Bytes`], across segments.
///
/// Reading never mutates the source; several readers may walk the same
/// content independently.
#[derive(Debug, Clone)]
pub struct BytesReader<'a> {
    bytes: &'a Bytes,
    position: usize,
    len: usize,
}

impl<'a> BytesReader<'a> {
    pub(crate) fn new(bytes: &'a Bytes) -> Self {
        Self {
            bytes,
            position: 0,
            len: bytes.len(),
        }
    }

    /// Current absolute position
    pub fn tell(&self) -> usize {
        self.position
    }

    /// Bytes left before the end
    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// Read up to `n` bytes, fewer if the end is reached first
    pub fn read_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n.min(self.remaining())];
        let read = self.copy_into(&mut out);
        out.truncate(read);
        out
    }

    fn copy_into(&mut self, buf: &mut [u8]) -> usize {
        let mut written = 0;
        let mut segment_start = 0;

        for segment in self.bytes.segments() {
            if written == buf.len() {
                break;
            }
            let slice = segment.as_slice();
            let segment_end = segment_start + slice.len();
            if self.position < segment_end {
                let offset = self.position - segment_start;
                let count = (slice.len() - offset).min(buf.len() - written);
                buf[written..written + count].copy_from_slice(&slice[offset..offset + count]);
                written += count;
                self.position += count;
            }
            segment_start = segment_end;
        }
        written
    }
}

impl Read for BytesReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.copy_into(buf))
    }
}

impl Seek for BytesReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(offset) => self.position as i128 + i128::from(offset),
            SeekFrom::End(offset) => self.len as i128 + i128::from(offset),
        };
        if target < 0 || target > self.len as i128 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek target {} outside 0..={}", target, self.len),
            ));
        }
        self.position = target as usize;
        Ok(self.position as u64)
    }
}
