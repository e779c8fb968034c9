//! Payload container and its reader, writer and slice views

pub mod bytes;
pub mod reader;
pub(crate) mod segment;
pub mod writer;

#[cfg(test)]
mod tests;

pub use bytes::{Bytes, SliceIter};
pub use reader::BytesReader;
pub use writer::BytesWriter;
