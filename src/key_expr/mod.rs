//! Key expression engine
//!
//! Key expressions are `/`-separated chunks naming sets of keys:
//! - `*` matches exactly one chunk
//! - `**` matches zero or more chunks
//! - `$*` inside a chunk matches any run of characters within that chunk
//!
//! Expressions are validated and canonicalized once at construction; all
//! matching runs on the canonical string.

pub mod canon;
pub mod expr;
pub mod matching;

#[cfg(test)]
mod tests;

pub use canon::{canonize, is_canon, validate};
pub use expr::KeyExpr;
pub use matching::{includes, intersects};
