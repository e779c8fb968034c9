//! Key expression validation and canonization

use std::borrow::Cow;

use crate::error::{RelayError, Result};

/// Chunk separator
pub const DELIMITER: char = '/';
/// Matches exactly one chunk
pub const SINGLE_WILD: &str = "*";
/// Matches zero or more chunks
pub const DOUBLE_WILD: &str = "**";
/// Matches any run of characters inside a chunk
pub const SUB_WILD: &str = "$*";

const FORBIDDEN_CHARS: [char; 2] = ['#', '?'];

/// Check one chunk against the grammar, returning the violation if any.
///
/// Accepts non-canonical forms such as `$*` alone or `a$*$*b`.
fn chunk_violation(chunk: &str) -> Option<&'static str> {
    if chunk.is_empty() {
        return Some("empty chunks are not allowed");
    }
    if chunk == SINGLE_WILD || chunk == DOUBLE_WILD {
        return None;
    }

    let mut chars = chunk.chars();
    while let Some(c) = chars.next() {
        match c {
            c if FORBIDDEN_CHARS.contains(&c) => {
                return Some("'#' and '?' are forbidden in key expressions")
            }
            '$' => {
                if chars.next() != Some('*') {
                    return Some("'$' is only allowed as part of '$*'");
                }
            }
            '*' => return Some("'*' must be a whole chunk ('*' or '**') or written '$*'"),
            _ => {}
        }
    }
    None
}

/// Validate a key expression without requiring it to be canonical
pub fn validate(input: &str) -> Result<()> {
    if input.is_empty() {
        return Err(RelayError::parse(input, "empty key expression"));
    }
    for chunk in input.split(DELIMITER) {
        if let Some(violation) = chunk_violation(chunk) {
            return Err(RelayError::parse(input, violation));
        }
    }
    Ok(())
}

/// Returns true if `input` is a valid key expression already in canonical form.
pub fn is_canon(input: &str) -> bool {
    if input.is_empty() {
        return false;
    }

    let mut after_double = false;
    for chunk in input.split(DELIMITER) {
        if chunk_violation(chunk).is_some() || chunk == SUB_WILD || chunk.contains("$*$*") {
            return false;
        }
        let wild = chunk == SINGLE_WILD || chunk == DOUBLE_WILD;
        if after_double && wild {
            return false;
        }
        after_double = chunk == DOUBLE_WILD;
    }
    true
}

fn canonize_chunk(chunk: &str) -> Cow<'_, str> {
    let mut chunk = Cow::Borrowed(chunk);
    while chunk.contains("$*$*") {
        chunk = Cow::Owned(chunk.replace("$*$*", "$*"));
    }
    if chunk == SUB_WILD {
        Cow::Borrowed(SINGLE_WILD)
    } else {
        chunk
    }
}

/// Emit a run of wildcard chunks as `*` repeated, then at most one `**`
fn flush_wilds(out: &mut Vec<Cow<'_, str>>, singles: &mut usize, double: &mut bool) {
    out.extend(std::iter::repeat(Cow::Borrowed(SINGLE_WILD)).take(*singles));
    if *double {
        out.push(Cow::Borrowed(DOUBLE_WILD));
    }
    *singles = 0;
    *double = false;
}

/// Validate and rewrite `input` into its canonical form
pub fn canonize(input: &str) -> Result<String> {
    validate(input)?;
    if is_canon(input) {
        return Ok(input.to_string());
    }

    let mut out: Vec<Cow<'_, str>> = Vec::new();
    let mut singles = 0usize;
    let mut double = false;

    for chunk in input.split(DELIMITER).map(canonize_chunk) {
        if chunk == SINGLE_WILD {
            singles += 1;
        } else if chunk == DOUBLE_WILD {
            double = true;
        } else {
            flush_wilds(&mut out, &mut singles, &mut double);
            out.push(chunk);
        }
    }
    flush_wilds(&mut out, &mut singles, &mut double);

    Ok(out.join("/"))
}
