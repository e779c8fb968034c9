//! Set operations over canonical key expressions
//!
//! Both `includes` and `intersects` are recursive descents over chunk indices
//! with a memo table, so `**` on either side costs O(n*m) rather than an
//! exponential number of backtracking paths. The same shape is reused inside
//! a chunk for `$*` sub-wildcards, at character granularity.

use super::canon::{DOUBLE_WILD, SINGLE_WILD, SUB_WILD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Double,
    Single,
    Pattern(&'a str),
}

impl<'a> Chunk<'a> {
    fn classify(chunk: &'a str) -> Self {
        match chunk {
            DOUBLE_WILD => Chunk::Double,
            SINGLE_WILD => Chunk::Single,
            other => Chunk::Pattern(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    Star,
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut rest = pattern;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(SUB_WILD) {
            tokens.push(Token::Star);
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                tokens.push(Token::Char(c));
            }
            rest = chars.as_str();
        }
    }
    tokens
}

/// Memo table indexed by (left position, right position)
struct Memo {
    width: usize,
    cells: Vec<Option<bool>>,
}

impl Memo {
    fn new(left: usize, right: usize) -> Self {
        Self {
            width: right + 1,
            cells: vec![None; (left + 1) * (right + 1)],
        }
    }

    fn get(&self, i: usize, j: usize) -> Option<bool> {
        self.cells[i * self.width + j]
    }

    fn set(&mut self, i: usize, j: usize, value: bool) -> bool {
        self.cells[i * self.width + j] = Some(value);
        value
    }
}

#[derive(Clone, Copy)]
enum Relation {
    Includes,
    Intersects,
}

fn tokens_relate(a: &[Token], b: &[Token], i: usize, j: usize, rel: Relation, memo: &mut Memo) -> bool {
    if let Some(known) = memo.get(i, j) {
        return known;
    }
    let result = match (a.get(i), b.get(j), rel) {
        (None, None, _) => true,
        (Some(Token::Star), _, _) => {
            tokens_relate(a, b, i + 1, j, rel, memo)
                || (j < b.len() && tokens_relate(a, b, i, j + 1, rel, memo))
        }
        (_, Some(Token::Star), Relation::Includes) => false,
        (_, Some(Token::Star), Relation::Intersects) => {
            tokens_relate(a, b, i, j + 1, rel, memo)
                || (i < a.len() && tokens_relate(a, b, i + 1, j, rel, memo))
        }
        (Some(Token::Char(x)), Some(Token::Char(y)), _) => {
            x == y && tokens_relate(a, b, i + 1, j + 1, rel, memo)
        }
        _ => false,
    };
    memo.set(i, j, result)
}

fn patterns_relate(a: &str, b: &str, rel: Relation) -> bool {
    if !a.contains('$') && !b.contains('$') {
        return a == b;
    }
    let (a, b) = (tokenize(a), tokenize(b));
    let mut memo = Memo::new(a.len(), b.len());
    tokens_relate(&a, &b, 0, 0, rel, &mut memo)
}

fn chunk_relates(a: Chunk<'_>, b: Chunk<'_>, rel: Relation) -> bool {
    match (a, b, rel) {
        (Chunk::Single, _, _) => true,
        (_, Chunk::Single, Relation::Intersects) => true,
        (_, Chunk::Single, Relation::Includes) => false,
        (Chunk::Pattern(x), Chunk::Pattern(y), _) => patterns_relate(x, y, rel),
        // `**` is handled at the expression level
        _ => false,
    }
}

fn chunks_relate(a: &[Chunk<'_>], b: &[Chunk<'_>], i: usize, j: usize, rel: Relation, memo: &mut Memo) -> bool {
    if let Some(known) = memo.get(i, j) {
        return known;
    }
    let result = match (a.get(i), b.get(j), rel) {
        (None, None, _) => true,
        (Some(Chunk::Double), _, _) => {
            chunks_relate(a, b, i + 1, j, rel, memo)
                || (j < b.len() && chunks_relate(a, b, i, j + 1, rel, memo))
        }
        (_, Some(Chunk::Double), Relation::Includes) => false,
        (_, Some(Chunk::Double), Relation::Intersects) => {
            chunks_relate(a, b, i, j + 1, rel, memo)
                || (i < a.len() && chunks_relate(a, b, i + 1, j, rel, memo))
        }
        (Some(x), Some(y), _) => chunk_relates(*x, *y, rel) && chunks_relate(a, b, i + 1, j + 1, rel, memo),
        _ => false,
    };
    memo.set(i, j, result)
}

fn relate(a: &str, b: &str, rel: Relation) -> bool {
    if a == b {
        return true;
    }
    let a: Vec<Chunk<'_>> = a.split('/').map(Chunk::classify).collect();
    let b: Vec<Chunk<'_>> = b.split('/').map(Chunk::classify).collect();
    let mut memo = Memo::new(a.len(), b.len());
    chunks_relate(&a, &b, 0, 0, rel, &mut memo)
}

/// Whether every key denoted by `b` is also denoted by `a`.
///
/// Both inputs must be canonical key expressions.
pub fn includes(a: &str, b: &str) -> bool {
    relate(a, b, Relation::Includes)
}

/// Whether some key is denoted by both `a` and `b`.
///
/// Both inputs must be canonical key expressions.
pub fn intersects(a: &str, b: &str) -> bool {
    relate(a, b, Relation::Intersects)
}
