//! Reference-counted canonical key expression

use std::{convert::Infallible, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

use super::{canon, matching};

/// An immutable, canonical key expression.
///
/// Cloning is a reference-count bump; equality is canonical-string equality,
/// which is also set equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyExpr(Arc<str>);

impl KeyExpr {
    /// Parse and canonicalize a key expression
    pub fn new(input: impl AsRef<str>) -> Result<Self> {
        Self::autocanonize(input)
    }

    /// Parse a key expression, rewriting it into canonical form if needed
    pub fn autocanonize(input: impl AsRef<str>) -> Result<Self> {
        let canonical = canon::canonize(input.as_ref())?;
        Ok(Self(Arc::from(canonical)))
    }

    /// Parse a key expression that must already be canonical.
    ///
    /// Valid but non-canonical input (such as `a/**/**`) is rejected with a
    /// parse error instead of being rewritten.
    pub fn strict(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        canon::validate(input)?;
        if !canon::is_canon(input) {
            return Err(RelayError::parse(input, "key expression is not canonical"));
        }
        Ok(Self(Arc::from(input)))
    }

    /// Canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the expression contains any wildcard
    pub fn is_wild(&self) -> bool {
        self.0.contains('*')
    }

    /// Iterate over the `/`-separated chunks
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.0.split(canon::DELIMITER)
    }

    /// Whether every key matched by `other` is also matched by `self`
    pub fn includes(&self, other: &KeyExpr) -> bool {
        matching::includes(&self.0, &other.0)
    }

    /// Whether at least one key is matched by both `self` and `other`
    pub fn intersects(&self, other: &KeyExpr) -> bool {
        matching::intersects(&self.0, &other.0)
    }

    /// Join with `/` as separator, e.g. `a/b` joined with `c` gives `a/b/c`
    pub fn join(&self, suffix: impl AsRef<str>) -> Result<Self> {
        let suffix = suffix.as_ref();
        if suffix.is_empty() {
            return Err(RelayError::parse(
                format!("{}/", self),
                "cannot join an empty suffix",
            ));
        }
        Self::autocanonize(format!("{}/{}", self.0, suffix))
    }

    /// Concatenate without separator, e.g. `a/b` with `c/d` gives `a/bc/d`
    pub fn concat(&self, suffix: impl AsRef<str>) -> Result<Self> {
        let suffix = suffix.as_ref();
        if self.0.ends_with('*') && suffix.starts_with('*') {
            return Err(RelayError::parse(
                format!("{}{}", self.0, suffix),
                "concatenation would produce an illegal '**' sequence",
            ));
        }
        Self::autocanonize(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for KeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for KeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyExpr({})", self.0)
    }
}

impl AsRef<str> for KeyExpr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for KeyExpr {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for KeyExpr {
    type Error = RelayError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&String> for KeyExpr {
    type Error = RelayError;

    fn try_from(value: &String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for KeyExpr {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self> {
        if canon::is_canon(&value) {
            return Ok(Self(Arc::from(value)));
        }
        Self::new(value)
    }
}

impl From<&KeyExpr> for KeyExpr {
    fn from(value: &KeyExpr) -> Self {
        value.clone()
    }
}

impl From<KeyExpr> for String {
    fn from(value: KeyExpr) -> Self {
        value.0.to_string()
    }
}

impl From<Infallible> for RelayError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}
