//! Selectors: a key expression plus query parameters

use std::{fmt, str::FromStr};

use crate::{
    error::{RelayError, Result},
    key_expr::KeyExpr,
};

/// Separator between a key expression and its parameters
pub const PARAMETERS_SEPARATOR: char = '?';
const LIST_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = '=';

/// Application-defined `name=value;name2=value2` query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Parameters(String);

impl Parameters {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs; a bare name has an empty value
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .split(LIST_SEPARATOR)
            .filter(|field| !field.is_empty())
            .map(|field| field.split_once(FIELD_SEPARATOR).unwrap_or((field, "")))
    }

    /// Value of the first parameter called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(key, _)| *key == name).map(|(_, value)| value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Parameters {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Parameters {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Target of a query: which keys, and with which parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub key_expr: KeyExpr,
    pub parameters: Parameters,
}

impl Selector {
    pub fn new(key_expr: KeyExpr, parameters: impl Into<Parameters>) -> Self {
        Self {
            key_expr,
            parameters: parameters.into(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "{}", self.key_expr)
        } else {
            write!(f, "{}{}{}", self.key_expr, PARAMETERS_SEPARATOR, self.parameters)
        }
    }
}

impl FromStr for Selector {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        let (key_expr, parameters) = s.split_once(PARAMETERS_SEPARATOR).unwrap_or((s, ""));
        Ok(Self::new(KeyExpr::new(key_expr)?, parameters))
    }
}

impl TryFrom<&str> for Selector {
    type Error = RelayError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for Selector {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<KeyExpr> for Selector {
    fn from(key_expr: KeyExpr) -> Self {
        Self::new(key_expr, Parameters::empty())
    }
}

impl From<&KeyExpr> for Selector {
    fn from(key_expr: &KeyExpr) -> Self {
        Self::new(key_expr.clone(), Parameters::empty())
    }
}
