//! Payload encoding descriptor

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Schema identifier plus optional free-form schema string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Encoding {
    id: u16,
    schema: Option<String>,
}

macro_rules! predefined_encodings {
    ($($name:ident = $id:expr, $text:expr;)*) => {
        impl Encoding {
            $(
                #[doc = concat!("`", $text, "`")]
                pub const $name: Encoding = Encoding { id: $id, schema: None };
            )*
        }

        const KNOWN_ENCODINGS: &[(u16, &str)] = &[$(($id, $text)),*];
    };
}

predefined_encodings! {
    ZENOH_BYTES = 0, "zenoh/bytes";
    ZENOH_STRING = 1, "zenoh/string";
    ZENOH_SERIALIZED = 2, "zenoh/serialized";
    APPLICATION_OCTET_STREAM = 3, "application/octet-stream";
    TEXT_PLAIN = 4, "text/plain";
    APPLICATION_JSON = 5, "application/json";
    TEXT_JSON = 6, "text/json";
    APPLICATION_CDR = 7, "application/cdr";
    APPLICATION_CBOR = 8, "application/cbor";
    APPLICATION_YAML = 9, "application/yaml";
    TEXT_YAML = 10, "text/yaml";
    TEXT_JSON5 = 11, "text/json5";
    APPLICATION_PROTOBUF = 12, "application/protobuf";
    IMAGE_PNG = 16, "image/png";
    IMAGE_JPEG = 17, "image/jpeg";
    APPLICATION_XML = 21, "application/xml";
    TEXT_HTML = 23, "text/html";
    TEXT_XML = 24, "text/xml";
    TEXT_CSV = 28, "text/csv";
}

impl Encoding {
    /// Encoding with an arbitrary numeric id
    pub const fn new(id: u16) -> Self {
        Self { id, schema: None }
    }

    /// Attach a schema string
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    fn name(&self) -> Option<&'static str> {
        KNOWN_ENCODINGS
            .iter()
            .find(|(id, _)| *id == self.id)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name)?,
            None => write!(f, "{}", self.id)?,
        }
        if let Some(schema) = &self.schema {
            write!(f, ";{}", schema)?;
        }
        Ok(())
    }
}

/// Parses `name`, `name;schema` or a numeric id.
///
/// An unknown name becomes a `zenoh/bytes` encoding carrying the whole input
/// as its schema, so no information is lost.
impl FromStr for Encoding {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Encoding::default());
        }
        let (name, schema) = match s.split_once(';') {
            Some((name, schema)) => (name, Some(schema)),
            None => (s, None),
        };
        if name.is_empty() {
            return Err(RelayError::parse(s, "encoding name is empty"));
        }

        let known = KNOWN_ENCODINGS
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(id, _)| *id)
            .or_else(|| name.parse::<u16>().ok());

        let encoding = match (known, schema) {
            (Some(id), Some(schema)) => Encoding::new(id).with_schema(schema),
            (Some(id), None) => Encoding::new(id),
            (None, _) => Encoding::ZENOH_BYTES.with_schema(s),
        };
        Ok(encoding)
    }
}

impl TryFrom<&str> for Encoding {
    type Error = RelayError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}
