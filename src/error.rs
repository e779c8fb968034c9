//! Error types and handling for keyrelay

use std::fmt;

/// Result type alias for keyrelay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result code taxonomy shared by every API boundary.
///
/// `ChannelDisconnected` and `ChannelNoData` are channel state signals rather
/// than failures; they are produced by the channel receive errors, never by
/// [`RelayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Ok,
    ChannelDisconnected,
    ChannelNoData,
    InvalidArgument,
    ParseError,
    IoError,
    NetworkError,
    NullOrDisposed,
    Unavailable,
    DeserializeError,
    SessionClosed,
    Utf8Error,
    GenericError,
}

impl ErrorKind {
    /// Whether this kind is a failure, as opposed to `Ok` or a channel signal
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            ErrorKind::Ok | ErrorKind::ChannelDisconnected | ErrorKind::ChannelNoData
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Comprehensive error types for keyrelay
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Invalid parameters or configuration
    #[error("Invalid argument: {parameter} - {message}")]
    InvalidArgument { parameter: String, message: String },

    /// Malformed key expression, selector or encoding
    #[error("Parse error: '{input}' - {message}")]
    Parse { input: String, message: String },

    /// I/O related errors (reader/writer views, config files)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failure reported by the transport collaborator
    #[error("Network error: {message}")]
    Network { message: String },

    /// Operation on an undeclared or otherwise torn-down handle
    #[error("Object disposed: {object}")]
    Disposed { object: String },

    /// Requested resource or capability is unavailable
    #[error("Unavailable: {message}")]
    Unavailable { message: String },

    /// Payload could not be decoded into the requested type
    #[error("Deserialize error: {message}")]
    Deserialize { message: String },

    /// The owning session has been closed
    #[error("Session closed")]
    SessionClosed,

    /// Payload is not valid UTF-8
    #[error("UTF-8 error: {message}")]
    Utf8 { message: String },

    /// Anything that does not fit the categories above
    #[error("{message}")]
    Generic { message: String },
}

impl RelayError {
    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a parse error for the given input
    pub fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a disposed-object error
    pub fn disposed(object: impl Into<String>) -> Self {
        Self::Disposed {
            object: object.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a deserialization error
    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::Deserialize {
            message: message.into(),
        }
    }

    /// Create a UTF-8 error
    pub fn utf8(message: impl Into<String>) -> Self {
        Self::Utf8 {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Result code of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            RelayError::Parse { .. } => ErrorKind::ParseError,
            RelayError::Io { .. } => ErrorKind::IoError,
            RelayError::Network { .. } => ErrorKind::NetworkError,
            RelayError::Disposed { .. } => ErrorKind::NullOrDisposed,
            RelayError::Unavailable { .. } => ErrorKind::Unavailable,
            RelayError::Deserialize { .. } => ErrorKind::DeserializeError,
            RelayError::SessionClosed => ErrorKind::SessionClosed,
            RelayError::Utf8 { .. } => ErrorKind::Utf8Error,
            RelayError::Generic { .. } => ErrorKind::GenericError,
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<std::str::Utf8Error> for RelayError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::utf8(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for RelayError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::utf8(err.to_string())
    }
}

impl From<bincode::Error> for RelayError {
    fn from(err: bincode::Error) -> Self {
        Self::deserialize(format!("Bincode error: {}", err))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse("json", err.to_string())
    }
}
