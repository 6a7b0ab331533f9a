//! Error representations
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GeneralError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GeneralError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(..))
    }

    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        if let Self::Protocol(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn try_into_protocol(self) -> Result<ProtocolError, Self> {
        if let Self::Protocol(v) = self {
            Ok(v)
        } else {
            Err(self)
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(..))
    }

    pub fn as_io(&self) -> Option<&std::io::Error> {
        if let Self::Io(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn try_into_io(self) -> Result<std::io::Error, Self> {
        if let Self::Io(v) = self {
            Ok(v)
        } else {
            Err(self)
        }
    }
}

/// Error for violations of the message framing protocol.
#[derive(Debug, thiserror::Error)]
pub struct ProtocolError {
    kind: ProtocolErrorKind,
    snippet: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind) -> Self {
        Self {
            kind,
            snippet: None,
            source: None,
        }
    }

    pub fn with_snippet<S: Into<String>>(mut self, value: S) -> Self {
        self.snippet = Some(value.into());
        self
    }

    pub fn with_source<T: Into<Box<dyn std::error::Error + Send + Sync>>>(
        mut self,
        source: T,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ProtocolErrorKind {
        self.kind
    }

    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "protocol error: {}", self.kind)?;

        if let Some(snippet) = &self.snippet {
            write!(f, " near '{}'", snippet)?;
        }

        Ok(())
    }
}

impl From<ProtocolErrorKind> for ProtocolError {
    fn from(value: ProtocolErrorKind) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ProtocolErrorKind {
    InvalidStatusHeader,
    InvalidHeader,
    IncompleteBody,
    BodyAlreadyRead,
    HeadersAlreadyRead,
    HeadersNotSent,
    MissingRequiredFields,
    ConnectionClosed,
    HeaderTooBig,
}

impl Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::InvalidStatusHeader => "invalid status header",
            Self::InvalidHeader => "invalid header",
            Self::IncompleteBody => "body has not been read to completion",
            Self::BodyAlreadyRead => "body already read",
            Self::HeadersAlreadyRead => "headers already read",
            Self::HeadersNotSent => "headers not sent",
            Self::MissingRequiredFields => "missing required fields",
            Self::ConnectionClosed => "connection closed",
            Self::HeaderTooBig => "header too big",
        };

        f.write_str(value)
    }
}
