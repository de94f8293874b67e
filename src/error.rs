use std::fmt;

/// Errors that faultline surfaces to its host.
///
/// Reporting problems never show up here: a notice that cannot be delivered
/// is logged by the [`Client`](crate::Client) and dropped. The only error a
/// host sees is one that should abort its own unit of work.
#[derive(Debug)]
pub enum Error {
    /// A context generator failed while the active context was being built.
    ContextGenerator {
        /// Name the generator was registered under
        name: String,
        /// The generator's own error
        source: GeneratorError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ContextGenerator { name, source } => {
                write!(f, "context generator '{}' failed: {}", name, source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ContextGenerator { source, .. } => Some(source),
        }
    }
}

/// Error returned by a context generator that cannot produce its value.
///
/// # Examples
///
/// ```
/// use faultline::GeneratorError;
///
/// let error = GeneratorError::new("no request id header");
/// assert_eq!(error.message(), "no request id header");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorError {
    message: String,
}

impl GeneratorError {
    /// Creates a new generator error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GeneratorError {}

/// Error returned by a [`Transport`](crate::Transport) that could not deliver a notice.
///
/// # Examples
///
/// ```
/// use faultline::{TransportError, TransportErrorKind};
///
/// let error = TransportError::new(TransportErrorKind::Unavailable);
/// assert_eq!(error.kind(), TransportErrorKind::Unavailable);
/// assert!(error.message().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: Option<String>,
}

impl TransportError {
    /// Creates a new transport error with the specified kind.
    pub fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new transport error with a custom message.
    pub fn with_message(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "transport error ({}): {}", self.kind, msg)
        } else {
            write!(f, "transport error ({})", self.kind)
        }
    }
}

impl std::error::Error for TransportError {}

/// Kind of transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The notice could not be serialized.
    Serialization,
    /// I/O failed while sending the notice.
    Io,
    /// The reporting service refused the notice.
    Rejected,
    /// The reporting service could not be reached.
    Unavailable,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization => write!(f, "serialization"),
            Self::Io => write!(f, "I/O error"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}
