//! Error types for the `domain` layer.
use session::Error as SessionError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. `web` depends on `domain` and maps the `error_kind`s to HTTP
/// status codes without reaching into `session` or `reqwest` directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Session(SessionErrorKind),
    Config,
}

/// Session routing failures translated from the `session` crate.
#[derive(Debug, PartialEq)]
pub enum SessionErrorKind {
    NotFound,
    TransportDisconnect,
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// The upstream call could not be established, or was refused with a
    /// non-success status, before any output was produced.
    UpstreamUnavailable,
    /// The upstream stream broke after output had started flowing.
    UpstreamStreamInterrupted,
    Network,
}

impl Error {
    pub fn upstream_unavailable(source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Error {
            source,
            error_kind: DomainErrorKind::External(ExternalErrorKind::UpstreamUnavailable),
        }
    }

    pub fn upstream_stream_interrupted(source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Error {
            source,
            error_kind: DomainErrorKind::External(ExternalErrorKind::UpstreamStreamInterrupted),
        }
    }

    pub fn is_upstream_unavailable(&self) -> bool {
        self.error_kind == DomainErrorKind::External(ExternalErrorKind::UpstreamUnavailable)
    }

    pub fn is_upstream_stream_interrupted(&self) -> bool {
        self.error_kind == DomainErrorKind::External(ExternalErrorKind::UpstreamStreamInterrupted)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `session` layer to the `domain` layer.
impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        let session_error_kind = match err {
            SessionError::SessionNotFound { .. } => SessionErrorKind::NotFound,
            SessionError::TransportDisconnect { .. } => SessionErrorKind::TransportDisconnect,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Session(session_error_kind)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}
