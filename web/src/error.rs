use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind, SessionErrorKind,
};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Session(session_error_kind) => match session_error_kind {
                    SessionErrorKind::NotFound => StatusCode::NOT_FOUND,
                    SessionErrorKind::TransportDisconnect => StatusCode::INTERNAL_SERVER_ERROR,
                },
                InternalErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::UpstreamUnavailable
                | ExternalErrorKind::UpstreamStreamInterrupted
                | ExternalErrorKind::Network => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("Responding with {status}: {}", self.0);
        }
        let reason = status.canonical_reason().unwrap_or("ERROR").to_uppercase();
        (status, reason).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_unavailable_is_bad_gateway() {
        let err = Error::from(DomainError::upstream_unavailable(None));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_session_not_found_is_not_found() {
        let err = Error::from(session::Error::session_not_found("7"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_config_error_is_internal_server_error() {
        let err = Error::from(DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
