use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    AuthErrorKind, DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use domain::UpstreamFailure;

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

/// Status for a failed provider call. `malformed` differs by stage: an unusable
/// token response is the caller's problem, an unusable profile is the provider's.
fn upstream_status(failure: &UpstreamFailure, malformed: StatusCode) -> StatusCode {
    match failure {
        UpstreamFailure::Status(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        UpstreamFailure::Malformed => malformed,
        UpstreamFailure::Timeout => StatusCode::GATEWAY_TIMEOUT,
        UpstreamFailure::Unreachable => StatusCode::BAD_GATEWAY,
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Config
                | InternalErrorKind::RecordStoreUnavailable
                | InternalErrorKind::Storage
                | InternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::TokenExchange(failure) => {
                    upstream_status(failure, StatusCode::BAD_REQUEST)
                }
                ExternalErrorKind::ProfileFetch(failure) => {
                    upstream_status(failure, StatusCode::BAD_GATEWAY)
                }
                ExternalErrorKind::RecordStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ExternalErrorKind::Network => StatusCode::BAD_GATEWAY,
            },
            DomainErrorKind::Auth(auth_error_kind) => match auth_error_kind {
                AuthErrorKind::InvalidState
                | AuthErrorKind::Denied
                | AuthErrorKind::MissingParameter(_) => StatusCode::BAD_REQUEST,
                AuthErrorKind::UnsupportedProvider => StatusCode::NOT_FOUND,
            },
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self.0);
        } else {
            warn!("{}", self.0);
        }

        let body = self
            .0
            .detail()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("ERROR").to_string());
        (status, body).into_response()
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
