//! Error types for the `domain` layer.
use relay_auth::error::{ErrorKind as RelayAuthErrorKind, HttpErrorKind, OAuthErrorKind};
use relay_auth::Error as RelayAuthError;
pub use relay_auth::UpstreamFailure;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums. The `source` field holds the original error, whose message doubles as
/// the human readable detail. `web` maps the `error_kind`s to HTTP status codes
/// and never depends on `relay-auth` directly.
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
    Auth(AuthErrorKind),
}

/// Failures inside the relay process itself.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Provider credentials or another required setting are missing or unusable.
    Config,
    /// The record store is not configured.
    RecordStoreUnavailable,
    /// State storage or token sealing failed.
    Storage,
    Other(String),
}

/// Failures talking to systems outside the relay.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    TokenExchange(UpstreamFailure),
    ProfileFetch(UpstreamFailure),
    RecordStore(UpstreamFailure),
    Network,
}

/// Problems with the request driving an authorization flow.
#[derive(Debug, PartialEq)]
pub enum AuthErrorKind {
    InvalidState,
    Denied,
    UnsupportedProvider,
    MissingParameter(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl Error {
    pub fn new(error_kind: DomainErrorKind, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Error {
            source: Some(message.into()),
            error_kind,
        }
    }

    /// Innermost message of the error chain, used as the response body.
    pub fn detail(&self) -> Option<String> {
        let mut current: &(dyn StdError + 'static) = self.source.as_deref()?;
        while let Some(next) = current.source() {
            current = next;
        }
        Some(current.to_string())
    }
}

// This is where we translate errors from the `relay-auth` layer to the `domain` layer.
impl From<RelayAuthError> for Error {
    fn from(err: RelayAuthError) -> Self {
        let error_kind = match &err.error_kind {
            RelayAuthErrorKind::Config(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            RelayAuthErrorKind::OAuth(kind) => match kind {
                OAuthErrorKind::InvalidState => DomainErrorKind::Auth(AuthErrorKind::InvalidState),
                OAuthErrorKind::AuthorizationDenied => DomainErrorKind::Auth(AuthErrorKind::Denied),
                OAuthErrorKind::UnsupportedProvider => {
                    DomainErrorKind::Auth(AuthErrorKind::UnsupportedProvider)
                }
                OAuthErrorKind::TokenExchangeFailed(failure) => {
                    DomainErrorKind::External(ExternalErrorKind::TokenExchange(*failure))
                }
                OAuthErrorKind::ProfileFetchFailed(failure) => {
                    DomainErrorKind::External(ExternalErrorKind::ProfileFetch(*failure))
                }
            },
            RelayAuthErrorKind::Storage(_) => DomainErrorKind::Internal(InternalErrorKind::Storage),
            RelayAuthErrorKind::Http(HttpErrorKind::BuilderFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to build reqwest client".to_string()),
            ),
            RelayAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
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
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}
