//! Error types for the `relay-auth` crate.
//!
//! A root Error struct holding an error kind tree and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for relay-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in relay-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Config(ConfigErrorKind),
    OAuth(OAuthErrorKind),
    Storage(StorageErrorKind),
    Http(HttpErrorKind),
}

/// Missing or unusable provider configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    MissingClientId,
    MissingClientSecret,
    MissingRedirectUri,
    InvalidEndpoint,
    InvalidEncryptionKey,
}

/// Errors from OAuth protocol operations.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// State token never issued, already consumed, expired or forged.
    InvalidState,
    /// The provider redirected back with an `error` parameter.
    AuthorizationDenied,
    UnsupportedProvider,
    TokenExchangeFailed(UpstreamFailure),
    ProfileFetchFailed(UpstreamFailure),
}

/// How a call to a provider endpoint failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Provider answered with a non-success HTTP status.
    Status(u16),
    /// Provider answered 2xx but the body did not have the expected shape.
    Malformed,
    /// The call did not complete within the client timeout.
    Timeout,
    /// The provider could not be reached.
    Unreachable,
}

/// Errors from state storage and token sealing.
#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    Unavailable,
    EncryptionFailed,
    DecryptionFailed,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Config(kind) => write!(f, "Configuration error: {:?}", kind)?,
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Storage(kind) => write!(f, "Storage error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
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

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl UpstreamFailure {
    /// Classify a transport-level reqwest failure.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamFailure::Timeout
        } else if err.is_decode() {
            UpstreamFailure::Malformed
        } else {
            UpstreamFailure::Unreachable
        }
    }
}

impl UpstreamFailure {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            UpstreamFailure::Status(status) => format!("provider answered with status {status}"),
            UpstreamFailure::Malformed => "provider response could not be read".to_string(),
            UpstreamFailure::Timeout => "provider did not answer in time".to_string(),
            UpstreamFailure::Unreachable => "provider could not be reached".to_string(),
        }
    }
}

impl Error {
    /// The message carried by this error's source, if any.
    pub fn detail(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.to_string())
    }
}

/// Helper function to create configuration errors.
pub fn config_error(kind: ConfigErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Config(kind),
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create storage errors.
pub fn storage_error(kind: StorageErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Storage(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_source_message() {
        let err = oauth_error(
            OAuthErrorKind::TokenExchangeFailed(UpstreamFailure::Status(400)),
            "invalid_grant",
        );
        let rendered = err.to_string();
        assert!(rendered.contains("TokenExchangeFailed"));
        assert!(rendered.ends_with(": invalid_grant"));
    }

    #[test]
    fn test_detail_is_none_without_source() {
        let err = Error {
            source: None,
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidState),
        };
        assert_eq!(err.detail(), None);
    }
}
