//! Result of an authorization-code exchange.

use std::fmt;

use secrecy::SecretString;
use serde_json::Value;

use super::extract;
use crate::error::{oauth_error, Error, OAuthErrorKind, UpstreamFailure};

/// Keys whose values are credentials and must never reach a log line.
const SENSITIVE_KEYS: &[&str] = &["access_token", "refresh_token", "id_token"];

/// Access token plus the provider's raw token payload.
///
/// Lives only for the duration of one callback.
pub struct TokenExchange {
    pub access_token: SecretString,
    pub raw: Value,
}

impl TokenExchange {
    /// Build from a token endpoint body, failing if no strategy yields a token.
    pub fn from_response(raw: Value) -> Result<Self, Error> {
        let access_token = extract::access_token(&raw).ok_or_else(|| {
            oauth_error(
                OAuthErrorKind::TokenExchangeFailed(UpstreamFailure::Malformed),
                &format!(
                    "No access token received. Response: {}",
                    redacted(&raw)
                ),
            )
        })?;

        Ok(Self {
            access_token: SecretString::from(access_token),
            raw,
        })
    }

    /// The raw payload with credential values masked, for diagnostics.
    pub fn redacted_raw(&self) -> Value {
        redacted(&self.raw)
    }
}

impl fmt::Debug for TokenExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchange")
            .field("access_token", &"[REDACTED]")
            .field("raw", &self.redacted_raw())
            .finish()
    }
}

/// Copy of `value` with every sensitive key's value replaced, at any depth.
pub(crate) fn redacted(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    if SENSITIVE_KEYS.contains(&key.as_str()) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redacted(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redacted).collect()),
        other => other.clone(),
    }
}
