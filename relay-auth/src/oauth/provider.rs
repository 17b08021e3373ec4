//! OAuth provider trait and types.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::pkce::{PkceChallenge, PkceVerifier};
use super::token::TokenExchange;
use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Known OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    TikTok,
}

impl ProviderKind {
    /// Get the provider identifier string, as used in route paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::TikTok => "tiktok",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "tiktok" => Ok(ProviderKind::TikTok),
            other => Err(oauth_error(
                OAuthErrorKind::UnsupportedProvider,
                &format!("Unsupported OAuth provider '{}'", other),
            )),
        }
    }
}

/// User profile retrieved from an OAuth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider's stable per-application user identifier.
    pub open_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub union_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Trait for OAuth 2.0 authorization-code providers.
///
/// Implementations handle the platform-specific parts of the flow:
/// - Authorization URL generation with a PKCE challenge
/// - Authorization code exchange
/// - Profile retrieval with the resulting access token
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider kind.
    fn kind(&self) -> ProviderKind;

    /// Build the URL the browser is redirected to.
    ///
    /// Fails with a configuration error when the client identifier is missing.
    fn authorization_url(&self, state: &str, challenge: &PkceChallenge) -> Result<String, Error>;

    /// Exchange an authorization code and its PKCE verifier for an access token.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenExchange, Error>;

    /// Fetch the user's profile with a bearer access token.
    async fn fetch_profile(&self, access_token: &SecretString) -> Result<UserProfile, Error>;
}
