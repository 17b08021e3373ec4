//! TikTok OAuth provider implementation (Login Kit v2).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{
    config_error, oauth_error, ConfigErrorKind, Error, ErrorKind, OAuthErrorKind,
    UpstreamFailure,
};
use crate::oauth::extract;
use crate::oauth::{PkceChallenge, PkceVerifier, ProviderKind, TokenExchange, UserProfile};

pub use service::config::{
    DEFAULT_TIKTOK_AUTH_URL as AUTHORIZE_URL, DEFAULT_TIKTOK_SCOPES as DEFAULT_SCOPES,
    DEFAULT_TIKTOK_TOKEN_URL as TOKEN_URL, DEFAULT_TIKTOK_USER_INFO_URL as USER_INFO_URL,
};

/// Profile fields requested from the user info endpoint.
pub const PROFILE_FIELDS: &str = "open_id,union_id,avatar_url,display_name";

/// Endpoint URLs, overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub user_info_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            user_info_url: USER_INFO_URL.to_string(),
        }
    }
}

/// Application credentials registered with TikTok.
///
/// Key and secret are optional so a misconfigured deployment can still start and
/// answer with a configuration error instead of crashing.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_key: Option<String>,
    pub client_secret: Option<SecretString>,
    pub redirect_uri: String,
    pub scopes: String,
}

/// TikTok OAuth provider.
pub struct Provider {
    credentials: Credentials,
    endpoints: Endpoints,
    http_client: reqwest::Client,
}

impl Provider {
    pub fn new(credentials: Credentials, endpoints: Endpoints, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            endpoints,
            http_client,
        }
    }

    fn client_key(&self) -> Result<&str, Error> {
        self.credentials
            .client_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::MissingClientId,
                    "TikTok client key not configured (TIKTOK_CLIENT_KEY)",
                )
            })
    }

    fn redirect_uri(&self) -> Result<&str, Error> {
        Some(self.credentials.redirect_uri.trim())
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::MissingRedirectUri,
                    "TikTok redirect URI not configured (TIKTOK_REDIRECT_URI)",
                )
            })
    }

    fn client_secret(&self) -> Result<&str, Error> {
        self.credentials
            .client_secret
            .as_ref()
            .map(|secret| secret.expose_secret().as_str())
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::MissingClientSecret,
                    "TikTok client secret not configured (TIKTOK_CLIENT_SECRET)",
                )
            })
    }
}

/// Map a transport error into the failure kind of the stage it interrupted,
/// with a message naming that stage.
fn transport_failure(
    stage: fn(UpstreamFailure) -> OAuthErrorKind,
    action: &str,
    err: reqwest::Error,
) -> Error {
    let failure = UpstreamFailure::from_transport(&err);
    oauth_error(
        stage(failure),
        &format!("{}: {} ({})", action, failure.describe(), err),
    )
}

const TOKEN_ACTION: &str = "Failed to get access token";
const PROFILE_ACTION: &str = "Failed to get user info";

/// TikTok reports API-level errors inside a 200 body: `{"error": {"code": "...", "message": "..."}}`.
fn api_error(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    let code = error.get("code")?.as_str()?;
    if code.is_empty() || code == "ok" {
        return None;
    }
    let message = error.get("message").and_then(Value::as_str).unwrap_or("");
    Some(format!("{}: {}", code, message))
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::TikTok
    }

    fn authorization_url(&self, state: &str, challenge: &PkceChallenge) -> Result<String, Error> {
        let client_key = self.client_key()?;
        let redirect_uri = self.redirect_uri()?;

        let url = Url::parse_with_params(
            &self.endpoints.authorize_url,
            &[
                ("client_key", client_key),
                ("scope", self.credentials.scopes.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri),
                ("state", state),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", PkceChallenge::METHOD),
            ],
        )
        .map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Config(ConfigErrorKind::InvalidEndpoint),
        })?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenExchange, Error> {
        let client_key = self.client_key()?;
        let client_secret = self.client_secret()?;
        let redirect_uri = self.redirect_uri()?;

        debug!("Exchanging TikTok authorization code for an access token");

        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_key", client_key),
                ("client_secret", client_secret),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
                ("code_verifier", verifier.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("TikTok token request failed: {:?}", e);
                transport_failure(OAuthErrorKind::TokenExchangeFailed, TOKEN_ACTION, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(OAuthErrorKind::TokenExchangeFailed, TOKEN_ACTION, e))?;

        info!("TikTok token response status: {}", status);

        if !status.is_success() {
            warn!("TikTok token endpoint rejected the code: {}", body);
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed(UpstreamFailure::Status(status.as_u16())),
                &format!("{}: {}", TOKEN_ACTION, body),
            ));
        }

        let raw: Value = serde_json::from_str(&body).map_err(|e| Error {
            source: Some(format!("Token endpoint returned a non-JSON body: {} ({})", body, e).into()),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed(
                UpstreamFailure::Malformed,
            )),
        })?;

        let exchange = TokenExchange::from_response(raw)?;
        debug!("TikTok token payload: {}", exchange.redacted_raw());

        Ok(exchange)
    }

    async fn fetch_profile(&self, access_token: &SecretString) -> Result<UserProfile, Error> {
        let response = self
            .http_client
            .get(&self.endpoints.user_info_url)
            .bearer_auth(access_token.expose_secret())
            .query(&[("fields", PROFILE_FIELDS)])
            .send()
            .await
            .map_err(|e| {
                warn!("TikTok user info request failed: {:?}", e);
                transport_failure(OAuthErrorKind::ProfileFetchFailed, PROFILE_ACTION, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(OAuthErrorKind::ProfileFetchFailed, PROFILE_ACTION, e))?;

        if !status.is_success() {
            warn!("TikTok user info error ({}): {}", status, body);
            return Err(oauth_error(
                OAuthErrorKind::ProfileFetchFailed(UpstreamFailure::Status(status.as_u16())),
                &format!("{}: {}", PROFILE_ACTION, body),
            ));
        }

        let malformed = |message: String| {
            oauth_error(
                OAuthErrorKind::ProfileFetchFailed(UpstreamFailure::Malformed),
                &message,
            )
        };

        let payload: Value = serde_json::from_str(&body)
            .map_err(|_| malformed(format!("User info endpoint returned a non-JSON body: {}", body)))?;

        if let Some(error) = api_error(&payload) {
            warn!("TikTok user info API error: {}", error);
            return Err(malformed(format!("{}: {}", PROFILE_ACTION, error)));
        }

        extract::user_profile(&payload)
            .ok_or_else(|| malformed(format!("No user profile in response: {}", body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientBuilder;
    use crate::oauth::Provider as _;
    use mockito::{Matcher, Server};

    fn credentials() -> Credentials {
        Credentials {
            client_key: Some("client-key-1".to_string()),
            client_secret: Some(SecretString::from("client-secret-1".to_string())),
            redirect_uri: "https://relay.example.com/auth/tiktok/callback".to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
        }
    }

    fn provider_for(server_url: &str, credentials: Credentials) -> Provider {
        let endpoints = Endpoints {
            authorize_url: format!("{}/v2/auth/authorize/", server_url),
            token_url: format!("{}/v2/oauth/token/", server_url),
            user_info_url: format!("{}/v2/user/info/", server_url),
        };
        Provider::new(credentials, endpoints, reqwest::Client::new())
    }

    #[test]
    fn test_authorization_url_carries_pkce_and_state() {
        let provider = Provider::new(credentials(), Endpoints::default(), reqwest::Client::new());
        let verifier = PkceVerifier::from_string("verifier".to_string());
        let challenge = verifier.challenge();

        let url = Url::parse(&provider.authorization_url("state-1", &challenge).unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with(AUTHORIZE_URL));
        assert_eq!(params["client_key"], "client-key-1");
        assert_eq!(params["scope"], DEFAULT_SCOPES);
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "https://relay.example.com/auth/tiktok/callback");
        assert_eq!(params["state"], "state-1");
        assert_eq!(params["code_challenge"], challenge.as_str());
        assert_eq!(params["code_challenge_method"], "S256");
    }

    #[test]
    fn test_authorization_url_requires_client_key() {
        let provider = Provider::new(
            Credentials {
                client_key: Some("  ".to_string()),
                ..credentials()
            },
            Endpoints::default(),
            reqwest::Client::new(),
        );
        let challenge = PkceVerifier::generate().challenge();

        let err = provider.authorization_url("s", &challenge).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::MissingClientId)
        );
    }

    #[test]
    fn test_authorization_url_requires_redirect_uri() {
        let provider = Provider::new(
            Credentials {
                redirect_uri: " ".to_string(),
                ..credentials()
            },
            Endpoints::default(),
            reqwest::Client::new(),
        );
        let challenge = PkceVerifier::generate().challenge();

        let err = provider.authorization_url("s", &challenge).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::MissingRedirectUri)
        );
    }

    #[tokio::test]
    async fn test_exchange_code_requires_redirect_uri() {
        let provider = provider_for(
            "http://127.0.0.1:9",
            Credentials {
                redirect_uri: String::new(),
                ..credentials()
            },
        );
        let err = provider
            .exchange_code("code", &PkceVerifier::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::MissingRedirectUri)
        );
    }

    #[tokio::test]
    async fn test_exchange_code_posts_pkce_form() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/oauth/token/")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_key".into(), "client-key-1".into()),
                Matcher::UrlEncoded("client_secret".into(), "client-secret-1".into()),
                Matcher::UrlEncoded("code".into(), "auth-code".into()),
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "https://relay.example.com/auth/tiktok/callback".into(),
                ),
                Matcher::UrlEncoded("code_verifier".into(), "the-verifier".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "tok123", "open_id": "u1", "data": {}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let verifier = PkceVerifier::from_string("the-verifier".to_string());
        let exchange = provider.exchange_code("auth-code", &verifier).await.unwrap();

        assert_eq!(exchange.access_token.expose_secret(), "tok123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_code_nested_token_shape() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/oauth/token/")
            .with_status(200)
            .with_body(r#"{"data": {"access_token": "tok456"}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let exchange = provider
            .exchange_code("code", &PkceVerifier::generate())
            .await
            .unwrap();

        assert_eq!(exchange.access_token.expose_secret(), "tok456");
    }

    #[tokio::test]
    async fn test_exchange_code_rejected_carries_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/oauth/token/")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let err = provider
            .exchange_code("used-code", &PkceVerifier::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed(
                UpstreamFailure::Status(400)
            ))
        );
        assert!(err.detail().unwrap().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_exchange_code_non_json_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/oauth/token/")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let err = provider
            .exchange_code("code", &PkceVerifier::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed(
                UpstreamFailure::Malformed
            ))
        );
    }

    #[tokio::test]
    async fn test_exchange_code_requires_secret() {
        let provider = provider_for(
            "http://127.0.0.1:9",
            Credentials {
                client_secret: None,
                ..credentials()
            },
        );
        let err = provider
            .exchange_code("code", &PkceVerifier::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::MissingClientSecret)
        );
    }

    #[tokio::test]
    async fn test_exchange_code_unreachable_provider() {
        // Port 9 (discard) is not listening on test hosts.
        let provider = provider_for("http://127.0.0.1:9", credentials());
        let err = provider
            .exchange_code("code", &PkceVerifier::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed(
                UpstreamFailure::Unreachable
            ))
        );
        assert!(err
            .detail()
            .unwrap()
            .starts_with("Failed to get access token: provider could not be reached"));
    }

    #[tokio::test]
    async fn test_exchange_code_silent_provider_times_out() {
        // Accepts connections but never writes a response.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let endpoints = Endpoints {
            authorize_url: format!("http://{addr}/v2/auth/authorize/"),
            token_url: format!("http://{addr}/v2/oauth/token/"),
            user_info_url: format!("http://{addr}/v2/user/info/"),
        };
        let client = ClientBuilder::new()
            .with_timeout(std::time::Duration::from_millis(300))
            .build()
            .unwrap();
        let provider = Provider::new(credentials(), endpoints, client);

        let err = provider
            .exchange_code("code", &PkceVerifier::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed(UpstreamFailure::Timeout))
        );
        assert!(err
            .detail()
            .unwrap()
            .starts_with("Failed to get access token: provider did not answer in time"));

        let err = provider
            .fetch_profile(&SecretString::from("tok".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed(UpstreamFailure::Timeout))
        );
        assert!(err
            .detail()
            .unwrap()
            .starts_with("Failed to get user info: provider did not answer in time"));
    }

    #[tokio::test]
    async fn test_fetch_profile_sends_bearer_and_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/user/info/")
            .match_header("authorization", "Bearer tok123")
            .match_query(Matcher::UrlEncoded("fields".into(), PROFILE_FIELDS.into()))
            .with_status(200)
            .with_body(
                r#"{"data": {"user": {"open_id": "open-1", "display_name": "Chef",
                    "avatar_url": "https://cdn.example.com/a.jpg"}},
                    "error": {"code": "ok", "message": "", "log_id": "x"}}"#,
            )
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let profile = provider
            .fetch_profile(&SecretString::from("tok123".to_string()))
            .await
            .unwrap();

        assert_eq!(profile.open_id, "open-1");
        assert_eq!(profile.display_name.as_deref(), Some("Chef"));
        assert_eq!(profile.union_id, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_profile_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/user/info/")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let err = provider
            .fetch_profile(&SecretString::from("tok".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed(
                UpstreamFailure::Status(500)
            ))
        );
        assert!(err.detail().unwrap().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_fetch_profile_api_error_in_success_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/user/info/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"data": {}, "error": {"code": "scope_not_authorized", "message": "missing scope"}}"#,
            )
            .create_async()
            .await;

        let provider = provider_for(&server.url(), credentials());
        let err = provider
            .fetch_profile(&SecretString::from("tok".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed(
                UpstreamFailure::Malformed
            ))
        );
        assert!(err.detail().unwrap().contains("scope_not_authorized"));
    }
}
