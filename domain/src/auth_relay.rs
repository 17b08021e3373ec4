//! The authorization relay: starts provider logins and completes their callbacks.
//!
//! A login is two requests. [`AuthRelay::authorize_url`] issues a state token
//! bound to a fresh PKCE verifier and returns the provider URL to redirect to.
//! [`AuthRelay::complete_callback`] consumes that state, exchanges the code,
//! fetches the profile, stores it when a record store is configured, and
//! returns the client application URL carrying the token and profile.

use std::collections::HashMap;
use std::sync::Arc;

use log::*;
use relay_auth::http::ClientBuilder;
use relay_auth::oauth::providers::tiktok;
use relay_auth::oauth::{MemoryStateStore, Provider, ProviderKind, StateManager, UserProfile};
use relay_auth::seal::TokenSealer;
use secrecy::{ExposeSecret, SecretString};
use service::config::Config;

use crate::error::{AuthErrorKind, DomainErrorKind, Error, InternalErrorKind};
use crate::profile_store::ProfileStore;
use crate::record_store::RecordStore;

/// Query parameters a provider sends back to the callback.
#[derive(Debug, Clone, Default)]
pub struct Callback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub struct AuthRelay {
    providers: HashMap<ProviderKind, Arc<dyn Provider>>,
    states: StateManager,
    profiles: Option<ProfileStore>,
    frontend_url: String,
}

impl AuthRelay {
    pub fn new(states: StateManager, frontend_url: &str) -> Self {
        Self {
            providers: HashMap::new(),
            states,
            profiles: None,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn with_profile_store(mut self, profiles: ProfileStore) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Wire the TikTok provider, an in-process state store and, when a record
    /// store is given, profile persistence.
    pub fn from_config(
        config: &Config,
        record_store: Option<Arc<dyn RecordStore>>,
    ) -> Result<Self, Error> {
        let http_client = ClientBuilder::new()
            .with_timeout(config.provider_timeout())
            .build()?;

        let tiktok = tiktok::Provider::new(
            tiktok::Credentials {
                client_key: config.tiktok_client_key(),
                client_secret: config.tiktok_client_secret().map(SecretString::from),
                redirect_uri: config.tiktok_redirect_uri().to_string(),
                scopes: config.tiktok_scopes().to_string(),
            },
            tiktok::Endpoints {
                authorize_url: config.tiktok_auth_url().to_string(),
                token_url: config.tiktok_token_url().to_string(),
                user_info_url: config.tiktok_user_info_url().to_string(),
            },
            http_client,
        );

        let ttl = config
            .state_ttl()
            .map(chrono::Duration::from_std)
            .transpose()
            .map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
            })?;
        let states = StateManager::with_ttl(Arc::new(MemoryStateStore::new()), ttl);

        let mut relay =
            Self::new(states, config.frontend_url()).with_provider(Arc::new(tiktok));

        if let Some(store) = record_store {
            let mut profiles = ProfileStore::new(store, config.supabase_profile_table());
            match config.token_encryption_key() {
                Some(key) => profiles = profiles.with_sealer(TokenSealer::from_hex_key(&key)?),
                None => warn!(
                    "Profile persistence is enabled without TOKEN_ENCRYPTION_KEY; access tokens will be stored unencrypted"
                ),
            }
            relay = relay.with_profile_store(profiles);
        }

        Ok(relay)
    }

    pub fn states(&self) -> &StateManager {
        &self.states
    }

    fn provider(&self, name: &str) -> Result<&Arc<dyn Provider>, Error> {
        let kind: ProviderKind = name.parse()?;
        self.providers.get(&kind).ok_or_else(|| {
            Error::new(
                DomainErrorKind::Auth(AuthErrorKind::UnsupportedProvider),
                format!("OAuth provider '{kind}' is not enabled"),
            )
        })
    }

    /// Issue a state and return the provider authorization URL.
    pub async fn authorize_url(&self, provider: &str) -> Result<String, Error> {
        let provider = self.provider(provider)?;
        let issued = self.states.create().await?;

        match provider.authorization_url(&issued.state_token, &issued.code_challenge) {
            Ok(url) => {
                info!("Starting {} authorization", provider.kind());
                Ok(url)
            }
            Err(err) => {
                // The URL never left the process, so the state can never come back.
                if let Err(discard_err) = self.states.consume(&issued.state_token).await {
                    debug!("Could not discard unused state: {discard_err}");
                }
                warn!("Could not build {} authorization URL: {err}", provider.kind());
                Err(err.into())
            }
        }
    }

    /// Complete a provider callback and return the client application URL to redirect to.
    pub async fn complete_callback(&self, provider: &str, callback: Callback) -> Result<String, Error> {
        let provider = self.provider(provider)?;

        let state = callback.state.as_deref().ok_or_else(|| {
            Error::new(
                DomainErrorKind::Auth(AuthErrorKind::MissingParameter("state")),
                "Missing state parameter",
            )
        })?;
        let verifier = self.states.consume(state).await.map_err(|err| {
            warn!("Rejected {} callback: {err}", provider.kind());
            Error::from(err)
        })?;

        if let Some(error) = callback.error.as_deref() {
            let description = callback.error_description.as_deref().unwrap_or_default();
            warn!("{} denied authorization: {error} {description}", provider.kind());
            return Err(Error::new(
                DomainErrorKind::Auth(AuthErrorKind::Denied),
                format!("Authorization denied: {error} {description}").trim_end().to_string(),
            ));
        }

        let code = callback.code.as_deref().ok_or_else(|| {
            Error::new(
                DomainErrorKind::Auth(AuthErrorKind::MissingParameter("code")),
                "Missing code parameter",
            )
        })?;

        let exchange = provider.exchange_code(code, &verifier).await?;
        let profile = provider.fetch_profile(&exchange.access_token).await?;
        info!("Completed {} authorization for open_id {}", provider.kind(), profile.open_id);

        if let Some(profiles) = &self.profiles {
            profiles.save_best_effort(&profile, &exchange.access_token).await;
        }

        self.client_redirect(&exchange.access_token, &profile)
    }

    /// Purge expired states, returning how many were removed.
    pub async fn sweep_expired_states(&self) -> Result<usize, Error> {
        Ok(self.states.cleanup_expired().await?)
    }

    fn client_redirect(&self, access_token: &SecretString, profile: &UserProfile) -> Result<String, Error> {
        let user = serde_json::to_string(profile).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to encode user profile".to_string(),
            )),
        })?;

        Ok(format!(
            "{}/search?access_token={}&user={}",
            self.frontend_url,
            urlencoding::encode(access_token.expose_secret()),
            urlencoding::encode(&user)
        ))
    }
}
