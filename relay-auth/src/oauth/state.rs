//! CSRF state management for OAuth flows.
//!
//! Every authorization attempt gets an opaque state token bound to its PKCE
//! verifier. The pair lives in a [`StateStore`] until the matching callback
//! consumes it exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, warn};

use super::pkce::{PkceChallenge, PkceVerifier};
use crate::error::{oauth_error, storage_error, Error, OAuthErrorKind, StorageErrorKind};

const STATE_TOKEN_BYTES: usize = 32;
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// A pending authorization: the state token and the verifier it protects.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub state_token: String,
    pub code_verifier: PkceVerifier,
    pub created_at: DateTime<Utc>,
}

/// What the authorization initiator needs to build the provider URL.
#[derive(Debug, Clone)]
pub struct IssuedState {
    pub state_token: String,
    pub code_challenge: PkceChallenge,
}

/// Backend holding pending authorizations.
///
/// Implementations must make `take` atomic: when several callers take the same
/// token concurrently, exactly one receives the entry. A networked store with
/// native TTL support can implement this trait for multi-instance deployments.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Store a new entry. Returns `false` without overwriting if the token is already live.
    async fn insert(&self, state: AuthState) -> Result<bool, Error>;

    /// Remove and return the entry for `state_token`.
    async fn take(&self, state_token: &str) -> Result<Option<AuthState>, Error>;

    /// Drop every entry created before `cutoff`, returning how many were removed.
    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Error>;
}

/// In-process state store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: DashMap<String, AuthState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn insert(&self, state: AuthState) -> Result<bool, Error> {
        match self.states.entry(state.state_token.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(state);
                Ok(true)
            }
        }
    }

    async fn take(&self, state_token: &str) -> Result<Option<AuthState>, Error> {
        Ok(self.states.remove(state_token).map(|(_, state)| state))
    }

    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Error> {
        let before = self.states.len();
        self.states.retain(|_, state| state.created_at >= cutoff);
        Ok(before.saturating_sub(self.states.len()))
    }
}

/// Issues and validates OAuth state tokens.
///
/// Generates CSRF state tokens with their PKCE verifiers and validates them on
/// callback. A token validates at most once; with a TTL set, it also stops
/// validating once older than the TTL.
#[derive(Clone)]
pub struct StateManager {
    store: Arc<dyn StateStore>,
    ttl: Option<Duration>,
}

impl StateManager {
    /// Create a state manager with the default TTL of 10 minutes.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            ttl: Some(Duration::minutes(10)),
        }
    }

    /// Create a state manager with a custom TTL; `None` disables expiry.
    pub fn with_ttl(store: Arc<dyn StateStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Generate a state token and PKCE verifier, store the pair, and return the
    /// token with the verifier's challenge.
    pub async fn create(&self) -> Result<IssuedState, Error> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let code_verifier = PkceVerifier::generate();
            let code_challenge = code_verifier.challenge();
            let state = AuthState {
                state_token: Self::generate_token(),
                code_verifier,
                created_at: Utc::now(),
            };
            let state_token = state.state_token.clone();

            if self.store.insert(state).await? {
                debug!("Issued OAuth state token");
                return Ok(IssuedState {
                    state_token,
                    code_challenge,
                });
            }
            warn!("Generated state token collided with a live one, regenerating");
        }

        Err(storage_error(
            StorageErrorKind::Unavailable,
            "Could not issue a unique state token",
        ))
    }

    /// Validate and consume a state token, returning its PKCE verifier.
    ///
    /// The entry is removed before any other check, so a replayed or expired token
    /// can never be consumed later.
    pub async fn consume(&self, state_token: &str) -> Result<PkceVerifier, Error> {
        let state = self.store.take(state_token).await?.ok_or_else(|| {
            oauth_error(
                OAuthErrorKind::InvalidState,
                "State parameter was never issued or has already been used",
            )
        })?;

        if let Some(ttl) = self.ttl {
            if Utc::now() - state.created_at > ttl {
                return Err(oauth_error(
                    OAuthErrorKind::InvalidState,
                    "State parameter has expired",
                ));
            }
        }

        Ok(state.code_verifier)
    }

    /// Remove expired entries. No-op when expiry is disabled.
    pub async fn cleanup_expired(&self) -> Result<usize, Error> {
        match self.ttl {
            Some(ttl) => self.store.purge_created_before(Utc::now() - ttl).await,
            None => Ok(0),
        }
    }

    /// Generate a cryptographically random state token.
    fn generate_token() -> String {
        let mut random_bytes = [0u8; STATE_TOKEN_BYTES];
        OsRng.fill_bytes(&mut random_bytes);
        URL_SAFE_NO_PAD.encode(random_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn manager_with_store() -> (StateManager, Arc<MemoryStateStore>) {
        let store = Arc::new(MemoryStateStore::new());
        (StateManager::new(store.clone()), store)
    }

    fn is_invalid_state(result: &Result<PkceVerifier, Error>) -> bool {
        matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidState),
                ..
            })
        )
    }

    #[tokio::test]
    async fn test_create_returns_url_safe_token() {
        let (manager, store) = manager_with_store();
        let issued = manager.create().await.unwrap();
        assert_eq!(issued.state_token.len(), 43);
        assert!(!issued.state_token.contains('='));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_consume_returns_matching_verifier() {
        let (manager, _) = manager_with_store();
        let issued = manager.create().await.unwrap();

        let verifier = manager.consume(&issued.state_token).await.unwrap();
        assert_eq!(verifier.challenge(), issued.code_challenge);
    }

    #[tokio::test]
    async fn test_state_consumed_only_once() {
        let (manager, store) = manager_with_store();
        let issued = manager.create().await.unwrap();

        assert!(manager.consume(&issued.state_token).await.is_ok());
        assert!(is_invalid_state(&manager.consume(&issued.state_token).await));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_state_has_no_side_effects() {
        let (manager, store) = manager_with_store();
        manager.create().await.unwrap();
        manager.create().await.unwrap();

        assert!(is_invalid_state(&manager.consume("forged-state").await));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_state_rejected_and_removed() {
        let store = Arc::new(MemoryStateStore::new());
        let manager = StateManager::with_ttl(store.clone(), Some(Duration::seconds(-1)));
        let issued = manager.create().await.unwrap();

        assert!(is_invalid_state(&manager.consume(&issued.state_token).await));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let store = Arc::new(MemoryStateStore::new());
        store
            .insert(AuthState {
                state_token: "old".to_string(),
                code_verifier: PkceVerifier::from_string("v".to_string()),
                created_at: Utc::now() - Duration::days(30),
            })
            .await
            .unwrap();
        let manager = StateManager::with_ttl(store, None);

        assert_eq!(manager.cleanup_expired().await.unwrap(), 0);
        assert_eq!(manager.consume("old").await.unwrap().as_str(), "v");
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let (manager, store) = manager_with_store();
        let fresh = manager.create().await.unwrap();
        store
            .insert(AuthState {
                state_token: "stale".to_string(),
                code_verifier: PkceVerifier::generate(),
                created_at: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();

        assert_eq!(manager.cleanup_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(manager.consume(&fresh.state_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_does_not_overwrite_live_token() {
        let store = MemoryStateStore::new();
        let first = AuthState {
            state_token: "same".to_string(),
            code_verifier: PkceVerifier::from_string("first".to_string()),
            created_at: Utc::now(),
        };
        let second = AuthState {
            code_verifier: PkceVerifier::from_string("second".to_string()),
            ..first.clone()
        };

        assert!(store.insert(first).await.unwrap());
        assert!(!store.insert(second).await.unwrap());
        let kept = store.take("same").await.unwrap().unwrap();
        assert_eq!(kept.code_verifier.as_str(), "first");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consume_has_single_winner() {
        let (manager, _) = manager_with_store();
        let manager = Arc::new(manager);
        let issued = manager.create().await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let token = issued.state_token.clone();
                tokio::spawn(async move { manager.consume(&token).await.is_ok() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
