//! Best-effort persistence of authenticated user profiles.

use std::sync::Arc;

use log::*;
use relay_auth::oauth::UserProfile;
use relay_auth::seal::TokenSealer;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::record_store::RecordStore;

const CONFLICT_COLUMN: &str = "open_id";

/// The row written for each completed authorization.
#[derive(Debug, Serialize)]
pub struct ProfileRecord<'a> {
    pub open_id: &'a str,
    pub display_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub access_token: String,
}

/// Writes profiles to a [`RecordStore`] table keyed by `open_id`.
pub struct ProfileStore {
    store: Arc<dyn RecordStore>,
    table: String,
    sealer: Option<TokenSealer>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            sealer: None,
        }
    }

    /// Seal access tokens before they are written.
    pub fn with_sealer(mut self, sealer: TokenSealer) -> Self {
        self.sealer = Some(sealer);
        self
    }

    /// Upsert `profile` with its access token.
    pub async fn save(&self, profile: &UserProfile, access_token: &SecretString) -> Result<(), Error> {
        let access_token = match &self.sealer {
            Some(sealer) => sealer.seal(access_token.expose_secret())?,
            None => access_token.expose_secret().to_string(),
        };

        let record = ProfileRecord {
            open_id: &profile.open_id,
            display_name: profile.display_name.as_deref(),
            avatar_url: profile.avatar_url.as_deref(),
            access_token,
        };
        let row = serde_json::to_value(&record).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to encode profile row".to_string(),
            )),
        })?;

        self.store.upsert(&self.table, CONFLICT_COLUMN, row).await?;
        debug!("Stored profile for open_id {}", profile.open_id);
        Ok(())
    }

    /// Save `profile`, logging and discarding any failure.
    pub async fn save_best_effort(&self, profile: &UserProfile, access_token: &SecretString) {
        if let Err(err) = self.save(profile, access_token).await {
            warn!("Error storing user {}: {err}", profile.open_id);
        }
    }
}
