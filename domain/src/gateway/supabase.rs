//! Supabase record store over its PostgREST interface.

use std::time::Duration;

use async_trait::async_trait;
use log::*;
use relay_auth::http::ClientBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use service::config::Config;

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::record_store::RecordStore;
use crate::UpstreamFailure;

/// PostgREST client for one Supabase project.
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl SupabaseClient {
    /// Create a client for `base_url` (the project URL, without `/rest/v1`).
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> Result<Self, Error> {
        let client = ClientBuilder::new().with_timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client when both `SUPABASE_URL` and `SUPABASE_KEY` are configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, Error> {
        match (config.supabase_url(), config.supabase_key()) {
            (Some(url), Some(key)) => Ok(Some(Self::new(
                &url,
                SecretString::from(key),
                config.provider_timeout(),
            )?)),
            _ => Ok(None),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.api_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    Error {
        error_kind: DomainErrorKind::External(ExternalErrorKind::RecordStore(
            UpstreamFailure::from_transport(&err),
        )),
        source: Some(Box::new(err)),
    }
}

async fn status_error(response: reqwest::Response, table: &str) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!("Supabase request on table {table} failed: {status} - {body}");
    Error::new(
        DomainErrorKind::External(ExternalErrorKind::RecordStore(UpstreamFailure::Status(
            status.as_u16(),
        ))),
        format!("Supabase request on {table} failed: {body}"),
    )
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> Result<(), Error> {
        debug!("Upserting row into {table} on conflict {on_conflict}");

        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, table).await);
        }

        Ok(())
    }

    async fn select_all(&self, table: &str) -> Result<Value, Error> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, table).await);
        }

        response.json::<Value>().await.map_err(transport_error)
    }
}
