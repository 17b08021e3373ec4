//! HTTP surface of the OAuth relay.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use domain::auth_relay::AuthRelay;
use domain::record_store::RecordStore;
use log::*;
use service::config::Config;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

mod controller;
mod error;
mod router;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub relay: Arc<AuthRelay>,
    pub record_store: Option<Arc<dyn RecordStore>>,
}

impl AppState {
    pub fn new(
        config: Config,
        relay: Arc<AuthRelay>,
        record_store: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        Self {
            config,
            relay,
            record_store,
        }
    }
}

/// A wildcard origin cannot be combined with credentials, so `*` gets a fully
/// open layer and an explicit origin list gets credentials.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// The full application: routes plus the CORS layer.
pub fn app(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);
    router::define_routes(app_state).layer(cors)
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", interface, app_state.config.port);

    let listener = TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
