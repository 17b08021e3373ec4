use crate::{controller::health_check_controller, AppState};
use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::controller::{oauth_controller, record_store_controller, search_controller};

use utoipa::OpenApi;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "OAuth Relay API"
        ),
        paths(
            health_check_controller::root,
            health_check_controller::health_check,
            oauth_controller::authorize,
            oauth_controller::callback,
            record_store_controller::probe,
            search_controller::search,
        ),
        tags(
            (name = "oauth_relay", description = "OAuth 2.0 authorization code relay with PKCE")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(oauth_routes(app_state.clone()))
        .merge(record_store_routes(app_state))
        .merge(search_routes())
        .route("/api-docs/openapi.json", get(openapi))
}

async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(health_check_controller::root))
        .route("/health", get(health_check_controller::health_check))
}

fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/{provider}", get(oauth_controller::authorize))
        .route(
            "/auth/{provider}/callback",
            get(oauth_controller::callback),
        )
        .with_state(app_state)
}

fn record_store_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/supabase-test", get(record_store_controller::probe))
        .with_state(app_state)
}

fn search_routes() -> Router {
    Router::new().route("/tiktok/search", get(search_controller::search))
}
