use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET greeting confirming the relay is reachable
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Greeting message"),
    )
)]
pub async fn root() -> impl IntoResponse {
    Json(json!({"message": "Hello World from the OAuth relay"}))
}

/// GET liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}
