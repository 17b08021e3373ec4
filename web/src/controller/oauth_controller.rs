//! Controller for the OAuth authorization code relay.
//!
//! Both endpoints are reached through browser redirects, so every success is a
//! 302 and every failure is a plain text body the browser can display.

use crate::{AppState, Error};

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use domain::auth_relay::Callback;
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters a provider appends to the callback redirect
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Authorization code to exchange
    pub code: Option<String>,
    /// State token issued by the authorize endpoint
    pub state: Option<String>,
    /// Set by the provider when the user or provider refused authorization
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl From<CallbackParams> for Callback {
    fn from(params: CallbackParams) -> Self {
        Callback {
            code: params.code,
            state: params.state,
            error: params.error,
            error_description: params.error_description,
        }
    }
}

fn found(location: String) -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, location)])
}

/// GET /auth/{provider}
///
/// Starts an authorization by redirecting to the provider with a fresh state and PKCE challenge.
#[utoipa::path(
    get,
    path = "/auth/{provider}",
    params(
        ("provider" = String, Path, description = "OAuth provider, e.g. tiktok"),
    ),
    responses(
        (status = 302, description = "Redirect to the provider authorization page"),
        (status = 404, description = "Unknown provider"),
        (status = 500, description = "Provider credentials are not configured"),
    )
)]
pub async fn authorize(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let url = app_state.relay.authorize_url(&provider).await?;
    Ok(found(url))
}

/// GET /auth/{provider}/callback
///
/// Completes the authorization and redirects to the client application search page
/// with the access token and user profile in the query string.
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "OAuth provider, e.g. tiktok"),
        CallbackParams,
    ),
    responses(
        (status = 302, description = "Redirect to the client application"),
        (status = 400, description = "Invalid, expired or missing state, denied authorization, or unusable token response"),
        (status = 404, description = "Unknown provider"),
        (status = 502, description = "Provider unreachable or returned an unusable profile"),
        (status = 504, description = "Provider did not answer in time"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, Error> {
    let url = app_state
        .relay
        .complete_callback(&provider, params.into())
        .await?;
    Ok(found(url))
}
