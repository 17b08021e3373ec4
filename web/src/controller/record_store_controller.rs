use crate::{AppState, Error};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use log::*;
use serde_json::json;

/// GET every row of the probe table, to check the record store connection
#[utoipa::path(
    get,
    path = "/supabase-test",
    responses(
        (status = 200, description = "Rows of the probe table"),
        (status = 500, description = "Record store not configured or unreachable"),
    )
)]
pub async fn probe(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let store = app_state.record_store.as_ref().ok_or_else(|| {
        DomainError::new(
            DomainErrorKind::Internal(InternalErrorKind::RecordStoreUnavailable),
            "Supabase not configured",
        )
    })?;

    let table = app_state.config.supabase_probe_table();
    debug!("Probing record store table {table}");
    let rows = store.select_all(table).await?;

    Ok(Json(json!({ "data": rows })))
}
