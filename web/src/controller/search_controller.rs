use axum::extract::Query;
use axum::response::IntoResponse;
use axum::Json;
use domain::video_search;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free text search terms
    pub query: String,
}

/// GET search videos. Results are placeholders.
#[utoipa::path(
    get,
    path = "/tiktok/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching videos and a notice message"),
        (status = 400, description = "Missing query parameter"),
    )
)]
pub async fn search(Query(params): Query<SearchParams>) -> impl IntoResponse {
    Json(video_search::search(&params.query))
}
