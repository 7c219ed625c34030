use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::tmdb::normalize_title;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/tmdb/search?q=
///
/// Proxied metadata search with titles the catalog already knows filtered
/// out, so users cannot re-submit existing movies.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Value>> {
    if params.q.trim().is_empty() {
        return Err(AppError::InvalidInput("Query manquante".to_string()));
    }

    let existing: HashSet<String> = state
        .catalog
        .titles()
        .await
        .iter()
        .map(|t| normalize_title(t))
        .collect();

    let results = state.tmdb.search(&params.q, &existing).await?;
    Ok(Json(json!({ "results": results })))
}

/// GET /api/tmdb/details/:id
pub async fn details(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let details = state.tmdb.details(movie_id).await?;
    Ok(Json(details))
}
