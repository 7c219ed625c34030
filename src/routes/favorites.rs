use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::MovieSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
}

/// POST /api/user/favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<FavoriteRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    state.store.add_favorite(auth.id, body.movie_id).await?;
    tracing::info!(movie_id = body.movie_id, user = %auth.id, "Favorite added");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Favori ajouté",
            "favorite": { "movieId": body.movie_id },
        })),
    ))
}

/// GET /api/user/favorites
///
/// Favorites enriched with catalog metadata; ids the catalog cannot resolve
/// are filtered out.
pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let ids = state.store.favorites_for(auth.id).await;

    let mut movies = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(summary) = state.catalog.get_by_id(id).await {
            movies.push((*summary).clone());
        }
    }

    Ok(Json(movies))
}

/// DELETE /api/user/favorites/:movieId
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Value>> {
    if !state.store.remove_favorite(auth.id, movie_id).await {
        return Err(AppError::NotFound("Favori introuvable".to_string()));
    }
    Ok(Json(json!({ "message": "Favori supprimé" })))
}
