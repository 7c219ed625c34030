use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::services::enrichment::enrich;
use crate::services::recommender::{CollabKind, TitleRating};
use crate::state::AppState;

/// Minimum distinct rated films before collaborative filtering has enough
/// signal to score a user.
const MIN_RATINGS_FOR_COLLAB: usize = 11;

#[derive(Debug, Default, Deserialize)]
pub struct ScoringParams {
    pub top_n: Option<u32>,
    pub k: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ContentRecommendation {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    pub year: String,
    pub genres: Vec<String>,
    pub description: String,
    pub backdrop: String,
    #[serde(rename = "userRating")]
    pub user_rating: Option<f64>,
    pub rated: bool,
}

/// POST /api/recommendations/content-based
///
/// Scores against the caller's favorite titles, excluding everything they
/// have already rated, and annotates each result with their own rating.
pub async fn content_based(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ScoringParams>,
) -> AppResult<Json<Value>> {
    let favorite_ids = state.store.favorites_for(auth.id).await;
    if favorite_ids.is_empty() {
        return Ok(Json(json!({ "success": true, "recommendations": [] })));
    }

    let mut favorite_titles = Vec::with_capacity(favorite_ids.len());
    for id in &favorite_ids {
        if let Some(movie) = state.catalog.get_by_id(*id).await {
            favorite_titles.push(movie.title.clone());
        }
    }
    if favorite_titles.is_empty() {
        return Err(AppError::InvalidInput(
            "Aucun titre trouvé pour les favoris de l'utilisateur".to_string(),
        ));
    }

    let ratings = state.store.ratings_for(auth.id).await;
    let exclude_seen: Vec<String> = ratings.iter().map(|r| r.film_id.to_string()).collect();

    let ids = state
        .recommender
        .content_based(favorite_titles, exclude_seen, body.top_n.unwrap_or(20))
        .await?;

    let mut recommendations = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(movie) = state.catalog.get_by_id(id).await {
            let user_rating = ratings.iter().find(|r| r.film_id == id).map(|r| r.note);
            recommendations.push(ContentRecommendation {
                movie_id: movie.movie_id,
                title: movie.title.clone(),
                year: movie.year.clone(),
                genres: movie.genres.clone(),
                description: movie.description.clone(),
                backdrop: movie.backdrop.clone(),
                user_rating,
                rated: user_rating.is_some(),
            });
        }
    }

    Ok(Json(json!({
        "success": true,
        "recommendations": recommendations,
    })))
}

/// GET /api/filtrage/rating-count
pub async fn rating_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    let count = state.store.distinct_rated_count(auth.id).await;
    Ok(Json(json!({ "count": count })))
}

/// POST /api/filtrage/ubcf
pub async fn ubcf(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ScoringParams>,
) -> AppResult<Json<Value>> {
    collaborative(state, auth, body, CollabKind::UserBased).await
}

/// POST /api/filtrage/ibcf
pub async fn ibcf(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ScoringParams>,
) -> AppResult<Json<Value>> {
    collaborative(state, auth, body, CollabKind::ItemBased).await
}

/// Shared user-based / item-based path. Callers below the ratings floor get
/// a structured insufficient-data response and nothing leaves the process.
async fn collaborative(
    state: AppState,
    auth: AuthUser,
    body: ScoringParams,
    kind: CollabKind,
) -> AppResult<Json<Value>> {
    let count = state.store.distinct_rated_count(auth.id).await;
    if count < MIN_RATINGS_FOR_COLLAB {
        return Ok(Json(json!({
            "success": false,
            "error": "Pas assez de films notés (min 11)",
            "count": count,
        })));
    }

    let raw = state
        .recommender
        .collaborative(
            kind,
            &auth.id.to_string(),
            body.top_n.unwrap_or(20),
            body.k.unwrap_or(20),
        )
        .await?;

    let recommendations = enrich(raw, &state.catalog).await;
    Ok(Json(json!({
        "success": true,
        "recommendations": recommendations,
    })))
}

/// POST /api/hybride
///
/// Joins the caller's favorites and rating history against the catalog and
/// hands both to the hybrid scorer.
pub async fn hybrid(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ScoringParams>,
) -> AppResult<Json<Value>> {
    let mut favorites = Vec::new();
    for id in state.store.favorites_for(auth.id).await {
        if let Some(movie) = state.catalog.get_by_id(id).await {
            favorites.push(movie.title.clone());
        }
    }

    let mut user_ratings = Vec::new();
    for rating in state.store.ratings_for(auth.id).await {
        if let Some(movie) = state.catalog.get_by_id(rating.film_id).await {
            user_ratings.push(TitleRating {
                title: movie.title.clone(),
                rating: rating.note,
            });
        }
    }

    let raw = state
        .recommender
        .hybrid(
            &auth.id.to_string(),
            body.top_n.unwrap_or(100),
            body.k.unwrap_or(41),
            favorites,
            user_ratings,
        )
        .await?;

    let recommendations = enrich(raw, &state.catalog).await;
    Ok(Json(json!({
        "success": true,
        "recommendations": recommendations,
    })))
}
