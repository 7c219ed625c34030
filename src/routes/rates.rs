use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{CatalogRecord, RatingEntry};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    #[serde(rename = "filmId")]
    pub film_id: i64,
    pub note: f64,
}

/// POST /api/rates
///
/// Upserts the caller's rating and appends a catalog line for the rated
/// movie with the `userId`/`rating` fields replaced. A movie the catalog
/// does not know is logged; the rating itself is still stored.
pub async fn create_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RateRequest>,
) -> AppResult<Json<Value>> {
    if !(0.0..=5.0).contains(&body.note) {
        return Err(AppError::InvalidInput(
            "La note doit être entre 0 et 5".to_string(),
        ));
    }

    let ratings = state
        .store
        .upsert_rating(auth.id, body.film_id, body.note)
        .await;

    // First catalog row for this movie carries the display metadata.
    let source = state
        .catalog_file
        .records()?
        .into_iter()
        .find(|r| r.movie_id == body.film_id);

    match source {
        Some(record) => {
            let line = CatalogRecord {
                user_id: Some(auth.id.to_string()),
                rating: Some(body.note),
                ..record
            };
            state.catalog_file.append(&line).await?;
            state.catalog.refresh(&state.catalog_file).await?;
        }
        None => {
            tracing::warn!(film_id = body.film_id, "Rated movie not found in catalog");
        }
    }

    Ok(Json(json!({
        "userId": auth.id,
        "ratings": ratings,
    })))
}

/// GET /api/rates
pub async fn list_rates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<RatingEntry>>> {
    Ok(Json(state.store.ratings_for(auth.id).await))
}

#[derive(Debug, Serialize)]
pub struct ProfileRating {
    #[serde(rename = "filmId")]
    pub film_id: i64,
    pub note: f64,
    pub date: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub backdrop: Option<String>,
    pub genres: Vec<String>,
    pub year: String,
    pub description: String,
    pub actors: Vec<String>,
}

/// GET /api/rates/profile
///
/// The caller's ratings joined with catalog metadata; films the catalog no
/// longer resolves keep a placeholder title instead of disappearing.
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ProfileRating>>> {
    let ratings = state.store.ratings_for(auth.id).await;

    let mut enriched = Vec::with_capacity(ratings.len());
    for rating in ratings {
        let movie = state.catalog.get_by_id(rating.film_id).await;
        enriched.push(match movie {
            Some(m) => ProfileRating {
                film_id: rating.film_id,
                note: rating.note,
                date: rating.date,
                title: m.title.clone(),
                backdrop: Some(m.backdrop.clone()),
                genres: m.genres.clone(),
                year: m.year.clone(),
                description: m.description.clone(),
                actors: m.actors.clone(),
            },
            None => ProfileRating {
                film_id: rating.film_id,
                note: rating.note,
                date: rating.date,
                title: "Titre inconnu".to_string(),
                backdrop: None,
                genres: vec![],
                year: String::new(),
                description: String::new(),
                actors: vec![],
            },
        });
    }

    Ok(Json(enriched))
}
