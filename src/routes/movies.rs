use std::collections::HashMap;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{split_genres, CustomMovie, MovieSummary};
use crate::state::AppState;
use crate::store::MOVIE_ID_COUNTER;

/// How many movies the trending endpoints return.
const TRENDING_LIMIT: usize = 12;
/// Custom submissions allowed per user per rolling week.
const WEEKLY_SUBMISSION_QUOTA: usize = 2;

/// GET /api/movies
///
/// Every distinct movie in the catalog, first row per id wins.
pub async fn list_movies(State(state): State<AppState>) -> AppResult<Json<Vec<MovieSummary>>> {
    // A missing catalog is a 404, not an empty listing from a stale
    // snapshot.
    if !state.catalog_file.exists() {
        return Err(AppError::NotFound(
            "Fichier movies_enriched.csv introuvable".to_string(),
        ));
    }

    let mut movies: Vec<MovieSummary> = state
        .catalog
        .all()
        .await
        .iter()
        .map(|m| (**m).clone())
        .collect();
    movies.sort_by_key(|m| m.movie_id);
    Ok(Json(movies))
}

#[derive(Debug, Serialize)]
pub struct TrendingMovie {
    #[serde(rename = "movieId")]
    movie_id: i64,
    title: String,
    year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_date: Option<String>,
    genres: Vec<String>,
    description: String,
    backdrop: String,
    #[serde(rename = "ratingsCount")]
    ratings_count: usize,
    rating: Option<f64>,
    #[serde(skip)]
    mean_rating: f64,
    #[serde(skip)]
    date_key: (i32, u32, u32),
}

/// Sort key for "YYYY-MM-DD" release dates, falling back to a bare year.
fn date_key(release_date: Option<&str>, year: &str) -> (i32, u32, u32) {
    let raw = release_date.filter(|d| !d.trim().is_empty()).unwrap_or(year);
    let mut parts = raw.trim().splitn(3, '-');
    let y = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let m = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let d = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (y, m, d)
}

/// Scans the catalog into per-movie aggregates: rating count and mean,
/// deduplicated display metadata from the first row per id.
fn trending_aggregate(
    state: &AppState,
    keep: Option<&[i64]>,
) -> AppResult<Vec<TrendingMovie>> {
    let records = state.catalog_file.records()?;

    let mut by_id: HashMap<i64, TrendingMovie> = HashMap::new();
    let mut sums: HashMap<i64, (f64, usize)> = HashMap::new();

    for record in &records {
        if let Some(keep) = keep {
            if !keep.contains(&record.movie_id) {
                continue;
            }
        }

        let movie = by_id.entry(record.movie_id).or_insert_with(|| TrendingMovie {
            movie_id: record.movie_id,
            title: record.title.clone(),
            year: record.year.clone(),
            release_date: record.release_date.clone(),
            genres: split_genres(&record.genres),
            description: record.description.clone(),
            backdrop: record.backdrop.clone(),
            ratings_count: 0,
            rating: None,
            mean_rating: 0.0,
            date_key: date_key(record.release_date.as_deref(), &record.year),
        });
        movie.ratings_count += 1;

        if let Some(rating) = record.rating {
            let (sum, n) = sums.entry(record.movie_id).or_insert((0.0, 0));
            *sum += rating;
            *n += 1;
        }
    }

    let mut movies: Vec<TrendingMovie> = by_id
        .into_values()
        .map(|mut m| {
            if let Some((sum, n)) = sums.get(&m.movie_id) {
                if *n > 0 {
                    m.mean_rating = sum / *n as f64;
                }
            }
            m
        })
        .collect();

    // Newest first, mean rating breaks ties.
    movies.sort_by(|a, b| {
        b.date_key.cmp(&a.date_key).then(
            b.mean_rating
                .partial_cmp(&a.mean_rating)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    movies.truncate(TRENDING_LIMIT);
    Ok(movies)
}

/// GET /api/movies/latest
pub async fn latest(State(state): State<AppState>) -> AppResult<Json<Vec<TrendingMovie>>> {
    let movies = trending_aggregate(&state, None)?;
    Ok(Json(movies))
}

/// GET /api/movies/latestAdd
///
/// Same trending shape, restricted to the 20 most recent user submissions.
pub async fn latest_additions(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<TrendingMovie>>> {
    let ids: Vec<i64> = state
        .store
        .latest_submissions(20)
        .await
        .iter()
        .map(|m| m.movie_id)
        .collect();

    let movies = trending_aggregate(&state, Some(&ids))?;
    Ok(Json(movies))
}

/// GET /api/movies/catalog
///
/// Raw catalog file download.
pub async fn download_catalog(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let contents = state.catalog_file.read_to_string()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        contents,
    ))
}

/// GET /api/movies/count
///
/// Submissions by the caller inside the rolling quota week.
pub async fn submission_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    let cutoff = Utc::now() - Duration::days(7);
    let count = state
        .store
        .submissions_since(&auth.id.to_string(), cutoff)
        .await;
    Ok(Json(json!({ "count": count })))
}

#[derive(Debug, serde::Deserialize)]
pub struct CustomMovieRequest {
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub backdrop: String,
    pub rating: f64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
}

/// POST /api/movies/custom
///
/// Ingests a user-submitted movie: quota check, id from the counter, genre
/// normalization, description cleaning, then submission record, rating, and
/// catalog append in that order (no rollback on partial failure).
pub async fn create_custom(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CustomMovieRequest>,
) -> AppResult<Json<Value>> {
    let user_key = auth.id.to_string();

    let cutoff = Utc::now() - Duration::days(7);
    let count = state.store.submissions_since(&user_key, cutoff).await;
    if count >= WEEKLY_SUBMISSION_QUOTA {
        tracing::info!(user = %user_key, count, "Weekly submission quota reached");
        return Ok(Json(json!({ "success": false, "error": "limit" })));
    }

    let movie_id = state.store.next_id(MOVIE_ID_COUNTER).await;

    let genres = crate::catalog::genres::normalize_genres(&body.genres);
    let mut actors = body.actors;
    actors.truncate(5);

    let description_clean = state
        .recommender
        .clean_description(&body.title, &genres, &body.year, &actors, &body.description)
        .await;

    let movie = CustomMovie {
        movie_id,
        title: body.title,
        genres,
        year: body.year,
        description: body.description,
        actors,
        backdrop: body.backdrop,
        description_clean,
        user_id: user_key.clone(),
        created_at: Utc::now(),
    };

    state.store.add_custom_movie(movie.clone()).await;
    let ratings = state
        .store
        .upsert_rating(auth.id, movie_id, body.rating)
        .await;

    let record = movie.to_catalog_record(&user_key, body.rating);
    state.catalog_file.append(&record).await?;
    state.catalog.refresh(&state.catalog_file).await?;

    tracing::info!(movie_id, user = %user_key, "Custom movie added to catalog");

    Ok(Json(json!({
        "success": true,
        "movie": movie,
        "rate": { "userId": user_key, "ratings": ratings },
        "remaining": WEEKLY_SUBMISSION_QUOTA.saturating_sub(count + 1),
    })))
}
