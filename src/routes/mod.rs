use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::request_id_middleware;
use crate::state::AppState;

pub mod auth;
pub mod favorites;
pub mod movies;
pub mod rates;
pub mod recommendations;
pub mod tmdb;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).put(auth::update_me))
        .route("/movies", get(movies::list_movies))
        .route("/movies/latest", get(movies::latest))
        .route("/movies/latestAdd", get(movies::latest_additions))
        .route("/movies/catalog", get(movies::download_catalog))
        .route("/movies/count", get(movies::submission_count))
        .route("/movies/custom", post(movies::create_custom))
        .route("/rates", post(rates::create_rate).get(rates::list_rates))
        .route("/rates/profile", get(rates::profile))
        .route(
            "/user/favorites",
            post(favorites::add_favorite).get(favorites::list_favorites),
        )
        .route("/user/favorites/:movieId", delete(favorites::remove_favorite))
        .route(
            "/recommendations/content-based",
            post(recommendations::content_based),
        )
        .route("/filtrage/rating-count", get(recommendations::rating_count))
        .route("/filtrage/ubcf", post(recommendations::ubcf))
        .route("/filtrage/ibcf", post(recommendations::ibcf))
        .route("/hybride", post(recommendations::hybrid))
        .route("/tmdb/search", get(tmdb::search))
        .route("/tmdb/details/:id", get(tmdb::details))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
