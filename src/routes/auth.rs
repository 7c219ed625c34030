use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{sign_token, AuthUser};
use crate::models::UserProfile;
use crate::state::AppState;
use crate::store::ProfileUpdate;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "FirstName", default)]
    pub first_name: String,
    #[serde(rename = "LastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    #[serde(rename = "FirstName")]
    pub first_name: Option<String>,
    #[serde(rename = "LastName")]
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if body.username.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.trim().is_empty()
    {
        return Err(AppError::InvalidInput(
            "username, email et password sont requis".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let user = state
        .store
        .create_user(
            body.username,
            body.email,
            password_hash,
            body.first_name,
            body.last_name,
            body.country.unwrap_or_else(|| "Unknown".to_string()),
            body.status.unwrap_or_else(|| "active".to_string()),
        )
        .await?;

    let token = sign_token(&user, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": UserProfile::from(&user),
            "token": token,
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .find_user_by_email(&body.email)
        .await
        .ok_or_else(|| AppError::Unauthorized("Identifiants invalides".to_string()))?;

    let ok = bcrypt::verify(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
    if !ok {
        return Err(AppError::Unauthorized("Identifiants invalides".to_string()));
    }

    let token = sign_token(&user, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.user_id, "User logged in");

    Ok(Json(json!({
        "user": UserProfile::from(&user),
        "token": token,
    })))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Value>> {
    let user = state
        .store
        .get_user(auth.id)
        .await
        .ok_or_else(|| AppError::NotFound("Utilisateur introuvable".to_string()))?;

    Ok(Json(json!({ "user": UserProfile::from(&user) })))
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<Value>> {
    // A blank password means "keep the current one", not "set it to blank".
    let password_hash = match body.password.as_deref() {
        Some(p) if !p.trim().is_empty() => Some(
            bcrypt::hash(p, bcrypt::DEFAULT_COST)
                .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?,
        ),
        _ => None,
    };

    let update = ProfileUpdate {
        username: body.username,
        first_name: body.first_name,
        last_name: body.last_name,
        country: body.country,
        status: body.status,
        password_hash,
    };

    let user = state
        .store
        .update_user(auth.id, update)
        .await
        .ok_or_else(|| AppError::NotFound("Utilisateur introuvable".to_string()))?;

    Ok(Json(json!({ "user": UserProfile::from(&user) })))
}
