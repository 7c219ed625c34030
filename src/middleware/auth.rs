use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::state::AppState;

/// Token lifetime, matching the web client's session length.
const TOKEN_TTL_DAYS: i64 = 7;

/// JWT claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User document id.
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
    pub exp: i64,
}

/// Mints an HS256 bearer token for a user.
pub fn sign_token(user: &User, secret: &str) -> AppResult<String> {
    let claims = Claims {
        sub: user.id.to_string(),
        user_id: user.user_id,
        email: user.email.clone(),
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

/// Validates a bearer token and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Token invalide ou expiré".to_string()))
}

/// The authenticated caller, extracted from the Authorization header.
///
/// Any handler taking this as an argument rejects unauthenticated requests
/// with a 401 before running.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub user_id: i64,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Token manquant".to_string()))?;

        let claims = verify_token(token, &state.config.jwt_secret)?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Token invalide ou expiré".to_string()))?;

        Ok(AuthUser {
            id,
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            user_id: 12,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            country: "France".to_string(),
            status: "etudiant".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let user = sample_user();
        let token = sign_token(&user, "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.user_id, 12);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign_token(&sample_user(), "secret").unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not-a-jwt", "secret").is_err());
    }
}
