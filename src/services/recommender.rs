use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

use super::enrichment::RawRecommendation;

/// Transport to an external JSON-over-HTTP scoring service.
///
/// Kept as a trait so tests can count and script calls without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommenderTransport: Send + Sync {
    /// POSTs a JSON payload and returns the raw response body.
    async fn post_json(&self, path: &str, payload: Value) -> AppResult<String>;
}

/// reqwest-backed transport with an explicit deadline on every call.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl RecommenderTransport for HttpTransport {
    async fn post_json(&self, path: &str, payload: Value) -> AppResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Scoring service returned status {}: {}",
                status, body
            )));
        }

        Ok(response.text().await?)
    }
}

/// Collaborative-filtering endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollabKind {
    UserBased,
    ItemBased,
}

impl CollabKind {
    fn path(self) -> &'static str {
        match self {
            CollabKind::UserBased => "/ubcf",
            CollabKind::ItemBased => "/ibcf",
        }
    }
}

/// One (title, rating) pair of the caller's history, as the hybrid endpoint
/// expects it.
#[derive(Debug, Clone, Serialize)]
pub struct TitleRating {
    pub title: String,
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
struct ContentBasedResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    recommendations: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoredResponse {
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
}

#[derive(Debug, Deserialize)]
struct CleanedResponse {
    #[serde(default)]
    description_clean: Option<String>,
}

/// Number of attempts against the hybrid endpoint before giving up.
const HYBRID_ATTEMPTS: u32 = 3;

/// Gateway to the external scoring and description-cleaning services.
///
/// Owns the request shapes and the failure policy; enrichment of whatever
/// comes back is the caller's job.
pub struct RecommenderGateway {
    scoring: Arc<dyn RecommenderTransport>,
    cleaner: Arc<dyn RecommenderTransport>,
    retry_delay: Duration,
}

impl RecommenderGateway {
    pub fn new(
        scoring: Arc<dyn RecommenderTransport>,
        cleaner: Arc<dyn RecommenderTransport>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            scoring,
            cleaner,
            retry_delay,
        }
    }

    /// Content-based scoring: favorite titles in, movie ids out.
    pub async fn content_based(
        &self,
        favorites: Vec<String>,
        exclude_seen: Vec<String>,
        top_n: u32,
    ) -> AppResult<Vec<i64>> {
        let payload = json!({
            "favorites": favorites,
            "top_n": top_n,
            "exclude_seen": exclude_seen,
        });

        let body = self.scoring.post_json("/cb", payload).await?;
        let parsed: ContentBasedResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::ExternalApi(format!("Invalid /cb response: {}", e)))?;

        if !parsed.success {
            return Err(AppError::ExternalApi(format!(
                "Content-based scoring failed: {}",
                parsed.error.unwrap_or_default()
            )));
        }

        // Ids arrive as numbers or numeric strings depending on the service
        // version.
        let ids = parsed
            .recommendations
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect();
        Ok(ids)
    }

    /// User-based / item-based scoring for one user.
    ///
    /// The ≥ 11 distinct-ratings precondition is checked by the caller
    /// before anything leaves the process.
    pub async fn collaborative(
        &self,
        kind: CollabKind,
        user_id: &str,
        top_n: u32,
        k: u32,
    ) -> AppResult<Vec<RawRecommendation>> {
        let payload = json!({
            "userId": user_id,
            "top_n": top_n,
            "k": k,
        });

        let body = self.scoring.post_json(kind.path(), payload).await?;
        let parsed: ScoredResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::ExternalApi(format!("Invalid {} response: {}", kind.path(), e))
        })?;
        Ok(parsed.recommendations)
    }

    /// Hybrid scoring with the wake-up retry loop.
    ///
    /// The hosted service cold-starts and answers with an HTML error page
    /// until it is warm: an unparsable body is retried after a fixed delay,
    /// three attempts total, then the call fails as service-unavailable.
    pub async fn hybrid(
        &self,
        user_id: &str,
        top_n: u32,
        k: u32,
        favorites: Vec<String>,
        user_ratings: Vec<TitleRating>,
    ) -> AppResult<Vec<RawRecommendation>> {
        let payload = json!({
            "userId": user_id,
            "top_n": top_n,
            "k": k,
            "favorites": favorites,
            "userRatings": user_ratings,
        });

        for attempt in 1..=HYBRID_ATTEMPTS {
            let body = self.scoring.post_json("/hybrid", payload.clone()).await?;

            match serde_json::from_str::<ScoredResponse>(&body) {
                Ok(parsed) => return Ok(parsed.recommendations),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        "Hybrid response did not parse, service may be waking up"
                    );
                    if attempt < HYBRID_ATTEMPTS {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(AppError::ServiceUnavailable(
            "Service de recommandation indisponible après plusieurs tentatives".to_string(),
        ))
    }

    /// Asks the cleaning service for a normalized description.
    ///
    /// Any failure degrades to an empty string; a submission never fails
    /// because the cleaner was down.
    pub async fn clean_description(
        &self,
        title: &str,
        genres: &[String],
        year: &str,
        actors: &[String],
        description: &str,
    ) -> String {
        let payload = json!({
            "title": title,
            "genres": genres,
            "year": year,
            "actors": actors,
            "description": description,
        });

        match self.cleaner.post_json("/description_clean", payload).await {
            Ok(body) => match serde_json::from_str::<CleanedResponse>(&body) {
                Ok(parsed) => parsed.description_clean.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(error = %e, "Cleaning service returned a malformed body");
                    String::new()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Cleaning service call failed");
                String::new()
            }
        }
    }
}
