use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Client for the external movie-metadata API (TMDB-shaped).
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Title search, with results already present in the catalog filtered
    /// out so users cannot re-submit movies the catalog knows.
    pub async fn search(
        &self,
        query: &str,
        existing_titles: &HashSet<String>,
    ) -> AppResult<Vec<Value>> {
        let url = format!("{}/search/movie", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("language", "en-US"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "TMDB search returned status {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        let results = body["results"]
            .as_array()
            .ok_or_else(|| AppError::ExternalApi("Invalid TMDB response format".to_string()))?;

        let filtered: Vec<Value> = results
            .iter()
            .filter(|movie| {
                movie["title"]
                    .as_str()
                    .map(|title| !existing_titles.contains(&normalize_title(title)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        tracing::info!(
            query = %query,
            total = results.len(),
            kept = filtered.len(),
            "Metadata search completed"
        );

        Ok(filtered)
    }

    /// Movie details: English data plus credits, with the French synopsis
    /// preferred when it exists and the principal cast truncated to 5.
    pub async fn details(&self, movie_id: i64) -> AppResult<Value> {
        let url = format!("{}/movie/{}", self.base_url, movie_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", "credits"),
                ("language", "en-US"),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Film introuvable".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "TMDB details returned status {}",
                status
            )));
        }

        let mut details: Value = response.json().await?;
        if details["success"] == Value::Bool(false) {
            return Err(AppError::NotFound("Film introuvable".to_string()));
        }

        // Second call just for the localized synopsis.
        let localized: Value = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "fr-FR"),
            ])
            .send()
            .await?
            .json()
            .await
            .unwrap_or(Value::Null);

        let actors = principal_cast(&details, 5);

        if let Some(overview) = localized["overview"].as_str() {
            if !overview.is_empty() {
                details["overview"] = Value::String(overview.to_string());
            }
        }
        details["actors"] = Value::Array(actors.into_iter().map(Value::String).collect());

        Ok(details)
    }
}

/// First `limit` cast member names from an appended credits block.
pub fn principal_cast(details: &Value, limit: usize) -> Vec<String> {
    details["credits"]["cast"]
        .as_array()
        .map(|cast| {
            cast.iter()
                .take(limit)
                .filter_map(|member| member["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Lowercases and folds accents so "Léon" and "leon" compare equal.
pub fn normalize_title(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' | 'õ' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_title_folds_accents() {
        assert_eq!(normalize_title("Léon"), "leon");
        assert_eq!(normalize_title("  Amélie  "), "amelie");
        assert_eq!(normalize_title("HEAT"), "heat");
    }

    #[test]
    fn test_principal_cast_truncates_to_limit() {
        let details = json!({
            "credits": {
                "cast": [
                    {"name": "A"}, {"name": "B"}, {"name": "C"},
                    {"name": "D"}, {"name": "E"}, {"name": "F"}
                ]
            }
        });
        assert_eq!(principal_cast(&details, 5), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_principal_cast_missing_credits() {
        let details = json!({"title": "No credits"});
        assert!(principal_cast(&details, 5).is_empty());
    }
}
