use serde::{Deserialize, Serialize};

use crate::catalog::CatalogIndex;
use crate::models::MovieSummary;

/// Identifier half of a `[identifier, score]` pair: the scoring service
/// emits ids from some endpoints and titles from others.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecId {
    Num(i64),
    Text(String),
}

/// One recommendation as the scoring service returned it.
///
/// The external endpoints disagree on shape: full objects, partial objects,
/// `[identifier, score]` pairs, bare ids, bare titles. Deserialization is
/// untagged; resolution happens in [`enrich`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawRecommendation {
    Entry {
        #[serde(rename = "movieId", default)]
        movie_id: Option<i64>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        score: Option<f64>,
    },
    Pair(RecId, f64),
    Id(i64),
    Title(String),
}

/// The uniform shape every recommendation endpoint responds with.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedRecommendation {
    #[serde(rename = "movieId")]
    pub movie_id: Option<i64>,
    pub title: String,
    pub score: Option<f64>,
    pub year: String,
    pub genres: Vec<String>,
    pub description: String,
    pub backdrop: String,
}

impl EnrichedRecommendation {
    fn from_summary(summary: &MovieSummary, score: Option<f64>) -> Self {
        Self {
            movie_id: Some(summary.movie_id),
            title: summary.title.clone(),
            score,
            year: summary.year.clone(),
            genres: summary.genres.clone(),
            description: summary.description.clone(),
            backdrop: summary.backdrop.clone(),
        }
    }
}

/// Resolves raw recommendations against the catalog index.
///
/// Resolution order is fixed: an already-complete object passes through,
/// then title lookup, then id lookup, then the pair form; entries that
/// resolve to nothing are filtered out.
pub async fn enrich(
    recommendations: Vec<RawRecommendation>,
    index: &CatalogIndex,
) -> Vec<EnrichedRecommendation> {
    let mut enriched = Vec::with_capacity(recommendations.len());

    for rec in recommendations {
        if let Some(movie) = resolve(rec, index).await {
            enriched.push(movie);
        }
    }

    enriched
}

async fn resolve(rec: RawRecommendation, index: &CatalogIndex) -> Option<EnrichedRecommendation> {
    match rec {
        RawRecommendation::Entry {
            movie_id: Some(movie_id),
            title: Some(title),
            score,
        } => {
            // Complete already; backfill display metadata when the catalog
            // knows the movie.
            match index.get_by_id(movie_id).await {
                Some(summary) => Some(EnrichedRecommendation::from_summary(&summary, score)),
                None => Some(EnrichedRecommendation {
                    movie_id: Some(movie_id),
                    title,
                    score,
                    year: String::new(),
                    genres: vec![],
                    description: String::new(),
                    backdrop: String::new(),
                }),
            }
        }
        RawRecommendation::Entry {
            movie_id,
            title,
            score,
        } => {
            let summary = match &title {
                Some(t) => index.get_by_title(t).await,
                None => None,
            };
            let summary = match summary {
                Some(s) => Some(s),
                None => match movie_id {
                    Some(id) => index.get_by_id(id).await,
                    None => None,
                },
            };
            summary.map(|s| EnrichedRecommendation::from_summary(&s, score))
        }
        RawRecommendation::Pair(id, score) => {
            let summary = match &id {
                RecId::Num(n) => index.get_by_id(*n).await,
                RecId::Text(t) => index.get_by_title(t).await,
            };
            summary.map(|s| EnrichedRecommendation::from_summary(&s, Some(score)))
        }
        RawRecommendation::Id(movie_id) => index
            .get_by_id(movie_id)
            .await
            .map(|s| EnrichedRecommendation::from_summary(&s, None)),
        RawRecommendation::Title(title) => index
            .get_by_title(&title)
            .await
            .map(|s| EnrichedRecommendation::from_summary(&s, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFile;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    async fn test_index() -> (NamedTempFile, CatalogIndex) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "movieId,title,genres,year,description,actors,backdrop,description_clean,userId,rating"
        )
        .unwrap();
        writeln!(file, "1,Toy Story,Animation|Children,1995,Toys come alive,Tom Hanks,http://a,toys,7,4").unwrap();
        writeln!(file, "6,Heat,Action|Crime,1995,Bank robbers,Al Pacino,http://b,robbers,7,5").unwrap();
        file.flush().unwrap();

        let index = CatalogIndex::new();
        index.refresh(&CatalogFile::new(file.path())).await.unwrap();
        (file, index)
    }

    #[test]
    fn test_untagged_shapes_deserialize() {
        let object: RawRecommendation =
            serde_json::from_str(r#"{"title": "Heat", "score": 0.9}"#).unwrap();
        assert!(matches!(object, RawRecommendation::Entry { .. }));

        let pair: RawRecommendation = serde_json::from_str(r#"["Heat", 0.8]"#).unwrap();
        assert_eq!(pair, RawRecommendation::Pair(RecId::Text("Heat".to_string()), 0.8));

        let id_pair: RawRecommendation = serde_json::from_str(r#"[6, 0.8]"#).unwrap();
        assert_eq!(id_pair, RawRecommendation::Pair(RecId::Num(6), 0.8));

        let bare_id: RawRecommendation = serde_json::from_str("6").unwrap();
        assert_eq!(bare_id, RawRecommendation::Id(6));

        let bare_title: RawRecommendation = serde_json::from_str(r#""Heat""#).unwrap();
        assert_eq!(bare_title, RawRecommendation::Title("Heat".to_string()));
    }

    #[tokio::test]
    async fn test_title_entry_resolves_with_metadata() {
        let (_file, index) = test_index().await;

        let recs = vec![RawRecommendation::Entry {
            movie_id: None,
            title: Some("Heat".to_string()),
            score: Some(0.93),
        }];
        let enriched = enrich(recs, &index).await;

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].movie_id, Some(6));
        assert_eq!(enriched[0].score, Some(0.93));
        assert_eq!(enriched[0].genres, vec!["Action", "Crime"]);
        assert_eq!(enriched[0].year, "1995");
    }

    #[tokio::test]
    async fn test_id_round_trip_resolves_non_null() {
        let (_file, index) = test_index().await;

        let enriched = enrich(vec![RawRecommendation::Id(1)], &index).await;
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].title, "Toy Story");
        assert_eq!(enriched[0].year, "1995");
        assert_eq!(enriched[0].genres, vec!["Animation", "Children"]);
    }

    #[tokio::test]
    async fn test_pair_forms_resolve_by_id_and_title() {
        let (_file, index) = test_index().await;

        let enriched = enrich(
            vec![
                RawRecommendation::Pair(RecId::Num(6), 0.7),
                RawRecommendation::Pair(RecId::Text("Toy Story".to_string()), 0.6),
            ],
            &index,
        )
        .await;

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].title, "Heat");
        assert_eq!(enriched[0].score, Some(0.7));
        assert_eq!(enriched[1].movie_id, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_entries_are_filtered() {
        let (_file, index) = test_index().await;

        let enriched = enrich(
            vec![
                RawRecommendation::Id(424242),
                RawRecommendation::Title("Never Heard Of It".to_string()),
                RawRecommendation::Id(6),
            ],
            &index,
        )
        .await;

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].title, "Heat");
    }

    #[tokio::test]
    async fn test_complete_object_passes_through_unknown_catalog() {
        let (_file, index) = test_index().await;

        let enriched = enrich(
            vec![RawRecommendation::Entry {
                movie_id: Some(999),
                title: Some("Fresh Upload".to_string()),
                score: Some(0.5),
            }],
            &index,
        )
        .await;

        // Complete objects win before any lookup, so they survive even when
        // the index has never seen them.
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].movie_id, Some(999));
        assert_eq!(enriched[0].title, "Fresh Upload");
    }

    #[tokio::test]
    async fn test_title_lookup_precedes_id_lookup() {
        let (_file, index) = test_index().await;

        // Title says Heat, id says Toy Story: the fixed order resolves by
        // title first.
        let enriched = enrich(
            vec![RawRecommendation::Entry {
                movie_id: Some(1),
                title: Some("Heat".to_string()),
                score: None,
            }],
            &index,
        )
        .await;

        // Both fields present makes it a complete object backfilled by id.
        assert_eq!(enriched[0].movie_id, Some(1));

        let enriched = enrich(
            vec![RawRecommendation::Entry {
                movie_id: None,
                title: Some("Heat".to_string()),
                score: None,
            }],
            &index,
        )
        .await;
        assert_eq!(enriched[0].movie_id, Some(6));
    }
}
