use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::MovieSummary;

use super::file::CatalogFile;

/// Immutable view of the catalog at one point in time.
#[derive(Debug, Default)]
struct Snapshot {
    version: u64,
    by_id: HashMap<i64, Arc<MovieSummary>>,
    by_title: HashMap<String, Arc<MovieSummary>>,
}

/// In-memory movie lookup keyed redundantly by id and title.
///
/// The index is an explicit cache with a snapshot version: every catalog
/// mutation is followed by a `refresh` call, so lookups never depend on the
/// process having started after the last write. The first row seen for a
/// movie id wins, matching how the catalog is scanned everywhere else.
pub struct CatalogIndex {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Rebuilds the snapshot from the catalog file and bumps the version.
    pub async fn refresh(&self, catalog: &CatalogFile) -> AppResult<u64> {
        let records = catalog.records()?;

        let mut by_id: HashMap<i64, Arc<MovieSummary>> = HashMap::new();
        let mut by_title: HashMap<String, Arc<MovieSummary>> = HashMap::new();

        for record in &records {
            if by_id.contains_key(&record.movie_id) {
                continue;
            }
            let summary = Arc::new(MovieSummary::from(record));
            by_id.insert(record.movie_id, Arc::clone(&summary));
            by_title.entry(summary.title.clone()).or_insert(summary);
        }

        let mut guard = self.snapshot.write().await;
        let version = guard.version + 1;
        let movies = by_id.len();
        *guard = Arc::new(Snapshot {
            version,
            by_id,
            by_title,
        });

        tracing::info!(version, movies, "Catalog index refreshed");
        Ok(version)
    }

    pub async fn version(&self) -> u64 {
        self.snapshot.read().await.version
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get_by_id(&self, movie_id: i64) -> Option<Arc<MovieSummary>> {
        self.snapshot.read().await.by_id.get(&movie_id).cloned()
    }

    pub async fn get_by_title(&self, title: &str) -> Option<Arc<MovieSummary>> {
        self.snapshot.read().await.by_title.get(title).cloned()
    }

    /// Every distinct movie in the snapshot, unordered.
    pub async fn all(&self) -> Vec<Arc<MovieSummary>> {
        self.snapshot.read().await.by_id.values().cloned().collect()
    }

    /// Titles currently known to the catalog, for metadata-search filtering.
    pub async fn titles(&self) -> Vec<String> {
        self.snapshot
            .read()
            .await
            .by_title
            .keys()
            .cloned()
            .collect()
    }
}
