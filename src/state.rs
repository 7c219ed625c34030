use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{sync_catalog, CatalogFile, CatalogIndex, SyncReport};
use crate::config::Config;
use crate::error::AppResult;
use crate::services::recommender::{HttpTransport, RecommenderGateway, RecommenderTransport};
use crate::services::tmdb::TmdbClient;
use crate::store::{Store, MOVIE_ID_COUNTER, USER_ID_COUNTER};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub catalog_file: Arc<CatalogFile>,
    pub catalog: Arc<CatalogIndex>,
    pub recommender: Arc<RecommenderGateway>,
    pub tmdb: Arc<TmdbClient>,
}

impl AppState {
    /// Builds state with real HTTP transports to the external services.
    pub fn new(config: Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.outbound_timeout_secs);

        let scoring: Arc<dyn RecommenderTransport> =
            Arc::new(HttpTransport::new(config.recommender_url.clone(), timeout)?);
        let cleaner: Arc<dyn RecommenderTransport> =
            Arc::new(HttpTransport::new(config.cleaner_url.clone(), timeout)?);

        Ok(Self::with_transports(config, scoring, cleaner)?)
    }

    /// Builds state around caller-supplied transports; tests inject
    /// scripted ones here.
    pub fn with_transports(
        config: Config,
        scoring: Arc<dyn RecommenderTransport>,
        cleaner: Arc<dyn RecommenderTransport>,
    ) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.outbound_timeout_secs);
        let retry_delay = Duration::from_secs(config.hybrid_retry_delay_secs);

        let recommender = RecommenderGateway::new(scoring, cleaner, retry_delay);
        let tmdb = TmdbClient::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            timeout,
        )?;
        let catalog_file = CatalogFile::new(config.catalog_path.clone());

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(Store::new()),
            catalog_file: Arc::new(catalog_file),
            catalog: Arc::new(CatalogIndex::new()),
            recommender: Arc::new(recommender),
            tmdb: Arc::new(tmdb),
        })
    }

    /// Startup sequence: seed the id counters from the catalog, run the
    /// derived-catalog synchronization, then build the first index
    /// snapshot.
    pub async fn initialize(&self) -> AppResult<SyncReport> {
        let max_movie_id = self.catalog_file.max_movie_id()?;
        self.store.init_counter(MOVIE_ID_COUNTER, max_movie_id).await;
        tracing::info!(seed = max_movie_id, "Movie id counter initialized");

        let max_user_id = self.catalog_file.max_user_id()?;
        self.store.init_counter(USER_ID_COUNTER, max_user_id).await;
        tracing::info!(seed = max_user_id, "User id counter initialized");

        let report = sync_catalog(
            &self.catalog_file,
            Path::new(&self.config.derived_catalog_path),
            &self.store,
        )
        .await?;

        self.catalog.refresh(&self.catalog_file).await?;

        Ok(report)
    }
}
