use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Secret used to sign and verify JWT bearer tokens
    pub jwt_secret: String,

    /// Path to the base movie catalog CSV
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path the synchronizer writes the derived catalog to
    #[serde(default = "default_derived_catalog_path")]
    pub derived_catalog_path: String,

    /// Base URL of the external recommendation scoring service
    #[serde(default = "default_recommender_url")]
    pub recommender_url: String,

    /// Base URL of the description-cleaning service
    #[serde(default = "default_cleaner_url")]
    pub cleaner_url: String,

    /// TMDB API key
    #[serde(default)]
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Deadline applied to every outbound HTTP call, in seconds
    #[serde(default = "default_outbound_timeout_secs")]
    pub outbound_timeout_secs: u64,

    /// Fixed delay between hybrid retry attempts, in seconds
    #[serde(default = "default_hybrid_retry_delay_secs")]
    pub hybrid_retry_delay_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "movies_enriched.csv".to_string()
}

fn default_derived_catalog_path() -> String {
    "movies_enriched_new.csv".to_string()
}

fn default_recommender_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_cleaner_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_outbound_timeout_secs() -> u64 {
    30
}

fn default_hybrid_retry_delay_secs() -> u64 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
