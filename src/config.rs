use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection string. When absent the service runs on the in-memory
    /// mock store instead of Postgres.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
}

/// Base URLs for the external lookup services consumed by the chat
/// assistant. Overridable so tests can point them at unroutable addresses.
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub images_api_url: String,
    pub techport_api_url: String,
    /// TechPort requires an api.nasa.gov key; without one the project
    /// source is silently skipped.
    #[serde(default)]
    pub nasa_api_key: Option<String>,
    pub wikipedia_search_url: String,
    pub wikipedia_summary_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            images_api_url: "https://images-api.nasa.gov".to_string(),
            techport_api_url: "https://api.nasa.gov/techport/api".to_string(),
            nasa_api_key: None,
            wikipedia_search_url: "https://en.wikipedia.org/w/api.php".to_string(),
            wikipedia_summary_url: "https://en.wikipedia.org/api/rest_v1".to_string(),
        }
    }
}

impl AppConfig {
    pub fn build() -> Result<Self, ConfigError> {
        let defaults = SourcesConfig::default();

        let builder = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.rust_log", "info,biosearch_rs=debug")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 30)?
            .set_default("sources.images_api_url", defaults.images_api_url)?
            .set_default("sources.techport_api_url", defaults.techport_api_url)?
            .set_default("sources.wikipedia_search_url", defaults.wikipedia_search_url)?
            .set_default("sources.wikipedia_summary_url", defaults.wikipedia_summary_url)?
            // Settings from environment variables with a prefix of APP.
            // E.g. `APP_SERVER__PORT=8080` sets `ServerConfig.port`
            .add_source(Environment::default().separator("__").prefix("APP"))
            // Plain env vars the original deployment used
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("sources.nasa_api_key", std::env::var("NASA_API_KEY").ok())?;

        builder.build()?.try_deserialize()
    }
}
