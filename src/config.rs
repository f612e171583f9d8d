use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// How placeholder fields the backend never supplies are filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderPolicy {
    /// Random vote counts, popularity and genre ids (matches the web client)
    #[default]
    Randomized,
    /// Lower bound of each placeholder range, reproducible across runs
    Fixed,
}

/// Application configuration loaded from `CINEMATCH_*` environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the recommendation backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout for the health probe, in seconds
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,

    /// Directory holding the profile store files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub placeholders: PlaceholderPolicy,
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("cinematch"))
        .unwrap_or_else(|| PathBuf::from(".cinematch"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            health_timeout_secs: default_health_timeout_secs(),
            data_dir: default_data_dir(),
            placeholders: PlaceholderPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("CINEMATCH_")
            .from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}
