use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::matcher::DEFAULT_SEARCH_LIMIT;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub beatport: BeatportConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Cached from the last user authorization.
    pub refresh_token: Option<String>,
}

impl SpotifyConfig {
    pub fn is_configured(&self) -> bool {
        self.client_id.as_ref().is_some_and(|s| !s.is_empty())
            && self.client_secret.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BeatportConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Candidates requested per search, clamped to `1..=50` (the Spotify cap).
    pub search_limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("toptracks")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Config::default()
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config");
            Config::default()
        }
    }
}

fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("invalid config file")
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
