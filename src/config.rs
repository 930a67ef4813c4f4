//! Search configuration.
//!
//! Stored as TOML at `~/.config/skillswap/search.toml` (or the XDG
//! equivalent). A missing file means defaults. Individual values can be
//! overridden from the environment (or a `.env` file) after loading.
//!
//! # Example Configuration
//!
//! ```toml
//! [debounce]
//! delay_ms = 300
//! min_length = 2
//!
//! [cache]
//! ttl_secs = 300
//! max_size = 50
//!
//! [matching]
//! suggestion_threshold = 0.6
//! max_results = 50
//! vocabulary = ["advertising", "guitar", "spanish"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Terms offered as suggestions even when no loaded profile lists them.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "accounting",
    "advertising",
    "baking",
    "calligraphy",
    "chess",
    "cooking",
    "copywriting",
    "data analysis",
    "drawing",
    "french",
    "gardening",
    "graphic design",
    "guitar",
    "illustration",
    "javascript",
    "knitting",
    "marketing",
    "meditation",
    "painting",
    "photography",
    "piano",
    "public speaking",
    "python",
    "react",
    "rust",
    "singing",
    "spanish",
    "video editing",
    "web design",
    "woodworking",
    "writing",
    "yoga",
];

/// Errors that can occur when loading or saving search configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiet period before a query is acted upon.
    pub delay_ms: u64,
    /// Shorter (trimmed) queries clear results immediately.
    pub min_length: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: 300,
            min_length: 2,
        }
    }
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_size: 50,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum normalized similarity for a "did you mean" term.
    pub suggestion_threshold: f64,
    pub max_results: usize,
    /// Extra suggestion terms on top of the skills of loaded profiles.
    pub vocabulary: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            suggestion_threshold: 0.6,
            max_results: 50,
            vocabulary: DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SearchConfig {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load from a specific path, then apply environment overrides.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path.
    ///
    /// - Primary: `$XDG_CONFIG_HOME/skillswap/search.toml`
    /// - Fallback: platform config dir (e.g. `~/.config/skillswap/search.toml` on Linux)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config)
                .join("skillswap")
                .join("search.toml"));
        }

        dirs::config_dir()
            .map(|p| p.join("skillswap").join("search.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Apply `SKILLSWAP_*` environment overrides. Unparseable values are
    /// ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("SKILLSWAP_DEBOUNCE_MS") {
            self.debounce.delay_ms = v;
        }
        if let Some(v) = env_parse("SKILLSWAP_MIN_QUERY_LEN") {
            self.debounce.min_length = v;
        }
        if let Some(v) = env_parse("SKILLSWAP_CACHE_TTL_SECS") {
            self.cache.ttl_secs = v;
        }
        if let Some(v) = env_parse("SKILLSWAP_CACHE_MAX_SIZE") {
            self.cache.max_size = v;
        }
        if let Some(v) = env_parse("SKILLSWAP_SUGGESTION_THRESHOLD") {
            self.matching.suggestion_threshold = v;
        }
        if let Some(v) = env_parse("SKILLSWAP_MAX_RESULTS") {
            self.matching.max_results = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_size == 0 {
            return Err(ConfigError::Validation(
                "cache.max_size must be at least 1".into(),
            ));
        }

        if self.matching.max_results == 0 {
            return Err(ConfigError::Validation(
                "matching.max_results must be at least 1".into(),
            ));
        }

        let threshold = self.matching.suggestion_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Validation(format!(
                "matching.suggestion_threshold must be within 0.0..=1.0, got {threshold}"
            )));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    dotenvy::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
