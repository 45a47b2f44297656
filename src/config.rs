use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::i18n::Lang;

/// Client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    /// Base URL of the recipe platform backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for ordinary requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Timeout for AI generation endpoints in seconds
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout: u64,
    /// Cards per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Language used until the user picks one
    #[serde(default)]
    pub default_lang: Lang,
    /// Directory for favorites, language preference and chat history
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Maximum chat messages kept per session, unbounded when unset
    #[serde(default)]
    pub chat_history_limit: Option<usize>,
    /// Characters of long text shown before "show more"
    #[serde(default = "default_collapsed_chars")]
    pub collapsed_chars: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            generation_timeout: default_generation_timeout(),
            page_size: default_page_size(),
            default_lang: Lang::default(),
            storage_dir: default_storage_dir(),
            chat_history_limit: None,
            collapsed_chars: default_collapsed_chars(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_generation_timeout() -> u64 {
    90
}

fn default_page_size() -> usize {
    12
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".recipe-portal")
}

fn default_collapsed_chars() -> usize {
    300
}

impl PortalConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_PORTAL__ prefix
    /// 2. recipe-portal.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_PORTAL__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout)
    }
}

/// Load configuration from file and environment variables
///
/// See [`PortalConfig::load`] for the source priority.
pub fn load_config() -> Result<PortalConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-portal").required(false))
        // Use double underscore as separator: RECIPE_PORTAL__PAGE_SIZE
        .add_source(
            Environment::with_prefix("RECIPE_PORTAL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_timeout(), 30);
        assert_eq!(default_generation_timeout(), 90);
        assert_eq!(default_page_size(), 12);
        assert_eq!(default_collapsed_chars(), 300);
    }

    #[test]
    fn test_config_default_matches_serde_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.default_lang, Lang::En);
        assert!(config.chat_history_limit.is_none());
        assert_eq!(config.generation_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let settings = Config::builder()
            .set_override("base_url", "https://recipes.example")
            .unwrap()
            .set_override("default_lang", "ar")
            .unwrap()
            .set_override("chat_history_limit", 50)
            .unwrap()
            .build()
            .unwrap();

        let config: PortalConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.base_url, "https://recipes.example");
        assert_eq!(config.default_lang, Lang::Ar);
        assert_eq!(config.chat_history_limit, Some(50));
        assert_eq!(config.page_size, 12);
    }

    #[test]
    fn test_load_config_without_file() {
        // No file and no RECIPE_PORTAL__ variables: every field has a default
        let result = load_config();
        assert!(result.is_ok());
    }
}
