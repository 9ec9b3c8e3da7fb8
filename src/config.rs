use crate::error::MirrorError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for the mirror service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base directory mirrors are written under, one subdirectory per host
    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum static-resource references allowed on a single page before
    /// the crawl is aborted
    #[serde(default = "default_resource_limit")]
    pub resource_limit: usize,

    /// User agent presented by both the browser session and direct fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds between feed polls in watch mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Directory contract sources are saved under
    #[serde(default = "default_contracts_dir")]
    pub contracts_dir: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            output_base_dir: default_output_base_dir(),
            webdriver_url: default_webdriver_url(),
            resource_limit: default_resource_limit(),
            user_agent: default_user_agent(),
            poll_interval_secs: default_poll_interval_secs(),
            contracts_dir: default_contracts_dir(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MirrorError> {
        let mut file = File::open(path.as_ref())
            .map_err(|e| MirrorError::io(path.as_ref().to_path_buf(), e))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| MirrorError::io(path.as_ref().to_path_buf(), e))?;

        let mut config: Self =
            serde_json::from_str(&contents).map_err(|e| MirrorError::Config(e.to_string()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override the WebDriver URL with an environment variable if provided
    pub fn apply_env_overrides(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }
}

fn default_output_base_dir() -> String {
    "./downloaded-sites".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_resource_limit() -> usize {
    100
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36"
        .to_string()
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_contracts_dir() -> String {
    "./saved-contracts".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MirrorConfig::default();
        assert_eq!(config.resource_limit, 100);
        assert_eq!(config.output_base_dir, "./downloaded-sites");
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.poll_interval_secs, 300);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MirrorConfig = serde_json::from_str(r#"{"resource_limit": 25}"#).unwrap();
        assert_eq!(config.resource_limit, 25);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
    }
}
