use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// Runtime settings, loaded from a RON file so credentials and endpoints
/// are never compiled in.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Base URL of the web app the browser is driven through.
    pub app_url: String,
    /// Base URL of the REST API.
    pub api_url: String,
    /// Address of the local WebDriver server.
    pub webdriver_url: String,
    /// Credentials typed into the login form. Leave empty to type them
    /// in the browser by hand.
    pub email: String,
    pub password: String,
    /// Comma-separated location table: header row, then (state, city, postal).
    pub locations_path: PathBuf,
    pub headless: bool,
    /// How long to wait for the operator to finish logging in.
    pub login_timeout_secs: u64,
    /// Rotate every candidate job instead of stopping after the first one.
    pub clone_all: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_url: "https://app.jazz.co/app/v2".to_string(),
            api_url: "https://api.jazz.co".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            email: String::new(),
            password: String::new(),
            locations_path: PathBuf::from("Locations.csv"),
            headless: false,
            login_timeout_secs: 300,
            clone_all: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ron::from_str(&config_str).with_context(|| format!("parsing {}", path.display()))
    }

    /// Loads the config file if it exists, otherwise falls back to defaults.
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_ron() {
        let config: Config = ron::from_str(
            r#"(
                email: "ops@example.com",
                clone_all: true,
            )"#,
        )
        .unwrap();
        assert_eq!(config.email, "ops@example.com");
        assert!(config.clone_all);
        // Unset fields keep their defaults.
        assert_eq!(config.locations_path, PathBuf::from("Locations.csv"));
        assert_eq!(config.login_timeout_secs, 300);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("does/not/exist.ron").unwrap();
        assert_eq!(config.api_url, "https://api.jazz.co");
        assert!(!config.clone_all);
    }
}
