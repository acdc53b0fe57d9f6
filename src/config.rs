use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

/// Agent endpoint used when no config file overrides it.
pub const DEFAULT_ENDPOINT: &str =
    "https://us-central1-my-pmo-agent-v1.cloudfunctions.net/my-pmo-agent";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self { endpoint: None }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("pmodash").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_default_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn endpoint_override_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"endpoint":"http://localhost:8787/agent"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint(), "http://localhost:8787/agent");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{endpoint").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
