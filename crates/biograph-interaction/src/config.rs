//! Configuration file management for BioGraph Assistant.
//!
//! Supports reading secrets from `~/.config/biograph/secret.json`.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use biograph_core::BioGraphError;

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub knowledge_graph: Option<ServiceConfig>,
    #[serde(default)]
    pub literature: Option<ServiceConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Configuration for one of the backing HTTP services.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Loads the secret configuration file from ~/.config/biograph/secret.json
pub fn load_secret_config() -> Result<SecretConfig, BioGraphError> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(BioGraphError::config(format!(
            "Configuration file not found at: {}",
            config_path.display()
        )));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        BioGraphError::config(format!(
            "Failed to read configuration file at {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        BioGraphError::config(format!(
            "Failed to parse configuration file at {}: {}",
            config_path.display(),
            e
        ))
    })
}

/// Returns the path to the configuration file: ~/.config/biograph/secret.json
fn get_config_path() -> Result<PathBuf, BioGraphError> {
    let home = dirs::home_dir()
        .ok_or_else(|| BioGraphError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("biograph").join("secret.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_config_parses_partial_files() {
        let config: SecretConfig = serde_json::from_str(
            r#"{ "gemini": { "api_key": "k" } }"#,
        )
        .unwrap();
        assert_eq!(config.gemini.unwrap().api_key, "k");
        assert!(config.knowledge_graph.is_none());
        assert!(config.literature.is_none());
    }
}
