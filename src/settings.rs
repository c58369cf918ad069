use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server_url: String,
    #[serde(default)]
    pub api_key: String,
    /// When true, a split allocation whose amounts/percentages do not
    /// reconcile to the transaction total is rejected client-side instead
    /// of submitted with a warning. The server re-validates either way.
    #[serde(default)]
    pub enforce_split_totals: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            api_key: String::new(),
            enforce_split_totals: false,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cardreview")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ReviewError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            server_url: "https://erp.example.com".to_string(),
            api_key: "abc123".to_string(),
            enforce_split_totals: true,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.server_url, "https://erp.example.com");
        assert_eq!(loaded.api_key, "abc123");
        assert!(loaded.enforce_split_totals);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.server_url, "http://localhost:8000");
        assert!(s.api_key.is_empty());
        assert!(!s.enforce_split_totals);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"server_url": "https://erp.example.com"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.server_url, "https://erp.example.com");
        assert!(s.api_key.is_empty());
        assert!(!s.enforce_split_totals);
    }
}
