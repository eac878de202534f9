use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PaytrailError, Result};
use crate::fields::StatusFilter;
use crate::importer::ParseContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_owner_user_id")]
    pub owner_user_id: String,
    /// Status wording to skip on top of the built-in cancelled/closed/refunded list.
    #[serde(default)]
    pub extra_skip_statuses: Vec<String>,
}

fn default_owner_user_id() -> String {
    "local".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            owner_user_id: default_owner_user_id(),
            extra_skip_statuses: Vec::new(),
        }
    }
}

impl Settings {
    pub fn parse_context(&self) -> ParseContext {
        ParseContext {
            status_filter: StatusFilter::with_extra(&self.extra_skip_statuses),
            ..ParseContext::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("paytrail.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("paytrail")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("paytrail")
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
        .map_err(|e| PaytrailError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            owner_user_id: "alice".to_string(),
            extra_skip_statuses: vec!["对方已退还".to_string()],
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.owner_user_id, "alice");
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.extra_skip_statuses, vec!["对方已退还"]);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.owner_user_id, "local");
        assert!(s.extra_skip_statuses.is_empty());
    }

    #[test]
    fn test_parse_context_includes_extra_statuses() {
        let s = Settings {
            extra_skip_statuses: vec!["已冲正".to_string()],
            ..Settings::default()
        };
        let ctx = s.parse_context();
        assert!(ctx.status_filter.should_skip("已冲正"));
        assert!(ctx.status_filter.should_skip("交易关闭"));
    }

    #[test]
    fn test_db_path() {
        let s = Settings {
            data_dir: "/data".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.db_path(), PathBuf::from("/data/paytrail.db"));
    }
}
