use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Error;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub database_path: String,
    /// Fixed seed for the tie-break pick; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_persist_results")]
    pub persist_results: bool,
}

fn default_persist_results() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "quiz-results.sqlite3".to_string(),
            seed: None,
            persist_results: default_persist_results(),
        }
    }
}

/// Reads settings, writing defaults back when the file is missing or empty.
pub fn load_settings(path: &Path) -> Result<Settings, Error> {
    if !path.exists() {
        let defaults = Settings::default();
        save_settings(path, &defaults)?;
        return Ok(defaults);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Settings(format!("Unable to read {}: {e}", path.display())))?;
    if raw.trim().is_empty() {
        let defaults = Settings::default();
        save_settings(path, &defaults)?;
        return Ok(defaults);
    }
    serde_json::from_str(&raw).map_err(|e| Error::Settings(format!("Invalid settings JSON: {e}")))
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(path, payload)
        .map_err(|e| Error::Settings(format!("Unable to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::{load_settings, Settings};

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config").join("settings.json");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"databasePath":"a.db","seed":7}"#).expect("write");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.database_path, "a.db");
        assert_eq!(settings.seed, Some(7));
        assert!(settings.persist_results);
    }

    #[test]
    fn invalid_json_is_a_settings_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{nope").expect("write");
        assert!(load_settings(&path).is_err());
    }
}
