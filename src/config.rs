//! Persisted dashboard settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::units::Units;

const APP_DIR: &str = "skycast";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub units: Units,
    pub demo_mode: bool,
    pub last_city: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::Metric,
            demo_mode: true,
            last_city: None,
        }
    }
}

impl Settings {
    /// `<config dir>/skycast/settings.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loaded settings");
                Ok(serde_json::from_str(&text)?)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// The configured key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Demo data is used when asked for or when there is no key to go live.
    pub fn use_demo(&self) -> bool {
        self.demo_mode || self.api_key().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.use_demo());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            api_key: Some("abc123".into()),
            units: Units::Imperial,
            demo_mode: false,
            last_city: Some("Nairobi".into()),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"units": "imperial"}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.units, Units::Imperial);
        assert!(settings.demo_mode);
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(crate::error::Error::SettingsFormat(_))
        ));
    }

    #[test]
    fn test_use_demo() {
        let mut settings = Settings {
            demo_mode: false,
            ..Default::default()
        };
        assert!(settings.use_demo());

        settings.api_key = Some("   ".into());
        assert!(settings.use_demo());

        settings.api_key = Some(" key ".into());
        assert_eq!(settings.api_key(), Some("key"));
        assert!(!settings.use_demo());

        settings.demo_mode = true;
        assert!(settings.use_demo());
    }
}
