use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

const THEME_KEY: &str = "theme";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(ThemeError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Unknown theme '{0}', expected dark or light")]
    Unknown(String),

    #[error("Failed to write preferences to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The user's theme preference, persisted in a small JSON key-value file.
///
/// Created once at startup with `init` and passed to whoever needs it;
/// every change is written straight back to disk.
#[derive(Debug)]
pub struct ThemeState {
    path: PathBuf,
    current: Theme,
}

impl ThemeState {
    /// Read the persisted preference; anything unreadable falls back to light
    pub fn init(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_preferences(&path)
            .remove(THEME_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        debug!("Theme preference {} loaded from {}", current, path.display());
        Self { path, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn toggle(&mut self) -> Result<Theme, ThemeError> {
        self.set(self.current.toggled())?;
        Ok(self.current)
    }

    pub fn set(&mut self, theme: Theme) -> Result<(), ThemeError> {
        self.current = theme;
        self.persist()?;
        info!("Theme set to {}", theme);
        Ok(())
    }

    /// Write the theme key, keeping any other keys already in the file
    fn persist(&self) -> Result<(), ThemeError> {
        let mut preferences = read_preferences(&self.path);
        preferences.insert(THEME_KEY.to_string(), serde_json::to_value(self.current)?);

        let io_error = |source| ThemeError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let body = serde_json::to_string_pretty(&Value::Object(preferences))?;
        fs::write(&self.path, body).map_err(io_error)
    }
}

fn read_preferences(path: &Path) -> Map<String, Value> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Map::new(),
        Err(e) => {
            warn!("Cannot read preferences {}: {}", path.display(), e);
            return Map::new();
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        _ => {
            warn!("Ignoring malformed preferences file {}", path.display());
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_to_light_without_a_file() {
        let dir = tempdir().unwrap();
        let state = ThemeState::init(dir.path().join("preferences.json"));
        assert_eq!(state.current(), Theme::Light);
    }

    #[test]
    fn toggle_persists_across_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut state = ThemeState::init(&path);
        assert_eq!(state.toggle().unwrap(), Theme::Dark);

        let reloaded = ThemeState::init(&path);
        assert_eq!(reloaded.current(), Theme::Dark);

        let mut reloaded = reloaded;
        assert_eq!(reloaded.toggle().unwrap(), Theme::Light);
        assert_eq!(ThemeState::init(&path).current(), Theme::Light);
    }

    #[test]
    fn keeps_unrelated_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"theme":"light","density":"compact"}"#).unwrap();

        ThemeState::init(&path).set(Theme::Dark).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved["density"], "compact");
    }

    #[test]
    fn malformed_file_falls_back_to_light() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(ThemeState::init(&path).current(), Theme::Light);
    }

    #[test]
    fn parses_theme_names() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!(matches!("blue".parse::<Theme>(), Err(ThemeError::Unknown(_))));
    }
}
