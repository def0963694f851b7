// Application settings
// Loaded from ~/.config/sheets/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Narrowest column the renderer can draw: one char of content plus padding.
pub const MIN_COLUMN_WIDTH: usize = 3;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid
    #[serde(rename = "grid.rows")]
    pub rows: usize,

    #[serde(rename = "grid.cols")]
    pub cols: usize,

    #[serde(rename = "grid.columnWidth")]
    pub column_width: usize,

    // File
    #[serde(rename = "csv.separator")]
    pub separator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 26,
            column_width: 10,
            separator: ",".to_string(),
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Grid size, fixed for the whole session
    "grid.rows": 100,
    "grid.cols": 26,

    // Display width of each column in characters (minimum 3)
    "grid.columnWidth": 10,

    // Field separator for reading and writing CSV files
    "csv.separator": ","
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheets");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    ///
    /// Never fails: problems with the file are logged and the defaults used.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            Self::create_default_file(&path);
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                log::info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Read, parse and validate a settings file.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SettingsError::Invalid(format!(
                "grid must have at least one row and column (got {} x {})",
                self.rows, self.cols
            )));
        }
        if self.column_width < MIN_COLUMN_WIDTH {
            return Err(SettingsError::Invalid(format!(
                "grid.columnWidth must be at least {} (got {})",
                MIN_COLUMN_WIDTH, self.column_width
            )));
        }
        self.separator_byte()?;
        Ok(())
    }

    /// The CSV separator as a single byte.
    pub fn separator_byte(&self) -> Result<u8, SettingsError> {
        match self.separator.as_bytes() {
            [b] if b.is_ascii() && !matches!(b, b'"' | b'\r' | b'\n') => Ok(*b),
            _ => Err(SettingsError::Invalid(format!(
                "csv.separator must be one ASCII character other than a quote or line break (got {:?})",
                self.separator
            ))),
        }
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("cannot create config directory {}: {}", parent.display(), e);
                return;
            }
        }

        match fs::write(path, DEFAULT_FILE) {
            Ok(()) => log::info!("wrote default settings to {}", path.display()),
            Err(e) => log::warn!("cannot write default settings to {}: {}", path.display(), e),
        }
    }
}
