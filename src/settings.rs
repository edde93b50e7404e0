// Application settings
// Loaded from ~/.config/shot-tracker/settings.json

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{quote_sheet_name, CellPosition, HEADER_REMOTE_ROW};

pub const DEFAULT_SPREADSHEET_ID: &str = "1qORbraCg2K5LvqwES8syIKsyIaSkpD-3UjwNGWXXRTI";
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{0}` must be at least 1")]
    Invalid(&'static str),
}

/// Where cell values live.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Google Sheets over HTTPS
    #[default]
    Sheets,
    /// A local CSV file laid out like the sheet
    Csv,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Number of mirrored columns, starting at column A
    pub columns: usize,
    /// Number of mirrored data rows below the header
    pub data_rows: usize,
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Sheets,
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            sheet_name: "Sheet1".to_string(),
            columns: 8,
            data_rows: 10,
            api_base: DEFAULT_API_BASE.to_string(),
            token_path: None,
            csv_path: None,
        }
    }
}

impl Settings {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shot-tracker")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load settings from disk, falling back to defaults. A missing file is
    /// written out with the defaults so there is something to edit.
    pub fn load() -> Self {
        Self::load_or_init(&Self::config_path())
    }

    fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            match settings.save_to(path) {
                Ok(()) => log::info!("Wrote default settings to {}", path.display()),
                Err(e) => log::warn!("Could not write {}: {}", path.display(), e),
            }
            return settings;
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The mirrored block must have at least one column and one data row.
    fn validate(&self) -> Result<(), SettingsError> {
        if self.columns == 0 {
            return Err(SettingsError::Invalid("columns"));
        }
        if self.data_rows == 0 {
            return Err(SettingsError::Invalid("data_rows"));
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("token.json"))
    }

    pub fn csv_path(&self) -> PathBuf {
        self.csv_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("sheet.csv"))
    }

    fn last_column(&self) -> String {
        CellPosition::col_to_letter(self.columns.saturating_sub(1))
    }

    /// Header row range, e.g. `Sheet1!A1:H1`
    pub fn header_range(&self) -> String {
        format!(
            "{}!A{row}:{}{row}",
            quote_sheet_name(&self.sheet_name),
            self.last_column(),
            row = HEADER_REMOTE_ROW
        )
    }

    /// Data block range, e.g. `Sheet1!A2:H11`
    pub fn data_range(&self) -> String {
        let first = HEADER_REMOTE_ROW + 1;
        let last = first + self.data_rows.saturating_sub(1);
        format!(
            "{}!A{}:{}{}",
            quote_sheet_name(&self.sheet_name),
            first,
            self.last_column(),
            last
        )
    }
}
