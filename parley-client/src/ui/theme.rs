//! Theme preference
//!
//! The chosen theme is persisted in the preferences file. Without a stored
//! choice the terminal's color-scheme hint decides. Storage problems never
//! fail the caller; the preference then only lasts for the session.

use std::path::{Path, PathBuf};

use crossterm::style::Color;
use serde::{Deserialize, Serialize};

use parley_utils::{ensure_dir, ParleyError, Result};

/// Environment variable terminals use to advertise their colors
const COLOR_HINT_VAR: &str = "COLORFGBG";

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Palette for this theme
    pub fn palette(&self) -> Palette {
        match self {
            Self::Dark => Palette {
                user: Color::Cyan,
                bot: Color::Green,
                notice: Color::DarkGrey,
                formula: Color::Yellow,
                timestamp: Color::DarkGrey,
                info: Color::Blue,
                success: Color::Green,
                error: Color::Red,
            },
            Self::Light => Palette {
                user: Color::DarkBlue,
                bot: Color::DarkGreen,
                notice: Color::Grey,
                formula: Color::DarkMagenta,
                timestamp: Color::Grey,
                info: Color::DarkBlue,
                success: Color::DarkGreen,
                error: Color::DarkRed,
            },
        }
    }

    /// Theme suggested by a `COLORFGBG` value (`"fg;bg"` or `"fg;x;bg"`)
    ///
    /// Dark backgrounds are the low ANSI indexes except 7. Without a usable
    /// hint the light theme is used.
    pub fn from_color_hint(hint: Option<&str>) -> Self {
        let background = hint
            .and_then(|h| h.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());

        match background {
            Some(0..=6) | Some(8) => Self::Dark,
            _ => Self::Light,
        }
    }
}

/// Colors used by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub bot: Color,
    pub notice: Color,
    pub formula: Color,
    pub timestamp: Color,
    pub info: Color,
    pub success: Color,
    pub error: Color,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<Theme>,
}

/// Loads, toggles and saves the theme preference
#[derive(Debug)]
pub struct ThemeStore {
    path: PathBuf,
    theme: Theme,
}

impl ThemeStore {
    /// Load the preference at `path`, falling back to the terminal hint
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let hint = std::env::var(COLOR_HINT_VAR).ok();
        Self::load_with_hint(path, hint.as_deref())
    }

    pub fn load_with_hint(path: impl Into<PathBuf>, hint: Option<&str>) -> Self {
        let path = path.into();
        let stored = match read_preferences(&path) {
            Ok(prefs) => prefs.and_then(|p| p.theme),
            Err(e) => {
                tracing::warn!("Ignoring unreadable preferences: {}", e);
                None
            }
        };

        let theme = stored.unwrap_or_else(|| Theme::from_color_hint(hint));
        tracing::debug!(theme = theme.as_str(), stored = stored.is_some(), "Theme loaded");
        Self { path, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip the theme and try to persist it
    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(e) = self.save() {
            tracing::warn!("Theme preference kept for this session only: {}", e);
        }
        self.theme
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            ensure_dir(dir).map_err(|source| ParleyError::FileWrite {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let prefs = Preferences {
            theme: Some(self.theme),
        };
        let json = serde_json::to_string_pretty(&prefs)
            .map_err(|e| ParleyError::internal(format!("Failed to encode preferences: {}", e)))?;

        std::fs::write(&self.path, json).map_err(|source| ParleyError::FileWrite {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_preferences(path: &Path) -> Result<Option<Preferences>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ParleyError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ParleyError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
