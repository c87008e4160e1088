//! Theme and accent color, read from and written to the local store

use std::str::FromStr;

use crate::error::StoreError;
use crate::store::KeyValueStore;

const THEME_KEY: &str = "ui.theme";
const ACCENT_KEY: &str = "ui.accent";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggle(&self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(()),
        }
    }
}

/// Accent colors offered by the UI
pub const ACCENTS: [&str; 5] = ["cyan", "magenta", "green", "yellow", "blue"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub accent: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            theme: Theme::Dark,
            accent: ACCENTS[0].to_string(),
        }
    }
}

impl Preferences {
    /// Reads preferences, falling back to defaults for missing or unknown values
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Preferences::default();
        let theme = store
            .get(THEME_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.theme);
        let accent = store
            .get(ACCENT_KEY)
            .filter(|v| ACCENTS.contains(&v.as_str()))
            .unwrap_or(defaults.accent);
        Preferences { theme, accent }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(THEME_KEY, self.theme.as_str())?;
        store.set(ACCENT_KEY, &self.accent)?;
        Ok(())
    }

    pub fn next_accent(&mut self) {
        let pos = ACCENTS.iter().position(|a| *a == self.accent).unwrap_or(0);
        self.accent = ACCENTS[(pos + 1) % ACCENTS.len()].to_string();
    }
}
