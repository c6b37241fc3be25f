use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const PREFERENCES_FILE: &str = "prefs.json";
pub const CALENDAR_EXTENSION: &str = "jobcal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Colour {
    Red,
    Green,
    Blue,
    Cyan,
    White,
    Yellow,
    Magenta,
    #[default]
    Grey,
    Black,
}

impl Colour {
    pub fn style(self) -> ansi_term::Style {
        use ansi_term::Colour as Ansi;
        match self {
            Colour::Red => Ansi::Red.bold(),
            Colour::Green => Ansi::Green.bold(),
            Colour::Blue => Ansi::Blue.bold(),
            Colour::Cyan => Ansi::Cyan.bold(),
            Colour::White => Ansi::White.bold(),
            Colour::Yellow => Ansi::Yellow.bold(),
            Colour::Magenta => Ansi::Purple.bold(),
            // bright black
            Colour::Grey | Colour::Black => Ansi::Fixed(8).normal(),
        }
    }
}

impl Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(v) => write!(f, "{}", v.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

/// Settings that outlive a single command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Name of the active calendar, see [calendar_path].
    pub calendar: String,
    pub colour: Colour,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            calendar: "default".into(),
            colour: Colour::default(),
        }
    }
}

impl Preferences {
    /// Falls back to the defaults when the file is missing or broken.
    pub async fn load(path: &Path) -> Preferences {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(v) => v,
            Err(e) => {
                debug!("No preferences at {path:?}: {e}");
                return Preferences::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Could not load preferences from {path:?}, using defaults: {e}");
            Preferences::default()
        })
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, serde_json::to_vec_pretty(self)?).await?;
        Ok(())
    }
}

/// File of a calendar inside the application directory. Names without an extension get
/// `.jobcal` appended.
pub fn calendar_path(dir: &Path, name: &str) -> PathBuf {
    if name.contains('.') {
        dir.join(name)
    } else {
        dir.join(format!("{name}.{CALENDAR_EXTENSION}"))
    }
}
