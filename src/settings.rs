use crate::error::{Error, Result};
use crate::model::{ArrowMode, PaletteColor, default_palette};
use crate::persistence::default_annotations_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub palette: Vec<PaletteColor>,
    pub arrow_mode: ArrowMode,
    pub show_straight_arrows: bool,
    pub font_size: f32,
    /// Maximum number of undo steps kept. Unbounded when absent.
    pub history_limit: Option<usize>,
    pub annotations_dir: PathBuf,
    pub last_source: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            arrow_mode: ArrowMode::Freehand,
            show_straight_arrows: false,
            font_size: 14.0,
            history_limit: None,
            annotations_dir: default_annotations_dir(),
            last_source: None,
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = PathBuf::from(home).join(".config").join("codemark.toml");
            if path.exists() {
                return Some(path);
            }
        }
        ["settings.toml", "settings.json"]
            .into_iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

pub fn load_settings(path: &Path) -> Result<AppSettings> {
    let s = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let toml_first = is_toml(path);
    let parsed = if toml_first {
        toml::from_str::<AppSettings>(&s).map_err(|source| Error::TomlDe {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str::<AppSettings>(&s).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    };
    match parsed {
        Ok(settings) => Ok(settings),
        Err(primary) => {
            let fallback = if toml_first {
                serde_json::from_str::<AppSettings>(&s).ok()
            } else {
                toml::from_str::<AppSettings>(&s).ok()
            };
            fallback.ok_or(primary)
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<()> {
    let text = if is_toml(path) {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings).map_err(Error::Encode)?
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| Error::io(path, e))?;
    log::debug!("saved settings to {}", path.display());
    Ok(())
}
