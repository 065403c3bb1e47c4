//! Installer configuration
//!
//! Three pieces, all explicit values rather than globals:
//! - [`Settings`]: manifest location and HTTP behaviour (`settings.yaml`)
//! - [`PathStore`]: the last-used game root (`plugins_path.txt`, plain text)
//! - [`InstallConfig`]: the root a run installs into, with the derived
//!   BepInEx paths

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::InstallError;

/// Default manifest location (GitHub "repository contents" endpoint)
pub const DEFAULT_MANIFEST_URL: &str =
    "https://api.github.com/repos/vainstar1/vap-mod-links/contents/mods.txt";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Host runtime folder created by the BepInEx pack
pub const BEPINEX_DIR: &str = "BepInEx";

/// Plugin folder created by BepInEx on the game's first launch
pub const PLUGINS_DIR: &str = "plugins";

/// Split files live in this folder under the plugins directory
pub const SPLITS_DIR: &str = "SpeedrunningUtils.Splits";

const SETTINGS_FILE: &str = "settings.yaml";
const PATH_FILE: &str = "plugins_path.txt";

/// User settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// URL of the manifest document
    pub manifest_url: String,

    /// Timeout applied to every HTTP request
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: concat!("vapmod/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Result<Self, InstallError> {
        Self::load_from_path(&config_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from a specific path, falling back to defaults
    pub fn load_from_path(path: &Path) -> Result<Self, InstallError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            InstallError::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        serde_yaml_ng::from_str(&content).map_err(|e| {
            InstallError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Save settings to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<(), InstallError> {
        let content = serde_yaml_ng::to_string(self)
            .map_err(|e| InstallError::Config(format!("failed to serialize settings: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InstallError::Config(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        std::fs::write(path, content).map_err(|e| {
            InstallError::Config(format!("failed to write {}: {e}", path.display()))
        })
    }
}

/// Plain-text store for the last-used game root
#[derive(Debug, Clone)]
pub struct PathStore {
    path: PathBuf,
}

impl PathStore {
    /// Store in the platform config directory
    pub fn open_default() -> Result<Self, InstallError> {
        Ok(Self::at(config_dir()?.join(PATH_FILE)))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Read the stored root, creating an empty store on first use
    pub fn load(&self) -> Result<String, InstallError> {
        if !self.path.exists() {
            self.save("")?;
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            InstallError::Config(format!("failed to read {}: {e}", self.path.display()))
        })?;

        Ok(content.trim().to_string())
    }

    pub fn save(&self, root: &str) -> Result<(), InstallError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InstallError::Config(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        std::fs::write(&self.path, root).map_err(|e| {
            InstallError::Config(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

/// The game root a run installs into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    pub root: PathBuf,
}

impl InstallConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/BepInEx`
    pub fn bepinex_dir(&self) -> PathBuf {
        self.root.join(BEPINEX_DIR)
    }

    /// `<root>/BepInEx/plugins`
    pub fn plugins_dir(&self) -> PathBuf {
        self.bepinex_dir().join(PLUGINS_DIR)
    }

    /// `<root>/BepInEx/plugins/SpeedrunningUtils.Splits`
    pub fn splits_dir(&self) -> PathBuf {
        self.plugins_dir().join(SPLITS_DIR)
    }
}

/// Platform config directory, created on demand
pub fn config_dir() -> Result<PathBuf, InstallError> {
    let config_dir = directories::ProjectDirs::from("com", "vainstar1", "vapmod")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| InstallError::Config("could not determine config directory".into()))?;

    std::fs::create_dir_all(&config_dir).map_err(|e| {
        InstallError::Config(format!("failed to create {}: {e}", config_dir.display()))
    })?;

    Ok(config_dir)
}
