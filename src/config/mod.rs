//! Configuration management for Pitkit
//!
//! Uses XDG-compliant paths:
//! - Config: ~/.config/pitkit/config.toml
//! - Data: ~/.local/share/pitkit/

mod paths;

pub use paths::{default_game_mods_dir, Paths};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Game executable that marks a valid game folder
pub const GAME_EXECUTABLE: &str = "mxbikes.exe";
/// Game settings file, also required in a valid game folder
pub const GAME_CONFIG_FILE: &str = "mxbikes.ini";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Game install folder (holds mxbikes.exe and mxbikes.ini)
    pub game_dir: Option<String>,

    /// Use this mods folder instead of the one the game is configured with
    pub mods_dir_override: Option<String>,

    /// Root for per-install scratch directories
    pub scratch_dir_override: Option<String>,

    /// Mods folder given on the command line; wins over everything and is
    /// never saved
    #[serde(skip)]
    pub runtime_mods_dir: Option<PathBuf>,

    /// Paths configuration
    #[serde(skip)]
    pub paths: Paths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_dir: None,
            mods_dir_override: None,
            scratch_dir_override: None,
            runtime_mods_dir: None,
            paths: Paths::new(),
        }
    }
}

impl Config {
    /// Resolve the mods root: the command-line folder, the saved override,
    /// then the folder named in the game's `mxbikes.ini`, then the game's
    /// default documents location.
    pub fn mods_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.runtime_mods_dir {
            return Ok(dir.clone());
        }
        if let Some(dir) = self.mods_dir_override.as_deref().filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        if let Some(game_dir) = self.game_dir.as_deref().filter(|d| !d.is_empty()) {
            let game_dir = Path::new(game_dir);
            let ini = game_dir.join(GAME_CONFIG_FILE);
            if ini.is_file() {
                let content = std::fs::read_to_string(&ini)
                    .with_context(|| format!("Failed to read {}", ini.display()))?;
                if let Some(folder) = mods_folder_from_ini(&content) {
                    let folder = PathBuf::from(folder);
                    return Ok(if folder.is_absolute() {
                        folder
                    } else {
                        game_dir.join(folder)
                    });
                }
            }
        }

        match default_game_mods_dir() {
            Some(dir) => Ok(dir),
            None => bail!("Could not determine the mods folder; set one with `pitkit config set-mods-dir`"),
        }
    }

    /// Root for per-install scratch directories
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir_override
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.paths.scratch_dir())
    }

    /// Set the game folder after checking it holds the game
    pub fn set_game_dir(&mut self, dir: &Path) -> Result<()> {
        if !verify_game_dir(dir) {
            bail!(
                "{} is not an MX Bikes folder (expected {} and {})",
                dir.display(),
                GAME_EXECUTABLE,
                GAME_CONFIG_FILE
            );
        }
        self.game_dir = Some(dir.to_string_lossy().to_string());
        Ok(())
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        self.paths
            .ensure_dirs()
            .context("Failed to create application directories")
    }

    /// Load configuration from disk, or create default
    pub async fn load() -> Result<Self> {
        Self::load_from(Paths::new()).await
    }

    /// Load configuration using the given paths
    pub async fn load_from(paths: Paths) -> Result<Self> {
        let config_path = paths.config_file();

        let mut config: Config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Config {
                paths: paths.clone(),
                ..Config::default()
            };
            config.save().await?;
            config
        };

        config.paths = paths;
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self) -> Result<()> {
        let config_path = self.paths.config_file();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .await
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// A game folder must contain both the executable and its settings file
pub fn verify_game_dir(dir: &Path) -> bool {
    dir.join(GAME_EXECUTABLE).is_file() && dir.join(GAME_CONFIG_FILE).is_file()
}

/// Value of `folder=` in the `[mods]` section of an mxbikes.ini
pub fn mods_folder_from_ini(content: &str) -> Option<String> {
    let mut in_mods = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_mods = section.trim().eq_ignore_ascii_case("mods");
            continue;
        }
        if !in_mods {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("folder") {
                let value = value.trim().trim_matches('"');
                return (!value.is_empty()).then(|| value.to_string());
            }
        }
    }

    None
}
