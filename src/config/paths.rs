//! XDG-compliant path management

use directories::{BaseDirs, ProjectDirs, UserDirs};
use std::path::{Path, PathBuf};

/// Manages all application paths using XDG base directory specification
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    /// Create a new Paths instance
    pub fn new() -> Self {
        match ProjectDirs::from("", "", "pitkit") {
            Some(dirs) => Self {
                config_dir: dirs.config_dir().to_path_buf(),
                data_dir: dirs.data_dir().to_path_buf(),
            },
            None => {
                // No home directory; keep everything together somewhere writable
                let root = std::env::temp_dir().join("pitkit");
                tracing::warn!(
                    "Could not determine home directory, using {}",
                    root.display()
                );
                Self::with_root(&root)
            }
        }
    }

    /// All paths below a single root
    pub fn with_root(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    // ========== Config Paths ==========

    /// Config directory: ~/.config/pitkit/
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Main config file: ~/.config/pitkit/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    // ========== Data Paths ==========

    /// Data directory: ~/.local/share/pitkit/
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Registry database: ~/.local/share/pitkit/pitkit.db
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("pitkit.db")
    }

    // ========== Scratch Paths ==========

    /// Default root for per-install scratch directories: <temp>/pitkit/
    pub fn scratch_dir(&self) -> PathBuf {
        std::env::temp_dir().join("pitkit")
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.data_dir())?;
        Ok(())
    }
}

/// Where the game keeps mods when `mxbikes.ini` does not say:
/// `<Documents>/PiBoSo/MX Bikes/mods`
pub fn default_game_mods_dir() -> Option<PathBuf> {
    let documents = UserDirs::new()
        .and_then(|u| u.document_dir().map(Path::to_path_buf))
        .or_else(|| BaseDirs::new().map(|b| b.home_dir().join("Documents")))?;
    Some(documents.join("PiBoSo").join("MX Bikes").join("mods"))
}
