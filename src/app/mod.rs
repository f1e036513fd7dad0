//! Application state and orchestration

mod actions;

use crate::config::Config;
use crate::db::Database;
use crate::mods::{ModInstaller, ModManager, Prompter};

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main application struct that orchestrates all components
pub struct App {
    /// Application configuration
    pub config: Arc<RwLock<Config>>,

    /// Mod registry
    pub db: Arc<Database>,

    /// Mod manager
    pub mods: Arc<ModManager>,

    /// Non-interactive run: no progress bars
    batch: bool,
}

impl App {
    /// Create a new App instance. `prompter` answers every install question.
    pub async fn new(config: Config, prompter: Arc<dyn Prompter>, batch: bool) -> Result<Self> {
        config.ensure_dirs().context("Failed to create directories")?;

        let db = Database::open(&config.paths.database_file())
            .context("Failed to open database")?;
        Self::with_database(config, Arc::new(db), prompter, batch)
    }

    /// Build the app around an already opened registry
    pub fn with_database(
        config: Config,
        db: Arc<Database>,
        prompter: Arc<dyn Prompter>,
        batch: bool,
    ) -> Result<Self> {
        let mods_root = match config.mods_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("{:#}", e);
                PathBuf::new()
            }
        };
        tracing::debug!("Mods folder: {}", mods_root.display());

        let installer = ModInstaller::new(mods_root, config.scratch_dir(), prompter);
        let mods = Arc::new(ModManager::new(installer, db.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            db,
            mods,
            batch,
        })
    }

    /// Set or clear the mods folder override.
    pub async fn set_mods_dir_override(&self, path: Option<&str>) -> Result<()> {
        let mut config = self.config.write().await;
        config.mods_dir_override = path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToOwned::to_owned);
        config.save().await?;
        Ok(())
    }

    /// Point the config at the game folder.
    pub async fn set_game_dir(&self, path: &str) -> Result<()> {
        let mut config = self.config.write().await;
        config.set_game_dir(std::path::Path::new(path.trim()))?;
        config.save().await?;
        Ok(())
    }
}
