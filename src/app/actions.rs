//! CLI command action handlers

use super::App;
use crate::config::verify_game_dir;
use crate::mods::{ModType, ProgressCallback};
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

impl App {
    // ========== Mod Commands ==========

    pub async fn cmd_install(&self, path: &str, name: Option<&str>) -> Result<()> {
        let source = Path::new(path);
        println!("Installing mod from: {}", source.display());

        let bar = self.extraction_bar();
        let progress: ProgressCallback = {
            let bar = bar.clone();
            Arc::new(move |file: String, done: usize, total: usize| {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
                bar.set_message(file);
            })
        };

        let result = self.mods.install(source, name, Some(progress)).await;
        bar.finish_and_clear();
        let installed = result?;

        if installed.files.is_empty() {
            println!("Nothing was installed from {}.", source.display());
        }
        println!(
            "Installed: {} ({}, {} file(s))",
            installed.name,
            installed.mod_type,
            installed.files.file_count()
        );
        Ok(())
    }

    fn extraction_bar(&self) -> ProgressBar {
        if self.batch {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar
    }

    pub async fn cmd_uninstall(&self, name: &str) -> Result<()> {
        let report = self.mods.uninstall(name)?;

        println!("Removed: {}", name);
        println!(
            "  {} file(s), {} folder(s) deleted",
            report.files_removed, report.dirs_removed
        );
        if !report.errors.is_empty() {
            println!("  {} problem(s), see the log for details:", report.errors.len());
            for error in &report.errors {
                println!("    {}", error);
            }
        }
        Ok(())
    }

    pub async fn cmd_list(&self) -> Result<()> {
        let mods = self.mods.list_mods()?;

        if mods.is_empty() {
            println!("No mods installed.");
            return Ok(());
        }

        println!("Installed Mods:");
        println!("{:-<60}", "");
        for (i, m) in mods.iter().enumerate() {
            let kind = match m.track_type {
                Some(track) => format!("{}/{}", m.mod_type, track),
                None => m.mod_type.to_string(),
            };
            println!("{:>3}. {} [{}]", i + 1, m.name, kind);
        }
        Ok(())
    }

    pub async fn cmd_info(&self, name: &str) -> Result<()> {
        let m = self.mods.get_mod(name)?;

        println!("Mod Information");
        println!("{:-<40}", "");
        println!("Name:      {}", m.name);
        println!("Type:      {}", m.mod_type);
        if let Some(track) = m.track_type {
            println!("Track:     {}", track);
        }
        println!("Installed: {}", m.installed_at.format("%Y-%m-%d %H:%M"));
        println!("Files:     {}", m.files.file_count());
        for path in m.files.file_paths() {
            println!("  {}", path.display());
        }
        Ok(())
    }

    pub async fn cmd_rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.mods.rename_mod(old_name, new_name)?;
        println!("Renamed: {} -> {}", old_name, new_name.trim());
        Ok(())
    }

    // ========== Status & Config ==========

    pub async fn cmd_status(&self) -> Result<()> {
        let config = self.config.read().await;

        println!("Pitkit Status");
        println!("{:-<40}", "");

        match config.game_dir.as_deref() {
            Some(dir) if verify_game_dir(Path::new(dir)) => println!("Game:        {}", dir),
            Some(dir) => println!("Game:        {} (mxbikes.exe not found)", dir),
            None => println!("Game:        not set"),
        }

        let mods_root = self.mods.mods_root();
        let marker = if mods_root.is_dir() { "" } else { " (missing)" };
        println!("Mods folder: {}{}", mods_root.display(), marker);

        let mods = self.mods.list_mods()?;
        let count = |t: ModType| mods.iter().filter(|m| m.mod_type == t).count();
        println!(
            "Mods:        {} installed ({} bike, {} track, {} rider, {} other)",
            mods.len(),
            count(ModType::Bike),
            count(ModType::Track),
            count(ModType::Rider),
            count(ModType::Other)
        );
        Ok(())
    }

    pub async fn cmd_config_show(&self) -> Result<()> {
        let config = self.config.read().await;

        println!("Configuration");
        println!("{:-<40}", "");
        println!("Config file:  {}", config.paths.config_file().display());
        println!("Database:     {}", config.paths.database_file().display());
        println!("Game folder:  {}", config.game_dir.as_deref().unwrap_or("not set"));
        println!(
            "Mods folder:  {}",
            config
                .mods_dir_override
                .as_deref()
                .map(|d| format!("{} (override)", d))
                .unwrap_or_else(|| self.mods.mods_root().display().to_string())
        );
        println!("Scratch root: {}", config.scratch_dir().display());
        Ok(())
    }

    pub async fn cmd_set_game_dir(&self, path: &str) -> Result<()> {
        if path.trim().is_empty() {
            bail!("Game folder cannot be empty");
        }
        self.set_game_dir(path).await?;
        println!("Game folder set to {}", path.trim());
        Ok(())
    }

    pub async fn cmd_set_mods_dir(&self, path: &str) -> Result<()> {
        self.set_mods_dir_override(Some(path)).await?;
        if path.trim().is_empty() {
            println!("Mods folder override cleared.");
        } else {
            println!("Mods folder set to {}", path.trim());
        }
        Ok(())
    }
}
