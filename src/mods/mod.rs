//! Mod management - classification, installation, and manifest-driven removal

mod archive;
pub mod category;
pub mod classifier;
mod copy;
mod error;
pub mod installer;
pub mod manifest;
pub mod prompt;
pub mod scanner;

pub use archive::*;
pub use copy::{copy_contents, copy_into, CopyStats};
pub use error::InstallError;
pub use manifest::{DeleteReport, FolderStructure, FolderStructureDeleter};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};

use crate::db::{Database, ModRecord};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use classifier::{classify, Classification};
use installer::CategoryInstaller;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What kind of content a mod mostly adds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModType {
    Bike,
    Track,
    Rider,
    Other,
}

impl ModType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModType::Bike => "bike",
            ModType::Track => "track",
            ModType::Rider => "rider",
            ModType::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bike" => Some(ModType::Bike),
            "track" => Some(ModType::Track),
            "rider" => Some(ModType::Rider),
            "other" => Some(ModType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ModType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track folders the base game ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Motocross,
    Supercross,
    Enduro,
    Supermoto,
}

impl TrackType {
    pub fn all() -> &'static [TrackType] {
        &[
            TrackType::Motocross,
            TrackType::Supercross,
            TrackType::Enduro,
            TrackType::Supermoto,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrackType::Motocross => "motocross",
            TrackType::Supercross => "supercross",
            TrackType::Enduro => "enduro",
            TrackType::Supermoto => "supermoto",
        }
    }

    /// Parse a track folder name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An installed mod and the manifest of everything it placed on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mod {
    pub name: String,
    pub mod_type: ModType,
    pub track_type: Option<TrackType>,
    pub installed_at: DateTime<Utc>,
    pub files: FolderStructure,
}

impl TryFrom<ModRecord> for Mod {
    type Error = anyhow::Error;

    fn try_from(r: ModRecord) -> Result<Self> {
        let mod_type = ModType::from_name(&r.mod_type)
            .with_context(|| format!("Unknown mod type '{}' for '{}'", r.mod_type, r.name))?;
        let track_type = r.track_type.as_deref().and_then(TrackType::from_name);
        let installed_at = DateTime::parse_from_rfc3339(&r.installed_at)
            .with_context(|| format!("Invalid install time for '{}'", r.name))?
            .with_timezone(&Utc);
        let files: FolderStructure = serde_json::from_str(&r.files)
            .with_context(|| format!("Corrupt manifest for '{}'", r.name))?;

        Ok(Self {
            name: r.name,
            mod_type,
            track_type,
            installed_at,
            files,
        })
    }
}

impl TryFrom<&Mod> for ModRecord {
    type Error = anyhow::Error;

    fn try_from(m: &Mod) -> Result<Self> {
        Ok(Self {
            name: m.name.clone(),
            mod_type: m.mod_type.as_str().to_string(),
            track_type: m.track_type.map(|t| t.as_str().to_string()),
            installed_at: m.installed_at.to_rfc3339(),
            files: serde_json::to_string(&m.files).context("Failed to encode manifest")?,
        })
    }
}

/// Runs one install end to end: unpack, classify, stage, merge, record.
pub struct ModInstaller {
    mods_root: PathBuf,
    scratch_root: PathBuf,
    prompter: Arc<dyn Prompter>,
}

impl ModInstaller {
    pub fn new(mods_root: PathBuf, scratch_root: PathBuf, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            mods_root,
            scratch_root,
            prompter,
        }
    }

    pub fn mods_root(&self) -> &Path {
        &self.mods_root
    }

    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    /// Install `source` under the display name `name`.
    ///
    /// Every install works in its own scratch directory, which is removed
    /// afterwards whether the install succeeded or not.
    pub async fn install(
        &self,
        source: &Path,
        name: &str,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<Mod> {
        SourceKind::detect(source)?;
        if !self.mods_root.is_dir() {
            bail!(
                "Mods folder not found: {} (set it with `pitkit config set-mods-dir`)",
                self.mods_root.display()
            );
        }

        let scratch = self.scratch_root.join(uuid::Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&scratch)
            .await
            .with_context(|| format!("Failed to create scratch directory {}", scratch.display()))?;

        let result = self.install_in(source, name, &scratch, progress_callback).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            tracing::warn!("Failed to remove scratch directory {}: {}", scratch.display(), e);
        }

        result
    }

    async fn install_in(
        &self,
        source: &Path,
        name: &str,
        scratch: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<Mod> {
        let unpacked = scratch.join("source");
        unpack_source(source, &unpacked, name, progress_callback).await?;

        let (layout, mod_type, track_type) = match classify(&unpacked) {
            Classification::Canonical { mods_dir, mod_type } => (mods_dir, mod_type, None),
            Classification::Decomposed(decomposition) => {
                let staged = scratch.join("staged");
                let outcome =
                    CategoryInstaller::new(&self.mods_root, &staged, self.prompter(), name)
                        .run(&unpacked, &decomposition)
                        .await?;
                (staged, outcome.mod_type, outcome.track_type)
            }
        };

        let files = if layout.is_dir() {
            let stats = copy_contents(&layout, &self.mods_root).await;
            tracing::info!(
                "Copied {} file(s) into {} ({} error(s))",
                stats.files,
                self.mods_root.display(),
                stats.errors.len()
            );
            FolderStructure::build_overlay(&layout, &self.mods_root)
        } else {
            FolderStructure::default()
        };

        if files.is_empty() {
            tracing::warn!("Nothing from {} was installed", source.display());
        }

        Ok(Mod {
            name: name.to_string(),
            mod_type,
            track_type,
            installed_at: Utc::now(),
            files,
        })
    }
}

/// Mod manager: installs through [`ModInstaller`] and keeps the registry
/// in step with the mods folder.
pub struct ModManager {
    installer: ModInstaller,
    db: Arc<Database>,
}

impl ModManager {
    pub fn new(installer: ModInstaller, db: Arc<Database>) -> Self {
        Self { installer, db }
    }

    pub fn mods_root(&self) -> &Path {
        self.installer.mods_root()
    }

    /// Install a mod. Without an explicit name the user is asked for one,
    /// defaulting to the source's name.
    pub async fn install(
        &self,
        source: &Path,
        name: Option<&str>,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<Mod> {
        let name = match name {
            Some(name) => name.trim().to_string(),
            None => self.ask_name(source).await?,
        };
        if name.is_empty() {
            bail!("Mod name cannot be empty");
        }

        let installed = self.installer.install(source, &name, progress_callback).await?;

        if self.db.get_mod(&name)?.is_some() {
            tracing::info!("Replacing existing registry entry for '{}'", name);
        }
        self.db.upsert_mod(&ModRecord::try_from(&installed)?)?;

        tracing::info!(
            "Installed '{}' as {} ({} file(s))",
            installed.name,
            installed.mod_type,
            installed.files.file_count()
        );
        Ok(installed)
    }

    async fn ask_name(&self, source: &Path) -> Result<String> {
        let default = default_mod_name(source);
        let answer = self
            .installer
            .prompter()
            .ask_text("Mod name", "Enter a name for this mod", &default)
            .await?;

        Ok(answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or(default))
    }

    /// Remove everything the mod's manifest lists, then drop its entry.
    pub fn uninstall(&self, name: &str) -> Result<DeleteReport> {
        let installed = self.get_mod(name)?;
        tracing::info!("Uninstalling '{}'", installed.name);

        let report = FolderStructureDeleter::delete(&installed.files, self.mods_root());
        self.db.delete_mod(&installed.name)?;

        Ok(report)
    }

    pub fn list_mods(&self) -> Result<Vec<Mod>> {
        self.db
            .list_mods()?
            .into_iter()
            .map(Mod::try_from)
            .collect()
    }

    pub fn get_mod(&self, name: &str) -> Result<Mod> {
        let record = self
            .db
            .get_mod(name)?
            .ok_or_else(|| anyhow::anyhow!("Mod '{}' not found", name))?;
        Mod::try_from(record)
    }

    /// Change a mod's display name. The files on disk are untouched.
    pub fn rename_mod(&self, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            bail!("Mod name cannot be empty");
        }
        if self.db.get_mod(old_name)?.is_none() {
            bail!("Mod '{}' not found", old_name);
        }
        if old_name != new_name && self.db.get_mod(new_name)?.is_some() {
            bail!("A mod named '{}' already exists", new_name);
        }

        self.db.rename_mod(old_name, new_name)
    }
}

/// Source name without its archive extension; folders keep their full name
pub fn default_mod_name(source: &Path) -> String {
    let name = if source.is_dir() {
        source.file_name()
    } else {
        source.file_stem()
    };
    name.map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "mod".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        for t in [ModType::Bike, ModType::Track, ModType::Rider, ModType::Other] {
            assert_eq!(ModType::from_name(t.as_str()), Some(t));
        }
        assert_eq!(TrackType::from_name("Supercross"), Some(TrackType::Supercross));
        assert_eq!(TrackType::from_name("dunes"), None);
    }

    #[test]
    fn test_record_conversion() {
        let installed = Mod {
            name: "Dunes".to_string(),
            mod_type: ModType::Track,
            track_type: Some(TrackType::Enduro),
            installed_at: Utc::now(),
            files: FolderStructure::new(
                Vec::new(),
                vec![(
                    "tracks".to_string(),
                    FolderStructure::new(vec!["dunes.pkz".to_string()], Vec::new()),
                )],
            ),
        };

        let record = ModRecord::try_from(&installed).unwrap();
        assert_eq!(record.mod_type, "track");
        assert_eq!(record.track_type.as_deref(), Some("enduro"));

        let back = Mod::try_from(record).unwrap();
        assert_eq!(back.files, installed.files);
        assert_eq!(back.track_type, Some(TrackType::Enduro));
    }

    #[test]
    fn test_default_mod_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("My.Pack");
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(default_mod_name(&dir), "My.Pack");
        assert_eq!(default_mod_name(Path::new("/dl/Yamaha YZ.zip")), "Yamaha YZ");
    }
}
