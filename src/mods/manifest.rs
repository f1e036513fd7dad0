//! Install manifests and manifest-driven uninstall
//!
//! A [`FolderStructure`] records, for one installed mod, every file and
//! directory that install placed under the mods root. It is the only record
//! of what a mod owns and drives [`FolderStructureDeleter`].

use super::copy::resolve_child;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Directories owned by the base game. Never removed on uninstall, even
/// when left empty.
pub const WHITELISTED_DIRS: &[&str] = &[
    "bikes",
    "tracks",
    "rider",
    "tyres",
    "misc",
    "fonts",
    "pitboard",
    "animations",
    "boots",
    "helmetcams",
    "helmets",
    "protections",
    "riders",
    "default_mx",
    "enduro",
    "motocross",
    "supercross",
    "supermoto",
];

/// Whether a directory basename belongs to the base game
pub fn is_whitelisted(name: &str) -> bool {
    WHITELISTED_DIRS.iter().any(|w| w.eq_ignore_ascii_case(name))
}

/// Immutable tree of files and sub-directories.
///
/// Sub-directory keys are lowercased. Serializes to
/// `{"files": [...], "subfolders": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStructure {
    #[serde(default)]
    files: BTreeSet<String>,
    #[serde(default)]
    subfolders: BTreeMap<String, FolderStructure>,
}

impl FolderStructure {
    /// Build a tree from explicit parts. Sub-directory keys are lowercased;
    /// keys that collide after lowercasing are merged.
    pub fn new<F, S>(files: F, subfolders: S) -> Self
    where
        F: IntoIterator<Item = String>,
        S: IntoIterator<Item = (String, FolderStructure)>,
    {
        let mut merged: BTreeMap<String, FolderStructure> = BTreeMap::new();
        for (name, sub) in subfolders {
            let key = name.to_lowercase();
            let combined = match merged.remove(&key) {
                Some(existing) => existing.union(sub),
                None => sub,
            };
            merged.insert(key, combined);
        }

        Self {
            files: files.into_iter().collect(),
            subfolders: merged,
        }
    }

    fn union(self, other: FolderStructure) -> FolderStructure {
        let files = self.files.into_iter().chain(other.files);
        let subfolders = self.subfolders.into_iter().chain(other.subfolders);
        FolderStructure::new(files, subfolders)
    }

    /// Record everything currently under `dir`
    pub fn build(dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        let mut subfolders = Vec::new();

        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type()?.is_dir() {
                subfolders.push((name, Self::build(&entry.path())?));
            } else {
                files.push(name);
            }
        }

        Ok(Self::new(files, subfolders))
    }

    /// Record every entry of `layout` that is now present under `dest`.
    ///
    /// `layout` is a tree arranged like the mods root (a staged install or
    /// an author-supplied `mods` folder) that has been merged into `dest`.
    /// Names are matched case-insensitively against `dest`, and the name
    /// found on disk is the one recorded.
    ///
    /// Runs after files already reached `dest`, so it never fails: an
    /// unreadable part of `layout` is logged and left out of the result.
    pub fn build_overlay(layout: &Path, dest: &Path) -> Self {
        let mut files = Vec::new();
        let mut subfolders = Vec::new();

        let entries = match std::fs::read_dir(layout) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list {}: {}", layout.display(), e);
                return Self::default();
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", layout.display(), e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(on_disk) = resolve_child(dest, &name) else {
                tracing::warn!(
                    "{} was not placed under {}, leaving it out of the manifest",
                    name,
                    dest.display()
                );
                continue;
            };
            let disk_name = on_disk
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or(name);

            if entry.path().is_dir() {
                if on_disk.is_dir() {
                    subfolders.push((disk_name, Self::build_overlay(&entry.path(), &on_disk)));
                }
            } else {
                files.push(disk_name);
            }
        }

        Self::new(files, subfolders)
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn subfolders(&self) -> &BTreeMap<String, FolderStructure> {
        &self.subfolders
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.subfolders.is_empty()
    }

    /// Number of files in the whole tree
    pub fn file_count(&self) -> usize {
        self.files.len() + self.subfolders.values().map(|s| s.file_count()).sum::<usize>()
    }

    /// Relative paths of every file in the tree (directory parts lowercased)
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        self.collect_paths(PathBuf::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: PathBuf, out: &mut Vec<PathBuf>) {
        out.extend(self.files.iter().map(|f| prefix.join(f)));
        for (name, sub) in &self.subfolders {
            sub.collect_paths(prefix.join(name), out);
        }
    }
}

/// What an uninstall did
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub errors: Vec<String>,
}

impl DeleteReport {
    fn error(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.errors.push(message);
    }
}

/// Removes what a manifest lists, pruning directories it leaves empty
pub struct FolderStructureDeleter;

impl FolderStructureDeleter {
    /// Delete `structure` from `mods_root`.
    ///
    /// Best effort: failures are logged and recorded in the report, never
    /// returned. Directories are removed only once empty and never when
    /// their basename is whitelisted. `mods_root` itself is never removed.
    pub fn delete(structure: &FolderStructure, mods_root: &Path) -> DeleteReport {
        let mut report = DeleteReport::default();
        tracing::info!("Deleting manifest entries from {}", mods_root.display());
        Self::delete_in(structure, mods_root, &mut report);
        tracing::info!(
            "Removed {} file(s) and {} director(ies), {} error(s)",
            report.files_removed,
            report.dirs_removed,
            report.errors.len()
        );
        report
    }

    fn delete_in(structure: &FolderStructure, dir: &Path, report: &mut DeleteReport) {
        for file in structure.files() {
            let Some(path) = resolve_child(dir, file) else {
                report.error(format!("{} is already gone", dir.join(file).display()));
                continue;
            };

            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match removed {
                Ok(()) => report.files_removed += 1,
                Err(e) => report.error(format!("Failed to remove {}: {}", path.display(), e)),
            }
        }

        for (name, sub) in structure.subfolders() {
            let Some(subdir) = resolve_child(dir, name).filter(|p| p.is_dir()) else {
                report.error(format!("{} is already gone", dir.join(name).display()));
                continue;
            };

            Self::delete_in(sub, &subdir, report);
            Self::prune(&subdir, report);
        }
    }

    fn prune(dir: &Path, report: &mut DeleteReport) {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if is_whitelisted(&name) {
            return;
        }

        match std::fs::read_dir(dir) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return;
                }
            }
            Err(e) => {
                report.error(format!("Failed to list {}: {}", dir.display(), e));
                return;
            }
        }

        match std::fs::remove_dir(dir) {
            Ok(()) => report.dirs_removed += 1,
            Err(e) => report.error(format!("Failed to remove {}: {}", dir.display(), e)),
        }
    }
}
