//! Route decomposed content into a staged mods layout
//!
//! The installer walks a [`Decomposition`] in scan order, asks the user
//! whenever a destination depends on what is already installed, and copies
//! matched content into a staging directory laid out like the mods root.
//! The staging tree is merged into the real mods root by the caller.

use super::category::{
    Destination, InstanceSource, ModelKind, PaintKind, Placement, Route, PACKAGE_EXTENSION,
    PAINT_EXTENSION,
};
use super::classifier::Decomposition;
use super::copy::{copy_contents, copy_into, resolve_child, CopyStats};
use super::error::InstallError;
use super::prompt::Prompter;
use super::scanner::{find_files_by_ext, has_extension};
use super::{ModType, TrackType};
use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};

/// Option offered next to existing track folders
pub const CREATE_NEW_FOLDER: &str = "Create New";

/// What the routed content says about the mod
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Type of the last category that placed content
    pub mod_type: ModType,
    pub track_type: Option<TrackType>,
    /// Files written into the staging tree
    pub files: usize,
}

impl Default for InstallOutcome {
    fn default() -> Self {
        Self {
            mod_type: ModType::Other,
            track_type: None,
            files: 0,
        }
    }
}

/// Stages one decomposed source
pub struct CategoryInstaller<'a> {
    mods_root: &'a Path,
    staging: &'a Path,
    prompter: &'a dyn Prompter,
    mod_name: &'a str,
    outcome: InstallOutcome,
}

impl<'a> CategoryInstaller<'a> {
    pub fn new(
        mods_root: &'a Path,
        staging: &'a Path,
        prompter: &'a dyn Prompter,
        mod_name: &'a str,
    ) -> Self {
        Self {
            mods_root,
            staging,
            prompter,
            mod_name,
            outcome: InstallOutcome::default(),
        }
    }

    /// Stage everything in `decomposition`, then sweep `source_root` for
    /// unclaimed paints and packages.
    pub async fn run(
        mut self,
        source_root: &Path,
        decomposition: &Decomposition,
    ) -> Result<InstallOutcome> {
        for matches in &decomposition.matches {
            let route = matches.category.route();
            for dir in &matches.dirs {
                tracing::info!("Installing {} from {}", matches.category.as_str(), dir.display());
                let Some(rel) = self.resolve_destination(route.destination).await? else {
                    tracing::info!("Skipped {}", dir.display());
                    continue;
                };
                self.place(route, dir, &rel).await;
            }
        }

        for dir in &decomposition.unrecognized {
            self.install_unrecognized(dir).await?;
        }

        self.install_paints(source_root, &decomposition.paint_exclusions())
            .await?;
        self.install_packages(source_root, &decomposition.claimed_dirs())
            .await?;

        Ok(self.outcome)
    }

    /// Turn a destination into a path relative to the mods root.
    /// `Ok(None)` means the user declined.
    async fn resolve_destination(&self, destination: Destination) -> Result<Option<PathBuf>> {
        match destination {
            Destination::Fixed(rel) => Ok(Some(PathBuf::from(rel))),
            Destination::InstalledBike => {
                let bikes = self.instances("bikes", InstanceSource::Packages);
                if bikes.is_empty() {
                    return Err(InstallError::MissingPrerequisite(format!(
                        "No bikes installed, unable to install {} into a bike",
                        self.mod_name
                    ))
                    .into());
                }
                let message = format!("Which bike is {} for?", self.mod_name);
                let bike = self.prompter.ask("Select a bike", &message, &bikes).await?;
                Ok(bike.map(|b| Path::new("bikes").join(b)))
            }
            Destination::TrackFolder => {
                let folder = self.select_track_folder().await?;
                Ok(folder.map(|f| Path::new("tracks").join(f)))
            }
        }
    }

    async fn select_track_folder(&self) -> Result<Option<String>> {
        let mut options: Vec<String> = TrackType::all().iter().map(|t| t.as_str().to_string()).collect();
        for folder in self.instances("tracks", InstanceSource::Directories) {
            if !options.iter().any(|o| o.eq_ignore_ascii_case(&folder)) {
                options.push(folder);
            }
        }
        options.push(CREATE_NEW_FOLDER.to_string());

        let message = format!("What kind of track is {}?", self.mod_name);
        let Some(choice) = self.prompter.ask("Select Track Type", &message, &options).await? else {
            return Ok(None);
        };
        if choice != CREATE_NEW_FOLDER {
            return Ok(Some(choice));
        }

        let Some(name) = self
            .prompter
            .ask_text(
                "Create new track folder",
                "Enter a name for the new track folder",
                "",
            )
            .await?
        else {
            return Ok(None);
        };
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if !is_plain_folder_name(name) {
            bail!("Invalid track folder name '{}'", name);
        }
        Ok(Some(name.to_string()))
    }

    /// Copy `source` into the staged `rel` directory according to the
    /// route, and credit the route's mod type when anything landed.
    async fn place(&mut self, route: Route, source: &Path, rel: &Path) {
        let dest = self.staging.join(rel);
        let stats = match route.placement {
            Placement::Directory => copy_into(source, &dest).await,
            Placement::Contents => copy_contents(source, &dest).await,
        };
        self.record(route.mod_type, rel, stats);
    }

    fn record(&mut self, mod_type: ModType, rel: &Path, stats: CopyStats) {
        if !stats.errors.is_empty() {
            tracing::warn!("{} error(s) while staging {}", stats.errors.len(), rel.display());
        }
        if stats.files == 0 {
            return;
        }

        self.outcome.files += stats.files;
        self.outcome.mod_type = mod_type;
        if mod_type == ModType::Track {
            self.outcome.track_type = rel
                .file_name()
                .and_then(|f| f.to_str())
                .and_then(TrackType::from_name);
        }
    }

    async fn ask_model_kind(&self, subject: &str) -> Result<Option<ModelKind>> {
        let message = format!("What type of mod is {}?", subject);
        let answer = self
            .prompter
            .ask("Select mod type", &message, &ModelKind::labels())
            .await?;
        Ok(answer.as_deref().and_then(ModelKind::from_label))
    }

    async fn install_unrecognized(&mut self, dir: &Path) -> Result<()> {
        let subject = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.mod_name.to_string());

        let Some(kind) = self.ask_model_kind(&subject).await? else {
            tracing::info!("No type chosen for {}, skipping", dir.display());
            return Ok(());
        };
        let route = kind.route();
        if let Some(rel) = self.resolve_destination(route.destination).await? {
            self.place(route, dir, &rel).await;
        }
        Ok(())
    }

    async fn install_paints(&mut self, source_root: &Path, excluded: &[PathBuf]) -> Result<()> {
        let paints = find_files_by_ext(source_root, PAINT_EXTENSION, excluded);
        if paints.is_empty() {
            return Ok(());
        }
        tracing::info!("Found {} unclaimed paint(s)", paints.len());

        let answer = self
            .prompter
            .ask(
                "Select paint type",
                "What type of paints are you installing?",
                &PaintKind::labels(),
            )
            .await?;
        let Some(kind) = answer.as_deref().and_then(PaintKind::from_label) else {
            tracing::info!("No paint type chosen, skipping paints");
            return Ok(());
        };

        let route = kind.route();
        let owners = self.instances(route.owner_dir, route.instances);
        if owners.is_empty() {
            return Err(InstallError::MissingPrerequisite(route.missing.to_string()).into());
        }
        let Some(owner) = self
            .prompter
            .ask(route.prompt_title, route.prompt_message, &owners)
            .await?
        else {
            tracing::info!("No {} chosen, skipping paints", kind.label());
            return Ok(());
        };

        let rel = Path::new(route.owner_dir).join(owner).join(route.subdir);
        let dest = self.staging.join(&rel);
        let mut stats = CopyStats::default();
        for paint in &paints {
            let copied = copy_into(paint, &dest).await;
            stats.files += copied.files;
            stats.errors.extend(copied.errors);
        }
        self.record(route.mod_type, &rel, stats);
        Ok(())
    }

    async fn install_packages(&mut self, source_root: &Path, claimed: &[PathBuf]) -> Result<()> {
        let packages = find_files_by_ext(source_root, PACKAGE_EXTENSION, claimed);
        if packages.is_empty() {
            return Ok(());
        }
        tracing::info!("Found {} unclaimed package(s)", packages.len());

        let Some(kind) = self.ask_model_kind(self.mod_name).await? else {
            tracing::info!("No type chosen, skipping packages");
            return Ok(());
        };
        let route = kind.route();
        let Some(rel) = self.resolve_destination(route.destination).await? else {
            return Ok(());
        };

        let dest = self.staging.join(&rel);
        let mut stats = CopyStats::default();
        for package in &packages {
            let copied = copy_into(package, &dest).await;
            stats.files += copied.files;
            stats.errors.extend(copied.errors);
        }
        self.record(route.mod_type, &rel, stats);
        Ok(())
    }

    /// Installed instances under `owner_dir`, looking at both the mods root
    /// and content staged earlier in this install. Sorted, without
    /// case-insensitive duplicates.
    fn instances(&self, owner_dir: &str, source: InstanceSource) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let roots = [
            resolve_relative(self.mods_root, Path::new(owner_dir)),
            Some(self.staging.join(owner_dir)),
        ];

        for root in roots.into_iter().flatten() {
            let Ok(entries) = std::fs::read_dir(&root) else {
                continue;
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let name = match (is_dir, source) {
                    (true, InstanceSource::Directories | InstanceSource::DirectoriesAndPackages) => {
                        entry.file_name().to_string_lossy().to_string()
                    }
                    (false, InstanceSource::Packages | InstanceSource::DirectoriesAndPackages)
                        if has_extension(&path, PACKAGE_EXTENSION) =>
                    {
                        match path.file_stem() {
                            Some(stem) => stem.to_string_lossy().to_string(),
                            None => continue,
                        }
                    }
                    _ => continue,
                };
                if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                    names.push(name);
                }
            }
        }

        names.sort_by_key(|n| n.to_lowercase());
        names
    }
}

/// Resolve `rel` below `root` one component at a time, ignoring case.
fn resolve_relative(root: &Path, rel: &Path) -> Option<PathBuf> {
    let mut current = root.to_path_buf();
    for component in rel.components() {
        let Component::Normal(name) = component else {
            continue;
        };
        current = resolve_child(&current, &name.to_string_lossy())?;
    }
    Some(current)
}

/// A single path segment a user may name a folder with
fn is_plain_folder_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(|c| c == '/' || c == '\\')
}
