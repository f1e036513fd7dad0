//! Decide what an unpacked source contains
//!
//! Sources that ship an author-made `mods` folder are trusted as-is. Anything
//! else is decomposed by file signatures into per-category match lists.

use super::category::{Category, Signature, EDF_EXTENSION};
use super::scanner::{find_deepest_named_subdir, find_dirs_containing_file, find_files_by_ext, parent_dirs};
use super::ModType;
use std::path::{Path, PathBuf};

/// Name of the directory that marks an author-supplied mods layout
pub const MODS_DIR_NAME: &str = "mods";

/// Result of classifying an unpacked source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The source carries a `mods` folder laid out like the game's
    Canonical { mods_dir: PathBuf, mod_type: ModType },
    /// No layout; content was matched by signature
    Decomposed(Decomposition),
}

/// Directories matched by one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatches {
    pub category: Category,
    pub dirs: Vec<PathBuf>,
}

/// Signature matches for every category, in scan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub matches: Vec<CategoryMatches>,
    /// Directories holding `.edf` files no category claimed, one entry per
    /// directory
    pub unrecognized: Vec<PathBuf>,
}

impl Decomposition {
    /// Directories matched by `category`
    pub fn dirs(&self, category: Category) -> &[PathBuf] {
        self.matches
            .iter()
            .find(|m| m.category == category)
            .map(|m| m.dirs.as_slice())
            .unwrap_or(&[])
    }

    /// Every directory some category (or the unrecognized bucket) claimed
    pub fn claimed_dirs(&self) -> Vec<PathBuf> {
        let mut claimed: Vec<PathBuf> = Vec::new();
        let all = self
            .matches
            .iter()
            .flat_map(|m| m.dirs.iter())
            .chain(self.unrecognized.iter());
        for dir in all {
            if !claimed.contains(dir) {
                claimed.push(dir.clone());
            }
        }
        claimed
    }

    /// Directories the paint sweep skips: claimed directories except those
    /// of categories that do not own their paints
    pub fn paint_exclusions(&self) -> Vec<PathBuf> {
        let mut excluded: Vec<PathBuf> = Vec::new();
        let owned = self
            .matches
            .iter()
            .filter(|m| m.category.owns_paints())
            .flat_map(|m| m.dirs.iter())
            .chain(self.unrecognized.iter());
        for dir in owned {
            if !excluded.contains(dir) {
                excluded.push(dir.clone());
            }
        }
        excluded
    }

    pub fn is_empty(&self) -> bool {
        self.unrecognized.is_empty() && self.matches.iter().all(|m| m.dirs.is_empty())
    }
}

/// Classify the unpacked source at `root`
pub fn classify(root: &Path) -> Classification {
    if let Some(mods_dir) = find_deepest_named_subdir(root, MODS_DIR_NAME) {
        let mod_type = mod_type_from_mods_dir(&mods_dir);
        tracing::info!(
            "Found mods layout at {} ({})",
            mods_dir.display(),
            mod_type.as_str()
        );
        return Classification::Canonical { mods_dir, mod_type };
    }

    Classification::Decomposed(decompose(root))
}

/// Run every signature scan over `root`
pub fn decompose(root: &Path) -> Decomposition {
    let matches: Vec<CategoryMatches> = Category::scan_order()
        .map(|category| {
            let dirs = match category.signature() {
                Signature::File(name) => find_dirs_containing_file(root, name),
                Signature::Extension(ext) => parent_dirs(&find_files_by_ext(root, ext, &[])),
            };
            if !dirs.is_empty() {
                tracing::info!("Found {} {}", dirs.len(), category.as_str());
            }
            CategoryMatches { category, dirs }
        })
        .collect();

    let mut decomposition = Decomposition {
        matches,
        unrecognized: Vec::new(),
    };

    let claimed = decomposition.claimed_dirs();
    let leftover = find_files_by_ext(root, EDF_EXTENSION, &claimed);
    decomposition.unrecognized = parent_dirs(&leftover);
    if !decomposition.unrecognized.is_empty() {
        tracing::info!(
            "Found {} folder(s) with unrecognized .edf files",
            decomposition.unrecognized.len()
        );
    }

    decomposition
}

/// Mod type implied by the first-level folders of a `mods` layout
pub fn mod_type_from_mods_dir(mods_dir: &Path) -> ModType {
    let mut names: Vec<String> = match std::fs::read_dir(mods_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().to_lowercase())
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to list {}: {}", mods_dir.display(), e);
            return ModType::Other;
        }
    };
    names.sort();

    names
        .iter()
        .find_map(|name| match name.as_str() {
            "bikes" => Some(ModType::Bike),
            "tracks" => Some(ModType::Track),
            "rider" => Some(ModType::Rider),
            _ => None,
        })
        .unwrap_or(ModType::Other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_canonical_layout_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("Mod/mods/bikes/Yamaha.pkz"));

        assert_eq!(
            classify(root),
            Classification::Canonical {
                mods_dir: root.join("Mod/mods"),
                mod_type: ModType::Bike,
            }
        );
    }

    #[test]
    fn test_mods_type_falls_back_to_other() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("mods/fonts/font.fnt"));
        assert_eq!(mod_type_from_mods_dir(&tmp.path().join("mods")), ModType::Other);

        touch(&tmp.path().join("mods/Tracks/motocross/t.pkz"));
        assert_eq!(mod_type_from_mods_dir(&tmp.path().join("mods")), ModType::Track);
    }

    #[test]
    fn test_decomposition_by_signature() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("Pack/HelmetX/helmet.edf"));
        touch(&root.join("Pack/HelmetX/skin.pnt"));
        touch(&root.join("Pack/Grip/front.tyre"));
        touch(&root.join("Pack/Grip/rear.tyre"));
        touch(&root.join("Pack/Dunes/dunes.map"));
        touch(&root.join("Pack/Dunes/objects.edf"));
        touch(&root.join("Pack/Cam/gopro.edf"));

        let Classification::Decomposed(d) = classify(root) else {
            panic!("expected a decomposition");
        };

        assert_eq!(d.dirs(Category::Helmets), &[root.join("Pack/HelmetX")]);
        assert_eq!(d.dirs(Category::Tyres), &[root.join("Pack/Grip")]);
        assert_eq!(d.dirs(Category::Tracks), &[root.join("Pack/Dunes")]);
        assert!(d.dirs(Category::Boots).is_empty());
        // The .edf next to the track map is claimed by the track
        assert_eq!(d.unrecognized, vec![root.join("Pack/Cam")]);
        assert!(d.claimed_dirs().contains(&root.join("Pack/HelmetX")));

        let paint_excluded = d.paint_exclusions();
        assert!(paint_excluded.contains(&root.join("Pack/HelmetX")));
        assert!(paint_excluded.contains(&root.join("Pack/Cam")));
        assert!(!paint_excluded.contains(&root.join("Pack/Grip")));
        assert!(!paint_excluded.contains(&root.join("Pack/Dunes")));
    }

    #[test]
    fn test_unrecognized_edfs_grouped_by_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("Cam/a.edf"));
        touch(&root.join("Cam/b.edf"));

        let d = decompose(root);
        assert_eq!(d.unrecognized, vec![root.join("Cam")]);
    }

    #[test]
    fn test_decomposition_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("b/boots.edf"));
        touch(&root.join("r/rider.edf"));
        touch(&root.join("bike/model.edf"));
        touch(&root.join("bike/engine.scl"));
        touch(&root.join("w/p_mx.edf"));
        touch(&root.join("p/protection.edf"));
        touch(&root.join("x/unknown.edf"));

        assert_eq!(decompose(root), decompose(root));
        assert!(!decompose(root).is_empty());
    }

    #[test]
    fn test_lone_package_is_not_claimed() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("track.pkz"));

        let d = decompose(tmp.path());
        assert!(d.is_empty());
    }
}
