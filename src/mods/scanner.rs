//! Recursive signature searches over an unpacked mod tree
//!
//! All scans walk in sorted file-name order so that scanning the same tree
//! twice yields the same result. Unreadable directories are logged and
//! skipped; one bad subtree never aborts a scan.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

fn walk(root: &Path) -> WalkDir {
    WalkDir::new(root).sort_by_file_name()
}

fn log_walk_error(err: walkdir::Error) -> Option<DirEntry> {
    tracing::warn!("Skipping unreadable path during scan: {}", err);
    None
}

/// Directories that directly contain a file named exactly `filename`.
///
/// The match is case-sensitive.
pub fn find_dirs_containing_file(root: &Path, filename: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = walk(root)
        .into_iter()
        .filter_map(|e| e.map_or_else(log_walk_error, Some))
        .filter(|e| !e.file_type().is_dir() && e.file_name().to_str() == Some(filename))
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();

    dirs.dedup();
    tracing::debug!("Found {} director(ies) containing {}", dirs.len(), filename);
    dirs
}

/// Files with extension `ext` (with or without the leading dot, ASCII
/// case-insensitive), skipping any subtree rooted at one of `exclude_dirs`.
pub fn find_files_by_ext(root: &Path, ext: &str, exclude_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let ext = ext.trim_start_matches('.');

    let files: Vec<PathBuf> = walk(root)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && exclude_dirs.iter().any(|x| x == e.path())))
        .filter_map(|e| e.map_or_else(log_walk_error, Some))
        .filter(|e| !e.file_type().is_dir() && has_extension(e.path(), ext))
        .map(|e| e.into_path())
        .collect();

    tracing::debug!("Found {} .{} file(s) under {}", files.len(), ext, root.display());
    files
}

/// The deepest directory below `root` whose name equals `name`, ignoring
/// ASCII case. A match further from `root` beats a shallower one.
pub fn find_deepest_named_subdir(root: &Path, name: &str) -> Option<PathBuf> {
    let mut deepest: Option<(usize, PathBuf)> = None;

    for entry in walk(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.map_or_else(log_walk_error, Some))
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            continue;
        }

        let depth = entry.depth();
        if deepest.as_ref().map_or(true, |(best, _)| depth > *best) {
            deepest = Some((depth, entry.into_path()));
        }
    }

    deepest.map(|(_, path)| path)
}

/// Whether `path` has extension `ext` (no dot), ignoring ASCII case.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Parent directories of `files`, in first-seen order without duplicates.
pub fn parent_dirs(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in files.iter().filter_map(|f| f.parent()) {
        if !dirs.iter().any(|d| d == dir) {
            dirs.push(dir.to_path_buf());
        }
    }
    dirs
}
