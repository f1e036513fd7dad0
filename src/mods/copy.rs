//! Additive, case-aware copies into the mods layout
//!
//! The game treats paths case-insensitively, so when a copy lands next to an
//! entry whose name differs only by case the existing entry is reused
//! instead of creating a sibling. Failures on single entries are logged and
//! collected; a copy never aborts halfway.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;

/// Outcome of a copy operation
#[derive(Debug, Default)]
pub struct CopyStats {
    pub files: usize,
    pub errors: Vec<String>,
}

impl CopyStats {
    fn absorb(&mut self, other: CopyStats) {
        self.files += other.files;
        self.errors.extend(other.errors);
    }

    fn error(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.errors.push(message);
    }
}

/// Find an existing child of `parent` named `name`, ignoring ASCII case.
///
/// An exact match wins over a case-insensitive one.
pub fn resolve_child(parent: &Path, name: &str) -> Option<PathBuf> {
    let exact = parent.join(name);
    if exact.symlink_metadata().is_ok() {
        return Some(exact);
    }

    let entries = std::fs::read_dir(parent).ok()?;
    entries
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|e| e.path())
}

/// Target path for `name` inside `parent`, reusing an existing entry that
/// differs only by case.
fn target_for(parent: &Path, name: &str) -> PathBuf {
    resolve_child(parent, name).unwrap_or_else(|| parent.join(name))
}

/// Copy `source` (file or directory) into `dest_dir`, keeping its name.
/// `dest_dir` is created when missing.
pub async fn copy_into(source: &Path, dest_dir: &Path) -> CopyStats {
    let mut stats = CopyStats::default();

    let name = match source.file_name() {
        Some(n) => n.to_string_lossy().to_string(),
        None => {
            stats.error(format!("Cannot copy {}: no file name", source.display()));
            return stats;
        }
    };

    if let Err(e) = fs::create_dir_all(dest_dir).await {
        stats.error(format!("Failed to create {}: {}", dest_dir.display(), e));
        return stats;
    }

    let target = target_for(dest_dir, &name);
    tracing::debug!("Copying {} to {}", source.display(), target.display());

    if source.is_dir() {
        stats.absorb(copy_dir_recursive(source, &target).await);
    } else {
        match fs::copy(source, &target).await {
            Ok(_) => stats.files += 1,
            Err(e) => stats.error(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                target.display(),
                e
            )),
        }
    }

    stats
}

/// Copy every child of `source_dir` into `dest_dir`, merging with whatever
/// is already there.
pub async fn copy_contents(source_dir: &Path, dest_dir: &Path) -> CopyStats {
    copy_dir_recursive(source_dir, dest_dir).await
}

/// Copy directory recursively (async)
fn copy_dir_recursive(src: &Path, dst: &Path) -> Pin<Box<dyn Future<Output = CopyStats> + Send>> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();

    Box::pin(async move {
        let mut stats = CopyStats::default();

        if let Err(e) = fs::create_dir_all(&dst).await {
            stats.error(format!("Failed to create {}: {}", dst.display(), e));
            return stats;
        }

        let mut entries = match fs::read_dir(&src).await {
            Ok(entries) => entries,
            Err(e) => {
                stats.error(format!("Failed to read {}: {}", src.display(), e));
                return stats;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    stats.error(format!("Failed to read entry in {}: {}", src.display(), e));
                    break;
                }
            };

            let src_path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let dst_path = target_for(&dst, &name);

            if src_path.is_dir() {
                stats.absorb(copy_dir_recursive(&src_path, &dst_path).await);
            } else {
                match fs::copy(&src_path, &dst_path).await {
                    Ok(_) => stats.files += 1,
                    Err(e) => stats.error(format!(
                        "Failed to copy {} to {}: {}",
                        src_path.display(),
                        dst_path.display(),
                        e
                    )),
                }
            }
        }

        stats
    })
}
