//! Install source unpacking and archive extraction (zip, 7z, rar)

use super::copy::copy_into;
use super::error::InstallError;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Progress callback for extraction
/// Parameters: (current_file, processed_count, total_count)
pub type ProgressCallback = Arc<dyn Fn(String, usize, usize) + Send + Sync>;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
    Rar,
    Unknown,
}

impl ArchiveFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match lowercase_extension(path).as_str() {
            "zip" => Self::Zip,
            "7z" => Self::SevenZip,
            "rar" => Self::Rar,
            _ => Self::Unknown,
        }
    }
}

/// What an install source is, decided from the path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A plain folder
    Directory,
    /// A compressed archive that has to be extracted
    Archive(ArchiveFormat),
    /// A single game package (`.pkz` model or `.pnt` paint) copied as-is
    Packaged,
}

impl SourceKind {
    pub fn detect(path: &Path) -> std::result::Result<Self, InstallError> {
        if !path.exists() {
            return Err(InstallError::SourceNotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return Ok(Self::Directory);
        }

        match ArchiveFormat::from_path(path) {
            ArchiveFormat::Unknown => {}
            format => return Ok(Self::Archive(format)),
        }

        match lowercase_extension(path).as_str() {
            "pkz" | "pnt" => Ok(Self::Packaged),
            ext => Err(InstallError::UnsupportedSourceType(format!(".{}", ext))),
        }
    }
}

/// Normalize an install source into a plain directory tree under `dest`.
///
/// Folders and packaged files are copied into `dest` keeping their own name.
/// Archives are extracted into `dest/<folder>`, where `folder` is
/// [`unpack_folder_name`] of the mod name, so content sitting at the archive
/// root still ends up in a folder of its own. `dest` belongs to the unpack
/// and is removed again if extraction fails.
pub async fn unpack_source(
    source: &Path,
    dest: &Path,
    mod_name: &str,
    progress_callback: Option<ProgressCallback>,
) -> Result<SourceKind> {
    let kind = SourceKind::detect(source)?;
    tracing::info!("Unpacking {} ({:?}) into {}", source.display(), kind, dest.display());

    match kind {
        SourceKind::Directory | SourceKind::Packaged => {
            let stats = copy_into(source, dest).await;
            if stats.files == 0 && !stats.errors.is_empty() {
                anyhow::bail!(
                    "Unable to copy {}: {}",
                    source.display(),
                    stats.errors.join("; ")
                );
            }
        }
        SourceKind::Archive(_) => {
            let root = dest.join(unpack_folder_name(mod_name, source));
            if let Err(e) = extract_archive(source, &root, progress_callback).await {
                if dest.exists() {
                    if let Err(cleanup) = tokio::fs::remove_dir_all(dest).await {
                        tracing::warn!(
                            "Failed to remove partial extraction {}: {}",
                            dest.display(),
                            cleanup
                        );
                    }
                }
                return Err(InstallError::ExtractionFailure {
                    archive: source.to_path_buf(),
                    reason: format!("{:#}", e),
                }
                .into());
            }
        }
    }

    Ok(kind)
}

/// Folder name an archive is extracted under: the mod name with characters
/// the game's filesystem rejects replaced by `_`. Falls back to the archive
/// stem, then to `mod`.
pub fn unpack_folder_name(mod_name: &str, source: &Path) -> String {
    fn clean(name: &str) -> String {
        name.chars()
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect::<String>()
            .trim_matches(|c: char| c == '.' || c.is_whitespace())
            .to_string()
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    [clean(mod_name), clean(&stem)]
        .into_iter()
        .find(|n| !n.is_empty())
        .unwrap_or_else(|| "mod".to_string())
}

/// Extract a zip, 7z or rar archive into `dest`, chosen by extension
pub async fn extract_archive(
    archive: &Path,
    dest: &Path,
    progress_callback: Option<ProgressCallback>,
) -> Result<()> {
    type Extractor = fn(&Path, &Path, Option<ProgressCallback>) -> Result<()>;
    let extract: Extractor = match ArchiveFormat::from_path(archive) {
        ArchiveFormat::Zip => extract_zip,
        ArchiveFormat::SevenZip => extract_7z,
        ArchiveFormat::Rar => extract_rar,
        ArchiveFormat::Unknown => {
            anyhow::bail!("{} is not a zip, 7z or rar archive", archive.display())
        }
    };

    tokio::fs::create_dir_all(dest).await?;
    extract(archive, dest, progress_callback)
}

fn extract_zip(archive: &Path, dest: &Path, progress_callback: Option<ProgressCallback>) -> Result<()> {
    let file = std::fs::File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("Not a readable zip archive")?;
    let total = zip.len();

    for index in 0..total {
        // Encrypted entries error out here
        let mut entry = zip
            .by_index(index)
            .context("Unable to extract password protected or damaged ZIP entry")?;
        let entry_name = entry.name().to_string();
        let target = dest.join(sanitize_path(&entry_name));

        if let Some(cb) = &progress_callback {
            cb(entry_name, index + 1, total);
        }

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

fn extract_7z(archive: &Path, dest: &Path, progress_callback: Option<ProgressCallback>) -> Result<()> {
    let report = |label: &str, done: usize| {
        if let Some(cb) = &progress_callback {
            cb(label.to_string(), done, 1);
        }
    };

    // No per-entry progress from sevenz_rust
    report("Extracting 7z archive...", 0);
    sevenz_rust::decompress_file(archive, dest)
        .map_err(|e| anyhow::anyhow!("Not a readable 7z archive: {}", e))?;
    report("Complete", 1);

    Ok(())
}

fn extract_rar(archive: &Path, dest: &Path, progress_callback: Option<ProgressCallback>) -> Result<()> {
    let unrar = which::which("unrar").map_err(|_| {
        anyhow::anyhow!(
            "RAR extraction requires 'unrar' to be installed.\n\
             Install it with: sudo apt install unrar (Debian/Ubuntu)\n\
                              sudo pacman -S unrar (Arch)"
        )
    })?;

    if let Some(cb) = &progress_callback {
        cb("Extracting RAR archive...".to_string(), 0, 1);
    }

    // -p- never asks for a password, so protected archives fail instead of hanging
    let out = std::process::Command::new(unrar)
        .args(["x", "-o+", "-y", "-p-"])
        .arg(archive)
        .arg(dest)
        .output()
        .context("Failed to run unrar")?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!("unrar failed: {}", stderr.trim());
    }

    if let Some(cb) = &progress_callback {
        cb("Complete".to_string(), 1, 1);
    }

    Ok(())
}

/// Sanitize path to prevent directory traversal
fn sanitize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ArchiveFormat::from_path(Path::new("mod.zip")),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("mod.7z")),
            ArchiveFormat::SevenZip
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("mod.rar")),
            ArchiveFormat::Rar
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("mod.ZIP")),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("bike.pkz")),
            ArchiveFormat::Unknown
        );
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("mods/bikes/yz.pkz"), "mods/bikes/yz.pkz");
        assert_eq!(sanitize_path("mods\\bikes\\yz.pkz"), "mods/bikes/yz.pkz");
        assert_eq!(sanitize_path("../../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_path("./foo/./bar"), "foo/bar");
    }

    #[test]
    fn test_source_kind_detection() {
        let tmp = tempfile::tempdir().unwrap();
        let pkz = tmp.path().join("Yamaha.pkz");
        let zip = tmp.path().join("pack.zip");
        let exe = tmp.path().join("setup.exe");
        for f in [&pkz, &zip, &exe] {
            std::fs::write(f, b"x").unwrap();
        }

        assert_eq!(SourceKind::detect(tmp.path()).unwrap(), SourceKind::Directory);
        assert_eq!(SourceKind::detect(&pkz).unwrap(), SourceKind::Packaged);
        assert_eq!(
            SourceKind::detect(&zip).unwrap(),
            SourceKind::Archive(ArchiveFormat::Zip)
        );
        assert!(matches!(
            SourceKind::detect(&exe),
            Err(InstallError::UnsupportedSourceType(ext)) if ext == ".exe"
        ));
        assert!(matches!(
            SourceKind::detect(&tmp.path().join("missing.zip")),
            Err(InstallError::SourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unpack_zip_source() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("helmet.zip");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("HelmetX/helmet.edf", options).unwrap();
            writer.write_all(b"edf").unwrap();
            writer.finish().unwrap();
        }

        let dest = tmp.path().join("out");
        let kind = unpack_source(&archive, &dest, "Airoh", None).await.unwrap();

        assert_eq!(kind, SourceKind::Archive(ArchiveFormat::Zip));
        assert!(dest.join("Airoh/HelmetX/helmet.edf").is_file());
    }

    #[tokio::test]
    async fn test_root_level_archive_content_gets_the_mod_name() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("bell.zip");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("helmet.edf", options).unwrap();
            writer.write_all(b"edf").unwrap();
            writer.finish().unwrap();
        }

        let dest = tmp.path().join("out");
        unpack_source(&archive, &dest, "Bell Moto-9", None).await.unwrap();

        assert!(dest.join("Bell Moto-9/helmet.edf").is_file());
        assert!(!dest.join("helmet.edf").exists());
    }

    #[test]
    fn test_unpack_folder_name() {
        let zip = Path::new("/downloads/pack.zip");
        assert_eq!(unpack_folder_name("Airoh", zip), "Airoh");
        assert_eq!(unpack_folder_name("AC/DC: Helmet?", zip), "AC_DC_ Helmet_");
        assert_eq!(unpack_folder_name("  ..  ", zip), "pack");
        assert_eq!(unpack_folder_name("", Path::new("/")), "mod");
    }

    #[tokio::test]
    async fn test_extract_rejects_unknown_format() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("pack.tar");
        std::fs::write(&archive, b"PK\x03\x04").unwrap();

        let dest = tmp.path().join("out");
        assert!(extract_archive(&archive, &dest, None).await.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unpack_broken_zip_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let dest = tmp.path().join("out");
        let err = unpack_source(&archive, &dest, "Broken", None).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::ExtractionFailure { .. })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unpack_packaged_file_keeps_name() {
        let tmp = tempfile::tempdir().unwrap();
        let pkz = tmp.path().join("track.pkz");
        std::fs::write(&pkz, b"pkz").unwrap();

        let dest = tmp.path().join("out");
        unpack_source(&pkz, &dest, "Track", None).await.unwrap();

        assert!(dest.join("track.pkz").is_file());
    }
}
