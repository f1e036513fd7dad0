#![allow(dead_code)]

use pitkit::db::Database;
use pitkit::mods::{ModInstaller, ModManager, ScriptedPrompter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Scratch layout for one test: a mods root, a scratch root and a place to
/// put install sources.
pub struct TestEnv {
    pub tmp: TempDir,
    pub mods: PathBuf,
    pub scratch: PathBuf,
    pub downloads: PathBuf,
}

pub fn setup_test_env() -> TestEnv {
    let tmp = tempfile::tempdir().unwrap();
    let mods = tmp.path().join("MX Bikes/mods");
    let scratch = tmp.path().join("scratch");
    let downloads = tmp.path().join("downloads");

    // The game ships these on a fresh install
    for dir in ["bikes", "tracks/motocross", "rider/helmets", "tyres"] {
        fs::create_dir_all(mods.join(dir)).unwrap();
    }
    fs::create_dir_all(&downloads).unwrap();

    TestEnv {
        tmp,
        mods,
        scratch,
        downloads,
    }
}

/// A manager over an in-memory registry, answering questions from `answers`
pub fn manager(env: &TestEnv, answers: &[&str]) -> (ModManager, Arc<ScriptedPrompter>) {
    let prompter = Arc::new(ScriptedPrompter::new(answers.iter().copied()));
    let installer = ModInstaller::new(env.mods.clone(), env.scratch.clone(), prompter.clone());
    let db = Arc::new(Database::open_in_memory().unwrap());
    (ModManager::new(installer, db), prompter)
}

pub fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"data").unwrap();
}

/// Build a zip archive holding `entries` (path, contents)
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Entries left in the scratch root
pub fn scratch_leftovers(env: &TestEnv) -> usize {
    fs::read_dir(&env.scratch).map(|d| d.count()).unwrap_or(0)
}

/// Resolve a manifest path (lowercased folders) against the real tree
pub fn resolve_ci(root: &Path, rel: &Path) -> Option<PathBuf> {
    let mut current = root.to_path_buf();
    for part in rel.iter() {
        let part = part.to_string_lossy();
        current = fs::read_dir(&current)
            .ok()?
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(&part))?
            .path();
    }
    Some(current)
}
