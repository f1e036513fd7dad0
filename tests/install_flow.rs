mod common;

use common::{manager, resolve_ci, scratch_leftovers, setup_test_env, touch, write_zip};
use pitkit::mods::{InstallError, ModType, TrackType};

#[tokio::test]
async fn test_canonical_bike_pack_from_zip() {
    let env = setup_test_env();
    let archive = env.downloads.join("Mod.zip");
    write_zip(
        &archive,
        &[
            ("Mod/mods/bikes/Yamaha.pkz", "pkz"),
            ("Mod/readme.txt", "hello"),
        ],
    );

    let (mods, _) = manager(&env, &[]);
    let installed = mods.install(&archive, Some("Yamaha"), None).await.unwrap();

    assert_eq!(installed.mod_type, ModType::Bike);
    assert!(env.mods.join("bikes/Yamaha.pkz").is_file());
    assert!(!env.mods.join("readme.txt").exists());
    assert_eq!(
        installed.files.file_paths(),
        vec![std::path::PathBuf::from("bikes/Yamaha.pkz")]
    );
    assert_eq!(scratch_leftovers(&env), 0);
}

#[tokio::test]
async fn test_helmet_claims_its_paints_without_prompting() {
    let env = setup_test_env();
    let source = env.downloads.join("HelmetX");
    touch(&source.join("helmet.edf"));
    touch(&source.join("skin.pnt"));

    let (mods, prompter) = manager(&env, &["unused"]);
    let installed = mods.install(&source, Some("HelmetX"), None).await.unwrap();

    assert_eq!(prompter.remaining(), 1);
    assert_eq!(installed.mod_type, ModType::Rider);
    assert!(env.mods.join("rider/helmets/HelmetX/helmet.edf").is_file());
    assert!(env.mods.join("rider/helmets/HelmetX/skin.pnt").is_file());
}

#[tokio::test]
async fn test_lone_track_package() {
    let env = setup_test_env();
    let source = env.downloads.join("track.pkz");
    touch(&source);

    let (mods, prompter) = manager(&env, &["tracks", "motocross"]);
    let installed = mods.install(&source, Some("Track"), None).await.unwrap();

    assert_eq!(prompter.remaining(), 0);
    assert_eq!(installed.mod_type, ModType::Track);
    assert_eq!(installed.track_type, Some(TrackType::Motocross));
    assert!(env.mods.join("tracks/motocross/track.pkz").is_file());
}

#[tokio::test]
async fn test_name_prompt_defaults_to_source_stem() {
    let env = setup_test_env();
    let source = env.downloads.join("Big Dunes.pkz");
    touch(&source);

    let (mods, _) = manager(&env, &["-", "tracks", "enduro"]);
    let installed = mods.install(&source, None, None).await.unwrap();
    assert_eq!(installed.name, "Big Dunes");

    let (mods, _) = manager(&env, &["My Dunes", "tracks", "enduro"]);
    let installed = mods.install(&source, None, None).await.unwrap();
    assert_eq!(installed.name, "My Dunes");
}

#[tokio::test]
async fn test_manifest_matches_disk() {
    let env = setup_test_env();
    let source = env.downloads.join("Pack");
    touch(&source.join("Boots/boots.edf"));
    touch(&source.join("Boots/paints/red.pnt"));
    touch(&source.join("Grip/front.tyre"));
    touch(&source.join("Rider/rider.edf"));

    let (mods, _) = manager(&env, &[]);
    let installed = mods.install(&source, Some("Pack"), None).await.unwrap();

    let paths = installed.files.file_paths();
    assert_eq!(paths.len(), 4);
    for path in &paths {
        let on_disk = resolve_ci(&env.mods, path);
        assert!(on_disk.is_some_and(|p| p.is_file()), "{} missing", path.display());
    }
    assert!(env.mods.join("rider/boots/Boots/paints/red.pnt").is_file());
    assert!(env.mods.join("tyres/Grip/front.tyre").is_file());
}

#[tokio::test]
async fn test_uninstall_keeps_game_folders() {
    let env = setup_test_env();
    touch(&env.mods.join("bikes/Stock.pkz"));
    let source = env.downloads.join("track.pkz");
    touch(&source);

    let (mods, _) = manager(&env, &["tracks", "motocross"]);
    mods.install(&source, Some("Track"), None).await.unwrap();

    let report = mods.uninstall("Track").unwrap();

    assert_eq!(report.files_removed, 1);
    assert!(report.errors.is_empty());
    assert!(!env.mods.join("tracks/motocross/track.pkz").exists());
    assert!(env.mods.join("tracks/motocross").is_dir());
    assert!(env.mods.join("bikes/Stock.pkz").is_file());
    assert!(mods.list_mods().unwrap().is_empty());
}

#[tokio::test]
async fn test_uninstall_removes_emptied_mod_folders() {
    let env = setup_test_env();
    let source = env.downloads.join("HelmetX");
    touch(&source.join("helmet.edf"));
    touch(&source.join("paints/blue.pnt"));

    let (mods, _) = manager(&env, &[]);
    mods.install(&source, Some("HelmetX"), None).await.unwrap();
    assert!(env.mods.join("rider/helmets/HelmetX/paints/blue.pnt").is_file());

    mods.uninstall("HelmetX").unwrap();

    assert!(!env.mods.join("rider/helmets/HelmetX").exists());
    assert!(env.mods.join("rider/helmets").is_dir());
    assert!(env.mods.is_dir());
}

#[tokio::test]
async fn test_reinstall_replaces_registry_entry() {
    let env = setup_test_env();
    let source = env.downloads.join("track.pkz");
    touch(&source);

    let (mods, _) = manager(&env, &["tracks", "motocross", "tracks", "supercross"]);
    mods.install(&source, Some("Track"), None).await.unwrap();
    mods.install(&source, Some("Track"), None).await.unwrap();

    let listed = mods.list_mods().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].track_type, Some(TrackType::Supercross));
}

#[tokio::test]
async fn test_unsupported_source_is_rejected() {
    let env = setup_test_env();
    let source = env.downloads.join("notes.txt");
    touch(&source);

    let (mods, _) = manager(&env, &[]);
    let err = mods.install(&source, Some("Notes"), None).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InstallError>(),
        Some(InstallError::UnsupportedSourceType(ext)) if ext == ".txt"
    ));
    assert_eq!(scratch_leftovers(&env), 0);
}

#[tokio::test]
async fn test_missing_bike_leaves_nothing_behind() {
    let env = setup_test_env();
    let source = env.downloads.join("Model");
    touch(&source.join("model.edf"));

    let (mods, _) = manager(&env, &[]);
    let err = mods.install(&source, Some("Model"), None).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InstallError>(),
        Some(InstallError::MissingPrerequisite(_))
    ));
    assert!(mods.list_mods().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(env.mods.join("bikes")).unwrap().count(), 0);
    assert_eq!(scratch_leftovers(&env), 0);
}

#[tokio::test]
async fn test_rename_keeps_files() {
    let env = setup_test_env();
    let source = env.downloads.join("HelmetX");
    touch(&source.join("helmet.edf"));

    let (mods, _) = manager(&env, &[]);
    mods.install(&source, Some("HelmetX"), None).await.unwrap();
    mods.rename_mod("HelmetX", "Airoh Aviator").unwrap();

    assert!(mods.get_mod("HelmetX").is_err());
    let renamed = mods.get_mod("Airoh Aviator").unwrap();
    assert_eq!(renamed.files.file_count(), 1);
    assert!(env.mods.join("rider/helmets/HelmetX/helmet.edf").is_file());
}

#[tokio::test]
async fn test_root_level_helmet_zips_get_their_own_folders() {
    let env = setup_test_env();
    let airoh = env.downloads.join("Airoh.zip");
    let bell = env.downloads.join("Bell.zip");
    write_zip(&airoh, &[("helmet.edf", "airoh"), ("helmet.dds", "airoh")]);
    write_zip(&bell, &[("helmet.edf", "bell"), ("helmet.dds", "bell")]);

    let (mods, _) = manager(&env, &[]);
    mods.install(&airoh, Some("Airoh"), None).await.unwrap();
    mods.install(&bell, Some("Bell"), None).await.unwrap();

    let helmets = env.mods.join("rider/helmets");
    assert_eq!(std::fs::read_to_string(helmets.join("Airoh/helmet.edf")).unwrap(), "airoh");
    assert_eq!(std::fs::read_to_string(helmets.join("Bell/helmet.edf")).unwrap(), "bell");

    mods.uninstall("Bell").unwrap();

    assert!(!helmets.join("Bell").exists());
    assert!(helmets.join("Airoh/helmet.edf").is_file());
    assert!(helmets.join("Airoh/helmet.dds").is_file());
}

#[tokio::test]
async fn test_paints_beside_root_level_tyres_are_swept() {
    let env = setup_test_env();
    touch(&env.mods.join("bikes/Stock.pkz"));
    let archive = env.downloads.join("Grip.zip");
    write_zip(&archive, &[("front.tyre", "tyre"), ("extra/blue.pnt", "paint")]);

    let (mods, prompter) = manager(&env, &["bikes", "Stock"]);
    let installed = mods.install(&archive, Some("Grip"), None).await.unwrap();

    assert_eq!(prompter.remaining(), 0);
    assert!(env.mods.join("tyres/Grip/front.tyre").is_file());
    assert!(env.mods.join("bikes/Stock/paints/blue.pnt").is_file());
    assert!(installed
        .files
        .file_paths()
        .contains(&std::path::PathBuf::from("bikes/stock/paints/blue.pnt")));
}
