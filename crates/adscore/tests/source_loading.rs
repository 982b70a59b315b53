use adscore::sources::{LoadError, SnapshotStore, SourceKind, SourceLoader, SourcePaths};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("adscore-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

#[test]
fn preference_means_round_trip() {
    let snapshot = SourceLoader::from_readers(
        Cursor::new("TypeA–Tag1,TypeA–Tag2\n0.2,1.0\n0.8,1.0\n"),
        Cursor::new("type,Tag1\nTypeA,0.3\n"),
    )
    .expect("sources load");

    let preferences = snapshot.preferences();
    assert_eq!(preferences.len(), 2);
    assert_eq!(preferences.get("TypeA–Tag1"), Some(0.5));
    assert_eq!(preferences.get("TypeA–Tag2"), Some(1.0));
}

#[test]
fn byte_order_mark_is_stripped_from_headers() {
    let snapshot = SourceLoader::from_readers(
        Cursor::new("\u{feff}短视频类–情感关系联结\n0.4\n"),
        Cursor::new("\u{feff}类型,情感关系联结\n短视频类,0.7\n"),
    )
    .expect("sources load");

    assert_eq!(snapshot.preference("短视频类", "情感关系联结"), Some(0.4));
    assert_eq!(snapshot.expression("短视频类", "情感关系联结"), Some(0.7));
}

#[test]
fn store_reload_swaps_both_tables_together() {
    let dir = scratch_dir("reload");
    let paths = SourcePaths::in_dir(&dir);
    fs::write(&paths.preference, "短视频类–情感关系联结\n0.1\n").expect("write preference");
    fs::write(&paths.expression, "类型,情感关系联结\n短视频类,0.2\n").expect("write expression");

    let store = SnapshotStore::new(paths.clone());
    let first = store.ensure_loaded().expect("first load");

    fs::write(&paths.preference, "短视频类–情感关系联结\n0.9\n").expect("rewrite preference");
    fs::write(&paths.expression, "类型,情感关系联结\n短视频类,0.8\n").expect("rewrite expression");
    let second = store.reload().expect("reload");

    assert_eq!(first.preference("短视频类", "情感关系联结"), Some(0.1));
    assert_eq!(first.expression("短视频类", "情感关系联结"), Some(0.2));
    assert_eq!(second.preference("短视频类", "情感关系联结"), Some(0.9));
    assert_eq!(second.expression("短视频类", "情感关系联结"), Some(0.8));
    assert!(second.version() > first.version());
}

#[test]
fn missing_expression_file_names_the_source() {
    let dir = scratch_dir("missing-expression");
    let paths = SourcePaths::in_dir(&dir);
    fs::write(&paths.preference, "a\n1\n").expect("write preference");
    let _ = fs::remove_file(&paths.expression);

    let error = SourceLoader::from_paths(&paths).expect_err("expression file missing");
    assert!(matches!(error, LoadError::Io { .. }));
    assert_eq!(error.source_kind(), SourceKind::Expression);
    assert!(error.to_string().contains("content_tag_values.csv"));
}
