use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;

use super::*;
use crate::config::{DisplayField, LibrarySettings};
use crate::path::AssetPath;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"not real audio").unwrap();
}

fn found(root: &Path, settings: &LibrarySettings) -> BTreeSet<AssetPath> {
    scan(&AssetPath::from_path(root), settings)
        .assets
        .into_iter()
        .collect()
}

fn expect(paths: &[&Path]) -> BTreeSet<AssetPath> {
    paths.iter().map(|p| AssetPath::from_path(p)).collect()
}

#[test]
fn scan_finds_supported_files_and_ignores_the_rest() {
    let dir = tempdir().unwrap();
    let lib = dir.path().join("lib");
    touch(&lib.join("kick.wav"));
    touch(&lib.join("sub").join("snare.flac"));
    touch(&lib.join("notes.txt"));
    touch(&lib.join("sub").join("loop.aiff"));

    let got = found(&lib, &LibrarySettings::default());
    assert_eq!(
        got,
        expect(&[&lib.join("kick.wav"), &lib.join("sub").join("snare.flac")])
    );
}

#[test]
fn scan_reports_each_file_exactly_once_in_deep_trees() {
    let dir = tempdir().unwrap();
    let mut expected = Vec::new();
    let mut current = dir.path().to_path_buf();
    for level in 0..12 {
        current = current.join(format!("d{level}"));
        let hit = current.join(format!("hit{level}.MP3"));
        touch(&hit);
        touch(&current.join(format!("miss{level}.doc")));
        expected.push(hit);
    }
    touch(&dir.path().join("side").join("a.ogg"));
    expected.push(dir.path().join("side").join("a.ogg"));

    let outcome = scan(&AssetPath::from_path(dir.path()), &LibrarySettings::default());
    assert_eq!(outcome.assets.len(), expected.len());
    assert!(outcome.skipped.is_empty());

    let got: BTreeSet<AssetPath> = outcome.assets.into_iter().collect();
    let want: BTreeSet<AssetPath> = expected.iter().map(|p| AssetPath::from_path(p)).collect();
    assert_eq!(got, want);
}

#[test]
fn scan_of_a_missing_root_is_empty_and_records_the_skip() {
    let dir = tempdir().unwrap();
    let outcome = scan(
        &AssetPath::from_path(&dir.path().join("gone")),
        &LibrarySettings::default(),
    );
    assert!(outcome.assets.is_empty());
    assert_eq!(outcome.skipped.len(), 1);
}

#[test]
fn scan_skips_hidden_entries_unless_asked() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join(".hidden.wav"));
    touch(&dir.path().join(".git").join("inside.wav"));
    touch(&dir.path().join("visible.wav"));

    let got = found(dir.path(), &LibrarySettings::default());
    assert_eq!(got, expect(&[&dir.path().join("visible.wav")]));

    let settings = LibrarySettings {
        include_hidden: true,
        ..LibrarySettings::default()
    };
    assert_eq!(found(dir.path(), &settings).len(), 3);
}

#[test]
fn scan_respects_recursive_false() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("root.wav"));
    touch(&dir.path().join("sub").join("child.wav"));

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    assert_eq!(
        found(dir.path(), &settings),
        expect(&[&dir.path().join("root.wav")])
    );
}

#[test]
fn scan_respects_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    touch(&dir.path().join("root.wav"));
    touch(&d1.join("one.wav"));
    touch(&d2.join("two.wav"));

    // Root is depth 0, its children 1, grandchildren 2.
    let settings = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    assert_eq!(
        found(dir.path(), &settings),
        expect(&[&dir.path().join("root.wav"), &d1.join("one.wav")])
    );
}

#[cfg(unix)]
#[test]
fn scan_following_links_terminates_on_cycles() {
    let dir = tempdir().unwrap();
    let lib = dir.path().join("lib");
    touch(&lib.join("a.wav"));
    std::os::unix::fs::symlink(&lib, lib.join("loop")).unwrap();

    let settings = LibrarySettings {
        follow_links: true,
        ..LibrarySettings::default()
    };
    let outcome = scan(&AssetPath::from_path(&lib), &settings);
    assert_eq!(outcome.assets.len(), 1);

    let no_follow = scan(&AssetPath::from_path(&lib), &LibrarySettings::default());
    assert_eq!(no_follow.assets, vec![AssetPath::from_path(&lib.join("a.wav"))]);
}

fn local(p: &str) -> MediaRecord {
    MediaRecord::local(AssetPath::new(p))
}

#[test]
fn replace_all_discards_the_previous_snapshot() {
    let mut db = MediaDatabase::new();
    db.replace_all(vec![local("/a/one.wav"), local("/a/two.wav")]);
    assert_eq!(db.len(), 2);

    let remote = MediaRecord::remote("fs-123", Metadata::new());
    db.replace_all(vec![remote.clone()]);

    assert_eq!(db.list(), &[remote]);
    assert!(db.get(&MediaId::Local(AssetPath::new("/a/one.wav"))).is_none());
    assert!(db.get(&MediaId::Remote("fs-123".into())).is_some());
}

#[test]
fn list_preserves_insertion_order_and_get_finds_records() {
    let mut db = MediaDatabase::new();
    let records = records_from_scan(vec![
        AssetPath::new("/z.wav"),
        AssetPath::new("/a.wav"),
        AssetPath::new("/m.wav"),
    ]);
    db.replace_all(records);

    let order: Vec<String> = db.list().iter().map(|r| r.id.to_string()).collect();
    assert_eq!(order, vec![
        AssetPath::new("/z.wav").to_string(),
        AssetPath::new("/a.wav").to_string(),
        AssetPath::new("/m.wav").to_string(),
    ]);

    let id = MediaId::Local(AssetPath::new("/a.wav"));
    assert_eq!(db.position(&id), Some(1));
    assert_eq!(db.get(&id).map(|r| r.source), Some(Source::Local));
    assert!(db.get(&MediaId::Local(AssetPath::new("/nope.wav"))).is_none());
}

#[test]
fn duplicate_identities_resolve_to_the_first_record() {
    let mut db = MediaDatabase::new();
    let mut first = MediaRecord::remote("dup", Metadata::new());
    first
        .metadata
        .insert(keys::TITLE.into(), MetaValue::Text("first".into()));
    let second = MediaRecord::remote("dup", Metadata::new());
    db.replace_all(vec![first, second]);

    assert_eq!(db.len(), 2);
    assert_eq!(db.get(&MediaId::Remote("dup".into())).and_then(|r| r.title()), Some("first"));
}

#[test]
fn set_metadata_fills_existing_records_only() {
    let mut db = MediaDatabase::new();
    db.replace_all(vec![local("/a/kick.wav")]);
    let id = MediaId::Local(AssetPath::new("/a/kick.wav"));

    let mut meta = Metadata::new();
    meta.insert(keys::DURATION.into(), MetaValue::Duration(Duration::from_millis(1500)));
    assert!(db.set_metadata(&id, meta.clone()));
    assert!(!db.set_metadata(&MediaId::Remote("x".into()), meta));

    let record = db.get(&id).unwrap();
    assert!(record.probed);
    assert_eq!(record.duration(), Some(Duration::from_millis(1500)));
    assert_eq!(db.len(), 1);
}

#[test]
fn label_from_fields_composes_in_order() {
    let mut record = local("/lib/Kick 01.wav");
    record
        .metadata
        .insert(keys::DURATION.into(), MetaValue::Duration(Duration::from_millis(61_200)));
    record.metadata.insert(
        keys::TAGS.into(),
        MetaValue::Tags(vec!["drums".into(), "808".into()]),
    );

    assert_eq!(
        label_from_fields(&record, &[DisplayField::Title, DisplayField::Duration], " - "),
        "Kick 01 - 1:02"
    );
    assert_eq!(
        label_from_fields(&record, &[DisplayField::Filename, DisplayField::Tags], " "),
        "Kick 01 [drums, 808]"
    );
}

#[test]
fn label_prefers_title_metadata_and_falls_back_to_identity() {
    let mut record = MediaRecord::remote("fs-9", Metadata::new());
    assert_eq!(label_from_fields(&record, &[DisplayField::Title], " - "), "fs-9");

    record
        .metadata
        .insert(keys::TITLE.into(), MetaValue::Text("  Vinyl crackle ".into()));
    assert_eq!(
        label_from_fields(&record, &[DisplayField::Title], " - "),
        "Vinyl crackle"
    );
}

#[test]
fn format_duration_rounds_up_partial_seconds() {
    assert_eq!(format_duration(Duration::ZERO), "0:00");
    assert_eq!(format_duration(Duration::from_millis(200)), "0:01");
    assert_eq!(format_duration(Duration::from_secs(125)), "2:05");
}
