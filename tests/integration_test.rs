// End-to-end resolution scenarios over in-memory package images.

use filesys::{ContentType, MemoryFilesystem, build};
use nandin::{Logger, SelectionManifest, resolve_files};
use settings::Settings;

const TYPE_APPLICATION: u8 = 0x80;
const TYPE_UPDATE: u8 = 0x81;
const TYPE_ADD_ON_CONTENT: u8 = 0x82;

fn meta_nca(version: u32, title_type: u8) -> Vec<u8> {
    let cnmt = build::build_cnmt(0x0100_0000_0000_0001, version, title_type);
    let section = build::build_pfs0(&[("title.cnmt", cnmt)]);
    build::build_nca(ContentType::Meta, &[section])
}

fn control_nca(name: &str, version: &str) -> Vec<u8> {
    let nacp = build::build_nacp(name, version);
    let image = build::build_romfs(&[("control.nacp", nacp)]);
    build::build_nca(ContentType::Control, &[image])
}

fn resolve(vfs: &MemoryFilesystem, paths: &[&str]) -> SelectionManifest {
    let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
    resolve_files(vfs, &paths, &Settings::default(), &Logger::disabled())
}

#[test]
fn package_without_control_gets_the_fallback_label() {
    let mut vfs = MemoryFilesystem::new();
    let nsp = build::build_pfs0(&[("meta.nca", meta_nca(3, TYPE_UPDATE))]);
    vfs.insert("Foo.nsp", nsp);

    let manifest = resolve(&vfs, &["Foo.nsp"]);
    assert_eq!(manifest.len(), 1);
    let entry = &manifest.entries()[0];
    assert_eq!(entry.label, "Foo (Update) (v3)");
    assert_eq!(entry.path, "Foo.nsp");
    assert!(entry.included);
}

#[test]
fn package_with_control_uses_the_application_name() {
    let mut vfs = MemoryFilesystem::new();
    let nsp = build::build_pfs0(&[
        ("meta.nca", meta_nca(3, TYPE_UPDATE)),
        ("control.nca", control_nca("Frobnicator", "1.2.3")),
    ]);
    vfs.insert("Foo.nsp", nsp);

    let manifest = resolve(&vfs, &["Foo.nsp"]);
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.entries()[0].label, "Frobnicator (Update) (1.2.3)");
}

#[test]
fn add_on_content_is_labeled_dlc() {
    let mut vfs = MemoryFilesystem::new();
    let nsp = build::build_pfs0(&[("meta.nca", meta_nca(2, TYPE_ADD_ON_CONTENT))]);
    vfs.insert("Extra.nsp", nsp);

    let manifest = resolve(&vfs, &["Extra.nsp"]);
    assert_eq!(manifest.entries()[0].label, "Extra (DLC) (v2)");
}

#[test]
fn card_image_without_meta_content_is_dropped() {
    let mut vfs = MemoryFilesystem::new();
    let data_only = build::build_hfs0(&[(
        "data.nca",
        build::build_nca(ContentType::Data, &[]),
    )]);
    vfs.insert("b.xci", build::build_xci(&[("secure", data_only)]));

    let manifest = resolve(&vfs, &["b.xci"]);
    assert!(manifest.is_empty());
}

#[test]
fn card_image_resolves_through_its_secure_partition() {
    let mut vfs = MemoryFilesystem::new();
    let secure = build::build_hfs0(&[
        ("meta.nca", meta_nca(5, TYPE_UPDATE)),
        ("control.nca", control_nca("Card Game", "2.0.1")),
    ]);
    vfs.insert("Game.xci", build::build_xci(&[
        ("update", build::build_hfs0(&[])),
        ("secure", secure),
    ]));

    let manifest = resolve(&vfs, &["Game.xci"]);
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.entries()[0].label, "Card Game (Update) (2.0.1)");
}

#[test]
fn card_image_fallback_label_uses_the_card_stem() {
    let mut vfs = MemoryFilesystem::new();
    let secure = build::build_hfs0(&[("meta.nca", meta_nca(5, TYPE_UPDATE))]);
    vfs.insert("Game.xci", build::build_xci(&[("secure", secure)]));

    let manifest = resolve(&vfs, &["Game.xci"]);
    assert_eq!(manifest.entries()[0].label, "Game (Update) (v5)");
}

#[test]
fn raw_content_archive_is_labeled_by_its_own_name() {
    let mut vfs = MemoryFilesystem::new();
    // Content is never read for this kind; garbage bytes are fine.
    vfs.insert("some/dir/c.nca", vec![0xAA; 16]);

    let manifest = resolve(&vfs, &["some/dir/c.nca"]);
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.entries()[0].label, "c.nca");
    assert!(manifest.entries()[0].included);
}

#[test]
fn unsupported_unreadable_and_garbled_candidates_are_dropped() {
    let mut vfs = MemoryFilesystem::new();
    vfs.insert("d.zip", vec![1, 2, 3]);
    vfs.insert("garbled.nsp", vec![0; 0x40]);

    let manifest = resolve(&vfs, &["d.zip", "missing.nsp", "garbled.nsp"]);
    assert!(manifest.is_empty());
}

#[test]
fn base_application_titles_are_not_installable_here() {
    let mut vfs = MemoryFilesystem::new();
    let nsp = build::build_pfs0(&[("meta.nca", meta_nca(1, TYPE_APPLICATION))]);
    vfs.insert("Base.nsp", nsp);

    assert!(resolve(&vfs, &["Base.nsp"]).is_empty());
}

#[test]
fn batch_keeps_input_order_and_skips_only_failures() {
    let mut vfs = MemoryFilesystem::new();
    vfs.insert("One.nsp", build::build_pfs0(&[("m.nca", meta_nca(1, TYPE_UPDATE))]));
    vfs.insert("junk.bin", vec![0; 8]);
    vfs.insert("two.nca", vec![0; 8]);
    vfs.insert("Three.nsp", build::build_pfs0(&[("m.nca", meta_nca(4, TYPE_ADD_ON_CONTENT))]));

    let manifest = resolve(&vfs, &["One.nsp", "junk.bin", "two.nca", "Three.nsp"]);
    let labels: Vec<&str> = manifest.entries().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["One (Update) (v1)", "two.nca", "Three (DLC) (v4)"]);
}

#[test]
fn duplicate_paths_resolve_independently_and_toggle_together() {
    let mut vfs = MemoryFilesystem::new();
    vfs.insert("Foo.nsp", build::build_pfs0(&[("m.nca", meta_nca(1, TYPE_UPDATE))]));

    let mut manifest = resolve(&vfs, &["Foo.nsp", "Foo.nsp"]);
    assert_eq!(manifest.len(), 2);

    manifest.toggle("Foo.nsp");
    assert!(manifest.selected_paths().is_empty());
}

#[test]
fn resolution_is_idempotent() {
    let mut vfs = MemoryFilesystem::new();
    vfs.insert("Foo.nsp", build::build_pfs0(&[("m.nca", meta_nca(3, TYPE_UPDATE))]));
    vfs.insert("c.nca", vec![0; 4]);

    let first = resolve(&vfs, &["Foo.nsp", "c.nca"]);
    let second = resolve(&vfs, &["Foo.nsp", "c.nca"]);
    assert_eq!(first.entries(), second.entries());
}

#[test]
fn dropped_candidates_are_logged_not_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::with_dir(dir.path().to_str().unwrap()).unwrap();

    let mut vfs = MemoryFilesystem::new();
    vfs.insert("bad.zip", vec![0; 4]);
    let manifest = resolve_files(
        &vfs,
        &[String::from("bad.zip")],
        &Settings::default(),
        &logger,
    );
    assert!(manifest.is_empty());

    let log = std::fs::read_to_string(dir.path().join("nandin.log")).unwrap();
    assert!(log.contains("skipped bad.zip"));
    assert!(log.contains("unsupported container kind"));
}
