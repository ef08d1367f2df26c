//! Package archives.

use layerdeps::dependencies::LocalizeOptions;
use layerdeps::package::{create_new_package, list_package_entries};
use layerdeps::test_utils::LayerFixture;

use crate::common::{build_shot, key, shot};

#[test]
fn test_package_holds_the_whole_shot() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let out = LayerFixture::new().unwrap();
    let package = out.file_path("shot.usdz");

    let summary = create_new_package(&root.to_string_lossy(), &package, &LocalizeOptions::default()).unwrap();

    let entries = list_package_entries(&package).unwrap();
    assert_eq!(entries, summary.entries);
    assert_eq!(entries[0], shot::ROOT);
    for file in [shot::ROOM, shot::HEAVY, shot::CHAIR].into_iter().chain(shot::TILES).chain(shot::CLIPS) {
        assert!(entries.iter().any(|e| e == file), "{file} is not in the package");
    }
    assert_eq!(entries.len(), 9);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.unresolved, vec![key(&fixture, shot::MISSING)]);
}

#[test]
fn test_package_renames_the_root() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let out = LayerFixture::new().unwrap();
    let package = out.file_path("nested/dir/shot.usdz");
    let options = LocalizeOptions {
        first_layer_name: Some("main.usda".to_string()),
        ..LocalizeOptions::default()
    };

    create_new_package(&root.to_string_lossy(), &package, &options).unwrap();

    let entries = list_package_entries(&package).unwrap();
    assert_eq!(entries[0], "main.usda");
    assert!(!entries.iter().any(|e| e == shot::ROOT));
}
