//! The `layerdeps` binary.

use assert_cmd::Command;
use layerdeps::test_utils::LayerFixture;
use predicates::prelude::*;

use crate::common::{build_shot, shot};

/// A command isolated from any settings file on the machine.
fn layerdeps(fixture: &LayerFixture) -> Command {
    let config = fixture.write_file("empty.toml", b"").unwrap();
    let mut cmd = Command::cargo_bin("layerdeps").unwrap();
    cmd.current_dir(fixture.path()).arg("--config").arg(config);
    cmd
}

#[test]
fn test_deps_json() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();

    let output = layerdeps(&fixture)
        .args(["deps", "--format", "json", "--graph"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["layers"].as_array().unwrap().len(), 7);
    assert_eq!(json["assets"].as_array().unwrap().len(), 2);
    assert!(json["order"].is_array());
}

#[test]
fn test_deps_text_tree() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();

    layerdeps(&fixture)
        .args(["deps", "--graph"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Layers:"))
        .stdout(predicate::str::contains("Unresolved:"))
        .stdout(predicate::str::contains("(already listed)"))
        .stdout(predicate::str::contains("Order (dependencies first):"));
}

#[test]
fn test_deps_missing_root_fails() {
    let fixture = LayerFixture::new().unwrap();

    layerdeps(&fixture)
        .args(["deps", "nope.usda"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to open root layer"));
}

#[test]
fn test_refs_lists_sublayers() {
    let fixture = LayerFixture::new().unwrap();
    build_shot(&fixture).unwrap();

    layerdeps(&fixture)
        .args(["refs", shot::ROOT])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sublayers:"))
        .stdout(predicate::str::contains("./sets/room.usda"));
}

#[test]
fn test_refs_of_empty_layer() {
    let fixture = LayerFixture::new().unwrap();
    fixture.write_layer("empty.usda", |l| l).unwrap();

    layerdeps(&fixture)
        .args(["refs", "empty.usda"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No external dependencies."));
}

#[test]
fn test_localize_creates_directory() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let out = LayerFixture::new().unwrap();
    let dest = out.file_path("localized");

    layerdeps(&fixture)
        .arg("localize")
        .arg(&root)
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Localized"));

    assert!(dest.join(shot::ROOT).is_file());
    assert!(dest.join(shot::TILES[1]).is_file());
}

#[test]
fn test_package_creates_archive() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let out = LayerFixture::new().unwrap();
    let package = out.file_path("shot.usdz");

    layerdeps(&fixture)
        .arg("package")
        .arg(&root)
        .arg(&package)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    assert!(package.is_file());
}
