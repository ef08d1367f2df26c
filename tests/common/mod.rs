//! Common test fixtures for layerdeps integration tests
//!
//! Builds a small but complete shot on disk that exercises every dependency
//! kind the engine knows about.

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use anyhow::Result;
use layerdeps::sdf::{Dictionary, PrimSpec, PropertySpec, Value};
use layerdeps::test_utils::LayerFixture;
use std::path::PathBuf;

/// Files of the shot built by [`build_shot`], relative to the fixture root.
pub mod shot {
    pub const ROOT: &str = "shot.usda";
    pub const ROOM: &str = "sets/room.usda";
    pub const HEAVY: &str = "sets/heavy.usda";
    pub const CHAIR: &str = "props/chair.usda";
    pub const TILES: [&str; 2] = ["textures/wood.1001.exr", "textures/wood.1002.exr"];
    pub const CLIPS: [&str; 3] = ["clips/anim.001.usda", "clips/anim.002.usda", "clips/anim.003.usda"];
    pub const MISSING: &str = "missing.exr";
}

/// Builds the shot:
///
/// ```text
/// shot.usda
/// ├── sublayer  ./sets/room.usda
/// │   ├── reference ../props/chair.usda
/// │   └── payload   ./heavy.usda
/// ├── reference ./props/chair.usda
/// │   └── asset     ../textures/wood.<UDIM>.exr  (two tiles)
/// ├── clips     ./clips/anim.###.usda            (frames 1-3)
/// ├── assetInfo ./info.usda                      (filtered, does not exist)
/// └── asset     ./missing.exr                    (does not exist)
/// ```
pub fn build_shot(fixture: &LayerFixture) -> Result<PathBuf> {
    for tile in shot::TILES {
        fixture.write_file(tile, b"tile")?;
    }
    for clip in shot::CLIPS {
        fixture.write_layer(clip, |l| l)?;
    }

    fixture.write_layer(shot::CHAIR, |l| {
        l.with_prim(
            PrimSpec::new("Chair").with_property(PropertySpec::asset("diffuse", "../textures/wood.<UDIM>.exr")),
        )
    })?;
    fixture.write_layer(shot::HEAVY, |l| l.with_prim(PrimSpec::new("Heavy")))?;
    fixture.write_layer(shot::ROOM, |l| {
        l.with_prim(
            PrimSpec::new("Room")
                .with_reference("../props/chair.usda")
                .with_payload("./heavy.usda"),
        )
    })?;

    let mut clip_set = Dictionary::new();
    clip_set.insert("templateAssetPath".into(), Value::String("./clips/anim.###.usda".into()));
    clip_set.insert("templateStartTime".into(), Value::Double(1.0));
    clip_set.insert("templateEndTime".into(), Value::Double(3.0));
    clip_set.insert("templateStride".into(), Value::Double(1.0));
    let mut clips = Dictionary::new();
    clips.insert("default".into(), Value::Dictionary(clip_set));

    fixture.write_layer(shot::ROOT, |l| {
        l.with_sublayer("./sets/room.usda").with_prim(
            PrimSpec::new("World")
                .with_reference("./props/chair.usda")
                .with_metadata("clips", Value::Dictionary(clips))
                .with_metadata("assetInfo", Value::asset("./info.usda"))
                .with_property(PropertySpec::asset("overlay", "./missing.exr")),
        )
    })
}

/// Normalized absolute path of `name` in `fixture`, as reports list it.
pub fn key(fixture: &LayerFixture, name: &str) -> String {
    layerdeps::utils::normalize_path(&fixture.file_path(name)).to_string_lossy().into_owned()
}
