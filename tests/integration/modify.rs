//! Rewriting authored paths, in place and on working copies.

use layerdeps::dependencies::modify_asset_paths;
use layerdeps::localize::{DependencyInfo, LocalizationContext, WritableLocalizationDelegate};
use layerdeps::resolver::FilesystemResolver;
use layerdeps::sdf::{FieldSite, LayerRegistry, PrimSpec, PropertySpec, SpecPath, Value};
use layerdeps::test_utils::LayerFixture;

use crate::common::{build_shot, shot};

fn world() -> SpecPath {
    "/World".parse().unwrap()
}

#[test]
fn test_rewrite_and_delete() {
    let fixture = LayerFixture::new().unwrap();
    fixture
        .write_layer("root.usda", |l| {
            l.with_sublayer("./a.usda").with_sublayer("./b.usda").with_prim(
                PrimSpec::new("World")
                    .with_reference("./a.usda")
                    .with_payload("./b.usda")
                    .with_property(PropertySpec::asset("tex", "./a.exr")),
            )
        })
        .unwrap();
    let layer = fixture.open("root.usda").unwrap();

    modify_asset_paths(
        &layer,
        |path| {
            if path.starts_with("./b") {
                String::new()
            } else {
                path.replace("./", "./lib/")
            }
        },
        false,
    )
    .unwrap();

    let edited = layer.read();
    assert_eq!(edited.sublayers(), ["./lib/a.usda"]);
    let prim = edited.prim_at(&world()).unwrap();
    assert_eq!(prim.references.items().next().unwrap().asset_path, "./lib/a.usda");
    assert_eq!(prim.payloads.items().count(), 0);
    let tex = FieldSite::new("/World.tex".parse().unwrap(), "default");
    assert_eq!(edited.get_field(&tex), Some(&Value::asset("./lib/a.exr")));

    // Nothing was saved.
    let on_disk = fixture.read_layer("root.usda").unwrap();
    assert_eq!(on_disk.sublayers(), ["./a.usda", "./b.usda"]);
}

#[test]
fn test_array_elements_removed_or_kept_empty() {
    let fixture = LayerFixture::new().unwrap();
    fixture
        .write_layer("root.usda", |l| {
            l.with_prim(PrimSpec::new("World").with_property(PropertySpec::asset_array(
                "layers",
                ["a.usda", "drop.usda", "b.usda"],
            )))
        })
        .unwrap();
    let site = FieldSite::new("/World.layers".parse().unwrap(), "default");

    for (keep, expected) in [
        (false, Value::asset_array(["a.usda", "b.usda"])),
        (true, Value::asset_array(["a.usda", "", "b.usda"])),
    ] {
        let layer = fixture.open("root.usda").unwrap();
        let remove = |path: &str| if path == "drop.usda" { String::new() } else { path.to_string() };
        modify_asset_paths(&layer, remove, keep).unwrap();
        assert_eq!(layer.read().get_field(&site), Some(&expected), "keep_empty_paths_in_arrays = {keep}");
    }
}

#[test]
fn test_identity_keeps_authored_empty_slots() {
    let fixture = LayerFixture::new().unwrap();
    fixture
        .write_layer("root.usda", |l| {
            l.with_prim(PrimSpec::new("World").with_property(PropertySpec::asset_array(
                "layers",
                ["a.usda", "", "b.usda"],
            )))
        })
        .unwrap();
    let site = FieldSite::new("/World.layers".parse().unwrap(), "default");

    for keep in [false, true] {
        let layer = fixture.open("root.usda").unwrap();
        modify_asset_paths(&layer, |p| p.to_string(), keep).unwrap();

        let after = layer.read();
        assert_eq!(after.get_field(&site), Some(&Value::asset_array(["a.usda", "", "b.usda"])));
        assert!(!after.is_dirty(), "keep_empty_paths_in_arrays = {keep}");
    }
}

#[test]
fn test_identity_leaves_layer_untouched() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let layer = fixture.open(shot::ROOT).unwrap();
    let before = layer.snapshot();

    modify_asset_paths(&layer, |p| p.to_string(), false).unwrap();

    assert!(layer.read().has_same_content(&before));
    assert!(!layer.read().is_dirty());
    assert!(root.is_file());
}

#[test]
fn test_session_writes_to_working_copies() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let registry = LayerRegistry::new();
    let resolver = FilesystemResolver::new();

    let mut delegate = WritableLocalizationDelegate::with_processing_fn(|_, info, _| {
        if info.asset_path == "./props/chair.usda" {
            DependencyInfo::new("./props/stool.usda")
        } else {
            info.clone()
        }
    });
    {
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_registry(registry.clone());
        context.process_asset(&root.to_string_lossy()).unwrap();
    }

    let original = registry.find(&root).unwrap();
    let copy = delegate.layer_used_for_writing(&original).unwrap();
    assert!(!copy.ptr_eq(&original));
    assert!(copy.read().is_anonymous());

    let reference = |layer: &layerdeps::sdf::Layer| {
        layer.prim_at(&world()).unwrap().references.items().next().unwrap().asset_path.clone()
    };
    assert_eq!(reference(&copy.read()), "./props/stool.usda");
    assert_eq!(reference(&original.read()), "./props/chair.usda");

    // Layers that did not change have no working copy.
    let room = registry.find(&fixture.file_path(shot::ROOM)).unwrap();
    assert!(delegate.layer_used_for_writing(&room).is_none());

    let copies = delegate.take_writable_copies();
    assert_eq!(copies.len(), 1);
    assert!(copies[&original.identifier()].ptr_eq(&copy));
    assert!(delegate.layer_used_for_writing(&original).is_none());
}
