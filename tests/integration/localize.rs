//! Localizing a shot into a directory.

use layerdeps::config::Settings;
use layerdeps::dependencies::{LocalizeOptions, compute_all_dependencies, localize_asset, plan_localization};
use layerdeps::sdf::SpecPath;
use layerdeps::test_utils::LayerFixture;

use crate::common::{build_shot, key, shot};

#[test]
fn test_localized_shot_is_complete() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let out = LayerFixture::new().unwrap();

    let localized = localize_asset(&root.to_string_lossy(), out.path(), &LocalizeOptions::default()).unwrap();

    assert_eq!(localized.root, out.file_path(shot::ROOT));
    for file in [shot::ROOT, shot::ROOM, shot::HEAVY, shot::CHAIR]
        .into_iter()
        .chain(shot::TILES)
        .chain(shot::CLIPS)
    {
        assert!(out.file_path(file).is_file(), "{file} was not localized");
    }
    assert_eq!(localized.layers.len(), 7);
    assert_eq!(localized.files.len(), 2);
    assert_eq!(localized.unresolved, vec![key(&fixture, shot::MISSING)]);
}

#[test]
fn test_localized_shot_resolves_on_its_own() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let out = LayerFixture::new().unwrap();
    localize_asset(&root.to_string_lossy(), out.path(), &LocalizeOptions::default()).unwrap();

    let source = compute_all_dependencies(&root.to_string_lossy(), &Settings::default()).unwrap();
    let copy =
        compute_all_dependencies(&out.file_path(shot::ROOT).to_string_lossy(), &Settings::default()).unwrap();

    assert_eq!(copy.layers.len(), source.layers.len());
    assert_eq!(copy.assets.len(), source.assets.len());
    assert!(copy.layers.iter().all(|layer| layer.starts_with(&*out.path().to_string_lossy())));
}

#[test]
fn test_plan_marks_only_rewritten_layers() {
    let fixture = LayerFixture::new().unwrap();
    let library = LayerFixture::new().unwrap();
    let prop = library.write_layer("prop.usda", |l| l).unwrap();
    let prop_path = prop.to_string_lossy().into_owned();
    fixture
        .write_layer("shot.usda", |l| {
            l.with_sublayer("./local.usda")
                .with_prim(layerdeps::sdf::PrimSpec::new("World").with_reference(prop_path.clone()))
        })
        .unwrap();
    fixture.write_layer("local.usda", |l| l).unwrap();

    let plan =
        plan_localization(&fixture.file_path("shot.usda").to_string_lossy(), &LocalizeOptions::default()).unwrap();

    let destinations: Vec<_> = plan.layers.iter().map(|l| (l.destination.as_str(), l.modified)).collect();
    assert_eq!(
        destinations,
        vec![("shot.usda", true), ("local.usda", false), ("external/0/prop.usda", false)]
    );

    let root = &plan.layers[0];
    let world: SpecPath = "/World".parse().unwrap();
    let layer = root.layer.read();
    let reference = layer.prim_at(&world).unwrap().references.items().next().unwrap();
    assert_eq!(reference.asset_path, "./external/0/prop.usda");
}
