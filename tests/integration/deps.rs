//! Recursive dependency reports.

use layerdeps::config::Settings;
use layerdeps::dependencies::{compute_all_dependencies, compute_dependencies_of, extract_external_references};
use layerdeps::graph::DependencyGraph;
use layerdeps::localize::ReferenceTypesToInclude;
use layerdeps::resolver::FilesystemResolver;
use layerdeps::sdf::{LayerRegistry, PrimSpec};
use layerdeps::test_utils::{LayerFixture, init_test_logging};

use crate::common::{build_shot, key, shot};

#[test]
fn test_full_report() {
    init_test_logging(None);
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();

    let report = compute_all_dependencies(&root.to_string_lossy(), &Settings::default()).unwrap();

    assert_eq!(report.layers[0], key(&fixture, shot::ROOT));
    for layer in [shot::ROOM, shot::HEAVY, shot::CHAIR].into_iter().chain(shot::CLIPS) {
        assert!(report.layers.contains(&key(&fixture, layer)), "missing layer {layer}");
    }
    assert_eq!(report.layers.len(), 7);

    let mut assets = report.assets.clone();
    assets.sort();
    assert_eq!(assets, shot::TILES.map(|t| key(&fixture, t)).to_vec());

    // assetInfo is filtered by default; only the dangling overlay remains.
    assert_eq!(report.unresolved, vec![key(&fixture, shot::MISSING)]);
}

#[test]
fn test_shared_dependency_is_reported_once() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();

    let report = compute_all_dependencies(&root.to_string_lossy(), &Settings::default()).unwrap();

    let chair = key(&fixture, shot::CHAIR);
    assert_eq!(report.layers.iter().filter(|l| **l == chair).count(), 1);
    // Both the root and the room point at the chair.
    assert!(report.edges.contains(&(key(&fixture, shot::ROOT), chair.clone())));
    assert!(report.edges.contains(&(key(&fixture, shot::ROOM), chair)));
}

#[test]
fn test_without_recursion() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let mut settings = Settings::default();
    settings.localize.recurse = false;

    let report = compute_all_dependencies(&root.to_string_lossy(), &settings).unwrap();

    assert!(report.layers.contains(&key(&fixture, shot::ROOM)));
    assert!(report.layers.contains(&key(&fixture, shot::CHAIR)));
    assert!(!report.layers.contains(&key(&fixture, shot::HEAVY)));
    assert!(report.assets.is_empty());
}

#[test]
fn test_metadata_filtering_disabled() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let mut settings = Settings::default();
    settings.localize.metadata_filtering = false;

    let report = compute_all_dependencies(&root.to_string_lossy(), &settings).unwrap();

    assert!(report.unresolved.contains(&key(&fixture, "info.usda")));
}

#[test]
fn test_skip_list_prunes_the_subtree() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let mut settings = Settings::default();
    settings.localize.skip = vec![fixture.file_path(shot::ROOM).to_string_lossy().into_owned()];

    let report = compute_all_dependencies(&root.to_string_lossy(), &settings).unwrap();

    assert!(!report.layers.contains(&key(&fixture, shot::ROOM)));
    assert!(!report.layers.contains(&key(&fixture, shot::HEAVY)));
    assert!(report.layers.contains(&key(&fixture, shot::CHAIR)));
}

#[test]
fn test_missing_root() {
    let fixture = LayerFixture::new().unwrap();
    let err = compute_all_dependencies(&fixture.file_path("nope.usda").to_string_lossy(), &Settings::default())
        .unwrap_err();
    assert!(err.to_string().contains("Unable to open root layer"));
}

#[test]
fn test_external_references_of_root() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();

    let refs = extract_external_references(&root, ReferenceTypesToInclude::All).unwrap();
    assert_eq!(refs.sublayers, vec!["./sets/room.usda"]);
    assert_eq!(
        refs.references,
        vec!["./clips/anim.###.usda", "./info.usda", "./missing.exr", "./props/chair.usda"]
    );
    assert!(refs.payloads.is_empty());
}

#[test]
fn test_graph_orders_dependencies_first() {
    let fixture = LayerFixture::new().unwrap();
    let root = build_shot(&fixture).unwrap();
    let report = compute_all_dependencies(&root.to_string_lossy(), &Settings::default()).unwrap();

    let graph = DependencyGraph::from_report(&report);
    assert!(!graph.has_cycles());
    let order = graph.topological_order();
    let pos = |name: &str| order.iter().position(|n| *n == key(&fixture, name)).unwrap();
    assert!(pos(shot::CHAIR) < pos(shot::ROOM));
    assert!(pos(shot::ROOM) < pos(shot::ROOT));
    assert!(pos(shot::TILES[0]) < pos(shot::CHAIR));
}

#[tokio::test]
async fn test_bulk_opened_roots_share_one_session() {
    let fixture = LayerFixture::new().unwrap();
    fixture.write_layer("shared.usda", |l| l).unwrap();
    for name in ["a.usda", "b.usda"] {
        fixture
            .write_layer(name, |l| l.with_prim(PrimSpec::new("P").with_reference("./shared.usda")))
            .unwrap();
    }

    let registry = LayerRegistry::new();
    let paths = vec![fixture.file_path("a.usda"), fixture.file_path("b.usda"), fixture.file_path("nope.usda")];
    let opened = registry.open_all(&paths, 2).await;
    assert!(opened[0].is_some());
    assert!(opened[1].is_some());
    assert!(opened[2].is_none());

    let roots: Vec<_> = opened.into_iter().flatten().collect();
    let report =
        compute_dependencies_of(&roots, &registry, &FilesystemResolver::new(), &Settings::default()).unwrap();

    assert_eq!(
        report.layers,
        vec![key(&fixture, "a.usda"), key(&fixture, "shared.usda"), key(&fixture, "b.usda")]
    );
}
