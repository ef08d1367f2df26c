//! The traversal driver of a localization session.
//!
//! [`LocalizationContext`] owns all mutable traversal state (work queue,
//! visited set, report) for one session; nothing is global, so independent
//! sessions can run on different threads as long as each has its own context
//! and delegate.
//!
//! # Algorithm
//!
//! 1. The root layer is marked visited and handed to the delegate, one
//!    operation per dependency category.
//! 2. Every path the delegate reports is anchored to the layer that
//!    authored it and pushed onto a LIFO queue.
//! 3. Popped paths are resolved. Already visited or skipped paths are
//!    dropped; unresolved paths and files that are not layers are recorded;
//!    layers are opened and, when recursion is enabled, processed like the
//!    root.
//!
//! Visited entries are keyed by resolved path, so two spellings of the same
//! file are processed once and cycles terminate.

use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, trace, warn};

use super::delegate::LocalizationDelegate;
use super::expand::{ClipTemplate, expand_clip_template, expand_udim, is_udim_path};
use super::{DependencyInfo, ReferenceTypesToInclude};
use crate::constants::{
    ASSET_TYPE_NAMES, CLIP_TEMPLATE_ASSET_PATH_KEY, CLIP_TEMPLATE_END_TIME_KEY,
    CLIP_TEMPLATE_START_TIME_KEY, CLIP_TEMPLATE_STRIDE_KEY, CLIPS_KEY, DEFAULT_FIELD_KEY,
    DEFAULT_FILTERED_METADATA_KEYS,
};
use crate::core::LocalizeError;
use crate::resolver::{Resolver, is_package_relative_path, split_package_relative_path_outer};
use crate::sdf::{
    FieldSite, LayerHandle, LayerRegistry, PrimSpec, SpecPath, Value, is_supported_layer_file,
};
use crate::utils::normalize_path;

/// What a session discovered.
///
/// Entries are resolved paths (or identifiers for anonymous layers and
/// unresolved paths), in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalizationReport {
    /// Layers reached, roots first
    pub layers: Vec<String>,
    /// Files that are not layers, or could not be opened as layers
    pub assets: Vec<String>,
    /// Anchored paths that did not resolve
    pub unresolved: Vec<String>,
    /// `(from layer, to dependency)` edges, deduplicated
    pub edges: Vec<(String, String)>,
}

#[derive(Debug)]
struct QueueItem {
    identifier: String,
    from: String,
}

/// Drives a localization session over a delegate.
pub struct LocalizationContext<'d, 'r> {
    delegate: &'d mut dyn LocalizationDelegate,
    resolver: &'r dyn Resolver,
    registry: LayerRegistry,
    reference_types: ReferenceTypesToInclude,
    metadata_filtering: bool,
    filtered_metadata_keys: Vec<String>,
    recurse: bool,
    dependencies_to_skip: HashSet<PathBuf>,
    queue: Vec<QueueItem>,
    visited: HashSet<String>,
    edges: HashSet<(String, String)>,
    report: LocalizationReport,
}

impl<'d, 'r> LocalizationContext<'d, 'r> {
    /// Creates a context with the default configuration: all reference
    /// types, metadata filtering off, recursion on, nothing skipped.
    pub fn new(delegate: &'d mut dyn LocalizationDelegate, resolver: &'r dyn Resolver) -> Self {
        Self {
            delegate,
            resolver,
            registry: LayerRegistry::new(),
            reference_types: ReferenceTypesToInclude::All,
            metadata_filtering: false,
            filtered_metadata_keys: DEFAULT_FILTERED_METADATA_KEYS
                .iter()
                .map(|key| (*key).to_string())
                .collect(),
            recurse: true,
            dependencies_to_skip: HashSet::new(),
            queue: Vec::new(),
            visited: HashSet::new(),
            edges: HashSet::new(),
            report: LocalizationReport::default(),
        }
    }

    /// Uses `registry` to find and open layers, sharing already opened ones.
    pub fn set_registry(&mut self, registry: LayerRegistry) -> &mut Self {
        self.registry = registry;
        self
    }

    /// Composition-only or all dependency kinds.
    pub fn set_reference_types_to_include(&mut self, types: ReferenceTypesToInclude) -> &mut Self {
        self.reference_types = types;
        self
    }

    /// Skips the filtered metadata keys when enabled.
    pub fn set_metadata_filtering_enabled(&mut self, enabled: bool) -> &mut Self {
        self.metadata_filtering = enabled;
        self
    }

    /// Replaces the metadata keys skipped by metadata filtering.
    pub fn set_filtered_metadata_keys(&mut self, keys: Vec<String>) -> &mut Self {
        self.filtered_metadata_keys = keys;
        self
    }

    /// When disabled, only the root's direct dependencies are opened; their
    /// own dependencies are not processed.
    pub fn set_recurse_layer_dependencies(&mut self, recurse: bool) -> &mut Self {
        self.recurse = recurse;
        self
    }

    /// Resolved paths that are never visited.
    pub fn set_dependencies_to_skip<I>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.dependencies_to_skip = paths.into_iter().map(|p| normalize_path(&p)).collect();
        self
    }

    /// The report accumulated so far.
    pub fn report(&self) -> &LocalizationReport {
        &self.report
    }

    /// Consumes the context, returning its report.
    pub fn into_report(self) -> LocalizationReport {
        self.report
    }

    /// The registry holding every layer the session opened.
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Resolves and opens `asset_path`, then processes it.
    ///
    /// # Errors
    ///
    /// Returns [`LocalizeError::RootUnreadable`] when the root cannot be
    /// resolved or opened as a layer; nothing is visited in that case.
    pub fn process_asset(&mut self, asset_path: &str) -> Result<LayerHandle, LocalizeError> {
        let identifier = self.resolver.create_identifier(asset_path, None);
        let resolved =
            self.resolver.resolve(&identifier).ok_or_else(|| LocalizeError::RootUnreadable {
                path: asset_path.to_string(),
                reason: "the path does not resolve to a file".to_string(),
            })?;

        let root = self.registry.find_or_open(&resolved).map_err(|e| {
            LocalizeError::RootUnreadable {
                path: asset_path.to_string(),
                reason: format!("{e:#}"),
            }
        })?;

        self.process(&root)?;
        Ok(root)
    }

    /// Processes `root` and everything reachable from it.
    ///
    /// Calling this again with another root extends the same session: layers
    /// visited by an earlier call are not processed twice.
    ///
    /// # Errors
    ///
    /// Only fatal conditions are errors: a working-copy invariant violation
    /// or a write-back failure in the delegate. Missing dependencies are
    /// reported, not raised.
    pub fn process(&mut self, root: &LayerHandle) -> Result<(), LocalizeError> {
        let root_key = layer_key(root);
        debug!("Processing root layer {root_key}");

        self.registry.insert(root.clone());
        if !self.visited.insert(root_key.clone()) {
            debug!("Root layer {root_key} was already processed");
            return Ok(());
        }
        self.report.layers.push(root_key.clone());

        let dependencies = self.process_layer(root)?;
        self.enqueue(root, &root_key, dependencies);

        while let Some(item) = self.queue.pop() {
            self.visit(item)?;
        }
        Ok(())
    }

    /// Runs the delegate over `layer` alone, without visiting anything it
    /// depends on. Returns the dependencies the delegate reported, as
    /// authored.
    pub fn process_single_layer(&mut self, layer: &LayerHandle) -> Result<Vec<String>, LocalizeError> {
        debug!("Processing single layer {}", layer.identifier());
        self.process_layer(layer)
    }

    fn visit(&mut self, item: QueueItem) -> Result<(), LocalizeError> {
        trace!("[QUEUE_POP] '{}' (from {})", item.identifier, item.from);

        let resolved = self.resolver.resolve(&item.identifier);
        if resolved.as_ref().is_some_and(|path| self.dependencies_to_skip.contains(path)) {
            debug!("[QUEUE_POP] SKIPPED (skip list): '{}'", item.identifier);
            return Ok(());
        }

        let key = resolved
            .as_ref()
            .map_or_else(|| item.identifier.clone(), |path| path.to_string_lossy().into_owned());
        if self.edges.insert((item.from.clone(), key.clone())) {
            self.report.edges.push((item.from.clone(), key.clone()));
        }

        if !self.visited.insert(key.clone()) {
            trace!("[QUEUE_POP] SKIPPED (already visited): '{key}'");
            return Ok(());
        }

        let Some(path) = resolved else {
            warn!("Unresolved dependency '{}' referenced from {}", item.identifier, item.from);
            self.report.unresolved.push(key);
            return Ok(());
        };

        if !is_supported_layer_file(&path) {
            debug!("Found asset {key}");
            self.report.assets.push(key);
            return Ok(());
        }

        let layer = match self.registry.find_or_open(&path) {
            Ok(layer) => layer,
            Err(e) => {
                warn!("Could not open {key} as a layer, recording it as an asset: {e:#}");
                self.report.assets.push(key);
                return Ok(());
            }
        };

        self.report.layers.push(key.clone());
        if self.recurse {
            let dependencies = self.process_layer(&layer)?;
            self.enqueue(&layer, &key, dependencies);
        }
        Ok(())
    }

    fn enqueue(&mut self, layer: &LayerHandle, from: &str, dependencies: Vec<String>) {
        // Reversed so the LIFO queue pops in authored order.
        for dependency in dependencies.into_iter().rev() {
            let dependency = if is_package_relative_path(&dependency) {
                split_package_relative_path_outer(&dependency).0.to_string()
            } else {
                dependency
            };
            let identifier = self.resolver.create_identifier(&dependency, Some(layer));
            if identifier.is_empty() {
                continue;
            }
            self.queue.push(QueueItem {
                identifier,
                from: from.to_string(),
            });
        }
    }

    fn process_layer(&mut self, layer: &LayerHandle) -> Result<Vec<String>, LocalizeError> {
        let mut dependencies = self.delegate.process_sublayers(layer)?;

        // Read from a detached copy; the delegate may write to `layer`.
        let snapshot = layer.snapshot();
        for prim_path in snapshot.prim_paths() {
            if prim_path.is_root() {
                continue;
            }
            let Some(prim) = snapshot.prim_at(&prim_path) else {
                continue;
            };

            dependencies.extend(self.delegate.process_payloads(layer, &prim_path)?);
            if self.reference_types == ReferenceTypesToInclude::All {
                dependencies.extend(self.process_properties(layer, &prim_path, prim)?);
            }
            dependencies.extend(self.process_metadata(layer, &prim_path, prim)?);
            dependencies.extend(self.delegate.process_references(layer, &prim_path)?);
        }
        Ok(dependencies)
    }

    fn is_filtered(&self, key: &str) -> bool {
        self.metadata_filtering && self.filtered_metadata_keys.iter().any(|k| k == key)
    }

    fn process_properties(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
        prim: &PrimSpec,
    ) -> Result<Vec<String>, LocalizeError> {
        let mut dependencies = Vec::new();
        for property in &prim.properties {
            let path = prim_path.append_property(&property.name);

            for (key, value) in &property.metadata {
                if !self.is_filtered(key) {
                    let site = FieldSite::new(path.clone(), key.as_str());
                    dependencies.extend(self.process_value(layer, &site, value)?);
                }
            }

            if !ASSET_TYPE_NAMES.contains(&property.type_name.as_str()) {
                continue;
            }
            if let Some(default) = &property.default {
                let site = FieldSite::new(path.clone(), DEFAULT_FIELD_KEY);
                dependencies.extend(self.process_value(layer, &site, default)?);
            }
            for sample in &property.time_samples {
                let site = FieldSite::time_sample(path.clone(), sample.time);
                dependencies.extend(self.process_value(layer, &site, &sample.value)?);
            }
        }
        Ok(dependencies)
    }

    fn process_metadata(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
        prim: &PrimSpec,
    ) -> Result<Vec<String>, LocalizeError> {
        let mut dependencies = Vec::new();
        for (key, value) in &prim.metadata {
            let site = FieldSite::new(prim_path.clone(), key.as_str());
            if key == CLIPS_KEY {
                dependencies.extend(self.process_value(layer, &site, value)?);
                dependencies.extend(self.process_clip_templates(layer, &site, value)?);
            } else if self.reference_types == ReferenceTypesToInclude::All && !self.is_filtered(key) {
                dependencies.extend(self.process_value(layer, &site, value)?);
            }
        }
        Ok(dependencies)
    }

    fn process_value(
        &mut self,
        layer: &LayerHandle,
        site: &FieldSite,
        value: &Value,
    ) -> Result<Vec<String>, LocalizeError> {
        if value.kind().is_none() {
            return Ok(Vec::new());
        }

        let mut dependencies = Vec::new();
        self.delegate.begin_process_value(layer, site, value);
        self.walk_value(layer, &mut Vec::new(), value, &mut dependencies);
        self.delegate.end_process_value(layer)?;
        Ok(dependencies)
    }

    fn walk_value(
        &mut self,
        layer: &LayerHandle,
        key_path: &mut Vec<String>,
        value: &Value,
        dependencies: &mut Vec<String>,
    ) {
        match value {
            Value::Asset(path) => {
                if path.is_empty() {
                    return;
                }
                let info = self.expand(layer, path.as_str());
                dependencies.extend(self.delegate.process_value_path(layer, key_path, &info));
            }
            Value::AssetArray(paths) => {
                for (index, path) in paths.iter().enumerate() {
                    let info = self.expand(layer, path.as_str());
                    dependencies.extend(
                        self.delegate.process_value_path_array_element(layer, key_path, index, &info),
                    );
                }
                self.delegate.end_processing_value_path_array(layer, key_path);
            }
            Value::Dictionary(entries) => {
                for (key, entry) in entries {
                    key_path.push(key.clone());
                    self.walk_value(layer, key_path, entry, dependencies);
                    key_path.pop();
                }
            }
            _ => {}
        }
    }

    fn expand(&self, layer: &LayerHandle, asset_path: &str) -> DependencyInfo {
        if is_udim_path(asset_path) {
            DependencyInfo::with_dependencies(asset_path, expand_udim(self.resolver, layer, asset_path))
        } else {
            DependencyInfo::new(asset_path)
        }
    }

    fn process_clip_templates(
        &mut self,
        layer: &LayerHandle,
        site: &FieldSite,
        clips: &Value,
    ) -> Result<Vec<String>, LocalizeError> {
        let mut dependencies = Vec::new();
        let Some(clip_sets) = clips.as_dictionary() else {
            return Ok(dependencies);
        };

        for (clip_set, clip_value) in clip_sets {
            let Some(clip) = clip_value.as_dictionary() else {
                continue;
            };
            let Some(template) = clip.get(CLIP_TEMPLATE_ASSET_PATH_KEY).and_then(Value::as_str) else {
                continue;
            };
            if template.is_empty() {
                continue;
            }

            let clip_template = ClipTemplate {
                asset_path: template.to_string(),
                start: clip.get(CLIP_TEMPLATE_START_TIME_KEY).and_then(Value::as_f64),
                end: clip.get(CLIP_TEMPLATE_END_TIME_KEY).and_then(Value::as_f64),
                stride: clip.get(CLIP_TEMPLATE_STRIDE_KEY).and_then(Value::as_f64),
            };
            let files = expand_clip_template(self.resolver, layer, &clip_template).unwrap_or_else(|e| {
                warn!("{e}");
                Vec::new()
            });

            let info = DependencyInfo::with_dependencies(template, files);
            dependencies.extend(
                self.delegate.process_clip_template_asset_path(layer, site, clip_set, &info)?,
            );
        }
        Ok(dependencies)
    }
}

impl std::fmt::Debug for LocalizationContext<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationContext")
            .field("reference_types", &self.reference_types)
            .field("metadata_filtering", &self.metadata_filtering)
            .field("recurse", &self.recurse)
            .field("queued", &self.queue.len())
            .field("visited", &self.visited.len())
            .finish_non_exhaustive()
    }
}

/// Visited-set key of a layer: its backing file, or its identifier.
fn layer_key(layer: &LayerHandle) -> String {
    layer
        .real_path()
        .map_or_else(|| layer.identifier(), |path| normalize_path(&path).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::{DependencyType, ReadOnlyLocalizationDelegate, WritableLocalizationDelegate};
    use crate::resolver::FilesystemResolver;
    use crate::sdf::{Dictionary, PropertySpec};
    use crate::test_utils::LayerFixture;
    use std::cell::RefCell;

    fn key(fixture: &LayerFixture, name: &str) -> String {
        normalize_path(&fixture.file_path(name)).to_string_lossy().into_owned()
    }

    #[test]
    fn test_cycle_terminates() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_layer("a.usd", |l| l.with_sublayer("./b.usd")).unwrap();
        fixture.write_layer("b.usd", |l| l.with_prim(PrimSpec::new("B").with_reference("./a.usd"))).unwrap();

        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.process(&fixture.open("a.usd").unwrap()).unwrap();

        let report = context.into_report();
        assert_eq!(report.layers, vec![key(&fixture, "a.usd"), key(&fixture, "b.usd")]);
        assert!(report.edges.contains(&(key(&fixture, "b.usd"), key(&fixture, "a.usd"))));
    }

    #[test]
    fn test_diamond_processes_shared_layer_once() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_layer("root.usd", |l| l.with_sublayer("./left.usd").with_sublayer("./right.usd")).unwrap();
        fixture.write_layer("left.usd", |l| l.with_sublayer("./shared.usd")).unwrap();
        fixture.write_layer("right.usd", |l| l.with_sublayer("shared.usd")).unwrap();
        fixture
            .write_layer("shared.usd", |l| l.with_prim(PrimSpec::new("S").with_reference("./leaf.usd")))
            .unwrap();
        fixture.write_layer("leaf.usd", |l| l).unwrap();

        let calls = RefCell::new(Vec::new());
        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::with_processing_fn(|_, info, _| {
            calls.borrow_mut().push(info.asset_path.clone());
            info.clone()
        });
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();
        let report = context.into_report();

        assert_eq!(report.layers.len(), 5);
        assert_eq!(calls.borrow().iter().filter(|p| p.as_str() == "./leaf.usd").count(), 1);
    }

    #[test]
    fn test_no_recurse_opens_direct_dependencies_only() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_layer("root.usd", |l| l.with_sublayer("./mid.usd")).unwrap();
        fixture.write_layer("mid.usd", |l| l.with_sublayer("./deep.usd")).unwrap();
        fixture.write_layer("deep.usd", |l| l).unwrap();

        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_recurse_layer_dependencies(false);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();

        assert_eq!(context.report().layers, vec![key(&fixture, "root.usd"), key(&fixture, "mid.usd")]);
    }

    #[test]
    fn test_assets_unresolved_and_unopenable() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_file("tex.exr", b"pixels").unwrap();
        fixture.write_file("broken.usd", b"not a layer").unwrap();
        fixture
            .write_layer("root.usd", |l| {
                l.with_sublayer("./broken.usd").with_prim(
                    PrimSpec::new("World")
                        .with_reference("./missing.usd")
                        .with_property(PropertySpec::asset("tex", "./tex.exr")),
                )
            })
            .unwrap();

        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();
        let report = context.into_report();

        assert_eq!(report.layers, vec![key(&fixture, "root.usd")]);
        assert_eq!(report.assets, vec![key(&fixture, "broken.usd"), key(&fixture, "tex.exr")]);
        assert_eq!(report.unresolved, vec![key(&fixture, "missing.usd")]);
    }

    #[test]
    fn test_root_unreadable() {
        let fixture = LayerFixture::new().unwrap();
        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);

        let missing = fixture.file_path("nope.usd");
        let err = context.process_asset(&missing.to_string_lossy()).unwrap_err();
        assert!(matches!(err, LocalizeError::RootUnreadable { .. }));
        assert!(context.report().layers.is_empty());
    }

    #[test]
    fn test_composition_only_and_metadata_filtering() {
        let fixture = LayerFixture::new().unwrap();
        for name in ["tex.exr", "info.usd", "doc.usd"] {
            fixture.write_file(name, b"").unwrap();
        }
        fixture
            .write_layer("root.usd", |l| {
                l.with_prim(
                    PrimSpec::new("World")
                        .with_property(PropertySpec::asset("tex", "./tex.exr"))
                        .with_metadata("assetInfo", Value::asset("./info.usd"))
                        .with_metadata("documentation", Value::asset("./doc.usd")),
                )
            })
            .unwrap();
        let resolver = FilesystemResolver::new();

        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_reference_types_to_include(ReferenceTypesToInclude::CompositionOnly);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();
        assert!(context.report().assets.is_empty());

        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_metadata_filtering_enabled(true);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();
        let mut assets = context.into_report().assets;
        assets.sort();
        assert_eq!(assets, vec![key(&fixture, "doc.usd"), key(&fixture, "tex.exr")]);
    }

    #[test]
    fn test_skip_list() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_layer("root.usd", |l| l.with_sublayer("./skip.usd")).unwrap();
        fixture.write_layer("skip.usd", |l| l.with_sublayer("./deep.usd")).unwrap();
        fixture.write_layer("deep.usd", |l| l).unwrap();

        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::new(None);
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_dependencies_to_skip([fixture.file_path("skip.usd")]);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();

        assert_eq!(context.report().layers, vec![key(&fixture, "root.usd")]);
    }

    #[test]
    fn test_udim_tiles_are_fed_to_the_processing_function() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_file("tex.1001.exr", b"").unwrap();
        fixture.write_file("tex.1002.exr", b"").unwrap();
        fixture
            .write_layer("root.usd", |l| {
                l.with_prim(PrimSpec::new("World").with_property(PropertySpec::asset("tex", "tex.<UDIM>.exr")))
            })
            .unwrap();

        let seen = RefCell::new(Vec::new());
        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::with_processing_fn(|_, info, _| {
            seen.borrow_mut().push(info.clone());
            info.clone()
        });
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();
        let report = context.into_report();

        assert_eq!(
            seen.borrow().as_slice(),
            [DependencyInfo::with_dependencies(
                "tex.<UDIM>.exr",
                vec!["tex.1001.exr".into(), "tex.1002.exr".into()]
            )]
        );
        assert_eq!(report.assets, vec![key(&fixture, "tex.1001.exr"), key(&fixture, "tex.1002.exr")]);
    }

    #[test]
    fn test_time_samples_are_rewritten_and_erased() {
        let fixture = LayerFixture::new().unwrap();
        fixture
            .write_layer("anim.usd", |l| {
                l.with_prim(
                    PrimSpec::new("World").with_property(
                        PropertySpec::asset("tex", "./still.exr")
                            .with_time_sample(1.0, Value::asset("./one.exr"))
                            .with_time_sample(2.0, Value::asset("./two.exr")),
                    ),
                )
            })
            .unwrap();
        let layer = fixture.open("anim.usd").unwrap();

        let resolver = FilesystemResolver::new();
        let mut delegate = WritableLocalizationDelegate::with_processing_fn(|_, info, _| {
            match info.asset_path.as_str() {
                "./one.exr" => DependencyInfo::new("./uno.exr"),
                "./two.exr" => DependencyInfo::new(""),
                _ => info.clone(),
            }
        });
        let dependencies = {
            let mut context = LocalizationContext::new(&mut delegate, &resolver);
            context.process_single_layer(&layer).unwrap()
        };
        assert_eq!(dependencies, vec!["./still.exr", "./uno.exr"]);

        let tex: SpecPath = "/World.tex".parse().unwrap();
        let first = FieldSite::time_sample(tex.clone(), 1.0);
        let second = FieldSite::time_sample(tex.clone(), 2.0);
        let default = FieldSite::new(tex, DEFAULT_FIELD_KEY);

        let copy = delegate.layer_used_for_writing(&layer).unwrap();
        let copy = copy.read();
        assert_eq!(copy.get_field(&first), Some(&Value::asset("./uno.exr")));
        assert_eq!(copy.get_field(&second), None);
        assert_eq!(copy.get_field(&default), Some(&Value::asset("./still.exr")));

        let original = layer.read();
        assert_eq!(original.get_field(&first), Some(&Value::asset("./one.exr")));
        assert_eq!(original.get_field(&second), Some(&Value::asset("./two.exr")));
    }

    #[test]
    fn test_clip_templates_follow_clip_files() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_layer("clips/c.001.usd", |l| l).unwrap();
        fixture.write_layer("clips/c.002.usd", |l| l).unwrap();
        fixture.write_layer("clips/manifest.usd", |l| l).unwrap();

        let mut clip_set = Dictionary::new();
        clip_set.insert(CLIP_TEMPLATE_ASSET_PATH_KEY.into(), Value::String("./clips/c.###.usd".into()));
        clip_set.insert(CLIP_TEMPLATE_START_TIME_KEY.into(), Value::Double(1.0));
        clip_set.insert(CLIP_TEMPLATE_END_TIME_KEY.into(), Value::Double(2.0));
        clip_set.insert(CLIP_TEMPLATE_STRIDE_KEY.into(), Value::Double(1.0));
        clip_set.insert("manifestAssetPath".into(), Value::asset("./clips/manifest.usd"));
        let mut clips = Dictionary::new();
        clips.insert("default".into(), Value::Dictionary(clip_set));
        fixture
            .write_layer("root.usd", |l| {
                l.with_prim(PrimSpec::new("World").with_metadata(CLIPS_KEY, Value::Dictionary(clips)))
            })
            .unwrap();

        let types = RefCell::new(Vec::new());
        let resolver = FilesystemResolver::new();
        let mut delegate = ReadOnlyLocalizationDelegate::with_processing_fn(|_, info, ty| {
            types.borrow_mut().push(ty);
            info.clone()
        });
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_reference_types_to_include(ReferenceTypesToInclude::CompositionOnly);
        context.process(&fixture.open("root.usd").unwrap()).unwrap();
        let report = context.into_report();

        assert_eq!(types.borrow().as_slice(), [DependencyType::Reference, DependencyType::ClipTemplateAssetPath]);
        assert!(report.layers.contains(&key(&fixture, "clips/c.001.usd")));
        assert!(report.layers.contains(&key(&fixture, "clips/c.002.usd")));
        assert!(report.layers.contains(&key(&fixture, "clips/manifest.usd")));
        assert!(report.unresolved.is_empty());
    }
}
