//! High-level dependency operations built on the localization engine.
//!
//! - [`extract_external_references`] lists what one layer references.
//! - [`compute_all_dependencies`] walks an asset and everything it pulls in.
//! - [`modify_asset_paths`] rewrites the paths authored in one layer.
//! - [`plan_localization`] and [`localize_asset`] gather an asset and its
//!   dependencies into a self-contained directory tree. The plan is also what
//!   [`crate::package`] writes into an archive.
//!
//! # Destination layout
//!
//! Files inside the root asset's directory keep their relative location.
//! Files elsewhere are placed under `external/<n>/`, with one number per
//! source directory, so source directory names never appear in the output.
//! Every authored path is rewritten relative to the destination of the layer
//! that authors it; UDIM and clip-template literals keep their placeholder.

use anyhow::{Context, Result};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::constants::EXTERNAL_DEPENDENCY_DIR;
use crate::core::LocalizeError;
use crate::localize::{
    DependencyInfo, DependencyType, LocalizationContext, LocalizationReport,
    ReadOnlyLocalizationDelegate, ReferenceTypesToInclude, WritableLocalizationDelegate,
};
use crate::resolver::{Resolver, is_package_relative_path, split_package_relative_path_outer};
use crate::sdf::{Layer, LayerHandle, LayerRegistry};
use crate::utils::{copy_file, ensure_dir, is_within, normalize_path, normalize_path_for_storage, relative_path};

/// Direct dependencies authored in a single layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalReferences {
    /// Sublayer paths, in authored order
    pub sublayers: Vec<String>,
    /// References, asset-valued fields and clip templates; sorted, unique
    pub references: Vec<String>,
    /// Payloads; sorted, unique
    pub payloads: Vec<String>,
}

impl ExternalReferences {
    /// Returns `true` when the layer has no external dependencies.
    pub fn is_empty(&self) -> bool {
        self.sublayers.is_empty() && self.references.is_empty() && self.payloads.is_empty()
    }
}

/// Result of a recursive dependency walk.
pub type DependencyReport = LocalizationReport;

/// Lists the dependencies authored in the layer at `path`, as written.
///
/// Only that layer is inspected; nothing it references is opened.
pub fn extract_external_references(
    path: &Path,
    reference_types: ReferenceTypesToInclude,
) -> Result<ExternalReferences> {
    let layer = LayerHandle::new(Layer::open(path)?);
    let found = RefCell::new(ExternalReferences::default());
    let resolver = crate::resolver::FilesystemResolver::new();

    {
        let mut delegate = ReadOnlyLocalizationDelegate::with_processing_fn(|_, info, ty| {
            let mut found = found.borrow_mut();
            let list = match ty {
                DependencyType::Sublayer => &mut found.sublayers,
                DependencyType::Payload => &mut found.payloads,
                DependencyType::Reference | DependencyType::ClipTemplateAssetPath => {
                    &mut found.references
                }
            };
            list.push(info.asset_path.clone());
            info.clone()
        });
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        context.set_reference_types_to_include(reference_types);
        context.process_single_layer(&layer)?;
    }

    let mut found = found.into_inner();
    found.references = sorted_unique(found.references);
    found.payloads = sorted_unique(found.payloads);
    Ok(found)
}

fn sorted_unique(paths: Vec<String>) -> Vec<String> {
    paths.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Recursively computes every layer and asset `asset_path` depends on.
///
/// All dependency kinds are inspected; metadata filtering, search paths and
/// the skip list come from `settings`.
///
/// # Errors
///
/// Fails with [`LocalizeError::RootUnreadable`] when the asset cannot be
/// opened.
pub fn compute_all_dependencies(asset_path: &str, settings: &Settings) -> Result<DependencyReport> {
    let resolver = settings.resolver()?;
    let mut delegate = ReadOnlyLocalizationDelegate::new(None);
    let mut context = LocalizationContext::new(&mut delegate, &resolver);
    settings.configure(&mut context)?;
    context
        .set_reference_types_to_include(ReferenceTypesToInclude::All)
        .set_recurse_layer_dependencies(true);

    context.process_asset(asset_path)?;
    Ok(context.into_report())
}

/// Computes the dependencies of several already opened roots in one session.
///
/// Layers shared between roots are processed once. The report lists the
/// roots first, in the given order, when they are distinct.
pub fn compute_dependencies_of(
    roots: &[LayerHandle],
    registry: &LayerRegistry,
    resolver: &dyn Resolver,
    settings: &Settings,
) -> Result<DependencyReport> {
    let mut delegate = ReadOnlyLocalizationDelegate::new(None);
    let mut context = LocalizationContext::new(&mut delegate, resolver);
    settings.configure(&mut context)?;
    context.set_registry(registry.clone());

    for root in roots {
        context.process(root)?;
    }
    Ok(context.into_report())
}

/// Rewrites every asset path authored in `layer` through `modify`.
///
/// The layer is edited in place and not saved. An empty return value removes
/// the dependency; array elements removed that way leave an empty slot when
/// `keep_empty_paths_in_arrays` is set.
pub fn modify_asset_paths<F>(layer: &LayerHandle, mut modify: F, keep_empty_paths_in_arrays: bool) -> Result<()>
where
    F: FnMut(&str) -> String,
{
    let resolver = crate::resolver::FilesystemResolver::new();
    let mut delegate = WritableLocalizationDelegate::with_processing_fn(|_, info, _| {
        DependencyInfo::with_dependencies(modify(&info.asset_path), info.dependencies.clone())
    });
    delegate.set_edit_layers_in_place(true).set_keep_empty_paths_in_arrays(keep_empty_paths_in_arrays);

    let mut context = LocalizationContext::new(&mut delegate, &resolver);
    context.set_metadata_filtering_enabled(false);
    context.process_single_layer(layer)?;
    Ok(())
}

/// Options of [`localize_asset`] and [`crate::package::create_new_package`].
#[derive(Debug, Clone, Default)]
pub struct LocalizeOptions {
    /// File name for the root layer in the output
    pub first_layer_name: Option<String>,
    /// Search paths, skip list and traversal options
    pub settings: Settings,
}

/// A layer and where it goes in the output.
#[derive(Debug, Clone)]
pub struct PlannedLayer {
    /// The layer to write: its working copy when it was rewritten
    pub layer: LayerHandle,
    /// Backing file of the original layer
    pub source: PathBuf,
    /// Destination, relative to the output root, `/`-separated
    pub destination: String,
    /// `true` when the content differs from the source file
    pub modified: bool,
}

/// A non-layer file and where it goes in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Source file
    pub source: PathBuf,
    /// Destination, relative to the output root, `/`-separated
    pub destination: String,
}

/// Everything needed to write a localized asset, root layer first.
#[derive(Debug, Clone, Default)]
pub struct LocalizationPlan {
    /// Layers to export
    pub layers: Vec<PlannedLayer>,
    /// Files to copy
    pub files: Vec<PlannedFile>,
    /// Anchored paths that did not resolve
    pub unresolved: Vec<String>,
}

/// A localized asset on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalizedAsset {
    /// The root layer in the output directory
    pub root: PathBuf,
    /// Every layer written, root first
    pub layers: Vec<PathBuf>,
    /// Every other file copied
    pub files: Vec<PathBuf>,
    /// Anchored paths that did not resolve
    pub unresolved: Vec<String>,
}

/// Assigns output locations to source files.
#[derive(Debug)]
struct DestinationMap {
    root_dir: PathBuf,
    assigned: HashMap<PathBuf, String>,
    external_dirs: HashMap<PathBuf, usize>,
}

impl DestinationMap {
    fn new(root: &Path, root_destination: String) -> Self {
        let root = normalize_path(root);
        let root_dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut assigned = HashMap::new();
        assigned.insert(root, root_destination);
        Self {
            root_dir,
            assigned,
            external_dirs: HashMap::new(),
        }
    }

    fn destination(&mut self, source: &Path) -> String {
        let source = normalize_path(source);
        if let Some(existing) = self.assigned.get(&source) {
            return existing.clone();
        }

        let destination = if is_within(&self.root_dir, &source) {
            normalize_path_for_storage(relative_path(&self.root_dir, &source))
        } else {
            let dir = source.parent().map(Path::to_path_buf).unwrap_or_default();
            let next = self.external_dirs.len();
            let number = *self.external_dirs.entry(dir).or_insert(next);
            let file_name = source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            format!("{EXTERNAL_DEPENDENCY_DIR}/{number}/{file_name}")
        };
        debug!("Destination of {}: {destination}", source.display());
        self.assigned.insert(source, destination.clone());
        destination
    }
}

/// The path that leads from the output location of `from` to `to`, both
/// relative to the output root.
fn destination_relative(from: &str, to: &str) -> String {
    let from_dir = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
    let relative = normalize_path_for_storage(relative_path(from_dir, Path::new(to)));
    if relative.starts_with("../") {
        relative
    } else {
        format!("./{relative}")
    }
}

/// Rebuilds a UDIM or clip-template literal at the output location of one of
/// its expanded files.
fn relocate_literal(literal: &str, relocated_file: &str) -> String {
    let literal_name = literal.rsplit('/').next().unwrap_or(literal);
    match relocated_file.rfind('/') {
        Some(slash) => format!("{}{literal_name}", &relocated_file[..=slash]),
        None => literal_name.to_string(),
    }
}

/// Computes where the asset and all of its dependencies go and rewrites the
/// authored paths on working copies. Nothing is written to disk.
///
/// # Errors
///
/// Fails with [`LocalizeError::RootUnreadable`] when the asset cannot be
/// opened, or with a working-copy error from the session.
pub fn plan_localization(asset_path: &str, options: &LocalizeOptions) -> Result<LocalizationPlan> {
    let settings = &options.settings;
    let resolver = settings.resolver()?;
    let root_path = resolver
        .resolve(&resolver.create_identifier(asset_path, None))
        .ok_or_else(|| LocalizeError::RootUnreadable {
            path: asset_path.to_string(),
            reason: "the path does not resolve to a file".to_string(),
        })?;
    let root_name = match &options.first_layer_name {
        Some(name) => name.clone(),
        None => root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| asset_path.to_string()),
    };
    let destinations = RefCell::new(DestinationMap::new(&root_path, root_name));
    let skip: HashSet<PathBuf> = settings.skip_paths()?.iter().map(|p| normalize_path(p)).collect();

    let remap = |layer: &LayerHandle, info: &DependencyInfo, _: DependencyType| -> DependencyInfo {
        let Some(layer_path) = layer.real_path() else {
            return info.clone();
        };
        let concrete = if info.dependencies.is_empty() {
            vec![info.asset_path.clone()]
        } else {
            info.dependencies.clone()
        };

        let mut resolved = Vec::with_capacity(concrete.len());
        for path in &concrete {
            let outer = if is_package_relative_path(path) {
                split_package_relative_path_outer(path).0
            } else {
                path.as_str()
            };
            match resolver.resolve(&resolver.create_identifier(outer, Some(layer))) {
                Some(found) if !skip.contains(&found) => resolved.push(found),
                _ => return info.clone(),
            }
        }

        let mut destinations = destinations.borrow_mut();
        let layer_destination = destinations.destination(&layer_path);
        let Some(first) = resolved.first() else {
            return info.clone();
        };
        let first_destination = destinations.destination(first);
        for other in resolved.iter().skip(1) {
            destinations.destination(other);
        }

        let relocated = destination_relative(&layer_destination, &first_destination);
        let asset_path = if info.dependencies.is_empty() {
            if is_package_relative_path(&info.asset_path) {
                let (_, inner) = split_package_relative_path_outer(&info.asset_path);
                crate::resolver::join_package_relative_path(&relocated, inner)
            } else {
                relocated
            }
        } else {
            relocate_literal(&info.asset_path, &relocated)
        };

        DependencyInfo::with_dependencies(
            asset_path,
            resolved.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
        )
    };

    let mut delegate = WritableLocalizationDelegate::with_processing_fn(remap);
    delegate
        .set_edit_layers_in_place(settings.localize.edit_layers_in_place)
        .set_keep_empty_paths_in_arrays(settings.localize.keep_empty_paths_in_arrays);

    let registry = LayerRegistry::new();
    let report = {
        let mut context = LocalizationContext::new(&mut delegate, &resolver);
        settings.configure(&mut context)?;
        context
            .set_reference_types_to_include(ReferenceTypesToInclude::All)
            .set_recurse_layer_dependencies(true)
            .set_registry(registry.clone());
        context.process_asset(asset_path)?;
        context.into_report()
    };

    let mut plan = LocalizationPlan {
        unresolved: report.unresolved,
        ..LocalizationPlan::default()
    };
    let mut destinations = destinations.borrow_mut();

    for layer_key in &report.layers {
        let source = PathBuf::from(layer_key);
        let Some(original) = registry.find(&source) else {
            warn!("Layer {layer_key} is no longer loaded, skipping it");
            continue;
        };
        let (layer, modified) = match delegate.layer_used_for_writing(&original) {
            Some(copy) if !copy.ptr_eq(&original) => (copy, true),
            _ => {
                let dirty = original.read().is_dirty();
                (original, dirty)
            }
        };
        plan.layers.push(PlannedLayer {
            layer,
            destination: destinations.destination(&source),
            source,
            modified,
        });
    }

    for asset in &report.assets {
        let source = PathBuf::from(asset);
        if source.is_dir() {
            debug!("Skipping directory dependency {asset}");
            continue;
        }
        plan.files.push(PlannedFile {
            destination: destinations.destination(&source),
            source,
        });
    }

    Ok(plan)
}

/// Writes `asset_path` and all of its dependencies below `dest_dir`.
///
/// Rewritten layers are exported from their working copies; untouched layers
/// and other files are copied as they are. The source files are never
/// modified unless in-place editing is configured, and even then they are not
/// saved.
pub fn localize_asset(asset_path: &str, dest_dir: &Path, options: &LocalizeOptions) -> Result<LocalizedAsset> {
    let plan = plan_localization(asset_path, options)?;
    ensure_dir(dest_dir)?;

    let mut written = HashSet::new();
    let mut localized = LocalizedAsset {
        unresolved: plan.unresolved,
        ..LocalizedAsset::default()
    };

    for planned in &plan.layers {
        if !written.insert(planned.destination.clone()) {
            warn!(
                "A file already exists at '{}', skipping layer {}",
                planned.destination,
                planned.source.display()
            );
            continue;
        }
        let target = dest_dir.join(&planned.destination);
        if planned.modified {
            planned.layer.read().export(&target)?;
        } else {
            copy_file(&planned.source, &target)?;
        }
        localized.layers.push(target);
    }

    for planned in &plan.files {
        if !written.insert(planned.destination.clone()) {
            warn!(
                "A file already exists at '{}', skipping {}",
                planned.destination,
                planned.source.display()
            );
            continue;
        }
        let target = dest_dir.join(&planned.destination);
        copy_file(&planned.source, &target)
            .with_context(|| format!("Failed to localize {}", planned.source.display()))?;
        localized.files.push(target);
    }

    localized.root = localized.layers.first().cloned().unwrap_or_default();
    info!(
        "Localized {} layers and {} files into {}",
        localized.layers.len(),
        localized.files.len(),
        dest_dir.display()
    );
    Ok(localized)
}
