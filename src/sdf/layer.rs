//! Layers: the unit of scene description that is opened, traversed and saved.
//!
//! A [`Layer`] owns a pseudo-root prim (whose metadata is the layer metadata
//! and whose children are the root prims) and an ordered sublayer list.
//! Layers are stored on disk as JSON documents.
//!
//! [`LayerHandle`] is the shared handle the rest of the crate passes around.
//! Its public surface is read-only: mutation goes through
//! [`crate::localize::WritableLayer`], which only the working-copy manager
//! hands out.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::path::{PathElement, SpecPath};
use super::spec::{PrimSpec, PropertySpec};
use super::value::Value;
use crate::constants::{DEFAULT_FIELD_KEY, LAYER_EXTENSIONS, TIME_SAMPLES_FIELD_KEY};
use crate::core::LocalizeError;
use crate::utils::{atomic_write, normalize_path};

/// Returns `true` if `path` has an extension that is opened as a layer.
pub fn is_supported_layer_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LAYER_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// On-disk shape of a layer.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sublayers: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    prims: Vec<PrimSpec>,
}

/// Addresses one field: a metadata key on a prim (or on the layer, at `/`),
/// or a field of a property. Time-sampled values carry the sample time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSite {
    /// Owning spec
    pub path: SpecPath,
    /// Field key
    pub key: String,
    /// Sample time, for `timeSamples` sites
    pub time: Option<f64>,
}

impl FieldSite {
    /// A plain field.
    pub fn new(path: SpecPath, key: impl Into<String>) -> Self {
        Self {
            path,
            key: key.into(),
            time: None,
        }
    }

    /// One time sample of a property.
    pub fn time_sample(path: SpecPath, time: f64) -> Self {
        Self {
            path,
            key: TIME_SAMPLES_FIELD_KEY.to_string(),
            time: Some(time),
        }
    }
}

impl std::fmt::Display for FieldSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time {
            Some(time) => write!(f, "{}:{}[{time}]", self.path, self.key),
            None => write!(f, "{}:{}", self.path, self.key),
        }
    }
}

/// A scene description layer.
#[derive(Debug, Clone)]
pub struct Layer {
    identifier: String,
    real_path: Option<PathBuf>,
    sublayers: Vec<String>,
    pseudo_root: PrimSpec,
    dirty: bool,
}

impl Layer {
    /// Creates an empty layer backed by `path`. Nothing is written until
    /// [`Layer::save`].
    pub fn create_new(path: &Path) -> Self {
        let path = normalize_path(path);
        Self {
            identifier: path.to_string_lossy().into_owned(),
            real_path: Some(path),
            sublayers: Vec::new(),
            pseudo_root: PrimSpec::default(),
            dirty: true,
        }
    }

    /// Creates an empty anonymous layer.
    pub fn new_anonymous(tag: &str) -> Self {
        Self {
            identifier: anonymous_identifier(tag),
            real_path: None,
            sublayers: Vec::new(),
            pseudo_root: PrimSpec::default(),
            dirty: false,
        }
    }

    /// Opens and parses the layer file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let path = normalize_path(path);
        if !is_supported_layer_file(&path) {
            return Err(LocalizeError::LayerParseError {
                path: path.display().to_string(),
                reason: "not a layer file extension".to_string(),
            }
            .into());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read layer: {}", path.display()))?;
        let mut layer = Self::parse(&text).map_err(|e| LocalizeError::LayerParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        layer.identifier = path.to_string_lossy().into_owned();
        layer.real_path = Some(path);
        Ok(layer)
    }

    /// Parses layer text into an anonymous layer.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let document: LayerDocument = serde_json::from_str(text)?;
        let mut layer = Self::new_anonymous("parsed");
        layer.sublayers = document.sublayers;
        layer.pseudo_root.metadata = document.metadata;
        layer.pseudo_root.children = document.prims;
        Ok(layer)
    }

    /// Serializes the layer content.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let document = LayerDocument {
            sublayers: self.sublayers.clone(),
            metadata: self.pseudo_root.metadata.clone(),
            prims: self.pseudo_root.children.clone(),
        };
        serde_json::to_string_pretty(&document)
    }

    /// Writes the layer content to `path` without changing its identity.
    pub fn export(&self, path: &Path) -> Result<()> {
        let text = self.to_json_string()?;
        atomic_write(path, text.as_bytes()).with_context(|| LocalizeError::LayerWriteError {
            identifier: self.identifier.clone(),
            path: path.display().to_string(),
        })
    }

    /// Saves the layer to its backing file.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.real_path.clone() else {
            return Err(LocalizeError::LayerWriteError {
                identifier: self.identifier.clone(),
                path: String::new(),
            }
            .into());
        };
        self.export(&path)?;
        self.dirty = false;
        Ok(())
    }

    /// Copies the content into a new anonymous layer with no backing file.
    pub fn duplicate_anonymous(&self, tag: &str) -> Self {
        Self {
            identifier: anonymous_identifier(tag),
            real_path: None,
            sublayers: self.sublayers.clone(),
            pseudo_root: self.pseudo_root.clone(),
            dirty: false,
        }
    }

    /// The layer identifier: its normalized path, or `anon:<uuid>:<tag>`.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The backing file, if any.
    pub fn real_path(&self) -> Option<&Path> {
        self.real_path.as_deref()
    }

    /// Returns `true` for layers without a backing file.
    pub fn is_anonymous(&self) -> bool {
        self.real_path.is_none()
    }

    /// Returns `true` if the layer was modified since it was opened or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if both layers hold the same sublayers and specs.
    pub fn has_same_content(&self, other: &Layer) -> bool {
        self.sublayers == other.sublayers && self.pseudo_root == other.pseudo_root
    }

    /// Ordered sublayer asset paths.
    pub fn sublayers(&self) -> &[String] {
        &self.sublayers
    }

    /// Replaces the sublayer list.
    pub fn set_sublayers(&mut self, sublayers: Vec<String>) {
        if self.sublayers != sublayers {
            self.sublayers = sublayers;
            self.dirty = true;
        }
    }

    /// Layer metadata (the pseudo-root's metadata).
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.pseudo_root.metadata
    }

    /// The pseudo-root prim.
    pub fn pseudo_root(&self) -> &PrimSpec {
        &self.pseudo_root
    }

    /// Appends a sublayer path.
    pub fn with_sublayer(mut self, path: impl Into<String>) -> Self {
        self.sublayers.push(path.into());
        self.dirty = true;
        self
    }

    /// Adds a root prim.
    pub fn with_prim(mut self, prim: PrimSpec) -> Self {
        self.pseudo_root.children.push(prim);
        self.dirty = true;
        self
    }

    /// Sets a layer metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.pseudo_root.metadata.insert(key.into(), value);
        self.dirty = true;
        self
    }

    /// Every prim path in pre-order: the pseudo-root first, then each prim
    /// followed by its variant prims and its children.
    pub fn prim_paths(&self) -> Vec<SpecPath> {
        let mut paths = vec![SpecPath::root()];
        for child in &self.pseudo_root.children {
            collect_prim_paths(child, &SpecPath::root().append_child(&child.name), &mut paths);
        }
        paths
    }

    /// The prim at `path`.
    pub fn prim_at(&self, path: &SpecPath) -> Option<&PrimSpec> {
        let mut prim = &self.pseudo_root;
        for element in path.elements() {
            prim = match element {
                PathElement::Prim(name) => prim.child(name)?,
                PathElement::Variant {
                    set,
                    selection,
                } => prim.variant_sets.get(set)?.get(selection)?,
            };
        }
        Some(prim)
    }

    fn prim_at_mut(&mut self, path: &SpecPath) -> Option<&mut PrimSpec> {
        let mut prim = &mut self.pseudo_root;
        for element in path.elements() {
            prim = match element {
                PathElement::Prim(name) => prim.child_mut(name)?,
                PathElement::Variant {
                    set,
                    selection,
                } => prim.variant_sets.get_mut(set)?.get_mut(selection)?,
            };
        }
        Some(prim)
    }

    /// The property at a property path.
    pub fn property_at(&self, path: &SpecPath) -> Option<&PropertySpec> {
        let name = path.property_name()?;
        self.prim_at(&path.prim_path())?.property(name)
    }

    fn property_at_mut(&mut self, path: &SpecPath) -> Option<&mut PropertySpec> {
        let name = path.property_name()?.to_string();
        self.prim_at_mut(&path.prim_path())?.property_mut(&name)
    }

    /// Applies `edit` to the prim at `path`; the layer is marked dirty when
    /// `edit` reports a change.
    pub fn edit_prim<F>(&mut self, path: &SpecPath, edit: F) -> Result<bool, LocalizeError>
    where
        F: FnOnce(&mut PrimSpec) -> bool,
    {
        let identifier = self.identifier.clone();
        let prim = self.prim_at_mut(path).ok_or_else(|| LocalizeError::SpecNotFound {
            layer: identifier,
            path: path.to_string(),
        })?;
        let changed = edit(prim);
        self.dirty |= changed;
        Ok(changed)
    }

    /// Reads a field.
    pub fn get_field(&self, site: &FieldSite) -> Option<&Value> {
        if !site.path.is_property() {
            return self.prim_at(&site.path)?.metadata.get(&site.key);
        }

        let property = self.property_at(&site.path)?;
        match (site.key.as_str(), site.time) {
            (DEFAULT_FIELD_KEY, _) => property.default.as_ref(),
            (TIME_SAMPLES_FIELD_KEY, Some(time)) => {
                property.time_samples.iter().find(|s| s.time == time).map(|s| &s.value)
            }
            (key, _) => property.metadata.get(key),
        }
    }

    /// Writes a field. The owning spec must exist.
    pub fn set_field(&mut self, site: &FieldSite, value: Value) -> Result<(), LocalizeError> {
        let identifier = self.identifier.clone();

        if !site.path.is_property() {
            let prim = self
                .prim_at_mut(&site.path)
                .ok_or_else(|| spec_not_found(identifier, site))?;
            prim.metadata.insert(site.key.clone(), value);
            self.dirty = true;
            return Ok(());
        }

        let property = self
            .property_at_mut(&site.path)
            .ok_or_else(|| spec_not_found(identifier, site))?;
        match (site.key.as_str(), site.time) {
            (DEFAULT_FIELD_KEY, _) => property.default = Some(value),
            (TIME_SAMPLES_FIELD_KEY, Some(time)) => {
                match property.time_samples.iter_mut().find(|s| s.time == time) {
                    Some(sample) => sample.value = value,
                    None => {
                        property.time_samples.push(super::spec::TimeSample {
                            time,
                            value,
                        });
                        property.time_samples.sort_by(|a, b| a.time.total_cmp(&b.time));
                    }
                }
            }
            (key, _) => {
                property.metadata.insert(key.to_string(), value);
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Removes a field. Returns `true` if it existed.
    pub fn erase_field(&mut self, site: &FieldSite) -> Result<bool, LocalizeError> {
        let identifier = self.identifier.clone();

        let removed = if site.path.is_property() {
            let property = self
                .property_at_mut(&site.path)
                .ok_or_else(|| spec_not_found(identifier, site))?;
            match (site.key.as_str(), site.time) {
                (DEFAULT_FIELD_KEY, _) => property.default.take().is_some(),
                (TIME_SAMPLES_FIELD_KEY, Some(time)) => {
                    let before = property.time_samples.len();
                    property.time_samples.retain(|s| s.time != time);
                    property.time_samples.len() != before
                }
                (key, _) => property.metadata.remove(key).is_some(),
            }
        } else {
            let prim = self
                .prim_at_mut(&site.path)
                .ok_or_else(|| spec_not_found(identifier, site))?;
            prim.metadata.remove(&site.key).is_some()
        };

        self.dirty |= removed;
        Ok(removed)
    }
}

fn spec_not_found(layer: String, site: &FieldSite) -> LocalizeError {
    LocalizeError::SpecNotFound {
        layer,
        path: site.to_string(),
    }
}

fn anonymous_identifier(tag: &str) -> String {
    format!("anon:{}:{tag}", Uuid::new_v4().simple())
}

fn collect_prim_paths(prim: &PrimSpec, path: &SpecPath, out: &mut Vec<SpecPath>) {
    out.push(path.clone());
    for (set, selections) in &prim.variant_sets {
        for (selection, variant) in selections {
            collect_prim_paths(variant, &path.append_variant(set, selection), out);
        }
    }
    for child in &prim.children {
        collect_prim_paths(child, &path.append_child(&child.name), out);
    }
}

/// Shared handle to a layer.
///
/// Cloning the handle shares the layer. Two handles are the same layer when
/// [`LayerHandle::ptr_eq`] holds.
#[derive(Debug, Clone)]
pub struct LayerHandle {
    inner: Arc<RwLock<Layer>>,
}

impl LayerHandle {
    /// Wraps a layer.
    pub fn new(layer: Layer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(layer)),
        }
    }

    /// Read access to the layer.
    pub fn read(&self) -> RwLockReadGuard<'_, Layer> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Layer> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The layer identifier.
    pub fn identifier(&self) -> String {
        self.read().identifier().to_string()
    }

    /// The backing file, if any.
    pub fn real_path(&self) -> Option<PathBuf> {
        self.read().real_path().map(Path::to_path_buf)
    }

    /// Returns `true` if both handles share one layer.
    pub fn ptr_eq(&self, other: &LayerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A detached copy of the current layer state.
    pub fn snapshot(&self) -> Layer {
        self.read().clone()
    }
}
