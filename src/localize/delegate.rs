//! The localization delegate interface and its read-only implementation.
//!
//! The context calls one operation per dependency category. Each operation
//! runs the processing function (through the session cache) and returns the
//! authored-form paths the traversal should follow. Value fields are visited
//! as a bracketed sequence:
//!
//! ```text
//! begin_process_value(site, value)
//!   process_value_path(key_path, info)                 // scalar entries
//!   process_value_path_array_element(key_path, i, info) // each array element
//!   end_processing_value_path_array(key_path)           // after each array
//! end_process_value()
//! ```
//!
//! so a writable implementation can rebuild the value incrementally and
//! write it back once.

use std::collections::HashMap;

use super::cache::ProcessedPathCache;
use super::{DependencyInfo, DependencyType, ProcessingFn};
use crate::core::LocalizeError;
use crate::sdf::{CompositionArc, FieldSite, LayerHandle, ListOp, SpecPath, Value};

/// Visitor over the dependencies of one layer.
pub trait LocalizationDelegate {
    /// Processes the layer's sublayer list.
    fn process_sublayers(&mut self, layer: &LayerHandle) -> Result<Vec<String>, LocalizeError>;

    /// Processes the payload list of the prim at `prim_path`.
    fn process_payloads(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
    ) -> Result<Vec<String>, LocalizeError>;

    /// Processes the reference list of the prim at `prim_path`.
    fn process_references(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
    ) -> Result<Vec<String>, LocalizeError>;

    /// Opens the bracket for one asset-bearing field value.
    fn begin_process_value(&mut self, _layer: &LayerHandle, _site: &FieldSite, _value: &Value) {}

    /// Processes one scalar asset path inside the current value. `key_path`
    /// is empty for the value itself, or the dictionary keys leading to it.
    fn process_value_path(
        &mut self,
        layer: &LayerHandle,
        key_path: &[String],
        info: &DependencyInfo,
    ) -> Vec<String>;

    /// Processes one element of an asset path array inside the current value.
    fn process_value_path_array_element(
        &mut self,
        layer: &LayerHandle,
        key_path: &[String],
        index: usize,
        info: &DependencyInfo,
    ) -> Vec<String>;

    /// Called after the last element of the array at `key_path`.
    fn end_processing_value_path_array(&mut self, _layer: &LayerHandle, _key_path: &[String]) {}

    /// Closes the bracket opened by [`Self::begin_process_value`].
    fn end_process_value(&mut self, _layer: &LayerHandle) -> Result<(), LocalizeError> {
        Ok(())
    }

    /// Processes the template asset path of clip set `clip_set` in the
    /// `clips` dictionary at `site`. `info.dependencies` holds the clip files
    /// the template expands to; only those are followed, never the template.
    fn process_clip_template_asset_path(
        &mut self,
        layer: &LayerHandle,
        site: &FieldSite,
        clip_set: &str,
        info: &DependencyInfo,
    ) -> Result<Vec<String>, LocalizeError>;
}

/// State shared by both delegates: the processing function and its cache.
pub struct DelegateCore<'a> {
    cache: ProcessedPathCache,
    processing_fn: Option<ProcessingFn<'a>>,
}

impl<'a> DelegateCore<'a> {
    /// Creates the core; `None` processes every record as itself.
    pub fn new(processing_fn: Option<ProcessingFn<'a>>) -> Self {
        Self {
            cache: ProcessedPathCache::new(),
            processing_fn,
        }
    }

    /// Runs the processing function for `info` through the cache. Empty
    /// authored paths are never processed.
    pub fn process(
        &mut self,
        layer: &LayerHandle,
        info: &DependencyInfo,
        dependency_type: DependencyType,
    ) -> DependencyInfo {
        if info.asset_path.is_empty() {
            return info.clone();
        }
        self.cache.get_processed_info(layer, info, dependency_type, self.processing_fn.as_mut())
    }

    /// The session cache.
    pub fn cache(&self) -> &ProcessedPathCache {
        &self.cache
    }

    /// Processes every distinct authored path of a string list.
    ///
    /// Returns the paths to follow and the authored paths whose processed
    /// value differs (mapped to the new value, empty for removal).
    pub(crate) fn process_path_list<'p, I>(
        &mut self,
        layer: &LayerHandle,
        paths: I,
        dependency_type: DependencyType,
    ) -> (Vec<String>, HashMap<String, String>)
    where
        I: IntoIterator<Item = &'p str>,
    {
        let mut follow = Vec::new();
        let mut remapped = HashMap::new();
        for path in paths {
            if path.is_empty() || remapped.contains_key(path) {
                continue;
            }
            let processed = self.process(layer, &DependencyInfo::new(path), dependency_type);
            follow.extend(processed.paths_to_follow());
            if processed.asset_path != path {
                remapped.insert(path.to_string(), processed.asset_path);
            }
        }
        (follow, remapped)
    }

    /// [`Self::process_path_list`] over the external items of an arc list.
    /// Internal arcs (empty asset path) are skipped.
    pub(crate) fn process_arc_list<T: CompositionArc>(
        &mut self,
        layer: &LayerHandle,
        list: &ListOp<T>,
        dependency_type: DependencyType,
    ) -> (Vec<String>, HashMap<String, String>) {
        let paths: Vec<String> = list.items().map(|item| item.asset_path().to_string()).collect();
        self.process_path_list(layer, paths.iter().map(String::as_str), dependency_type)
    }
}

impl std::fmt::Debug for DelegateCore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateCore")
            .field("cache", &self.cache)
            .field("has_processing_fn", &self.processing_fn.is_some())
            .finish()
    }
}

/// Reports dependencies without touching any layer.
#[derive(Debug)]
pub struct ReadOnlyLocalizationDelegate<'a> {
    core: DelegateCore<'a>,
}

impl<'a> ReadOnlyLocalizationDelegate<'a> {
    /// Creates a read-only delegate.
    pub fn new(processing_fn: Option<ProcessingFn<'a>>) -> Self {
        Self {
            core: DelegateCore::new(processing_fn),
        }
    }

    /// Creates a read-only delegate around `f`.
    pub fn with_processing_fn<F>(f: F) -> Self
    where
        F: FnMut(&LayerHandle, &DependencyInfo, DependencyType) -> DependencyInfo + 'a,
    {
        Self::new(Some(Box::new(f)))
    }

    /// The session cache.
    pub fn cache(&self) -> &ProcessedPathCache {
        self.core.cache()
    }
}

impl LocalizationDelegate for ReadOnlyLocalizationDelegate<'_> {
    fn process_sublayers(&mut self, layer: &LayerHandle) -> Result<Vec<String>, LocalizeError> {
        let sublayers = layer.read().sublayers().to_vec();
        let (follow, _) = self.core.process_path_list(
            layer,
            sublayers.iter().map(String::as_str),
            DependencyType::Sublayer,
        );
        Ok(follow)
    }

    fn process_payloads(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
    ) -> Result<Vec<String>, LocalizeError> {
        let payloads = layer.read().prim_at(prim_path).map(|prim| prim.payloads.clone());
        Ok(payloads
            .map(|list| self.core.process_arc_list(layer, &list, DependencyType::Payload).0)
            .unwrap_or_default())
    }

    fn process_references(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
    ) -> Result<Vec<String>, LocalizeError> {
        let references = layer.read().prim_at(prim_path).map(|prim| prim.references.clone());
        Ok(references
            .map(|list| self.core.process_arc_list(layer, &list, DependencyType::Reference).0)
            .unwrap_or_default())
    }

    fn process_value_path(
        &mut self,
        layer: &LayerHandle,
        _key_path: &[String],
        info: &DependencyInfo,
    ) -> Vec<String> {
        self.core.process(layer, info, DependencyType::Reference).paths_to_follow()
    }

    fn process_value_path_array_element(
        &mut self,
        layer: &LayerHandle,
        _key_path: &[String],
        _index: usize,
        info: &DependencyInfo,
    ) -> Vec<String> {
        self.core.process(layer, info, DependencyType::Reference).paths_to_follow()
    }

    fn process_clip_template_asset_path(
        &mut self,
        layer: &LayerHandle,
        _site: &FieldSite,
        _clip_set: &str,
        info: &DependencyInfo,
    ) -> Result<Vec<String>, LocalizeError> {
        let processed = self.core.process(layer, info, DependencyType::ClipTemplateAssetPath);
        Ok(processed.clip_files_to_follow())
    }
}
