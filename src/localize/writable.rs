//! The writable localization delegate.
//!
//! Applies each processed record back to the layer that authored it:
//! unchanged records write nothing, empty records remove the dependency and
//! anything else replaces the authored path. All writes go through
//! [`WritableLayerCopies`], so unless in-place editing is enabled they land
//! on anonymous working copies and the originals stay untouched.

use std::collections::{HashMap, HashSet};

use super::copies::{WritableLayer, WritableLayerCopies};
use super::delegate::{DelegateCore, LocalizationDelegate};
use super::{DependencyInfo, DependencyType, ProcessedPathCache, ProcessingFn};
use crate::constants::CLIP_TEMPLATE_ASSET_PATH_KEY;
use crate::core::LocalizeError;
use crate::sdf::{AssetPath, CompositionArc, FieldSite, LayerHandle, ListOp, PrimSpec, SpecPath, Value};

/// A field value being rebuilt between `begin_process_value` and
/// `end_process_value`.
#[derive(Debug)]
struct ValueEdit {
    site: FieldSite,
    original: Value,
    edited: Value,
    erase: bool,
    malformed: bool,
    array: Vec<AssetPath>,
}

/// Delegate that rewrites dependencies as it reports them.
#[derive(Debug)]
pub struct WritableLocalizationDelegate<'a> {
    core: DelegateCore<'a>,
    copies: WritableLayerCopies,
    keep_empty_paths_in_arrays: bool,
    current: Option<ValueEdit>,
}

impl<'a> WritableLocalizationDelegate<'a> {
    /// Creates a writable delegate that edits working copies.
    pub fn new(processing_fn: Option<ProcessingFn<'a>>) -> Self {
        Self {
            core: DelegateCore::new(processing_fn),
            copies: WritableLayerCopies::new(false),
            keep_empty_paths_in_arrays: false,
            current: None,
        }
    }

    /// Creates a writable delegate around `f`.
    pub fn with_processing_fn<F>(f: F) -> Self
    where
        F: FnMut(&LayerHandle, &DependencyInfo, DependencyType) -> DependencyInfo + 'a,
    {
        Self::new(Some(Box::new(f)))
    }

    /// Writes to the original layers instead of working copies.
    ///
    /// Only takes effect before the first write of the session.
    pub fn set_edit_layers_in_place(&mut self, edit_layers_in_place: bool) -> &mut Self {
        if self.copies.is_empty() {
            self.copies = WritableLayerCopies::new(edit_layers_in_place);
        } else {
            tracing::warn!("Ignoring in-place editing change after layers were written");
        }
        self
    }

    /// Keeps an empty slot for array elements that were removed.
    pub fn set_keep_empty_paths_in_arrays(&mut self, keep: bool) -> &mut Self {
        self.keep_empty_paths_in_arrays = keep;
        self
    }

    /// The layer that received writes for `original`, if any.
    pub fn layer_used_for_writing(&self, original: &LayerHandle) -> Option<LayerHandle> {
        self.copies.layer_used_for_writing(original)
    }

    /// Forgets the working copy of `original` once it has been persisted.
    pub fn clear_layer_used_for_writing(&mut self, original: &LayerHandle) -> Option<LayerHandle> {
        self.copies.clear_layer_used_for_writing(original)
    }

    /// Takes every written layer, keyed by the original identifier.
    pub fn take_writable_copies(&mut self) -> HashMap<String, LayerHandle> {
        self.copies.take_all()
    }

    /// The session cache.
    pub fn cache(&self) -> &ProcessedPathCache {
        self.core.cache()
    }

    fn writable(&mut self, layer: &LayerHandle) -> Result<WritableLayer, LocalizeError> {
        self.copies.get_or_create_writable_layer(layer)
    }

    fn process_arcs<T, R, W>(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
        dependency_type: DependencyType,
        read: R,
        write: W,
    ) -> Result<Vec<String>, LocalizeError>
    where
        T: CompositionArc,
        R: Fn(&PrimSpec) -> &ListOp<T>,
        W: FnOnce(&mut PrimSpec) -> &mut ListOp<T>,
    {
        let Some(list) = layer.read().prim_at(prim_path).map(|prim| read(prim).clone()) else {
            return Ok(Vec::new());
        };

        let (follow, remapped) = self.core.process_arc_list(layer, &list, dependency_type);
        if !remapped.is_empty() {
            self.writable(layer)?.edit_prim(prim_path, |prim| {
                write(prim).modify_item_edits(|item| remap_arc(item, &remapped))
            })?;
        }
        Ok(follow)
    }
}

fn remap_arc<T: CompositionArc>(item: &T, remapped: &HashMap<String, String>) -> Option<T> {
    match remapped.get(item.asset_path()) {
        Some(new_path) if new_path.is_empty() => None,
        Some(new_path) => Some(item.with_asset_path(new_path)),
        None => Some(item.clone()),
    }
}

impl LocalizationDelegate for WritableLocalizationDelegate<'_> {
    fn process_sublayers(&mut self, layer: &LayerHandle) -> Result<Vec<String>, LocalizeError> {
        let sublayers = layer.read().sublayers().to_vec();
        let (follow, remapped) = self.core.process_path_list(
            layer,
            sublayers.iter().map(String::as_str),
            DependencyType::Sublayer,
        );

        if !remapped.is_empty() {
            let writable = self.writable(layer)?;
            let current = writable.sublayers();
            let untouched: HashSet<&String> = current.iter().filter(|s| !remapped.contains_key(*s)).collect();
            let mut updated: Vec<String> = Vec::with_capacity(current.len());
            for sublayer in &current {
                match remapped.get(sublayer) {
                    None => updated.push(sublayer.clone()),
                    Some(path) if path.is_empty() => {}
                    // A rewrite onto an entry that is already listed is dropped.
                    Some(path) if untouched.contains(path) || updated.contains(path) => {}
                    Some(path) => updated.push(path.clone()),
                }
            }
            writable.set_sublayers(updated);
        }
        Ok(follow)
    }

    fn process_payloads(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
    ) -> Result<Vec<String>, LocalizeError> {
        self.process_arcs(
            layer,
            prim_path,
            DependencyType::Payload,
            |prim| &prim.payloads,
            |prim| &mut prim.payloads,
        )
    }

    fn process_references(
        &mut self,
        layer: &LayerHandle,
        prim_path: &SpecPath,
    ) -> Result<Vec<String>, LocalizeError> {
        self.process_arcs(
            layer,
            prim_path,
            DependencyType::Reference,
            |prim| &prim.references,
            |prim| &mut prim.references,
        )
    }

    fn begin_process_value(&mut self, _layer: &LayerHandle, site: &FieldSite, value: &Value) {
        self.current = Some(ValueEdit {
            site: site.clone(),
            original: value.clone(),
            edited: value.clone(),
            erase: false,
            malformed: false,
            array: Vec::new(),
        });
    }

    fn process_value_path(
        &mut self,
        layer: &LayerHandle,
        key_path: &[String],
        info: &DependencyInfo,
    ) -> Vec<String> {
        let processed = self.core.process(layer, info, DependencyType::Reference);
        if processed.asset_path == info.asset_path {
            return processed.paths_to_follow();
        }

        if let Some(edit) = self.current.as_mut() {
            let replacement = (!processed.asset_path.is_empty())
                .then(|| Value::asset(processed.asset_path.clone()));
            match replacement {
                None if key_path.is_empty() => edit.erase = true,
                replacement => {
                    if !edit.edited.set_at_key_path(key_path, replacement) {
                        edit.malformed = true;
                    }
                }
            }
        }
        processed.paths_to_follow()
    }

    fn process_value_path_array_element(
        &mut self,
        layer: &LayerHandle,
        _key_path: &[String],
        _index: usize,
        info: &DependencyInfo,
    ) -> Vec<String> {
        let processed = self.core.process(layer, info, DependencyType::Reference);
        // Authored empty slots are retained; the flag only governs removals.
        let removed = !info.asset_path.is_empty() && processed.asset_path.is_empty();
        let keep = !removed || self.keep_empty_paths_in_arrays;
        if let Some(edit) = self.current.as_mut().filter(|_| keep) {
            edit.array.push(AssetPath::new(processed.asset_path.clone()));
        }
        processed.paths_to_follow()
    }

    fn end_processing_value_path_array(&mut self, _layer: &LayerHandle, key_path: &[String]) {
        if let Some(edit) = self.current.as_mut() {
            let array = std::mem::take(&mut edit.array);
            if !edit.edited.set_at_key_path(key_path, Some(Value::AssetArray(array))) {
                edit.malformed = true;
            }
        }
    }

    fn end_process_value(&mut self, layer: &LayerHandle) -> Result<(), LocalizeError> {
        let Some(edit) = self.current.take() else {
            return Ok(());
        };

        if edit.malformed {
            tracing::warn!(
                "Skipping write-back of malformed value {} in {}",
                edit.site,
                layer.identifier()
            );
            return Ok(());
        }

        if edit.erase {
            self.writable(layer)?.erase_field(&edit.site)?;
        } else if edit.edited != edit.original {
            self.writable(layer)?.set_field(&edit.site, edit.edited)?;
        }
        Ok(())
    }

    fn process_clip_template_asset_path(
        &mut self,
        layer: &LayerHandle,
        site: &FieldSite,
        clip_set: &str,
        info: &DependencyInfo,
    ) -> Result<Vec<String>, LocalizeError> {
        let processed = self.core.process(layer, info, DependencyType::ClipTemplateAssetPath);
        if processed.asset_path == info.asset_path {
            return Ok(processed.clip_files_to_follow());
        }

        let writable = self.writable(layer)?;
        // Read from the layer being written so earlier edits of the same
        // clips dictionary are kept.
        let Some(mut clips) = writable.get_field(site) else {
            return Ok(processed.clip_files_to_follow());
        };
        let key_path = [clip_set.to_string(), CLIP_TEMPLATE_ASSET_PATH_KEY.to_string()];
        let replacement =
            (!processed.asset_path.is_empty()).then(|| Value::String(processed.asset_path.clone()));
        if clips.set_at_key_path(&key_path, replacement) {
            writable.set_field(site, clips)?;
        } else {
            tracing::warn!("Clip set '{clip_set}' at {site} in {} is malformed", layer.identifier());
        }
        Ok(processed.clip_files_to_follow())
    }
}
