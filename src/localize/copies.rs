//! Copy-on-write management of the layers a writable session edits.
//!
//! Writes never go through a plain [`LayerHandle`]: the writable delegate
//! asks [`WritableLayerCopies`] for a [`WritableLayer`] first. When in-place
//! editing is disabled that is an anonymous duplicate created on the first
//! write and reused for every later write, so the original can never be
//! written through once a copy exists.

use std::collections::HashMap;
use std::path::Path;

use crate::core::LocalizeError;
use crate::sdf::{FieldSite, LayerHandle, PrimSpec, SpecPath, Value};

/// Write access to a layer, handed out by [`WritableLayerCopies`].
#[derive(Debug, Clone)]
pub struct WritableLayer {
    handle: LayerHandle,
}

impl WritableLayer {
    pub(crate) fn new(handle: LayerHandle) -> Self {
        Self {
            handle,
        }
    }

    /// The layer being written.
    pub fn handle(&self) -> &LayerHandle {
        &self.handle
    }

    /// Reads a field from the layer being written.
    pub fn get_field(&self, site: &FieldSite) -> Option<Value> {
        self.handle.read().get_field(site).cloned()
    }

    /// Ordered sublayers of the layer being written.
    pub fn sublayers(&self) -> Vec<String> {
        self.handle.read().sublayers().to_vec()
    }

    /// Replaces the sublayer list.
    pub fn set_sublayers(&self, sublayers: Vec<String>) {
        self.handle.write().set_sublayers(sublayers);
    }

    /// Writes a field.
    pub fn set_field(&self, site: &FieldSite, value: Value) -> Result<(), LocalizeError> {
        self.handle.write().set_field(site, value)
    }

    /// Removes a field.
    pub fn erase_field(&self, site: &FieldSite) -> Result<bool, LocalizeError> {
        self.handle.write().erase_field(site)
    }

    /// Edits a prim in place; see [`crate::sdf::Layer::edit_prim`].
    pub fn edit_prim<F>(&self, path: &SpecPath, edit: F) -> Result<bool, LocalizeError>
    where
        F: FnOnce(&mut PrimSpec) -> bool,
    {
        self.handle.write().edit_prim(path, edit)
    }

    /// Saves the layer to its backing file.
    pub fn save(&self) -> anyhow::Result<()> {
        self.handle.write().save()
    }
}

/// Map from original layer identifier to the layer used for writing it.
#[derive(Debug, Default)]
pub struct WritableLayerCopies {
    edit_layers_in_place: bool,
    layers: HashMap<String, LayerHandle>,
}

impl WritableLayerCopies {
    /// Creates an empty manager.
    pub fn new(edit_layers_in_place: bool) -> Self {
        Self {
            edit_layers_in_place,
            layers: HashMap::new(),
        }
    }

    /// Returns the layer to write for `original`, creating its working copy
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LocalizeError::WorkingCopyInvariant`] when `original` is
    /// itself a working copy of this session.
    pub fn get_or_create_writable_layer(
        &mut self,
        original: &LayerHandle,
    ) -> Result<WritableLayer, LocalizeError> {
        let identifier = original.identifier();
        if let Some(existing) = self.layers.get(&identifier) {
            return Ok(WritableLayer::new(existing.clone()));
        }

        if self.edit_layers_in_place {
            self.layers.insert(identifier, original.clone());
            return Ok(WritableLayer::new(original.clone()));
        }

        if self.layers.values().any(|copy| copy.ptr_eq(original)) {
            return Err(LocalizeError::WorkingCopyInvariant {
                layer: identifier,
                reason: "layer is already a working copy of this session".to_string(),
            });
        }

        let copy = {
            let layer = original.read();
            let tag = layer
                .real_path()
                .and_then(Path::file_name)
                .map_or_else(|| "copy".to_string(), |name| name.to_string_lossy().into_owned());
            LayerHandle::new(layer.duplicate_anonymous(&tag))
        };
        tracing::debug!("Created working copy {} of {identifier}", copy.identifier());
        self.layers.insert(identifier, copy.clone());
        Ok(WritableLayer::new(copy))
    }

    /// The layer that received writes for `original`, if any.
    pub fn layer_used_for_writing(&self, original: &LayerHandle) -> Option<LayerHandle> {
        self.layers.get(&original.identifier()).cloned()
    }

    /// Forgets the mapping for `original`, returning the layer it mapped to.
    pub fn clear_layer_used_for_writing(&mut self, original: &LayerHandle) -> Option<LayerHandle> {
        self.layers.remove(&original.identifier())
    }

    /// Number of layers that received writes.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Takes every mapping, keyed by original identifier.
    pub fn take_all(&mut self) -> HashMap<String, LayerHandle> {
        std::mem::take(&mut self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf::Layer;
    use tempfile::TempDir;

    fn saved_layer(dir: &Path) -> LayerHandle {
        let path = dir.join("a.usd");
        Layer::create_new(&path).with_sublayer("b.usd").save().unwrap();
        LayerHandle::new(Layer::open(&path).unwrap())
    }

    #[test]
    fn test_copy_is_created_once_and_reused() {
        let temp = TempDir::new().unwrap();
        let original = saved_layer(temp.path());
        let mut copies = WritableLayerCopies::new(false);

        let first = copies.get_or_create_writable_layer(&original).unwrap();
        first.set_sublayers(vec!["c.usd".into()]);
        let second = copies.get_or_create_writable_layer(&original).unwrap();

        assert!(first.handle().ptr_eq(second.handle()));
        assert!(!first.handle().ptr_eq(&original));
        assert_eq!(original.read().sublayers(), ["b.usd"]);
        assert_eq!(second.sublayers(), vec!["c.usd"]);

        let used = copies.layer_used_for_writing(&original).unwrap();
        assert!(used.ptr_eq(first.handle()));
        assert!(used.read().is_anonymous());

        // The file on disk is untouched.
        let on_disk = Layer::open(&temp.path().join("a.usd")).unwrap();
        assert_eq!(on_disk.sublayers(), ["b.usd"]);
    }

    #[test]
    fn test_in_place_returns_original() {
        let temp = TempDir::new().unwrap();
        let original = saved_layer(temp.path());
        let mut copies = WritableLayerCopies::new(true);

        let writable = copies.get_or_create_writable_layer(&original).unwrap();
        assert!(writable.handle().ptr_eq(&original));
        assert!(copies.layer_used_for_writing(&original).unwrap().ptr_eq(&original));
    }

    #[test]
    fn test_clear_and_invariant() {
        let temp = TempDir::new().unwrap();
        let original = saved_layer(temp.path());
        let mut copies = WritableLayerCopies::new(false);

        let writable = copies.get_or_create_writable_layer(&original).unwrap();
        let copy = writable.handle().clone();
        assert!(matches!(
            copies.get_or_create_writable_layer(&copy),
            Err(LocalizeError::WorkingCopyInvariant { .. })
        ));

        assert!(copies.clear_layer_used_for_writing(&original).is_some());
        assert!(copies.layer_used_for_writing(&original).is_none());
        assert!(copies.is_empty());
    }
}
