//! Object specs: prims, properties and their composition arcs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::list_op::ListOp;
use super::value::Value;

/// Time offset and scale applied to a referenced layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerOffset {
    /// Time offset
    pub offset: f64,
    /// Time scale
    pub scale: f64,
}

/// An item of a reference or payload list that may point at another layer.
///
/// Both [`Reference`] and [`Payload`] implement this so the localization
/// delegates can process either list with the same code.
pub trait CompositionArc: Clone + PartialEq {
    /// The authored asset path; empty for internal (same-layer) arcs.
    fn asset_path(&self) -> &str;

    /// Returns a copy pointing at `asset_path`.
    fn with_asset_path(&self, asset_path: &str) -> Self;
}

/// A reference to a prim in another (or the same) layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Asset path of the referenced layer; empty for internal references
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_path: String,
    /// Target prim path; empty for the layer's default prim
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prim_path: String,
    /// Optional layer offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_offset: Option<LayerOffset>,
}

impl Reference {
    /// Creates an external reference to the default prim of `asset_path`.
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            ..Self::default()
        }
    }
}

impl CompositionArc for Reference {
    fn asset_path(&self) -> &str {
        &self.asset_path
    }

    fn with_asset_path(&self, asset_path: &str) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            ..self.clone()
        }
    }
}

/// A payload: a deferred-load reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Asset path of the payload layer; empty for internal payloads
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_path: String,
    /// Target prim path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prim_path: String,
    /// Optional layer offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_offset: Option<LayerOffset>,
}

impl Payload {
    /// Creates a payload targeting the default prim of `asset_path`.
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            ..Self::default()
        }
    }
}

impl CompositionArc for Payload {
    fn asset_path(&self) -> &str {
        &self.asset_path
    }

    fn with_asset_path(&self, asset_path: &str) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            ..self.clone()
        }
    }
}

/// One authored time sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSample {
    /// Sample time
    pub time: f64,
    /// Sample value
    pub value: Value,
}

/// An attribute or relationship spec.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    /// Property name
    pub name: String,
    /// Value type name, e.g. `asset`, `asset[]`, `float`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Time samples, ordered by time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_samples: Vec<TimeSample>,
    /// Property metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl PropertySpec {
    /// An `asset`-typed attribute with a default value.
    pub fn asset(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "asset".to_string(),
            default: Some(Value::asset(path)),
            ..Self::default()
        }
    }

    /// An `asset[]`-typed attribute with a default value.
    pub fn asset_array<I, S>(name: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            type_name: "asset[]".to_string(),
            default: Some(Value::asset_array(paths)),
            ..Self::default()
        }
    }

    /// Adds a time sample.
    pub fn with_time_sample(mut self, time: f64, value: Value) -> Self {
        self.time_samples.push(TimeSample {
            time,
            value,
        });
        self
    }

    /// Adds a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A prim spec: a node of the layer's object tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimSpec {
    /// Prim name; empty for the pseudo-root
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Schema type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Prim metadata fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    /// Properties in authored order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertySpec>,
    /// Reference list edits
    #[serde(default, skip_serializing_if = "ListOp::is_empty")]
    pub references: ListOp<Reference>,
    /// Payload list edits
    #[serde(default, skip_serializing_if = "ListOp::is_empty")]
    pub payloads: ListOp<Payload>,
    /// Variant sets: set name → selection → variant prim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variant_sets: BTreeMap<String, BTreeMap<String, PrimSpec>>,
    /// Child prims in authored order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PrimSpec>,
}

impl PrimSpec {
    /// Creates an empty prim named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a child prim.
    pub fn with_child(mut self, child: PrimSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Prepends an external reference.
    pub fn with_reference(mut self, asset_path: impl Into<String>) -> Self {
        self.references.prepended.push(Reference::new(asset_path));
        self
    }

    /// Prepends an external payload.
    pub fn with_payload(mut self, asset_path: impl Into<String>) -> Self {
        self.payloads.prepended.push(Payload::new(asset_path));
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Adds a variant prim under `set`/`selection`.
    pub fn with_variant(
        mut self,
        set: impl Into<String>,
        selection: impl Into<String>,
        prim: PrimSpec,
    ) -> Self {
        self.variant_sets.entry(set.into()).or_default().insert(selection.into(), prim);
        self
    }

    /// Finds a child prim by name.
    pub fn child(&self, name: &str) -> Option<&PrimSpec> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Finds a child prim by name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut PrimSpec> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Finds a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Finds a property by name, mutably.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertySpec> {
        self.properties.iter_mut().find(|p| p.name == name)
    }
}
