//! Layer document model.
//!
//! The localization engine only needs a small slice of a scene description
//! model: layers with sublayers and a prim tree, list-edited references and
//! payloads, and field get/set/erase. This module provides exactly that, with
//! layers persisted as JSON. It does not compose layer stacks.

pub mod layer;
pub mod list_op;
pub mod path;
pub mod registry;
pub mod spec;
pub mod value;

pub use layer::{FieldSite, Layer, LayerHandle, is_supported_layer_file};
pub use list_op::ListOp;
pub use path::{PathElement, SpecPath};
pub use registry::LayerRegistry;
pub use spec::{CompositionArc, LayerOffset, Payload, PrimSpec, PropertySpec, Reference, TimeSample};
pub use value::{AssetPath, Dictionary, Value, ValueKind};
