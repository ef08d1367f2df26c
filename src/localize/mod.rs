//! Asset dependency localization engine.
//!
//! A localization session walks a root layer and everything it transitively
//! depends on (sublayers, references, payloads, asset-valued fields, UDIM tile
//! sets and value-clip templates), hands every discovered dependency to a
//! user [`ProcessingFn`], and optionally writes the function's answer back.
//!
//! # Architecture
//!
//! - [`LocalizationContext`] drives the traversal: a LIFO work queue, a
//!   visited set keyed by resolved path, and the session configuration.
//! - [`LocalizationDelegate`] is the per-category visitor.
//!   [`ReadOnlyLocalizationDelegate`] only reports;
//!   [`WritableLocalizationDelegate`] also applies the returned records.
//! - [`ProcessedPathCache`] guarantees the processing function sees each
//!   `(layer, authored path)` pair at most once per session.
//! - [`WritableLayerCopies`] creates anonymous working copies on first write
//!   when layers must not be edited in place.
//! - [`expand`] turns UDIM and clip-template literals into concrete files.
//!
//! # Processing function contract
//!
//! The function receives the layer that authored the path, a
//! [`DependencyInfo`] and the [`DependencyType`], and returns a record:
//!
//! - same `asset_path` → unchanged;
//! - empty `asset_path` → remove the dependency;
//! - anything else → rewrite the authored path.
//!
//! The returned record decides what the traversal follows next: nothing for
//! an empty path, the returned `dependencies` when there are any, otherwise
//! the returned `asset_path` itself (so a rewritten path is followed too).
//!
//! # Examples
//!
//! ```rust,no_run
//! use layerdeps::localize::{LocalizationContext, ReadOnlyLocalizationDelegate};
//! use layerdeps::resolver::FilesystemResolver;
//!
//! # fn example() -> anyhow::Result<()> {
//! let resolver = FilesystemResolver::new();
//! let mut delegate = ReadOnlyLocalizationDelegate::new(None);
//! let mut context = LocalizationContext::new(&mut delegate, &resolver);
//! context.process_asset("shot.usda")?;
//! for layer in &context.report().layers {
//!     println!("{layer}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod context;
pub mod copies;
pub mod delegate;
pub mod expand;
pub mod writable;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sdf::LayerHandle;

pub use cache::ProcessedPathCache;
pub use context::{LocalizationContext, LocalizationReport};
pub use copies::{WritableLayer, WritableLayerCopies};
pub use delegate::{LocalizationDelegate, ReadOnlyLocalizationDelegate};
pub use writable::WritableLocalizationDelegate;

/// An authored asset path and the concrete files it stands for.
///
/// `dependencies` is empty for an ordinary path; for UDIM and clip-template
/// literals it lists every file the literal expands to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// The authored asset path
    pub asset_path: String,
    /// Expanded dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl DependencyInfo {
    /// A plain dependency without expansions.
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            dependencies: Vec::new(),
        }
    }

    /// A dependency with expansions.
    pub fn with_dependencies(asset_path: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            dependencies,
        }
    }

    /// The paths the traversal follows after this record was processed.
    pub fn paths_to_follow(&self) -> Vec<String> {
        if self.asset_path.is_empty() {
            Vec::new()
        } else if !self.dependencies.is_empty() {
            self.dependencies.clone()
        } else {
            vec![self.asset_path.clone()]
        }
    }

    /// The expanded files of a processed clip template. The template itself
    /// names no single file and is never followed.
    pub fn clip_files_to_follow(&self) -> Vec<String> {
        if self.asset_path.is_empty() { Vec::new() } else { self.dependencies.clone() }
    }
}

/// How a dependency is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    /// A reference, or any asset-valued field
    Reference,
    /// A sublayer
    Sublayer,
    /// A payload
    Payload,
    /// A value-clip template asset path
    ClipTemplateAssetPath,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reference => "reference",
            Self::Sublayer => "sublayer",
            Self::Payload => "payload",
            Self::ClipTemplateAssetPath => "clip template",
        };
        write!(f, "{name}")
    }
}

/// Which kinds of dependency a session inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceTypesToInclude {
    /// Sublayers, references, payloads and value clips only
    CompositionOnly,
    /// Also asset-valued properties and metadata
    #[default]
    All,
}

/// The user callback invoked for every discovered dependency.
pub type ProcessingFn<'a> =
    Box<dyn FnMut(&LayerHandle, &DependencyInfo, DependencyType) -> DependencyInfo + 'a>;
