//! layerdeps - asset dependency discovery, localization and packaging
//!
//! Layered scene descriptions spread one asset over many files: sublayers,
//! referenced and payloaded layers, textures named by asset-valued fields,
//! UDIM tile sets and value-clip sequences. layerdeps finds all of them and
//! can rewrite the authored paths so the whole set can be moved, archived or
//! audited as one unit.
//!
//! # Architecture Overview
//!
//! A localization session walks a root layer with a LIFO work queue. For every
//! dependency category a [`localize::LocalizationDelegate`] reports the
//! authored paths, passing each one through a user processing function
//! first. The read-only delegate only reports; the writable delegate also
//! writes the function's answer back, on anonymous working copies unless
//! in-place editing is requested.
//!
//! # Core Modules
//!
//! - [`sdf`] - The layer document model: layers, prim specs, values, registry
//! - [`resolver`] - Anchoring and resolving asset paths on the filesystem
//! - [`localize`] - The traversal engine, delegates, cache and expanders
//! - [`dependencies`] - Reference extraction, recursive reports, path
//!   rewriting and localization into a directory
//! - [`package`] - Package archives
//! - [`graph`] - Dependency graph ordering and tree rendering
//!
//! ## Supporting Modules
//!
//! - [`cli`] - Command-line interface
//! - [`config`] - Settings file and search paths
//! - [`core`] - Error types and user-facing error formatting
//! - [`constants`] - Field keys, extensions and defaults
//! - [`utils`] - Path and file helpers
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Everything shot.usda depends on, with the dependency tree
//! layerdeps deps shot.usda --graph
//!
//! # The paths authored in one layer
//! layerdeps refs shot.usda
//!
//! # A relocatable copy, and a package archive
//! layerdeps localize shot.usda ./out
//! layerdeps package shot.usda shot.usdz --first-layer-name main.usda
//! ```
//!
//! # Settings (`layerdeps.toml`)
//!
//! ```toml
//! search_paths = ["~/assets/lib"]
//!
//! [localize]
//! reference_types = "all"
//! metadata_filtering = true
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// Document model and resolution
pub mod resolver;
pub mod sdf;

// Localization
pub mod dependencies;
pub mod graph;
pub mod localize;
pub mod package;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
