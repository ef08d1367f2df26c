//! Asset path resolution.
//!
//! The localization engine treats asset paths as opaque strings. A
//! [`Resolver`] turns an authored path into an *identifier* (anchored to the
//! layer that authored it) and an identifier into a concrete file, if one
//! exists.
//!
//! [`FilesystemResolver`] implements the conventional rules:
//!
//! - absolute paths are used as-is;
//! - `./` and `../` paths are anchored to the directory of the referencing layer;
//! - any other relative path is a *search path*: it is tried next to the
//!   referencing layer first, then in each configured search directory.

pub mod package;

use std::path::{Path, PathBuf};

use crate::sdf::LayerHandle;
use crate::utils::normalize_path;
pub use package::{
    is_package_path, is_package_relative_path, join_package_relative_path,
    split_package_relative_path_outer,
};

/// Resolves authored asset paths.
pub trait Resolver: Send + Sync {
    /// Anchors `asset_path` to `anchor`, the layer that authored it.
    fn create_identifier(&self, asset_path: &str, anchor: Option<&LayerHandle>) -> String;

    /// Returns the file an identifier refers to, if it exists.
    fn resolve(&self, identifier: &str) -> Option<PathBuf>;

    /// Returns `true` for relative paths that are looked up on the search path.
    fn is_search_path(&self, asset_path: &str) -> bool;

    /// Returns `true` for any relative path.
    fn is_relative_path(&self, asset_path: &str) -> bool;
}

/// Resolver over the local filesystem with an optional search path.
#[derive(Debug, Clone, Default)]
pub struct FilesystemResolver {
    search_paths: Vec<PathBuf>,
}

impl FilesystemResolver {
    /// Creates a resolver without search directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with the given search directories, tried in order.
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
        }
    }

    /// The configured search directories.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn anchor_dir(anchor: Option<&LayerHandle>) -> Option<PathBuf> {
        anchor?.real_path()?.parent().map(Path::to_path_buf)
    }

    fn create_file_identifier(&self, asset_path: &str, anchor: Option<&LayerHandle>) -> String {
        let path = Path::new(asset_path);
        if path.is_absolute() {
            return normalize_path(path).to_string_lossy().into_owned();
        }

        let Some(anchor_dir) = Self::anchor_dir(anchor) else {
            return asset_path.to_string();
        };

        let anchored = normalize_path(&anchor_dir.join(path));
        if self.is_search_path(asset_path) && !anchored.exists() {
            // Left unanchored so the search directories get a chance.
            return asset_path.to_string();
        }
        anchored.to_string_lossy().into_owned()
    }

    fn resolve_file(&self, identifier: &str) -> Option<PathBuf> {
        let path = Path::new(identifier);
        if path.is_absolute() {
            let path = normalize_path(path);
            return path.exists().then_some(path);
        }

        self.search_paths
            .iter()
            .map(|dir| normalize_path(&dir.join(path)))
            .chain(std::env::current_dir().ok().map(|cwd| normalize_path(&cwd.join(path))))
            .find(|candidate| candidate.exists())
    }
}

impl Resolver for FilesystemResolver {
    fn create_identifier(&self, asset_path: &str, anchor: Option<&LayerHandle>) -> String {
        if asset_path.is_empty() {
            return String::new();
        }
        if is_package_relative_path(asset_path) {
            let (outer, inner) = split_package_relative_path_outer(asset_path);
            return join_package_relative_path(&self.create_file_identifier(outer, anchor), inner);
        }
        self.create_file_identifier(asset_path, anchor)
    }

    fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        if identifier.is_empty() {
            return None;
        }
        if is_package_relative_path(identifier) {
            let (outer, inner) = split_package_relative_path_outer(identifier);
            let outer = self.resolve_file(outer)?;
            return Some(PathBuf::from(join_package_relative_path(&outer.to_string_lossy(), inner)));
        }
        self.resolve_file(identifier)
    }

    fn is_search_path(&self, asset_path: &str) -> bool {
        self.is_relative_path(asset_path)
            && !asset_path.starts_with("./")
            && !asset_path.starts_with("../")
            && asset_path != "."
            && asset_path != ".."
    }

    fn is_relative_path(&self, asset_path: &str) -> bool {
        !asset_path.is_empty() && Path::new(asset_path).is_relative()
    }
}
