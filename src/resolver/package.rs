//! Package-relative asset paths.
//!
//! A file inside a package archive is addressed as `outer.usdz[inner/file.usd]`.
//! Packages may nest: `a.usdz[b.usdz[c.usd]]` has outer `a.usdz` and inner
//! `b.usdz[c.usd]`.

use std::path::Path;

use crate::constants::PACKAGE_EXTENSIONS;

/// Returns `true` for `outer[inner]` paths.
pub fn is_package_relative_path(path: &str) -> bool {
    path.ends_with(']') && path.find('[').is_some_and(|open| open > 0)
}

/// Splits `outer[inner]` into `(outer, inner)`.
///
/// Paths that are not package-relative are returned whole with an empty inner
/// part.
pub fn split_package_relative_path_outer(path: &str) -> (&str, &str) {
    if !is_package_relative_path(path) {
        return (path, "");
    }
    match path.find('[') {
        Some(open) => (&path[..open], &path[open + 1..path.len() - 1]),
        None => (path, ""),
    }
}

/// Builds `outer[inner]`.
pub fn join_package_relative_path(outer: &str, inner: &str) -> String {
    if inner.is_empty() {
        return outer.to_string();
    }
    format!("{outer}[{inner}]")
}

/// Returns `true` if `path` names a package archive.
pub fn is_package_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PACKAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
