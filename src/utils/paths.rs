//! Lexical path helpers.
//!
//! Asset paths are compared and rewritten as strings, so every path that is
//! stored or compared goes through [`normalize_path`] or
//! [`normalize_path_for_storage`] first.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path, removing `.` and resolving `..` components.
///
/// `..` never climbs above the root of an absolute path.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Normalizes a path for storage inside layers: forward slashes only.
#[must_use]
pub fn normalize_path_for_storage<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Returns `true` if `path` lies inside `base` (or is `base`).
///
/// Containment is decided on whole path components after normalization, so
/// `/pkg2/a.usd` is not considered inside `/pkg`.
#[must_use]
pub fn is_within(base: &Path, path: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(base))
}

/// Computes the relative path that leads from directory `from_dir` to `to`.
///
/// Both paths are normalized first. When the paths share no common root (for
/// example one is relative and the other absolute) `to` is returned as is.
#[must_use]
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from = normalize_path(from_dir);
    let to = normalize_path(to);

    if from.is_absolute() != to.is_absolute() {
        return to;
    }

    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    let common =
        from_components.iter().zip(to_components.iter()).take_while(|(a, b)| a == b).count();

    let mut result = PathBuf::new();
    for _ in common..from_components.len() {
        result.push("..");
    }
    for component in &to_components[common..] {
        result.push(component.as_os_str());
    }
    result
}
