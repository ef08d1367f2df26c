//! Cross-platform utilities for layerdeps
//!
//! - [`fs`] - Atomic writes, copies, and TOML/JSON file helpers
//! - [`paths`] - Lexical path normalization, containment and relative paths

pub mod fs;
pub mod paths;

pub use fs::{atomic_write, copy_file, ensure_dir, ensure_parent_dir};
pub use paths::{is_within, normalize_path, normalize_path_for_storage, relative_path};
