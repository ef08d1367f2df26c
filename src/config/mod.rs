//! Configuration management for layerdeps
//!
//! Settings come from a single TOML file. The first of these that exists is
//! used:
//!
//! 1. the path passed with `--config`;
//! 2. `./layerdeps.toml` in the working directory;
//! 3. the global file (`~/.layerdeps/config.toml`, or
//!    `%LOCALAPPDATA%\layerdeps\config.toml` on Windows).
//!
//! Without any file the defaults apply.
//!
//! ```toml
//! # Directories tried for search-path style asset paths (`~` and `$VAR` expand)
//! search_paths = ["~/assets/lib", "$PROJECT_ROOT/shared"]
//!
//! [localize]
//! reference_types = "all"          # or "composition-only"
//! metadata_filtering = true
//! filtered_metadata_keys = ["assetInfo", "customData"]
//! recurse = true
//! edit_layers_in_place = false
//! keep_empty_paths_in_arrays = false
//! skip = ["/mnt/library/shared.usd"]
//! max_parallel = 8
//! ```
//!
//! Entries of the `LAYERDEPS_SEARCH_PATH` environment variable (separated
//! like `PATH`) are appended to `search_paths`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_FILTERED_METADATA_KEYS, DEFAULT_MAX_PARALLEL, SEARCH_PATH_ENV,
};
use crate::core::LocalizeError;
use crate::localize::{LocalizationContext, ReferenceTypesToInclude};
use crate::resolver::FilesystemResolver;

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Search directories, before expansion
    pub search_paths: Vec<String>,
    /// Traversal options
    pub localize: LocalizeSettings,
}

/// Options of a localization session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizeSettings {
    /// Which dependency kinds are inspected
    pub reference_types: ReferenceTypesToInclude,
    /// Skip `filtered_metadata_keys`
    pub metadata_filtering: bool,
    /// Metadata keys skipped when filtering is on
    pub filtered_metadata_keys: Vec<String>,
    /// Process dependencies of dependencies
    pub recurse: bool,
    /// Write edits to the original layers instead of working copies
    pub edit_layers_in_place: bool,
    /// Keep an empty slot for removed asset array elements
    pub keep_empty_paths_in_arrays: bool,
    /// Files never visited, before expansion
    pub skip: Vec<String>,
    /// Layers opened concurrently by bulk loads
    pub max_parallel: usize,
}

impl Default for LocalizeSettings {
    fn default() -> Self {
        Self {
            reference_types: ReferenceTypesToInclude::All,
            metadata_filtering: true,
            filtered_metadata_keys: DEFAULT_FILTERED_METADATA_KEYS
                .iter()
                .map(|key| (*key).to_string())
                .collect(),
            recurse: true,
            edit_layers_in_place: false,
            keep_empty_paths_in_arrays: false,
            skip: Vec::new(),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl Settings {
    /// Loads settings following the lookup order of this module.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file does not exist, or if the
    /// selected file cannot be read or parsed.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(LocalizeError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                }
                .into());
            }
            return Self::load_from(path).await;
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from(&local).await;
        }

        match Self::default_path() {
            Ok(global) if global.exists() => Self::load_from(&global).await,
            _ => Ok(Self::default()),
        }
    }

    /// Loads settings from `path`.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// The global settings file.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("layerdeps")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".layerdeps")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Expanded search directories, followed by those of
    /// `LAYERDEPS_SEARCH_PATH`.
    pub fn search_paths(&self) -> Result<Vec<PathBuf>> {
        self.search_paths_with_env(std::env::var_os(SEARCH_PATH_ENV).as_deref())
    }

    fn search_paths_with_env(&self, env: Option<&std::ffi::OsStr>) -> Result<Vec<PathBuf>> {
        let mut paths = self
            .search_paths
            .iter()
            .map(|entry| expand_path(entry))
            .collect::<Result<Vec<_>>>()?;
        if let Some(env) = env {
            paths.extend(std::env::split_paths(env).filter(|p| !p.as_os_str().is_empty()));
        }
        Ok(paths)
    }

    /// Expanded skip list.
    pub fn skip_paths(&self) -> Result<Vec<PathBuf>> {
        self.localize.skip.iter().map(|entry| expand_path(entry)).collect()
    }

    /// A filesystem resolver over [`search_paths`](Self::search_paths).
    pub fn resolver(&self) -> Result<FilesystemResolver> {
        Ok(FilesystemResolver::with_search_paths(self.search_paths()?))
    }

    /// Applies the traversal options to `context`.
    pub fn configure(&self, context: &mut LocalizationContext<'_, '_>) -> Result<()> {
        let localize = &self.localize;
        context
            .set_reference_types_to_include(localize.reference_types)
            .set_metadata_filtering_enabled(localize.metadata_filtering)
            .set_filtered_metadata_keys(localize.filtered_metadata_keys.clone())
            .set_recurse_layer_dependencies(localize.recurse)
            .set_dependencies_to_skip(self.skip_paths()?);
        Ok(())
    }
}

fn expand_path(entry: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(entry)
        .with_context(|| format!("Failed to expand path '{entry}'"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
