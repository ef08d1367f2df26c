//! Find-or-open cache of layers keyed by resolved path.
//!
//! Every layer is opened at most once per registry, so two references that
//! resolve to the same file share one [`LayerHandle`]. The registry also hosts
//! the optional bulk-open step: opening a flat list of known layer files
//! concurrently before any of them reaches a localization session.
//!
//! # Concurrency
//!
//! The map is a [`DashMap`], so concurrent opens from [`LayerRegistry::open_all`]
//! never contend on a registry-wide lock. A localization session itself only
//! touches the registry from its driving thread.

use anyhow::{Result, anyhow};
use dashmap::DashMap;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::layer::{Layer, LayerHandle};
use crate::utils::normalize_path;

/// Shared registry of opened layers.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Arc<DashMap<PathBuf, LayerHandle>>,
}

impl LayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the already opened layer for `path`, if any.
    pub fn find(&self, path: &Path) -> Option<LayerHandle> {
        self.layers.get(&normalize_path(path)).map(|entry| entry.value().clone())
    }

    /// Returns the layer for `path`, opening it on first use.
    pub fn find_or_open(&self, path: &Path) -> Result<LayerHandle> {
        let key = normalize_path(path);
        if let Some(handle) = self.layers.get(&key) {
            return Ok(handle.value().clone());
        }

        let layer = Layer::open(&key)?;
        tracing::debug!("Opened layer {}", key.display());
        // A concurrent open of the same path may have won; keep the first.
        let handle = self.layers.entry(key).or_insert_with(|| LayerHandle::new(layer)).clone();
        Ok(handle)
    }

    /// Registers an already opened layer under its real path.
    ///
    /// Anonymous layers have no path and are not registered.
    pub fn insert(&self, handle: LayerHandle) {
        if let Some(path) = handle.real_path() {
            self.layers.insert(normalize_path(&path), handle);
        }
    }

    /// Number of registered layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if no layer has been opened.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Opens `paths` concurrently, at most `max_parallel` at a time.
    ///
    /// Each open runs on the blocking pool and fills its own slot of the
    /// result, so `result[i]` belongs to `paths[i]`. Files that fail to open
    /// yield `None` and a warning. All opens complete before this returns.
    pub async fn open_all(&self, paths: &[PathBuf], max_parallel: usize) -> Vec<Option<LayerHandle>> {
        if paths.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
        let futures: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| {
                let registry = self.clone();
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| anyhow!("Layer open semaphore closed: {e}"))?;
                    let display = path.display().to_string();
                    tokio::task::spawn_blocking(move || registry.find_or_open(&path))
                        .await
                        .map_err(|e| anyhow!("Task join error opening {display}: {e}"))?
                }
            })
            .collect();

        join_all(futures)
            .await
            .into_iter()
            .zip(paths)
            .map(|(result, path)| match result {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!("Failed to open layer {}: {e:#}", path.display());
                    None
                }
            })
            .collect()
    }
}
