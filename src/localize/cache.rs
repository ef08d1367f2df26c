//! Memoization of processing-function results.

use std::collections::HashMap;

use super::{DependencyInfo, DependencyType, ProcessingFn};
use crate::sdf::LayerHandle;

/// Caches processed records by `(layer identifier, authored path)`.
///
/// On a miss the processing function runs exactly once and its result is
/// stored; a hit returns the stored record without calling it again. Without
/// a processing function every record maps to itself.
#[derive(Debug, Default)]
pub struct ProcessedPathCache {
    entries: HashMap<(String, String), DependencyInfo>,
    hits: usize,
}

impl ProcessedPathCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the processed record for `info` as authored in `layer`.
    pub fn get_processed_info(
        &mut self,
        layer: &LayerHandle,
        info: &DependencyInfo,
        dependency_type: DependencyType,
        processing_fn: Option<&mut ProcessingFn<'_>>,
    ) -> DependencyInfo {
        let key = (layer.identifier(), info.asset_path.clone());
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            tracing::trace!("[CACHE_HIT] {} in {}", key.1, key.0);
            return cached.clone();
        }

        let processed = match processing_fn {
            Some(f) => f(layer, info, dependency_type),
            None => info.clone(),
        };
        if processed.asset_path != info.asset_path {
            tracing::debug!(
                "{dependency_type} '{}' in {} processed to '{}'",
                info.asset_path,
                key.0,
                processed.asset_path
            );
        }
        self.entries.insert(key, processed.clone());
        processed
    }

    /// Number of distinct records processed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was processed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
