//! On-disk layer fixtures.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::sdf::{Layer, LayerHandle};

/// A temporary directory holding layer files and plain assets.
///
/// The directory is removed when the fixture is dropped.
#[derive(Debug)]
pub struct LayerFixture {
    temp: TempDir,
}

impl LayerFixture {
    /// Creates an empty fixture directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: TempDir::new().context("Failed to create fixture directory")?,
        })
    }

    /// Root of the fixture.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Absolute path of `name` inside the fixture.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// Builds a layer at `name` with `build` and saves it.
    pub fn write_layer<F>(&self, name: &str, build: F) -> Result<PathBuf>
    where
        F: FnOnce(Layer) -> Layer,
    {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut layer = build(Layer::create_new(&path));
        layer.save()?;
        Ok(path)
    }

    /// Writes a plain file (texture, clip, anything that is not a layer).
    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write fixture file: {}", path.display()))?;
        Ok(path)
    }

    /// Opens the layer at `name`.
    pub fn open(&self, name: &str) -> Result<LayerHandle> {
        Ok(LayerHandle::new(Layer::open(&self.file_path(name))?))
    }

    /// Reads the layer at `name` from disk as it is now.
    pub fn read_layer(&self, name: &str) -> Result<Layer> {
        Layer::open(&self.file_path(name))
    }
}
