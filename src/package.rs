//! Package archives.
//!
//! A package is a zip archive whose entries are stored uncompressed so
//! readers can map them directly. The root layer is always the first entry.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::core::LocalizeError;
use crate::dependencies::{LocalizeOptions, plan_localization};
use crate::utils::ensure_parent_dir;

/// What went into a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    /// The archive written
    pub package_path: PathBuf,
    /// In-archive paths, in archive order
    pub entries: Vec<String>,
    /// Sources left out because their in-archive path was already taken
    pub skipped: Vec<String>,
    /// Anchored paths that did not resolve
    pub unresolved: Vec<String>,
}

/// Packages `asset_path` and all of its dependencies into `package_path`.
///
/// Layers whose authored paths were rewritten are serialized from their
/// working copies; untouched layers and other files are added byte for byte.
///
/// # Errors
///
/// Fails when the root asset cannot be opened, when the plan is empty or
/// when the archive cannot be written.
pub fn create_new_package(asset_path: &str, package_path: &Path, options: &LocalizeOptions) -> Result<PackageSummary> {
    debug!("Creating package {} containing {asset_path}", package_path.display());
    let plan = plan_localization(asset_path, options)?;
    if plan.layers.is_empty() && plan.files.is_empty() {
        return Err(LocalizeError::PackageError {
            path: package_path.display().to_string(),
            reason: "nothing to package".to_string(),
        }
        .into());
    }

    ensure_parent_dir(package_path)?;
    let file = File::create(package_path)
        .with_context(|| format!("Failed to create package file: {}", package_path.display()))?;
    let mut writer = ZipWriter::new(file);
    let entry_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut summary = PackageSummary {
        package_path: package_path.to_path_buf(),
        unresolved: plan.unresolved.clone(),
        ..PackageSummary::default()
    };
    let mut packaged = HashSet::new();

    for planned in &plan.layers {
        if !packaged.insert(planned.destination.clone()) {
            warn!(
                "A file already exists at path \"{}\" in the package, skipping layer {}",
                planned.destination,
                planned.source.display()
            );
            summary.skipped.push(planned.source.display().to_string());
            continue;
        }

        let content = if planned.modified {
            planned.layer.read().to_json_string()?.into_bytes()
        } else {
            std::fs::read(&planned.source)
                .with_context(|| format!("Failed to read layer {}", planned.source.display()))?
        };
        add_entry(&mut writer, entry_options, &planned.destination, &content, package_path)?;
        summary.entries.push(planned.destination.clone());
    }

    for planned in &plan.files {
        if !packaged.insert(planned.destination.clone()) {
            warn!(
                "A file already exists at path \"{}\" in the package, skipping {}",
                planned.destination,
                planned.source.display()
            );
            summary.skipped.push(planned.source.display().to_string());
            continue;
        }

        let content = std::fs::read(&planned.source)
            .with_context(|| format!("Failed to read {}", planned.source.display()))?;
        add_entry(&mut writer, entry_options, &planned.destination, &content, package_path)?;
        summary.entries.push(planned.destination.clone());
    }

    writer.finish().map_err(|e| LocalizeError::PackageError {
        path: package_path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!("Packaged {} files into {}", summary.entries.len(), package_path.display());
    Ok(summary)
}

fn add_entry(
    writer: &mut ZipWriter<File>,
    options: SimpleFileOptions,
    name: &str,
    content: &[u8],
    package_path: &Path,
) -> Result<()> {
    debug!(".. adding '{name}' to the package");
    writer.start_file(name, options).map_err(|e| LocalizeError::PackageError {
        path: package_path.display().to_string(),
        reason: format!("cannot add '{name}': {e}"),
    })?;
    writer
        .write_all(content)
        .with_context(|| format!("Failed to write '{name}' into {}", package_path.display()))?;
    Ok(())
}

/// Lists the entry names of a package, in archive order.
pub fn list_package_entries(package_path: &Path) -> Result<Vec<String>> {
    let file = File::open(package_path)
        .with_context(|| format!("Failed to open package: {}", package_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| LocalizeError::PackageError {
        path: package_path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| LocalizeError::PackageError {
            path: package_path.display().to_string(),
            reason: e.to_string(),
        })?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf::{PrimSpec, PropertySpec};
    use crate::test_utils::LayerFixture;
    use std::io::Read;

    #[test]
    fn test_package_root_first_and_stored() {
        let fixture = LayerFixture::new().unwrap();
        fixture.write_file("tex.exr", b"texture").unwrap();
        fixture.write_layer("geo.usd", |l| l).unwrap();
        fixture
            .write_layer("shot.usd", |l| {
                l.with_prim(
                    PrimSpec::new("World")
                        .with_reference("./geo.usd")
                        .with_property(PropertySpec::asset("tex", "./tex.exr")),
                )
            })
            .unwrap();

        let out = LayerFixture::new().unwrap();
        let package = out.file_path("shot.usdz");
        let options = LocalizeOptions {
            first_layer_name: Some("main.usd".to_string()),
            ..LocalizeOptions::default()
        };
        let summary =
            create_new_package(&fixture.file_path("shot.usd").to_string_lossy(), &package, &options).unwrap();

        assert_eq!(summary.entries, vec!["main.usd", "geo.usd", "tex.exr"]);
        assert_eq!(list_package_entries(&package).unwrap(), summary.entries);

        let mut archive = zip::ZipArchive::new(File::open(&package).unwrap()).unwrap();
        let mut entry = archive.by_name("tex.exr").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"texture");
    }

    #[test]
    fn test_package_missing_root() {
        let out = LayerFixture::new().unwrap();
        let err = create_new_package(
            &out.file_path("missing.usd").to_string_lossy(),
            &out.file_path("x.usdz"),
            &LocalizeOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unable to open root layer"));
    }
}
