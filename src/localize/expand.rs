//! Dependency expanders: UDIM tile sets and value-clip templates.
//!
//! Both expanders list the directory the literal points into and match file
//! names against a pattern built from the literal. Matches are returned in
//! authored form (the literal's own directory part plus the matched file
//! name), so they anchor to the authoring layer exactly like the literal.

use glob::Pattern;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::{CLIP_STRIDE_EPSILON, UDIM_TILE_GLOB, UDIM_TOKEN};
use crate::core::LocalizeError;
use crate::resolver::Resolver;
use crate::sdf::LayerHandle;

/// A value-clip template and its authored frame range.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipTemplate {
    /// Template asset path, e.g. `clips/shot.###.usd`
    pub asset_path: String,
    /// First frame, if authored
    pub start: Option<f64>,
    /// Last frame, if authored
    pub end: Option<f64>,
    /// Frame stride, if authored
    pub stride: Option<f64>,
}

/// Returns `true` if `asset_path` holds the UDIM placeholder.
pub fn is_udim_path(asset_path: &str) -> bool {
    asset_path.contains(UDIM_TOKEN)
}

/// Expands a UDIM literal into the tile files present on disk.
///
/// Paths without the placeholder, and placeholders that match no file, fall
/// back to the literal itself.
pub fn expand_udim(resolver: &dyn Resolver, layer: &LayerHandle, asset_path: &str) -> Vec<String> {
    let identity = vec![asset_path.to_string()];
    if !is_udim_path(asset_path) {
        return identity;
    }

    let (dir, file_name) = split_authored_dir(asset_path);
    let Some((prefix, suffix)) = file_name.split_once(UDIM_TOKEN) else {
        // Token in the directory part; tiles are only matched on file names.
        return identity;
    };

    let pattern_text = format!("{}{UDIM_TILE_GLOB}{}", Pattern::escape(prefix), Pattern::escape(suffix));
    let Ok(pattern) = Pattern::new(&pattern_text) else {
        return identity;
    };

    let Some(directory) = locate_directory(resolver, layer, dir) else {
        tracing::debug!("No directory for UDIM path '{asset_path}'");
        return identity;
    };

    let tiles: Vec<String> = list_file_names(&directory)
        .into_iter()
        .filter(|name| pattern.matches(name))
        .map(|name| format!("{dir}{name}"))
        .collect();

    if tiles.is_empty() {
        tracing::debug!("No UDIM tiles found for '{asset_path}'");
        return identity;
    }
    tiles
}

/// Expands a clip template into the clip files present on disk.
///
/// A run of `#` matches an integer frame, `#.#` a fractional one. Files are
/// kept when their frame lies in `[start, end]` and on the stride, for
/// whichever of those are authored. A missing clip directory yields no
/// dependencies and a warning.
pub fn expand_clip_template(
    resolver: &dyn Resolver,
    layer: &LayerHandle,
    template: &ClipTemplate,
) -> Result<Vec<String>, LocalizeError> {
    let (dir, file_name) = split_authored_dir(&template.asset_path);
    let matcher = frame_matcher(&template.asset_path, file_name)?;

    let Some(directory) = locate_directory(resolver, layer, dir) else {
        tracing::warn!(
            "Clips directory for template '{}' in {} is not a directory on the filesystem",
            template.asset_path,
            layer.identifier()
        );
        return Ok(Vec::new());
    };

    let clips = list_file_names(&directory)
        .into_iter()
        .filter(|name| {
            matcher
                .captures(name)
                .and_then(|caps| caps.get(1))
                .and_then(|frame| frame.as_str().parse::<f64>().ok())
                .is_some_and(|frame| frame_in_range(frame, template))
        })
        .map(|name| format!("{dir}{name}"))
        .collect();

    Ok(clips)
}

fn frame_matcher(template: &str, file_name: &str) -> Result<Regex, LocalizeError> {
    let invalid = |reason: &str| LocalizeError::InvalidClipTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let placeholder = Regex::new(r"#+(?:\.#+)?").map_err(|e| invalid(&e.to_string()))?;
    let mut found = placeholder.find_iter(file_name);
    let Some(frame) = found.next() else {
        return Err(invalid("no '#' frame placeholder in the file name"));
    };
    if found.next().is_some() {
        return Err(invalid("more than one frame placeholder"));
    }

    let group = if frame.as_str().contains('.') { r"(-?\d+\.\d+)" } else { r"(-?\d+)" };
    let expression = format!(
        "^{}{group}{}$",
        regex::escape(&file_name[..frame.start()]),
        regex::escape(&file_name[frame.end()..])
    );
    Regex::new(&expression).map_err(|e| invalid(&e.to_string()))
}

fn frame_in_range(frame: f64, template: &ClipTemplate) -> bool {
    if template.start.is_some_and(|start| frame < start - CLIP_STRIDE_EPSILON) {
        return false;
    }
    if template.end.is_some_and(|end| frame > end + CLIP_STRIDE_EPSILON) {
        return false;
    }
    match template.stride {
        Some(stride) if stride > 0.0 => {
            let steps = (frame - template.start.unwrap_or(0.0)) / stride;
            (steps - steps.round()).abs() * stride <= CLIP_STRIDE_EPSILON
        }
        _ => true,
    }
}

/// Splits an authored path into its directory part (with trailing `/`, or
/// empty) and file name.
fn split_authored_dir(asset_path: &str) -> (&str, &str) {
    match asset_path.rfind('/') {
        Some(index) => asset_path.split_at(index + 1),
        None => ("", asset_path),
    }
}

fn locate_directory(resolver: &dyn Resolver, layer: &LayerHandle, dir: &str) -> Option<PathBuf> {
    let dir = if dir.is_empty() { "./" } else { dir };
    let identifier = resolver.create_identifier(dir, Some(layer));
    let anchored = Path::new(&identifier);
    if anchored.is_absolute() && anchored.is_dir() {
        return Some(anchored.to_path_buf());
    }
    resolver.resolve(&identifier).filter(|path| path.is_dir())
}

fn list_file_names(directory: &Path) -> Vec<String> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect()
}
