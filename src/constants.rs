//! Global constants used throughout the layerdeps codebase.
//!
//! Field keys of the layer document model, file extensions, and the numeric
//! defaults used by the expanders and the bulk layer loader live here so the
//! magic values are discoverable in one place.

/// File extensions that are opened as layer documents.
pub const LAYER_EXTENSIONS: &[&str] = &["usd", "usda", "usdj", "sdf"];

/// File extensions that denote package archives.
pub const PACKAGE_EXTENSIONS: &[&str] = &["usdz"];

/// Prim metadata key holding the value-clip dictionary.
pub const CLIPS_KEY: &str = "clips";

/// Clip-set key for the templated clip asset path.
pub const CLIP_TEMPLATE_ASSET_PATH_KEY: &str = "templateAssetPath";

/// Clip-set key for the first frame of a templated clip sequence.
pub const CLIP_TEMPLATE_START_TIME_KEY: &str = "templateStartTime";

/// Clip-set key for the last frame of a templated clip sequence.
pub const CLIP_TEMPLATE_END_TIME_KEY: &str = "templateEndTime";

/// Clip-set key for the frame stride of a templated clip sequence.
pub const CLIP_TEMPLATE_STRIDE_KEY: &str = "templateStride";

/// Property field key for the default value.
pub const DEFAULT_FIELD_KEY: &str = "default";

/// Property field key for time samples.
pub const TIME_SAMPLES_FIELD_KEY: &str = "timeSamples";

/// Property type names whose values are inspected for asset paths.
pub const ASSET_TYPE_NAMES: &[&str] = &["asset", "asset[]"];

/// Metadata keys skipped when metadata filtering is enabled.
///
/// These hold bookkeeping data that frequently carries asset-typed values
/// which are not real dependencies of the layer.
pub const DEFAULT_FILTERED_METADATA_KEYS: &[&str] = &["assetInfo", "customData"];

/// Placeholder token for UDIM tile sets.
pub const UDIM_TOKEN: &str = "<UDIM>";

/// Glob fragment matching a four digit UDIM tile number.
pub const UDIM_TILE_GLOB: &str = "[1-9][0-9][0-9][0-9]";

/// Tolerance when checking whether a clip frame lies on the template stride.
pub const CLIP_STRIDE_EPSILON: f64 = 1e-6;

/// Default number of layers opened concurrently by the bulk loader.
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Directory used for dependencies that live outside the root asset's directory.
pub const EXTERNAL_DEPENDENCY_DIR: &str = "external";

/// Project configuration file name.
pub const CONFIG_FILE_NAME: &str = "layerdeps.toml";

/// Environment variable extending the resolver search path.
pub const SEARCH_PATH_ENV: &str = "LAYERDEPS_SEARCH_PATH";
