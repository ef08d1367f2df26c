//! Test utilities for layerdeps
//!
//! Helpers for unit and integration tests: temporary layer trees on disk and
//! one-time logging setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use layerdeps::sdf::PrimSpec;
//! use layerdeps::test_utils::LayerFixture;
//!
//! let fixture = LayerFixture::new().unwrap();
//! fixture
//!     .write_layer("root.usda", |layer| {
//!         layer.with_prim(PrimSpec::new("World").with_reference("./chair.usd"))
//!     })
//!     .unwrap();
//! ```

pub mod fixtures;

pub use fixtures::LayerFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG` when set, otherwise stays silent.
///
/// ```bash
/// RUST_LOG=layerdeps=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
