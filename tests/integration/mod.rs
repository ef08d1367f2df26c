//! Integration test suite for layerdeps
//!
//! End-to-end tests of the public API and the `layerdeps` binary against
//! layer trees written to temporary directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **deps**: Recursive dependency reports, filtering and bulk loading
//! - **modify**: Rewriting authored paths and copy-on-write sessions
//! - **localize**: Localizing into a directory
//! - **package**: Package archives
//! - **cli**: The command-line interface

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod deps;
mod localize;
mod modify;
mod package;
