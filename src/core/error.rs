//! Error handling for layerdeps
//!
//! This module provides the error taxonomy of the localization engine and the
//! user-friendly error reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** for the conditions callers need to match on
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Fatal session errors**: [`LocalizeError::RootUnreadable`],
//!   [`LocalizeError::WorkingCopyInvariant`]. These abort a localization
//!   session and are returned from `LocalizationContext::process`.
//! - **Document model**: [`LocalizeError::LayerParseError`],
//!   [`LocalizeError::LayerWriteError`], [`LocalizeError::InvalidSpecPath`],
//!   [`LocalizeError::SpecNotFound`]
//! - **Expansion**: [`LocalizeError::InvalidClipTemplate`]
//! - **Packaging**: [`LocalizeError::PackageError`]
//! - **Configuration**: [`LocalizeError::ConfigError`], [`LocalizeError::TomlError`]
//!
//! Ordinary "dependency not found" conditions are never errors: they flow
//! through the dependency records and the session report instead.
//!
//! # Examples
//!
//! ```rust,no_run
//! use layerdeps::core::{LocalizeError, ErrorContext};
//!
//! let context = ErrorContext::new(LocalizeError::RootUnreadable {
//!     path: "shot.usd".to_string(),
//!     reason: "file not found".to_string(),
//! })
//! .with_suggestion("Check that the root asset path is correct");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for layerdeps operations.
///
/// # Error Categories
///
/// ## Session
/// - [`RootUnreadable`] - The root layer of a session cannot be opened
/// - [`WorkingCopyInvariant`] - A working copy could not be created or reused
///
/// ## Document model
/// - [`LayerParseError`] - A layer file is not a valid layer document
/// - [`LayerWriteError`] - A layer could not be saved or exported
/// - [`InvalidSpecPath`] - A spec path string is malformed
/// - [`SpecNotFound`] - A field write targeted a spec that does not exist
///
/// ## Expansion and packaging
/// - [`InvalidClipTemplate`] - A clip template asset path is malformed
/// - [`PackageError`] - Writing the package archive failed
///
/// [`RootUnreadable`]: LocalizeError::RootUnreadable
/// [`WorkingCopyInvariant`]: LocalizeError::WorkingCopyInvariant
/// [`LayerParseError`]: LocalizeError::LayerParseError
/// [`LayerWriteError`]: LocalizeError::LayerWriteError
/// [`InvalidSpecPath`]: LocalizeError::InvalidSpecPath
/// [`SpecNotFound`]: LocalizeError::SpecNotFound
/// [`InvalidClipTemplate`]: LocalizeError::InvalidClipTemplate
/// [`PackageError`]: LocalizeError::PackageError
#[derive(Error, Debug)]
pub enum LocalizeError {
    /// The root layer of a localization session could not be opened.
    ///
    /// This is fatal to the session: nothing is visited.
    #[error("Unable to open root layer '{path}'")]
    RootUnreadable {
        /// Asset path of the root layer as given by the caller
        path: String,
        /// Why the layer could not be opened
        reason: String,
    },

    /// A layer file exists but is not a readable layer document.
    #[error("Invalid layer document '{path}': {reason}")]
    LayerParseError {
        /// Path to the layer file
        path: String,
        /// Parser message
        reason: String,
    },

    /// Saving or exporting a layer failed.
    #[error("Failed to write layer '{identifier}' to '{path}'")]
    LayerWriteError {
        /// Identifier of the layer being written
        identifier: String,
        /// Destination path
        path: String,
    },

    /// A spec path string could not be parsed.
    #[error("Invalid spec path '{path}': {reason}")]
    InvalidSpecPath {
        /// The offending path string
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// A field access addressed a spec that is not in the layer.
    #[error("No spec at '{path}' in layer '{layer}'")]
    SpecNotFound {
        /// Identifier of the layer
        layer: String,
        /// The spec path
        path: String,
    },

    /// A clip template asset path has no frame placeholder.
    #[error("Invalid clip template asset path '{template}': {reason}")]
    InvalidClipTemplate {
        /// The template string
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// The working-copy map is in an inconsistent state.
    #[error("Working copy invariant violated for layer '{layer}': {reason}")]
    WorkingCopyInvariant {
        /// Identifier of the original layer
        layer: String,
        /// Description of the violation
        reason: String,
    },

    /// Creating the package archive failed.
    #[error("Failed to create package '{path}': {reason}")]
    PackageError {
        /// Path of the package being written
        path: String,
        /// Reason for the failure
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for LocalizeError {
    fn clone(&self) -> Self {
        match self {
            Self::RootUnreadable {
                path,
                reason,
            } => Self::RootUnreadable {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::LayerParseError {
                path,
                reason,
            } => Self::LayerParseError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::LayerWriteError {
                identifier,
                path,
            } => Self::LayerWriteError {
                identifier: identifier.clone(),
                path: path.clone(),
            },
            Self::InvalidSpecPath {
                path,
                reason,
            } => Self::InvalidSpecPath {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::SpecNotFound {
                layer,
                path,
            } => Self::SpecNotFound {
                layer: layer.clone(),
                path: path.clone(),
            },
            Self::InvalidClipTemplate {
                template,
                reason,
            } => Self::InvalidClipTemplate {
                template: template.clone(),
                reason: reason.clone(),
            },
            Self::WorkingCopyInvariant {
                layer,
                reason,
            } => Self::WorkingCopyInvariant {
                layer: layer.clone(),
                reason: reason.clone(),
            },
            Self::PackageError {
                path,
                reason,
            } => Self::PackageError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Wraps a [`LocalizeError`] with an optional suggestion and details so the
/// CLI can present actionable guidance.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: LocalizeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: LocalizeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green in the terminal.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    ///
    /// Details are displayed in yellow in the terminal.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for display.
///
/// Known [`LocalizeError`] values anywhere in the chain get tailored
/// suggestions; I/O and TOML errors are mapped to their closest variant;
/// everything else is reported with its full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(localize_error) = error.chain().find_map(|e| e.downcast_ref::<LocalizeError>()) {
        return create_error_context(localize_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(LocalizeError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check file ownership and permissions of the asset and destination");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(LocalizeError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(LocalizeError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your layerdeps.toml file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(LocalizeError::Other {
        message,
    })
}

fn create_error_context(error: LocalizeError) -> ErrorContext {
    match &error {
        LocalizeError::RootUnreadable {
            reason, ..
        } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_details(reason)
                .with_suggestion("Check that the root asset exists and is a supported layer file (.usd, .usda, .usdj, .sdf)")
        }
        LocalizeError::LayerParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Layer documents must be valid JSON layer files"),
        LocalizeError::LayerWriteError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the destination directory is writable"),
        LocalizeError::InvalidClipTemplate {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Clip templates need a run of '#' characters for the frame number, e.g. 'clips/frame.###.usd'"),
        LocalizeError::WorkingCopyInvariant {
            ..
        } => ErrorContext::new(error)
            .with_details("A working copy is created once per layer and reused for every write in a session"),
        LocalizeError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check layerdeps.toml or the file passed with --config"),
        LocalizeError::PackageError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the package path ends in .usdz and its directory is writable"),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LocalizeError::RootUnreadable {
            path: "shot.usd".to_string(),
            reason: "missing".to_string(),
        };
        assert_eq!(error.to_string(), "Unable to open root layer 'shot.usd'");

        let error = LocalizeError::SpecNotFound {
            layer: "a.usd".to_string(),
            path: "/World".to_string(),
        };
        assert_eq!(error.to_string(), "No spec at '/World' in layer 'a.usd'");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(LocalizeError::ConfigError {
            message: "bad".to_string(),
        })
        .with_suggestion("fix it");

        let display = format!("{ctx}");
        assert!(display.contains("Configuration error: bad"));
        assert!(display.contains("Suggestion: fix it"));
    }

    #[test]
    fn test_user_friendly_error_finds_typed_error_in_chain() {
        let err = anyhow::Error::from(LocalizeError::RootUnreadable {
            path: "root.usd".to_string(),
            reason: "not found".to_string(),
        })
        .context("while computing dependencies");

        let ctx = user_friendly_error(err);
        assert!(matches!(ctx.error, LocalizeError::RootUnreadable { .. }));
        assert_eq!(ctx.details.as_deref(), Some("not found"));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(err);
        match ctx.error {
            LocalizeError::Other {
                message,
            } => {
                assert!(message.starts_with("outer"));
                assert!(message.contains("1: inner"));
            }
            _ => panic!("Expected Other error"),
        }
    }

    #[test]
    fn test_clone_io_error_becomes_other() {
        let err = LocalizeError::IoError(std::io::Error::other("disk"));
        match err.clone() {
            LocalizeError::Other {
                message,
            } => assert!(message.contains("disk")),
            _ => panic!("Expected Other"),
        }
    }
}
