//! Error handling for brewer
//!
//! This module provides the error types and user-friendly error reporting used across
//! the crate. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can match on precise failure modes
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`BrewerError`] - Enumerated error types for every failure case
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! # Error Categories
//!
//! - **Package index**: [`BrewerError::PackageNotFound`], [`BrewerError::NetworkError`]
//! - **Formula files**: [`BrewerError::FormulaParseError`], [`BrewerError::FormulaFieldMissing`],
//!   [`BrewerError::FormulaNotFound`]
//! - **Project metadata**: [`BrewerError::ProjectFileNotFound`], [`BrewerError::ProjectParseError`],
//!   [`BrewerError::LockfileNotFound`], [`BrewerError::LockfileParseError`]
//! - **Dependency graph**: [`BrewerError::CircularDependency`], [`BrewerError::UnsupportedSource`]
//! - **Rendering**: [`BrewerError::TemplateError`]
//!
//! None of these errors is recoverable inside the crate. A formula is either built
//! completely or not at all, and every error propagates up to the CLI boundary.
//!
//! # Examples
//!
//! ```rust,no_run
//! use brewer::core::{BrewerError, user_friendly_error};
//!
//! let error = BrewerError::PackageNotFound {
//!     name: "click".to_string(),
//!     version: "99.0.0".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for brewer operations.
///
/// Each variant describes one failure mode with the data needed to explain it.
/// Variants that wrap foreign errors (`IoError`, `TomlError`) are converted
/// automatically through `From`.
#[derive(Error, Debug)]
pub enum BrewerError {
    /// The package index has no release for the requested name and version.
    ///
    /// Raised when the index answers with 404 or lists no distributable files.
    #[error("Package '{name}' version {version} not found in the package index")]
    PackageNotFound {
        /// Package name as recorded in the lockfile
        name: String,
        /// Exact locked version
        version: String,
    },

    /// A request to the package index could not be completed.
    ///
    /// Covers transport failures, timeouts, unexpected status codes and
    /// undecodable response bodies. The whole formula construction may be retried.
    #[error("Network error: {operation}")]
    NetworkError {
        /// The network operation that failed
        operation: String,
        /// Reason for the network failure
        reason: String,
    },

    /// A formula file does not follow the expected grammar.
    #[error("Invalid formula syntax in {file} at line {line}: {reason}")]
    FormulaParseError {
        /// Formula file (or `<string>` for in-memory text)
        file: String,
        /// 1-based line number of the offending statement
        line: usize,
        /// What was wrong with the statement
        reason: String,
    },

    /// A formula file is missing a statement every rendered formula carries.
    #[error("Formula {file} is missing the required '{field}' statement")]
    FormulaFieldMissing {
        /// Formula file (or `<string>` for in-memory text)
        file: String,
        /// Name of the missing statement
        field: String,
    },

    /// The formula file to update does not exist.
    #[error("Formula file not found: {path}")]
    FormulaNotFound {
        /// Path that was given
        path: String,
    },

    /// The lock graph contains a dependency cycle.
    ///
    /// The resolver is expected to hand over an acyclic graph, so this points at
    /// a malformed lockfile rather than at something the user can fix here.
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// The dependency chain showing the circular reference
        chain: String,
    },

    /// `pyproject.toml` could not be found for the given project path.
    #[error("Project file not found: {path}")]
    ProjectFileNotFound {
        /// Path that was searched
        path: String,
    },

    /// `pyproject.toml` exists but lacks required data or is malformed.
    #[error("Invalid project file {file}: {reason}")]
    ProjectParseError {
        /// Path to the project file
        file: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// `poetry.lock` is missing next to the project file.
    #[error("Lockfile not found: {path}")]
    LockfileNotFound {
        /// Path where the lockfile was expected
        path: String,
    },

    /// `poetry.lock` exists but is malformed.
    #[error("Invalid lockfile syntax in {file}")]
    LockfileParseError {
        /// Path to the lockfile that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// A locked package comes from a source kind formulas cannot reference.
    #[error("Package '{name}' uses unsupported source type '{kind}'")]
    UnsupportedSource {
        /// Package name
        name: String,
        /// Source type recorded in the lockfile (e.g. `directory`, `file`)
        kind: String,
    },

    /// Two resources of one formula would share a name.
    ///
    /// Same-named packages are qualified with their version or git reference
    /// first; this is raised only when that still leaves a clash.
    #[error("Resource name '{name}' is used by more than one download")]
    DuplicateResource {
        /// The shared resource name
        name: String,
    },

    /// The formula's revision cannot be incremented any further.
    #[error("Formula revision {revision} cannot be incremented")]
    RevisionOverflow {
        /// Revision read from the formula
        revision: u32,
    },

    /// The formula template failed to render.
    #[error("Template rendering failed: {reason}")]
    TemplateError {
        /// Cleaned-up message from the template engine
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

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

impl Clone for BrewerError {
    fn clone(&self) -> Self {
        match self {
            Self::PackageNotFound {
                name,
                version,
            } => Self::PackageNotFound {
                name: name.clone(),
                version: version.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::FormulaParseError {
                file,
                line,
                reason,
            } => Self::FormulaParseError {
                file: file.clone(),
                line: *line,
                reason: reason.clone(),
            },
            Self::FormulaFieldMissing {
                file,
                field,
            } => Self::FormulaFieldMissing {
                file: file.clone(),
                field: field.clone(),
            },
            Self::FormulaNotFound {
                path,
            } => Self::FormulaNotFound {
                path: path.clone(),
            },
            Self::CircularDependency {
                chain,
            } => Self::CircularDependency {
                chain: chain.clone(),
            },
            Self::ProjectFileNotFound {
                path,
            } => Self::ProjectFileNotFound {
                path: path.clone(),
            },
            Self::ProjectParseError {
                file,
                reason,
            } => Self::ProjectParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::LockfileNotFound {
                path,
            } => Self::LockfileNotFound {
                path: path.clone(),
            },
            Self::LockfileParseError {
                file,
                reason,
            } => Self::LockfileParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::UnsupportedSource {
                name,
                kind,
            } => Self::UnsupportedSource {
                name: name.clone(),
                kind: kind.clone(),
            },
            Self::DuplicateResource {
                name,
            } => Self::DuplicateResource {
                name: name.clone(),
            },
            Self::RevisionOverflow {
                revision,
            } => Self::RevisionOverflow {
                revision: *revision,
            },
            Self::TemplateError {
                reason,
            } => Self::TemplateError {
                reason: reason.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
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
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use brewer::core::{BrewerError, ErrorContext};
///
/// let context = ErrorContext::new(BrewerError::LockfileNotFound {
///     path: "poetry.lock".to_string(),
/// })
/// .with_suggestion("Run 'poetry lock' in the project directory")
/// .with_details("Formulas are generated from the resolved lockfile");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: BrewerError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: BrewerError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
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

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`BrewerError`] anywhere in the `anyhow` chain, [`std::io::Error`] and
/// [`toml::de::Error`]. Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(brewer_error) = error.chain().find_map(|e| e.downcast_ref::<BrewerError>()) {
        return create_error_context(brewer_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(BrewerError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check the ownership and permissions of the formula and project files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(BrewerError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(BrewerError::ProjectParseError {
            file: "pyproject.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the project file. Verify quotes, brackets, and tables");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(BrewerError::Other {
        message,
    })
}

/// Map each [`BrewerError`] variant to a context with tailored suggestions.
fn create_error_context(error: BrewerError) -> ErrorContext {
    match &error {
        BrewerError::PackageNotFound { name, version } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Check that {name}=={version} is published on the package index, or exclude it under [tool.brewer.dependencies]"
            ))
            .with_details("Every registry package in the lockfile must have a downloadable release on the index"),

        BrewerError::NetworkError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check your internet connection and retry. Use --timeout to allow slower responses")
            .with_details("No partial formula is written when a package lookup fails"),

        BrewerError::FormulaParseError { file, .. } | BrewerError::FormulaFieldMissing { file, .. } => {
            ErrorContext::new(error.clone())
                .with_suggestion(format!(
                    "Regenerate {file} with 'brewer create' or fix the reported statement by hand"
                ))
                .with_details("Only formulas previously written by brewer can be updated")
        }

        BrewerError::FormulaNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Create the formula first with 'brewer create <project> <formula>'"),

        BrewerError::CircularDependency { chain } => ErrorContext::new(error.clone())
            .with_suggestion("Regenerate the lockfile with 'poetry lock'")
            .with_details(format!(
                "The lockfile describes a dependency cycle ({chain}); resolvers are expected to produce acyclic graphs"
            )),

        BrewerError::ProjectFileNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Pass the directory that contains pyproject.toml, or the file itself"),

        BrewerError::LockfileNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Run 'poetry lock' in the project directory first")
            .with_details("Formulas are generated from the resolved lockfile, not from version constraints"),

        BrewerError::LockfileParseError { reason, .. } => ErrorContext::new(error.clone())
            .with_suggestion("Regenerate the lockfile with 'poetry lock'")
            .with_details(reason.clone()),

        BrewerError::UnsupportedSource { name, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Publish '{name}' to the index or to a git repository, or exclude it under [tool.brewer.dependencies]"
            ))
            .with_details("Formula resources can only point at index releases or git tarballs"),

        BrewerError::DuplicateResource { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Exclude one of the clashing packages under [tool.brewer.dependencies]"),

        BrewerError::RevisionOverflow { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Reset the 'revision' line of the formula by hand"),

        _ => ErrorContext::new(error.clone()),
    }
}
