//! Error types and handling for bundletool
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Errors fall into a small number of kinds (see [`ErrorKind`]) so that callers
//! can tell a misused command apart from a broken bundle or a device that simply
//! cannot run the app. This module is organized into sub-modules of convenience
//! constructors by error domain:
//! - [`command`]: Invalid command / flag combinations
//! - [`bundle`]: Invalid bundle structure or content
//! - [`device`]: Bundle and device incompatibilities
//! - [`fs`]: File system errors

pub mod bundle;
pub mod command;
pub mod device;
pub mod fs;

use miette::Diagnostic;
use thiserror::Error;

/// Broad classification of a [`BundletoolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The command was invoked with conflicting or missing flags
    Command,
    /// The bundle violates a structural or content invariant
    Bundle,
    /// The bundle and the device spec are valid but mutually incompatible
    Device,
    /// I/O, archive or parse failures in the environment
    Environment,
}

/// Main error type for bundletool operations
#[derive(Error, Diagnostic, Debug)]
pub enum BundletoolError {
    // Command errors
    #[error("{message}")]
    #[diagnostic(code(bundletool::command::invalid))]
    InvalidCommand { message: String },

    #[error("File '{path}' already exists.")]
    #[diagnostic(
        code(bundletool::command::output_exists),
        help("Pass --overwrite to replace the existing file")
    )]
    OutputExists { path: String },

    // Bundle errors
    #[error("{message}")]
    #[diagnostic(code(bundletool::bundle::invalid))]
    InvalidBundle { message: String },

    #[error("Found cyclic dependency between modules: {chain}")]
    #[diagnostic(
        code(bundletool::bundle::cyclic_dependency),
        help("Remove one of the 'uses-split' declarations that form the cycle")
    )]
    CircularDependency { chain: String },

    #[error("{message}")]
    #[diagnostic(code(bundletool::bundle::validator_failed))]
    ValidatorFailed { message: String },

    // Device errors
    #[error("{message}")]
    #[diagnostic(code(bundletool::device::incompatible))]
    IncompatibleDevice { message: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(bundletool::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(bundletool::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(bundletool::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(bundletool::fs::io_error))]
    Io { message: String },

    // Archive and parse errors
    #[error("Invalid zip archive: {message}")]
    #[diagnostic(code(bundletool::zip::invalid))]
    Zip { message: String },

    #[error("Failed to parse {what}: {reason}")]
    #[diagnostic(code(bundletool::parse::failed))]
    ParseFailed { what: String, reason: String },
}

impl BundletoolError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCommand { .. } | Self::OutputExists { .. } => ErrorKind::Command,
            Self::InvalidBundle { .. }
            | Self::CircularDependency { .. }
            | Self::ValidatorFailed { .. } => ErrorKind::Bundle,
            Self::IncompatibleDevice { .. } => ErrorKind::Device,
            Self::FileNotFound { .. }
            | Self::FileReadFailed { .. }
            | Self::FileWriteFailed { .. }
            | Self::Io { .. }
            | Self::Zip { .. }
            | Self::ParseFailed { .. } => ErrorKind::Environment,
        }
    }
}

impl From<std::io::Error> for BundletoolError {
    fn from(err: std::io::Error) -> Self {
        BundletoolError::Io {
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for BundletoolError {
    fn from(err: zip::result::ZipError) -> Self {
        BundletoolError::Zip {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BundletoolError {
    fn from(err: serde_json::Error) -> Self {
        BundletoolError::ParseFailed {
            what: "JSON".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BundletoolError {
    fn from(err: serde_yaml::Error) -> Self {
        BundletoolError::ParseFailed {
            what: "YAML".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for BundletoolError {
    fn from(err: quick_xml::Error) -> Self {
        BundletoolError::ParseFailed {
            what: "AndroidManifest.xml".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BundletoolError>;
