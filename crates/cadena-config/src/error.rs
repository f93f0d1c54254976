//! Error types for configuration operations.

use std::path::PathBuf;

use cadena_core::ChainError;
use thiserror::Error;

/// Errors that can occur while reading, writing or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Syntax error in a filter list string.
    #[error("filter list error at byte {position}: {reason}")]
    FilterList {
        /// Byte offset into the filter list where the error was found.
        position: usize,
        /// What was wrong.
        reason: String,
    },

    /// Malformed `rate:channels:format` string.
    #[error("invalid format spec '{spec}': {reason}")]
    FormatSpec {
        /// The rejected spec.
        spec: String,
        /// What was wrong.
        reason: String,
    },

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// The chain rejected the configuration.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create a filter list syntax error.
    pub fn filter_list(position: usize, reason: impl Into<String>) -> Self {
        ConfigError::FilterList {
            position,
            reason: reason.into(),
        }
    }

    /// Create a format spec error.
    pub fn format_spec(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::FormatSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}
