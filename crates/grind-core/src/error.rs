//! Error types for grind

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GrindError
pub type Result<T> = std::result::Result<T, GrindError>;

/// Main error type for grind core operations
#[derive(Debug, Error)]
pub enum GrindError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Project structure and module selection errors
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Class file parsing errors
    #[error(transparent)]
    Classfile(#[from] ClassfileError),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("No config file found at {0}, try `grind config --generate` first?")]
    NotFound(PathBuf),

    /// Configuration path exists but is not a regular file
    #[error("Config location {0} is not a file")]
    NotAFile(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Could not determine the home directory
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// TOML parsing error
    #[error("TOML parsing error")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error")]
    TomlSerError(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error reading config")]
    Io(#[from] std::io::Error),
}

/// Project structure and module selection errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Root is not a directory or has no build descriptor
    #[error("Not a recognizable project at {path}: {reason}")]
    NotAProject { path: PathBuf, reason: String },

    /// Explicitly requested modules were not discovered
    #[error("Could not find specified modules: {}", .0.join(" "))]
    ModulesNotFound(Vec<String>),

    /// Include or exclude glob could not be compiled
    #[error("Invalid test name pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Errors while reading a compiled class file
#[derive(Debug, Error)]
pub enum ClassfileError {
    /// File could not be read
    #[error("Failed to read class file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Magic number mismatch
    #[error("{0} is not a class file (bad magic number)")]
    BadMagic(PathBuf),

    /// File ended before the header was complete
    #[error("{0} is truncated")]
    Truncated(PathBuf),

    /// Malformed constant pool or class reference
    #[error("Malformed class file {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}
