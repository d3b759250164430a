//! Error types for manifest operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for manifest operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Main error type for manifest operations
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Manifest already exists at {}", path.display())]
    ManifestAlreadyExists { path: PathBuf },

    #[error("Manifest file {} missing, can't update", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("Failed to parse descriptor {}: {source}", path.display())]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse manifest {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Introspection failed: {0}")]
    Introspection(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Cargo metadata error: {0}")]
    CargoMetadataError(#[from] cargo_metadata::Error),

    #[error("Directory walk error: {0}")]
    WalkError(#[from] walkdir::Error),
}

impl AuditError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an introspection error
    pub fn introspection(msg: impl Into<String>) -> Self {
        Self::Introspection(msg.into())
    }

    /// Wrap a descriptor parse failure with the offending path
    pub fn descriptor(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::DescriptorParse {
            path: path.into(),
            source,
        }
    }
}
