//! Error handling for artifact publishing
//!
//! This module provides the error taxonomy for the publish and list
//! workflows using the thiserror crate for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the object-storage capability interface
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request to object storage failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("object storage returned unexpected status {status} during {operation}")]
    UnexpectedStatus { operation: &'static str, status: u16 },

    #[error("could not parse listing response: {message}")]
    MalformedListing { message: String },

    #[error("upload body stream failed: {0}")]
    Body(#[source] std::io::Error),
}

/// Main error type for publish and list operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Precondition errors
    #[error("package manifest must have a non-empty `{field}` field")]
    IdentityMissing { field: &'static str },

    #[error("could not read package manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse package manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read configuration at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // Conflict errors
    #[error("artifact {key} already exists in bucket {bucket}")]
    ArtifactExists { bucket: String, key: String },

    #[error("could not determine whether {key} exists in bucket {bucket}: {source}")]
    ExistenceUnknown {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    // I/O errors
    #[error("staging {path} failed: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not remove build directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archiving the staged package failed: {0}")]
    Archive(#[source] std::io::Error),

    // Backend errors
    #[error("object storage {operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl PublishError {
    /// Check if this failure was detected before any side effect occurred
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::IdentityMissing { .. }
                | Self::ManifestRead { .. }
                | Self::ManifestParse { .. }
                | Self::ConfigRead { .. }
                | Self::ConfigParse { .. }
        )
    }

    /// Get suggested action for this error, if one exists
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::IdentityMissing { .. } => {
                Some("add the missing field to package.json and retry")
            }
            Self::ArtifactExists { .. } => {
                Some("bump the version, or pass --force to overwrite the published artifact")
            }
            Self::ExistenceUnknown { .. } => {
                Some("check network connectivity and the bucket name; nothing was uploaded")
            }
            _ => None,
        }
    }

    /// Get stable error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::IdentityMissing { .. } => "IDENTITY_MISSING",
            Self::ManifestRead { .. } => "MANIFEST_READ",
            Self::ManifestParse { .. } => "MANIFEST_PARSE",
            Self::ConfigRead { .. } => "CONFIG_READ",
            Self::ConfigParse { .. } => "CONFIG_PARSE",
            Self::ArtifactExists { .. } => "ARTIFACT_EXISTS",
            Self::ExistenceUnknown { .. } => "EXISTENCE_UNKNOWN",
            Self::Staging { .. } => "STAGING_FAILED",
            Self::Cleanup { .. } => "CLEANUP_FAILED",
            Self::Archive(_) => "ARCHIVE_FAILED",
            Self::Backend { .. } => "BACKEND_FAILED",
        }
    }
}
