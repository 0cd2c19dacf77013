//! Package manifest metadata
//!
//! Package identity comes from the project's `package.json`. The manifest
//! may also carry a default bucket name, which the CLI argument overrides.

use crate::core::error::PublishError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Manifest file name at the project root
pub const MANIFEST_FILENAME: &str = "package.json";

/// Name and version of the package being published.
///
/// Invariant: both fields are non-empty. Construction goes through
/// [`PackageManifest::identity`], which enforces this before any remote
/// interaction happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
}

/// Bucket settings embedded in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Subset of `package.json` this tool reads
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketConfig>,
}

impl PackageManifest {
    /// Load the manifest from `<project_root>/package.json`
    pub async fn load(project_root: &Path) -> Result<Self, PublishError> {
        let path = project_root.join(MANIFEST_FILENAME);

        let raw = fs::read_to_string(&path)
            .await
            .map_err(|source| PublishError::ManifestRead {
                path: path.clone(),
                source,
            })?;

        serde_json::from_str(&raw).map_err(|source| PublishError::ManifestParse { path, source })
    }

    /// Extract the package identity, failing fast if name or version is
    /// missing or empty
    pub fn identity(&self) -> Result<PackageIdentity, PublishError> {
        let name = match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(PublishError::IdentityMissing { field: "name" }),
        };

        let version = match self.version.as_deref() {
            Some(version) if !version.is_empty() => version.to_string(),
            _ => return Err(PublishError::IdentityMissing { field: "version" }),
        };

        Ok(PackageIdentity { name, version })
    }

    /// Default bucket name from the manifest, if configured
    pub fn default_bucket(&self) -> Option<&str> {
        self.bucket
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}
