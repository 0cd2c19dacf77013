//! Publisher configuration
//!
//! Projects may carry an optional `.publisher.yml` next to their
//! `package.json` to adjust the staging block-list, point the storage
//! client at an S3-compatible endpoint, or change the request timeout.
//! A missing file means defaults.

use crate::core::error::PublishError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Configuration file name at the project root
pub const CONFIG_FILENAME: &str = ".publisher.yml";

/// Top-level entries never copied into the staging directory
pub const DEFAULT_BLOCK_LIST: &[&str] = &["node_modules"];

/// Default per-request timeout for storage calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// On-disk configuration shape (all fields optional)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
struct ConfigFile {
    /// Top-level entries excluded from staging
    #[serde(skip_serializing_if = "Option::is_none")]
    block_list: Option<Vec<String>>,

    /// Custom storage endpoint (MinIO, LocalStack, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
}

/// Resolved publisher configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherConfig {
    pub block_list: Vec<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            block_list: DEFAULT_BLOCK_LIST.iter().map(|s| s.to_string()).collect(),
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PublisherConfig {
    /// Load configuration from `<project_root>/.publisher.yml`, falling
    /// back to defaults when the file does not exist
    pub async fn load(project_root: &Path) -> Result<Self, PublishError> {
        let path = project_root.join(CONFIG_FILENAME);

        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PublishError::ConfigRead {
                    path: path.clone(),
                    source,
                });
            }
        };

        let file: ConfigFile = serde_yaml::from_str(&raw)
            .map_err(|source| PublishError::ConfigParse { path, source })?;

        Ok(Self::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            block_list: file.block_list.unwrap_or(defaults.block_list),
            endpoint: file.endpoint,
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = PublisherConfig::load(dir.path()).await.unwrap();

        assert_eq!(config.block_list, vec!["node_modules".to_string()]);
        assert_eq!(config.endpoint, None);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "endpoint: http://localhost:9000\n",
        )
        .await
        .unwrap();

        let config = PublisherConfig::load(dir.path()).await.unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.block_list, vec!["node_modules".to_string()]);
    }

    #[tokio::test]
    async fn test_full_file_overrides_everything() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "block_list:\n  - target\n  - .git\nendpoint: http://minio:9000\ntimeout_secs: 5\n",
        )
        .await
        .unwrap();

        let config = PublisherConfig::load(dir.path()).await.unwrap();

        assert_eq!(
            config.block_list,
            vec!["target".to_string(), ".git".to_string()]
        );
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(CONFIG_FILENAME), "block_list: [unclosed\n")
            .await
            .unwrap();

        let err = PublisherConfig::load(dir.path()).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_PARSE");
    }
}
