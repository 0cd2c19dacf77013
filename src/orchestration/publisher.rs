//! Publish orchestrator
//!
//! Sequences one publish invocation: identity validation, artifact key
//! derivation, the existence guard, staging, the streaming upload, and
//! build-directory teardown. Teardown runs on every exit path, so the
//! ephemeral `.build` directory never survives an invocation.

use crate::build::archive::upload_archive;
use crate::build::staging::BuildStaging;
use crate::core::artifact::artifact_key;
use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::manifest::PackageManifest;
use crate::core::traits::{ObjectStore, Presence, PutReceipt};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Publishing options passed from the CLI
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Overwrite an already-published artifact
    pub force: bool,
}

/// Outcome of the existence check against the overwrite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistsDecision {
    Absent,
    PresentAllowOverwrite,
    PresentBlock,
}

/// Report returned after a successful publish
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub package_name: String,
    pub version: String,
    pub key: String,
    pub location: String,
    pub overwrote_existing: bool,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

/// Main publish orchestrator
pub struct PublishOrchestrator<'a> {
    project_root: PathBuf,
    config: PublisherConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> PublishOrchestrator<'a> {
    pub fn new(project_root: &Path, config: PublisherConfig, store: &'a dyn ObjectStore) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config,
            store,
        }
    }

    /// Publish one artifact to `bucket`
    pub async fn publish(
        &self,
        bucket: &str,
        options: &PublishOptions,
    ) -> Result<PublishReport, PublishError> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        // Identity must be complete before any remote interaction
        let manifest = PackageManifest::load(&self.project_root).await?;
        let identity = manifest.identity()?;
        let key = artifact_key(&identity);

        println!(
            "📦 Package: {} version: {} will be published",
            identity.name, identity.version
        );

        let decision = self.check_existing(bucket, &key, options.force).await?;
        match decision {
            ExistsDecision::Absent => {}
            ExistsDecision::PresentAllowOverwrite => {
                println!("⚠️  {} already exists, overwriting (--force)", key);
                warnings.push(format!("overwrote existing artifact {}", key));
            }
            ExistsDecision::PresentBlock => {
                return Err(PublishError::ArtifactExists {
                    bucket: bucket.to_string(),
                    key,
                });
            }
        }

        let staging = BuildStaging::new(&self.project_root, &self.config.block_list);

        // A stale build directory from an interrupted run is removed, not
        // an error
        staging.remove().await?;

        let outcome = self.stage_and_upload(&staging, bucket, &key).await;
        let cleanup = staging.remove().await;

        let receipt = match outcome {
            Ok(receipt) => {
                cleanup?;
                receipt
            }
            Err(e) => {
                if let Err(cleanup_err) = cleanup {
                    eprintln!("⚠️  {}", cleanup_err);
                }
                return Err(e);
            }
        };

        println!(
            "✅ Package: {} version: {} published",
            identity.name, identity.version
        );
        println!("   Location: {}", receipt.location);

        Ok(PublishReport {
            package_name: identity.name,
            version: identity.version,
            key,
            location: receipt.location,
            overwrote_existing: decision == ExistsDecision::PresentAllowOverwrite,
            published_at: chrono::Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            warnings,
        })
    }

    /// Probe the backend and apply the overwrite policy.
    ///
    /// An indeterminate probe (transport failure, unexpected status) never
    /// reads as "absent": it aborts the attempt before any staging work.
    async fn check_existing(
        &self,
        bucket: &str,
        key: &str,
        force: bool,
    ) -> Result<ExistsDecision, PublishError> {
        let presence = self.store.head_object(bucket, key).await.map_err(|source| {
            PublishError::ExistenceUnknown {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            }
        })?;

        Ok(match (presence, force) {
            (Presence::Absent, _) => ExistsDecision::Absent,
            (Presence::Present, true) => ExistsDecision::PresentAllowOverwrite,
            (Presence::Present, false) => ExistsDecision::PresentBlock,
        })
    }

    async fn stage_and_upload(
        &self,
        staging: &BuildStaging,
        bucket: &str,
        key: &str,
    ) -> Result<PutReceipt, PublishError> {
        println!("   Staging project files...");
        let stage_root = staging.stage().await?;

        println!("   Uploading {}...", key);
        upload_archive(self.store, bucket, key, &stage_root).await
    }
}
