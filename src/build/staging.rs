//! Build directory staging
//!
//! Stages a filtered copy of the project tree into `<project>/.build/package`.
//! Top-level entries are copied by independent blocking tasks joined as a
//! group; the first failure aborts the step. Teardown is idempotent and is
//! the orchestrator's responsibility on every exit path.

use crate::core::error::PublishError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// Ephemeral build directory name under the project root
pub const BUILD_DIR_NAME: &str = ".build";

/// Staging subdirectory holding the filtered project copy
pub const STAGE_DIR_NAME: &str = "package";

/// Stages project files for archiving
pub struct BuildStaging {
    project_root: PathBuf,
    build_root: PathBuf,
    block_list: Vec<String>,
}

impl BuildStaging {
    pub fn new(project_root: &Path, block_list: &[String]) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            build_root: project_root.join(BUILD_DIR_NAME),
            block_list: block_list.to_vec(),
        }
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn stage_root(&self) -> PathBuf {
        self.build_root.join(STAGE_DIR_NAME)
    }

    /// Top-level project entries that belong in the package: everything
    /// except the block-list and the build directory itself
    pub async fn project_entries(&self) -> Result<Vec<OsString>, PublishError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.project_root)
            .await
            .map_err(|source| self.staging_error(&self.project_root, source))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|source| self.staging_error(&self.project_root, source))?
        {
            let name = entry.file_name();
            let display = name.to_string_lossy();

            if display == BUILD_DIR_NAME || self.block_list.iter().any(|b| b == &*display) {
                continue;
            }
            entries.push(name);
        }

        Ok(entries)
    }

    /// Create a fresh `.build/package` tree and copy the filtered entries
    /// into it. Fails if a stale build root still exists.
    pub async fn stage(&self) -> Result<PathBuf, PublishError> {
        fs::create_dir(&self.build_root)
            .await
            .map_err(|source| self.staging_error(&self.build_root, source))?;

        let stage_root = self.stage_root();
        fs::create_dir(&stage_root)
            .await
            .map_err(|source| self.staging_error(&stage_root, source))?;

        let entries = self.project_entries().await?;

        // One recursive copy per top-level entry; no ordering between them
        let mut copies = JoinSet::new();
        for name in entries {
            let from = self.project_root.join(&name);
            let to = stage_root.join(&name);
            copies.spawn_blocking(move || copy_recursively(&from, &to));
        }

        while let Some(joined) = copies.join_next().await {
            let result = joined
                .map_err(|e| self.staging_error(&self.build_root, std::io::Error::other(e)))?;
            if let Err(source) = result {
                copies.abort_all();
                return Err(self.staging_error(&self.build_root, source));
            }
        }

        Ok(stage_root)
    }

    /// Remove the build directory. A missing directory is not an error, so
    /// this can run unconditionally on every exit path.
    pub async fn remove(&self) -> Result<(), PublishError> {
        match fs::remove_dir_all(&self.build_root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PublishError::Cleanup {
                path: self.build_root.clone(),
                source,
            }),
        }
    }

    fn staging_error(&self, path: &Path, source: std::io::Error) -> PublishError {
        PublishError::Staging {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Copy one top-level entry (file or directory tree), preserving structure,
/// permissions, and symlinks
fn copy_recursively(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        // The walk root itself yields an empty relative path; joining it
        // would turn `to` into a trailing-separator directory path
        let dest = if rel.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(rel)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    let target = std::fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::copy(from, to).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), b"{}").await.unwrap();
        fs::write(dir.path().join("index.js"), b"module.exports = 1;\n")
            .await
            .unwrap();
        fs::create_dir_all(dir.path().join("lib/util")).await.unwrap();
        fs::write(dir.path().join("lib/util/helpers.js"), b"// helpers\n")
            .await
            .unwrap();
        fs::create_dir(dir.path().join("node_modules")).await.unwrap();
        fs::write(dir.path().join("node_modules/dep.js"), b"// dep\n")
            .await
            .unwrap();
        dir
    }

    fn default_block_list() -> Vec<String> {
        vec!["node_modules".to_string()]
    }

    #[tokio::test]
    async fn test_project_entries_applies_block_list() {
        let project = fixture_project().await;
        let staging = BuildStaging::new(project.path(), &default_block_list());

        let mut entries: Vec<String> = staging
            .project_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        entries.sort();

        assert_eq!(entries, vec!["index.js", "lib", "package.json"]);
    }

    #[tokio::test]
    async fn test_project_entries_excludes_build_dir() {
        let project = fixture_project().await;
        fs::create_dir(project.path().join(BUILD_DIR_NAME)).await.unwrap();
        let staging = BuildStaging::new(project.path(), &default_block_list());

        let entries = staging.project_entries().await.unwrap();
        assert!(!entries.iter().any(|n| n == BUILD_DIR_NAME));
    }

    #[test]
    fn test_copy_single_file_entry() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("package.json");
        std::fs::write(&from, b"{\"name\": \"demo\"}").unwrap();
        let to = dir.path().join("staged.json");

        copy_recursively(&from, &to).unwrap();

        assert_eq!(std::fs::read(&to).unwrap(), b"{\"name\": \"demo\"}");
    }

    #[tokio::test]
    async fn test_stage_copies_top_level_files() {
        let project = fixture_project().await;
        let staging = BuildStaging::new(project.path(), &default_block_list());

        let stage_root = staging.stage().await.unwrap();

        assert_eq!(
            fs::read(stage_root.join("package.json")).await.unwrap(),
            b"{}"
        );
        assert_eq!(
            fs::read(stage_root.join("index.js")).await.unwrap(),
            b"module.exports = 1;\n"
        );
    }

    #[tokio::test]
    async fn test_stage_copies_nested_tree() {
        let project = fixture_project().await;
        let staging = BuildStaging::new(project.path(), &default_block_list());

        let stage_root = staging.stage().await.unwrap();

        assert!(stage_root.join("package.json").is_file());
        assert!(stage_root.join("lib/util/helpers.js").is_file());
        assert!(!stage_root.join("node_modules").exists());

        let copied = fs::read(stage_root.join("index.js")).await.unwrap();
        assert_eq!(copied, b"module.exports = 1;\n");
    }

    #[tokio::test]
    async fn test_stage_fails_on_stale_build_root() {
        let project = fixture_project().await;
        fs::create_dir(project.path().join(BUILD_DIR_NAME)).await.unwrap();
        let staging = BuildStaging::new(project.path(), &default_block_list());

        let err = staging.stage().await.unwrap_err();
        assert_eq!(err.code(), "STAGING_FAILED");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let project = fixture_project().await;
        let staging = BuildStaging::new(project.path(), &default_block_list());

        staging.stage().await.unwrap();
        staging.remove().await.unwrap();
        assert!(!staging.build_root().exists());

        // Second removal of an already-missing directory succeeds
        staging.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_stage_after_remove_succeeds_again() {
        let project = fixture_project().await;
        let staging = BuildStaging::new(project.path(), &default_block_list());

        staging.stage().await.unwrap();
        staging.remove().await.unwrap();
        staging.stage().await.unwrap();

        assert!(staging.stage_root().join("package.json").is_file());
    }
}
