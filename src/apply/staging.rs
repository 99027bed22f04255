use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{AppError, Result};
use crate::platform::types::PullRequestRef;
use crate::workflow::types::FileChange;

static NEXT_STAGE: AtomicU64 = AtomicU64::new(0);

/// Manages per-event directories holding a materialized change set.
pub struct StagingArea {
    base_dir: PathBuf,
}

/// A change set written to disk, ready for the apply command.
#[derive(Debug)]
pub struct StagedChanges {
    pub path: PathBuf,
}

impl StagingArea {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// Write all changes into a fresh directory for this event.
    pub async fn stage(&self, pr: &PullRequestRef, changes: &[FileChange]) -> Result<StagedChanges> {
        let path = self.stage_path(pr);
        if path.exists() {
            tokio::fs::remove_dir_all(&path).await?;
        }
        tokio::fs::create_dir_all(&path).await?;

        let staged = StagedChanges { path };
        if let Err(e) = Self::write_all(&staged.path, changes).await {
            let _ = self.cleanup(&staged).await;
            return Err(e);
        }
        Ok(staged)
    }

    async fn write_all(root: &Path, changes: &[FileChange]) -> Result<()> {
        for change in changes {
            let full_path = Self::verify_path(root, Path::new(&change.path))?;
            if let Some(parent) = full_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&full_path, &change.content).await?;
        }
        Ok(())
    }

    /// Remove a staged directory.
    pub async fn cleanup(&self, staged: &StagedChanges) -> Result<()> {
        if staged.path.exists() {
            tokio::fs::remove_dir_all(&staged.path).await?;
        }
        Ok(())
    }

    fn stage_path(&self, pr: &PullRequestRef) -> PathBuf {
        let seq = NEXT_STAGE.fetch_add(1, Ordering::Relaxed);
        self.base_dir.join(format!(
            "{}__{}__{}__{}-{seq}",
            pr.owner,
            pr.repo,
            pr.number,
            std::process::id()
        ))
    }

    /// Resolve a repository-relative path inside `root`, rejecting anything
    /// that could escape it.
    pub fn verify_path(root: &Path, requested_path: &Path) -> Result<PathBuf> {
        let mut relative = PathBuf::new();
        for component in requested_path.components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AppError::Apply(format!(
                        "Path traversal detected: {} is outside the staging directory",
                        requested_path.display()
                    )));
                }
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(AppError::Apply(format!(
                "Invalid file path: '{}'",
                requested_path.display()
            )));
        }

        Ok(root.join(relative))
    }
}
