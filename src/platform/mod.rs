pub mod github;
pub mod types;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Remote calls the reconciler makes against the hosting platform.
///
/// Implementations hold no per-event state and must be safe to share across
/// concurrent workflows.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch the current state of a pull request.
    async fn get_pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestState>;

    /// List the files changed by a pull request, in platform order.
    async fn list_files(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>>;

    /// Fetch the raw content behind a file's content URL.
    async fn fetch_raw(&self, content_url: &str) -> Result<Vec<u8>>;

    /// Merge a pull request.
    async fn merge_pull_request(&self, pr: &PullRequestRef) -> Result<()>;

    /// Back out a pull request whose changes failed to apply.
    async fn revert_pull_request(&self, pr: &PullRequestRef, reason: &str) -> Result<()>;
}
