use crate::error::Result;
use crate::platform::types::{ChangedFile, PullRequestRef};
use crate::platform::Platform;
use crate::workflow::types::FileChange;

/// List the files changed by a pull request, in the order the platform returns them.
pub async fn list_changed_files<P>(platform: &P, pr: &PullRequestRef) -> Result<Vec<ChangedFile>>
where
    P: Platform + ?Sized,
{
    let files = platform.list_files(pr).await?;
    tracing::info!(pr = %pr, count = files.len(), "Listed changed files");
    Ok(files)
}

/// Fetch every file's content one at a time. The first failed fetch aborts
/// the whole extraction.
pub async fn fetch_contents<P>(platform: &P, files: Vec<ChangedFile>) -> Result<Vec<FileChange>>
where
    P: Platform + ?Sized,
{
    let mut changes = Vec::with_capacity(files.len());
    for file in files {
        tracing::debug!(file = %file.filename, "Fetching content");
        let content = platform.fetch_raw(&file.content_url).await?;
        tracing::info!(file = %file.filename, bytes = content.len(), "Fetched file");
        changes.push(FileChange {
            path: file.filename,
            content,
        });
    }
    Ok(changes)
}

/// List and fetch the full change set of a pull request.
pub async fn extract_changes<P>(platform: &P, pr: &PullRequestRef) -> Result<Vec<FileChange>>
where
    P: Platform + ?Sized,
{
    let files = list_changed_files(platform, pr).await?;
    fetch_contents(platform, files).await
}
