use serde::Deserialize;

use crate::platform::types;

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Deserialize)]
pub struct FilePayload {
    pub filename: String,
    pub raw_url: Option<String>,
    pub contents_url: Option<String>,
}

/// Map an octocrab PullRequest to our platform state snapshot.
pub fn map_pull_request_state(pr: &octocrab::models::pulls::PullRequest) -> types::PullRequestState {
    let status = match pr.state {
        Some(octocrab::models::IssueState::Open) => types::PrStatus::Open,
        Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => {
            types::PrStatus::Merged
        }
        // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
        Some(_) | None => types::PrStatus::Closed,
    };

    types::PullRequestState {
        status,
        mergeable: types::Mergeability::from(pr.mergeable),
        title: pr.title.clone().unwrap_or_default(),
    }
}

/// Map a file listing entry, preferring the raw download URL.
pub fn map_changed_file(file: FilePayload) -> Option<types::ChangedFile> {
    let content_url = file.raw_url.or(file.contents_url)?;
    Some(types::ChangedFile {
        filename: file.filename,
        content_url,
    })
}
