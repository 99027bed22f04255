use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use crate::config::{Credentials, GitHubConfig};
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper::{self, FilePayload};

const FILES_PER_PAGE: usize = 100;
/// GitHub stops listing pull request files after 3000 entries.
const MAX_FILE_PAGES: u32 = 30;

#[derive(Serialize)]
struct PageQuery {
    per_page: usize,
    page: u32,
}

/// GitHub-backed platform gateway.
///
/// Both clients are built once at startup and shared read-only by every workflow.
pub struct GitHubPlatform {
    client: Octocrab,
    http: reqwest::Client,
    access_token: String,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig, credentials: &Credentials) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(credentials.access_token.clone());
        if let Some(base) = &config.api_base {
            builder = builder
                .base_uri(base.as_str())
                .map_err(|e| AppError::Config(format!("Invalid github.api_base {base}: {e}")))?;
        }
        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("gitops-operator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            http,
            access_token: credentials.access_token.clone(),
        })
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn get_pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestState> {
        let pull = self
            .client
            .pulls(&pr.owner, &pr.repo)
            .get(pr.number)
            .await?;

        let state = mapper::map_pull_request_state(&pull);
        tracing::debug!(pr = %pr, status = %state.status, mergeable = ?state.mergeable, "Fetched PR");
        Ok(state)
    }

    async fn list_files(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>> {
        let url = format!(
            "/repos/{}/{}/pulls/{}/files",
            pr.owner, pr.repo, pr.number
        );

        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let query = PageQuery {
                per_page: FILES_PER_PAGE,
                page,
            };
            let batch: Vec<FilePayload> = self
                .client
                .get(&url, Some(&query))
                .await
                .map_err(|e| AppError::GitHubApi(format!("Failed to list PR files: {e}")))?;

            let last_page = batch.len() < FILES_PER_PAGE;
            for payload in batch {
                let filename = payload.filename.clone();
                match mapper::map_changed_file(payload) {
                    Some(file) => files.push(file),
                    None => tracing::warn!(pr = %pr, file = %filename, "File has no content URL, skipping"),
                }
            }
            if last_page {
                break;
            }
        }

        Ok(files)
    }

    async fn fetch_raw(&self, content_url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(content_url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.access_token))
            .header(reqwest::header::ACCEPT, "application/vnd.github.raw")
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn merge_pull_request(&self, pr: &PullRequestRef) -> Result<()> {
        let result = self
            .client
            .pulls(&pr.owner, &pr.repo)
            .merge(pr.number)
            .send()
            .await
            .map_err(|e| AppError::GitHubApi(format!("Merge failed: {e}")))?;

        if !result.merged {
            return Err(AppError::GitHubApi(format!(
                "Merge of {pr} was refused: {}",
                result.message.unwrap_or_default()
            )));
        }

        tracing::debug!(pr = %pr, sha = ?result.sha, "Merged PR");
        Ok(())
    }

    async fn revert_pull_request(&self, pr: &PullRequestRef, reason: &str) -> Result<()> {
        let body = format!(
            "Applying the changes in this pull request failed, so it was not merged.\n\n```\n{reason}\n```\n\n---\n*gitops-operator*"
        );
        self.client
            .issues(&pr.owner, &pr.repo)
            .create_comment(pr.number, body)
            .await?;

        let url = format!("/repos/{}/{}/pulls/{}", pr.owner, pr.repo, pr.number);
        let _: serde_json::Value = self
            .client
            .patch(&url, Some(&serde_json::json!({ "state": "closed" })))
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to close PR: {e}")))?;

        tracing::debug!(pr = %pr, "Closed PR after failed apply");
        Ok(())
    }
}
