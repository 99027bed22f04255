use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Mergeability not resolved after {waited:?}")]
    MergeabilityTimeout { waited: Duration },

    #[error("Apply failed: {0}")]
    Apply(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether this error came from a collaborator call (GitHub API or raw fetch).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::GitHubApi(_)
                | AppError::Transport(_)
                | AppError::Http(_)
                | AppError::Serialization(_)
        )
    }
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
