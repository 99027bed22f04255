use async_trait::async_trait;
use tokio::process::Command;

use crate::apply::staging::StagingArea;
use crate::apply::ApplyAction;
use crate::error::{AppError, Result};
use crate::platform::types::PullRequestRef;
use crate::workflow::types::FileChange;

/// Keep failure messages short enough for a PR comment.
const MAX_STDERR_TAIL: usize = 4096;

/// Stages the change set on disk and runs an external program against it.
///
/// The staging directory is passed as the last argument. The program also
/// sees `GITOPS_PR_OWNER`, `GITOPS_PR_REPO` and `GITOPS_PR_NUMBER`.
pub struct CommandApply {
    program: String,
    args: Vec<String>,
    staging: StagingArea,
}

impl CommandApply {
    pub fn new(program: String, args: Vec<String>, staging: StagingArea) -> Self {
        Self {
            program,
            args,
            staging,
        }
    }

    async fn run(&self, pr: &PullRequestRef, dir: &std::path::Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .env("GITOPS_PR_OWNER", &pr.owner)
            .env("GITOPS_PR_REPO", &pr.repo)
            .env("GITOPS_PR_NUMBER", pr.number.to_string())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::Apply(format!("Failed to run {}: {e}", self.program)))?;

        if output.status.success() {
            tracing::info!(pr = %pr, command = %self.program, "Apply command succeeded");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(AppError::Apply(format!(
            "{} exited with {}: {}",
            self.program,
            output.status,
            tail(stderr.trim(), MAX_STDERR_TAIL)
        )))
    }
}

#[async_trait]
impl ApplyAction for CommandApply {
    async fn apply(&self, pr: &PullRequestRef, changes: &[FileChange]) -> Result<()> {
        let staged = self.staging.stage(pr, changes).await?;
        tracing::debug!(pr = %pr, dir = %staged.path.display(), files = changes.len(), "Staged changes");

        let result = self.run(pr, &staged.path).await;

        if let Err(e) = self.staging.cleanup(&staged).await {
            tracing::warn!(dir = %staged.path.display(), error = %e, "Failed to clean up staging directory");
        }
        result
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
