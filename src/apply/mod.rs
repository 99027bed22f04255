pub mod command;
pub mod staging;

#[cfg(test)]
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ApplyConfig;
use crate::error::Result;
use crate::platform::types::PullRequestRef;
use crate::workflow::types::FileChange;

/// Enacts a pull request's change set against the target system.
///
/// Called once per event with the complete change set. An `Err` means the
/// change did not take effect cleanly and the pull request must be reverted.
#[async_trait]
pub trait ApplyAction: Send + Sync {
    async fn apply(&self, pr: &PullRequestRef, changes: &[FileChange]) -> Result<()>;
}

/// Logs the change set without touching anything.
pub struct DryRunApply;

#[async_trait]
impl ApplyAction for DryRunApply {
    async fn apply(&self, pr: &PullRequestRef, changes: &[FileChange]) -> Result<()> {
        for change in changes {
            tracing::info!(
                pr = %pr,
                file = %change.path,
                bytes = change.content.len(),
                "Dry run: would apply file"
            );
        }
        Ok(())
    }
}

/// Build the apply action described by configuration.
pub fn from_config(config: &ApplyConfig) -> Arc<dyn ApplyAction> {
    match &config.command {
        Some(program) => {
            tracing::info!(command = %program, args = ?config.args, "Applying changes with command");
            Arc::new(command::CommandApply::new(
                program.clone(),
                config.args.clone(),
                staging::StagingArea::new(&config.staging_dir),
            ))
        }
        None => {
            tracing::warn!("No apply.command configured, running in dry-run mode");
            Arc::new(DryRunApply)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_always_succeeds() {
        let changes = vec![FileChange {
            path: "config.yaml".to_string(),
            content: b"replicas: 3".to_vec(),
        }];
        let pr = PullRequestRef::new("acme", "infra", 42);
        assert!(DryRunApply.apply(&pr, &changes).await.is_ok());
    }

    #[tokio::test]
    async fn test_from_config_without_command_is_dry_run() {
        let action = from_config(&ApplyConfig::default());
        let pr = PullRequestRef::new("acme", "infra", 42);
        assert!(action.apply(&pr, &[]).await.is_ok());
    }
}
