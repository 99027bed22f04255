use std::sync::Arc;

use tracing::Instrument;

use crate::apply::ApplyAction;
use crate::error::AppError;
use crate::platform::types::{Mergeability, PrStatus, PullRequestRef, PullRequestState};
use crate::platform::Platform;
use crate::workflow::extractor;
use crate::workflow::locks::PrLocks;
use crate::workflow::poller::{self, PollSettings};
use crate::workflow::types::{PullRequestEvent, ReconciliationOutcome, RejectReason};

/// Workflow stages, in the order one event moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Polling,
    Validating,
    Extracting,
    Applying,
    Finalizing,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileSettings {
    pub poll: PollSettings,
    pub serialize_per_pr: bool,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            serialize_per_pr: true,
        }
    }
}

/// Drives one pull request event from mergeability polling to merge or revert.
pub struct Reconciler<P: ?Sized, A: ?Sized> {
    platform: Arc<P>,
    apply: Arc<A>,
    settings: ReconcileSettings,
    locks: Option<PrLocks>,
}

impl<P, A> Reconciler<P, A>
where
    P: Platform + ?Sized,
    A: ApplyAction + ?Sized,
{
    pub fn new(platform: Arc<P>, apply: Arc<A>, settings: ReconcileSettings) -> Self {
        let locks = settings.serialize_per_pr.then(PrLocks::new);
        Self {
            platform,
            apply,
            settings,
            locks,
        }
    }

    /// Reconcile a single event. Always resolves to exactly one outcome.
    pub async fn reconcile(&self, event: &PullRequestEvent) -> ReconciliationOutcome {
        let span = tracing::info_span!(
            "reconcile",
            owner = %event.pr.owner,
            repo = %event.pr.repo,
            pr = event.pr.number,
            title = %event.title,
        );

        async {
            let _guard = match &self.locks {
                Some(locks) => Some(locks.lock(&event.pr).await),
                None => None,
            };

            tracing::info!("Reconciling pull request");
            let outcome = self.run(&event.pr).await;
            log_outcome(&outcome);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, pr: &PullRequestRef) -> ReconciliationOutcome {
        tracing::debug!(stage = ?Stage::Polling, "Waiting for mergeability");
        let state = match poller::resolve_mergeability(&*self.platform, pr, self.settings.poll).await {
            Ok(state) => state,
            Err(AppError::MergeabilityTimeout { waited }) => {
                tracing::warn!(waited = ?waited, "Mergeability never resolved");
                return ReconciliationOutcome::Rejected(RejectReason::MergeabilityTimeout);
            }
            Err(e) => return ReconciliationOutcome::TransportError { error: e.to_string() },
        };
        tracing::info!(title = %state.title, "Mergeability resolved, validating");

        tracing::debug!(stage = ?Stage::Validating, "Validating PR state");
        if let Err(reason) = validate(&state) {
            return ReconciliationOutcome::Rejected(reason);
        }

        tracing::debug!(stage = ?Stage::Extracting, "Extracting changes");
        let changes = match extractor::extract_changes(&*self.platform, pr).await {
            Ok(changes) => changes,
            Err(e) => return ReconciliationOutcome::TransportError { error: e.to_string() },
        };

        tracing::debug!(stage = ?Stage::Applying, files = changes.len(), "Applying changes");
        let applied = self.apply.apply(pr, &changes).await;

        tracing::debug!(stage = ?Stage::Finalizing, "Finalizing");
        match applied {
            Ok(()) => self.merge(pr).await,
            Err(e) => self.revert(pr, e.to_string()).await,
        }
    }

    /// Merge after re-checking that the pull request is still open and mergeable.
    async fn merge(&self, pr: &PullRequestRef) -> ReconciliationOutcome {
        let fresh = poller::resolve_mergeability(&*self.platform, pr, self.settings.poll).await;
        let blocked = match &fresh {
            Ok(state) => validate(state).err().map(|reason| reason.to_string()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = blocked {
            tracing::warn!(reason = %reason, "PR no longer mergeable after apply, reverting instead");
            return self
                .revert(pr, format!("changes were applied but the pull request can no longer be merged: {reason}"))
                .await;
        }

        match self.platform.merge_pull_request(pr).await {
            Ok(()) => ReconciliationOutcome::Applied,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Merge failed after changes were applied; manual intervention required"
                );
                ReconciliationOutcome::TransportError { error: e.to_string() }
            }
        }
    }

    async fn revert(&self, pr: &PullRequestRef, reason: String) -> ReconciliationOutcome {
        match self.platform.revert_pull_request(pr, &reason).await {
            Ok(()) => ReconciliationOutcome::ApplyFailed { error: reason },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    apply_error = %reason,
                    "Revert failed; manual intervention required"
                );
                ReconciliationOutcome::TransportError { error: e.to_string() }
            }
        }
    }
}

/// The merge gate: open and mergeable.
pub fn validate(state: &PullRequestState) -> Result<(), RejectReason> {
    if state.status != PrStatus::Open {
        return Err(RejectReason::NotOpen(state.status));
    }
    if state.mergeable != Mergeability::Mergeable {
        return Err(RejectReason::NotMergeable);
    }
    Ok(())
}

fn log_outcome(outcome: &ReconciliationOutcome) {
    match outcome {
        ReconciliationOutcome::Applied => {
            tracing::info!(outcome = outcome.label(), "Changes applied and PR merged");
        }
        ReconciliationOutcome::Rejected(reason) => {
            tracing::warn!(outcome = outcome.label(), reason = %reason, "PR rejected");
        }
        ReconciliationOutcome::ApplyFailed { error } => {
            tracing::error!(outcome = outcome.label(), error = %error, "Apply failed, PR reverted");
        }
        ReconciliationOutcome::TransportError { error } => {
            tracing::error!(outcome = outcome.label(), error = %error, "Reconciliation aborted");
        }
    }
}
