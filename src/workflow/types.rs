use std::fmt;

use crate::platform::types::{PrStatus, PullRequestRef};

/// A decoded pull request delivery, consumed once by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub pr: PullRequestRef,
    pub title: String,
}

/// Why a pull request was turned away without applying anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotOpen(PrStatus),
    NotMergeable,
    MergeabilityTimeout,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotOpen(status) => write!(f, "pull request is {status}"),
            RejectReason::NotMergeable => f.write_str("pull request is not mergeable"),
            RejectReason::MergeabilityTimeout => f.write_str("mergeability never resolved"),
        }
    }
}

/// Terminal result of reconciling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Changes applied and pull request merged.
    Applied,
    /// Nothing applied.
    Rejected(RejectReason),
    /// Apply failed and the pull request was reverted.
    ApplyFailed { error: String },
    /// A collaborator call failed. If it was the merge or revert call, the
    /// apply may already have taken effect.
    TransportError { error: String },
}

impl ReconciliationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReconciliationOutcome::Applied => "applied",
            ReconciliationOutcome::Rejected(_) => "rejected",
            ReconciliationOutcome::ApplyFailed { .. } => "apply_failed",
            ReconciliationOutcome::TransportError { .. } => "transport_error",
        }
    }
}

/// A changed file with its fetched content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: Vec<u8>,
}
