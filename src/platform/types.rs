use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a pull request on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrStatus {
    Open,
    Closed,
    Merged,
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrStatus::Open => "open",
            PrStatus::Closed => "closed",
            PrStatus::Merged => "merged",
        };
        f.write_str(s)
    }
}

/// Platform-computed mergeability. GitHub reports `null` while it is still computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mergeability {
    Unknown,
    Mergeable,
    Conflicting,
}

impl Mergeability {
    pub fn is_resolved(self) -> bool {
        self != Mergeability::Unknown
    }
}

impl From<Option<bool>> for Mergeability {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Mergeability::Unknown,
            Some(true) => Mergeability::Mergeable,
            Some(false) => Mergeability::Conflicting,
        }
    }
}

/// Snapshot of a pull request at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestState {
    pub status: PrStatus,
    pub mergeable: Mergeability,
    pub title: String,
}

/// A file touched by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub content_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mergeability_from_github_flag() {
        assert_eq!(Mergeability::from(None), Mergeability::Unknown);
        assert_eq!(Mergeability::from(Some(true)), Mergeability::Mergeable);
        assert_eq!(Mergeability::from(Some(false)), Mergeability::Conflicting);
        assert!(!Mergeability::Unknown.is_resolved());
        assert!(Mergeability::Conflicting.is_resolved());
    }

    #[test]
    fn test_pr_ref_display() {
        assert_eq!(PullRequestRef::new("acme", "infra", 42).to_string(), "acme/infra#42");
    }
}
