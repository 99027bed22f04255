use std::sync::Mutex;

use async_trait::async_trait;

use crate::apply::ApplyAction;
use crate::error::{AppError, Result};
use crate::platform::types::PullRequestRef;
use crate::workflow::types::FileChange;

/// Records each invocation; fails when constructed with `failing`.
#[derive(Default)]
pub struct MockApply {
    failure: Option<String>,
    pub calls: Mutex<Vec<(PullRequestRef, Vec<FileChange>)>>,
}

impl MockApply {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            failure: Some(msg.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApplyAction for MockApply {
    async fn apply(&self, pr: &PullRequestRef, changes: &[FileChange]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((pr.clone(), changes.to_vec()));
        match &self.failure {
            Some(msg) => Err(AppError::Apply(msg.clone())),
            None => Ok(()),
        }
    }
}
