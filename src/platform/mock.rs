//! Recording platform double for reconciler and webhook tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

/// Scripted response for a single `get_pull_request` call.
#[derive(Debug, Clone)]
pub enum Lookup {
    State(PullRequestState),
    Error(String),
}

/// Hand-written mock that records every call.
///
/// `get_pull_request` pops scripted lookups in order and repeats the last one
/// once the script is exhausted.
#[derive(Default)]
pub struct MockPlatform {
    lookups: Mutex<VecDeque<Lookup>>,
    last_lookup: Mutex<Option<Lookup>>,
    files: Mutex<Vec<ChangedFile>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    // Error injection
    error_on_list_files: Mutex<Option<String>>,
    error_on_fetch: Mutex<Option<String>>,
    error_on_merge: Mutex<Option<String>>,
    error_on_revert: Mutex<Option<String>>,
    // Call tracking
    pub lookup_calls: Mutex<Vec<PullRequestRef>>,
    pub fetch_calls: Mutex<Vec<String>>,
    pub merge_calls: Mutex<Vec<PullRequestRef>>,
    pub revert_calls: Mutex<Vec<(PullRequestRef, String)>>,
}

pub fn open_state(mergeable: Mergeability) -> PullRequestState {
    PullRequestState {
        status: PrStatus::Open,
        mergeable,
        title: "bump replicas".to_string(),
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_lookup(&self, lookup: Lookup) -> &Self {
        self.lookups.lock().unwrap().push_back(lookup);
        self
    }

    pub fn push_state(&self, state: PullRequestState) -> &Self {
        self.push_lookup(Lookup::State(state))
    }

    pub fn add_file(&self, filename: &str, content: &[u8]) -> &Self {
        let url = format!("https://raw.test/{filename}");
        self.files.lock().unwrap().push(ChangedFile {
            filename: filename.to_string(),
            content_url: url.clone(),
        });
        self.contents.lock().unwrap().insert(url, content.to_vec());
        self
    }

    pub fn fail_list_files(&self, msg: &str) {
        *self.error_on_list_files.lock().unwrap() = Some(msg.to_string());
    }

    /// Fail fetches of the given URL.
    pub fn fail_fetch(&self, url: &str) {
        *self.error_on_fetch.lock().unwrap() = Some(url.to_string());
    }

    pub fn fail_merge(&self, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_revert(&self, msg: &str) {
        *self.error_on_revert.lock().unwrap() = Some(msg.to_string());
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_calls.lock().unwrap().len()
    }

    pub fn merge_count(&self) -> usize {
        self.merge_calls.lock().unwrap().len()
    }

    pub fn revert_count(&self) -> usize {
        self.revert_calls.lock().unwrap().len()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn get_pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestState> {
        self.lookup_calls.lock().unwrap().push(pr.clone());

        let next = self.lookups.lock().unwrap().pop_front();
        let lookup = match next {
            Some(lookup) => {
                *self.last_lookup.lock().unwrap() = Some(lookup.clone());
                lookup
            }
            None => self
                .last_lookup
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Lookup::State(open_state(Mergeability::Unknown))),
        };

        match lookup {
            Lookup::State(state) => Ok(state),
            Lookup::Error(msg) => Err(AppError::Transport(msg)),
        }
    }

    async fn list_files(&self, _pr: &PullRequestRef) -> Result<Vec<ChangedFile>> {
        if let Some(msg) = self.error_on_list_files.lock().unwrap().clone() {
            return Err(AppError::GitHubApi(msg));
        }
        Ok(self.files.lock().unwrap().clone())
    }

    async fn fetch_raw(&self, content_url: &str) -> Result<Vec<u8>> {
        self.fetch_calls.lock().unwrap().push(content_url.to_string());

        if self.error_on_fetch.lock().unwrap().as_deref() == Some(content_url) {
            return Err(AppError::Transport(format!("connection reset fetching {content_url}")));
        }
        self.contents
            .lock()
            .unwrap()
            .get(content_url)
            .cloned()
            .ok_or_else(|| AppError::Transport(format!("404 for {content_url}")))
    }

    async fn merge_pull_request(&self, pr: &PullRequestRef) -> Result<()> {
        self.merge_calls.lock().unwrap().push(pr.clone());
        match self.error_on_merge.lock().unwrap().clone() {
            Some(msg) => Err(AppError::GitHubApi(msg)),
            None => Ok(()),
        }
    }

    async fn revert_pull_request(&self, pr: &PullRequestRef, reason: &str) -> Result<()> {
        self.revert_calls
            .lock()
            .unwrap()
            .push((pr.clone(), reason.to_string()));
        match self.error_on_revert.lock().unwrap().clone() {
            Some(msg) => Err(AppError::GitHubApi(msg)),
            None => Ok(()),
        }
    }
}
