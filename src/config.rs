use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// Environment variable holding the JSON credential blob.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    /// API base URL override, e.g. for GitHub Enterprise.
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcileConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_mergeability_deadline_ms")]
    pub mergeability_deadline_ms: u64,
    /// Serialize overlapping workflows for the same pull request.
    #[serde(default = "default_serialize_per_pr")]
    pub serialize_per_pr: bool,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// `pull_request` actions that trigger a reconciliation.
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplyConfig {
    /// Program run against the staged change set. Unset means dry-run.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

/// Tokens read from the credential blob.
#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub secret_token: String,
}

// Manual Debug impl to avoid leaking either token
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("secret_token", &"[REDACTED]")
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_secret_env() -> String {
    "GITHUB_SECRET".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_mergeability_deadline_ms() -> u64 {
    15_000
}

fn default_serialize_per_pr() -> bool {
    true
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

fn default_actions() -> Vec<String> {
    ["opened", "reopened", "synchronize", "ready_for_review"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("/tmp/gitops-operator")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
            api_base: None,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            mergeability_deadline_ms: default_mergeability_deadline_ms(),
            serialize_per_pr: default_serialize_per_pr(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            actions: default_actions(),
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            staging_dir: default_staging_dir(),
        }
    }
}

impl ReconcileConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn mergeability_deadline(&self) -> Duration {
        Duration::from_millis(self.mergeability_deadline_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(
                config::File::with_name("gitops-operator")
                    .required(false),
            );
        }

        // Environment variable overrides with GITOPS_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("GITOPS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("reconcile.actions")
                .with_list_parse_key("apply.args")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let reconcile = &self.reconcile;
        if reconcile.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "reconcile.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if reconcile.poll_interval_ms > reconcile.mergeability_deadline_ms {
            return Err(AppError::Config(format!(
                "reconcile.poll_interval_ms ({}) exceeds reconcile.mergeability_deadline_ms ({})",
                reconcile.poll_interval_ms, reconcile.mergeability_deadline_ms
            )));
        }
        if let Some(command) = &self.apply.command {
            if command.trim().is_empty() {
                return Err(AppError::Config("apply.command is empty".to_string()));
            }
        }
        Ok(())
    }

    /// Read the credential blob named by `github.secret_env` from the environment.
    pub fn credentials(&self) -> Result<Credentials> {
        let raw = std::env::var(&self.github.secret_env).map_err(|_| {
            AppError::Config(format!(
                "Environment variable {} is not set",
                self.github.secret_env
            ))
        })?;
        Credentials::parse(&raw)
    }
}

impl Credentials {
    pub fn parse(raw: &str) -> Result<Self> {
        let credentials: Credentials = serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("Failed to parse credentials: {e}")))?;

        if credentials.access_token.is_empty() {
            return Err(AppError::Config("Credentials missing accessToken".to_string()));
        }
        if credentials.secret_token.is_empty() {
            return Err(AppError::Config("Credentials missing secretToken".to_string()));
        }

        Ok(credentials)
    }
}
