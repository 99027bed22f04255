use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::apply::{self, ApplyAction};
use crate::config::{AppConfig, Credentials};
use crate::dispatch::InFlight;
use crate::platform::github::GitHubPlatform;
use crate::platform::Platform;
use crate::workflow::poller::PollSettings;
use crate::workflow::{ReconcileSettings, Reconciler};

pub type SharedReconciler = Arc<Reconciler<dyn Platform, dyn ApplyAction>>;

pub struct AppState {
    pub config: AppConfig,
    webhook_secret: String,
    pub reconciler: SharedReconciler,
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(config: AppConfig, credentials: Credentials) -> crate::error::Result<Self> {
        let platform: Arc<dyn Platform> =
            Arc::new(GitHubPlatform::new(&config.github, &credentials)?);
        let apply = apply::from_config(&config.apply);
        Ok(Self::with_parts(config, credentials.secret_token, platform, apply))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        webhook_secret: String,
        platform: Arc<dyn Platform>,
        apply: Arc<dyn ApplyAction>,
    ) -> Self {
        let settings = ReconcileSettings {
            poll: PollSettings {
                interval: config.reconcile.poll_interval(),
                deadline: config.reconcile.mergeability_deadline(),
            },
            serialize_per_pr: config.reconcile.serialize_per_pr,
        };
        let reconciler = Arc::new(Reconciler::new(platform, apply, settings));

        Self {
            config,
            webhook_secret,
            reconciler,
            in_flight: InFlight::new(),
        }
    }

    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/github", post(crate::webhook::handler::handle_webhook))
        .route("/health", axum::routing::get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}
