use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::dispatch::spawn_reconcile;
use crate::server::AppState;
use crate::webhook::events::{PullRequestWebhook, WebhookEvent};
use crate::webhook::signature::verify_signature;

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // Extract required headers
    let signature = match headers.get("x-hub-signature-256").and_then(|v| v.to_str().ok()) {
        Some(sig) => sig.to_string(),
        None => {
            tracing::warn!("Missing X-Hub-Signature-256 header");
            return StatusCode::UNAUTHORIZED;
        }
    };

    let event_type = match headers.get("x-github-event").and_then(|v| v.to_str().ok()) {
        Some(et) => et.to_string(),
        None => {
            tracing::warn!("Missing X-GitHub-Event header");
            return StatusCode::BAD_REQUEST;
        }
    };

    let delivery = headers
        .get("x-github-delivery")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Verify signature
    if let Err(e) = verify_signature(state.webhook_secret(), &body, &signature) {
        tracing::warn!(error = %e, delivery = %delivery, "Webhook signature verification failed");
        return StatusCode::UNAUTHORIZED;
    }

    // Parse event
    let event = match WebhookEvent::parse(&event_type, &body) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, event_type = %event_type, "Failed to parse webhook event");
            return StatusCode::BAD_REQUEST;
        }
    };

    tracing::info!(event_type = %event_type, delivery = %delivery, "Received webhook event");

    match event {
        WebhookEvent::PullRequest(pr_event) => handle_pull_request_event(&state, pr_event),
        WebhookEvent::Ping => {
            tracing::info!("Received ping event");
            StatusCode::OK
        }
        WebhookEvent::Unsupported(event_type) => {
            tracing::debug!(event_type = %event_type, "Ignoring unsupported event");
            StatusCode::OK
        }
    }
}

fn handle_pull_request_event(state: &Arc<AppState>, event: PullRequestWebhook) -> StatusCode {
    if !state.config.reconcile.actions.iter().any(|a| *a == event.action) {
        tracing::debug!(
            repo = %event.repository.full_name,
            pr = event.number,
            action = %event.action,
            "Ignoring pull request action"
        );
        return StatusCode::OK;
    }

    if event.pull_request.number != event.number {
        tracing::warn!(
            number = event.number,
            pull_request_number = event.pull_request.number,
            "Pull request number mismatch in payload"
        );
        return StatusCode::BAD_REQUEST;
    }

    tracing::info!(
        repo = %event.repository.full_name,
        pr = event.number,
        title = %event.pull_request.title,
        action = %event.action,
        "Pull request event accepted, dispatching reconciliation"
    );

    spawn_reconcile(
        Arc::clone(&state.reconciler),
        &state.in_flight,
        event.to_event(),
    );

    StatusCode::ACCEPTED
}
