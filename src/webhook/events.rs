use serde::Deserialize;

use crate::platform::types::PullRequestRef;
use crate::workflow::types::PullRequestEvent;

/// Top-level webhook event parsed from the payload based on X-GitHub-Event header.
#[derive(Debug)]
pub enum WebhookEvent {
    PullRequest(PullRequestWebhook),
    Ping,
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
pub struct PullRequestWebhook {
    pub action: String,
    pub number: u64,
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub name: String,
    pub full_name: String,
    pub owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
pub struct OwnerPayload {
    pub login: String,
}

impl WebhookEvent {
    pub fn parse(event_type: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        match event_type {
            "pull_request" => {
                let event: PullRequestWebhook = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::PullRequest(event))
            }
            "ping" => Ok(WebhookEvent::Ping),
            other => Ok(WebhookEvent::Unsupported(other.to_string())),
        }
    }
}

impl PullRequestWebhook {
    pub fn to_event(&self) -> PullRequestEvent {
        PullRequestEvent {
            pr: PullRequestRef::new(
                self.repository.owner.login.clone(),
                self.repository.name.clone(),
                self.number,
            ),
            title: self.pull_request.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "action": "opened",
            "number": 42,
            "pull_request": {
                "number": 42,
                "title": "bump replicas",
                "state": "open",
                "mergeable": null
            },
            "repository": {
                "id": 1,
                "name": "infra",
                "full_name": "acme/infra",
                "owner": { "login": "acme", "id": 7 }
            },
            "sender": { "login": "octocat" }
        })
    }

    #[test]
    fn test_parse_pull_request_event() {
        let body = serde_json::to_vec(&payload()).unwrap();
        let event = match WebhookEvent::parse("pull_request", &body).unwrap() {
            WebhookEvent::PullRequest(event) => event,
            other => panic!("unexpected event: {other:?}"),
        };

        assert_eq!(event.action, "opened");
        let decoded = event.to_event();
        assert_eq!(decoded.pr, PullRequestRef::new("acme", "infra", 42));
        assert_eq!(decoded.title, "bump replicas");
    }

    #[test]
    fn test_parse_rejects_malformed_pull_request() {
        assert!(WebhookEvent::parse("pull_request", br#"{"action":"opened"}"#).is_err());
    }

    #[test]
    fn test_other_events_are_unsupported() {
        assert!(matches!(
            WebhookEvent::parse("push", b"{}").unwrap(),
            WebhookEvent::Unsupported(ref e) if e == "push"
        ));
        assert!(matches!(
            WebhookEvent::parse("ping", b"{}").unwrap(),
            WebhookEvent::Ping
        ));
    }
}
