use std::time::Duration;

use crate::error::{AppError, Result};
use crate::platform::types::{PullRequestRef, PullRequestState};
use crate::platform::Platform;

/// Cadence and deadline for mergeability polling.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(15),
        }
    }
}

/// Poll the platform until it reports a definitive mergeability value.
///
/// Each check happens one `interval` after the previous one. Lookup errors
/// count as "still unknown". Once `deadline` elapses the in-flight lookup is
/// dropped and `AppError::MergeabilityTimeout` is returned.
pub async fn resolve_mergeability<P>(
    platform: &P,
    pr: &PullRequestRef,
    settings: PollSettings,
) -> Result<PullRequestState>
where
    P: Platform + ?Sized,
{
    let poll = async {
        let mut attempt = 0u32;
        loop {
            tokio::time::sleep(settings.interval).await;
            attempt += 1;

            match platform.get_pull_request(pr).await {
                Ok(state) if state.mergeable.is_resolved() => {
                    tracing::debug!(pr = %pr, attempt, mergeable = ?state.mergeable, "Mergeability resolved");
                    return state;
                }
                Ok(_) => {
                    tracing::debug!(pr = %pr, attempt, "Mergeability still unknown");
                }
                Err(e) => {
                    tracing::debug!(pr = %pr, attempt, error = %e, "PR lookup failed, will retry");
                }
            }
        }
    };

    tokio::time::timeout(settings.deadline, poll)
        .await
        .map_err(|_| AppError::MergeabilityTimeout {
            waited: settings.deadline,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{open_state, Lookup, MockPlatform};
    use crate::platform::types::Mergeability;
    use tokio::time::Instant;

    fn pr() -> PullRequestRef {
        PullRequestRef::new("acme", "infra", 42)
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_within_one_interval_of_deadline() {
        let platform = MockPlatform::new();
        platform.push_state(open_state(Mergeability::Unknown));
        let settings = PollSettings {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(15),
        };

        let started = Instant::now();
        let err = resolve_mergeability(&platform, &pr(), settings)
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, AppError::MergeabilityTimeout { .. }));
        assert!(elapsed >= settings.deadline);
        assert!(elapsed <= settings.deadline + settings.interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uneven_interval_timeout_bounds() {
        let platform = MockPlatform::new();
        let settings = PollSettings {
            interval: Duration::from_millis(700),
            deadline: Duration::from_secs(2),
        };

        let started = Instant::now();
        assert!(resolve_mergeability(&platform, &pr(), settings).await.is_err());
        let elapsed = started.elapsed();

        assert!(elapsed >= settings.deadline);
        assert!(elapsed <= settings.deadline + settings.interval);
        assert_eq!(platform.lookup_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_first_definitive_answer() {
        let platform = MockPlatform::new();
        platform
            .push_state(open_state(Mergeability::Unknown))
            .push_state(open_state(Mergeability::Unknown))
            .push_state(open_state(Mergeability::Mergeable));

        let started = Instant::now();
        let state = resolve_mergeability(&platform, &pr(), PollSettings::default())
            .await
            .unwrap();

        assert_eq!(state.mergeable, Mergeability::Mergeable);
        assert_eq!(platform.lookup_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_mergeable_is_definitive() {
        let platform = MockPlatform::new();
        platform.push_state(open_state(Mergeability::Conflicting));

        let state = resolve_mergeability(&platform, &pr(), PollSettings::default())
            .await
            .unwrap();

        assert_eq!(state.mergeable, Mergeability::Conflicting);
        assert_eq!(platform.lookup_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_lookup_errors_keep_polling() {
        let platform = MockPlatform::new();
        platform
            .push_lookup(Lookup::Error("502 bad gateway".to_string()))
            .push_lookup(Lookup::Error("connection reset".to_string()))
            .push_state(open_state(Mergeability::Mergeable));

        let state = resolve_mergeability(&platform, &pr(), PollSettings::default())
            .await
            .unwrap();

        assert_eq!(state.mergeable, Mergeability::Mergeable);
        assert_eq!(platform.lookup_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polling_after_timeout() {
        let platform = MockPlatform::new();
        let settings = PollSettings {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(3),
        };

        assert!(resolve_mergeability(&platform, &pr(), settings).await.is_err());
        let calls = platform.lookup_count();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(platform.lookup_count(), calls);
    }
}
