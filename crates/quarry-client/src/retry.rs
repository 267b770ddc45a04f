//! Retry loop for transient service failures

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::ClientError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as 1 when set to 0.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 5, delay_ms: 1000 }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `op` until it succeeds, the policy is exhausted, or `cancel` fires.
/// Exhaustion returns [`ClientError::RetryExhausted`] wrapping the last
/// failure.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => {
                tracing::error!(attempt, error = %err, "giving up");
                return Err(ClientError::RetryExhausted {
                    attempts,
                    source: Box::new(err),
                });
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "attempt failed, retrying");
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            _ = tokio::time::sleep(policy.delay()) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy { attempts, delay_ms: 1 }
    }

    #[tokio::test]
    async fn test_first_success_returns_immediately() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(5), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ClientError>(42) }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(5), &cancel, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClientError::Service("flaky".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_wraps_last_error() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast_policy(3), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ClientError::Service("down".to_string())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            ClientError::RetryExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, ClientError::Service(_)));
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(0), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ClientError>(()) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = with_retry(&fast_policy(5), &cancel, || async {
            Ok::<_, ClientError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
    }
}
