//! Opt-in retry with exponential backoff, layered above the transport.
//!
//! Only failures that say nothing about the request itself are retried:
//! transport errors, timeouts and rate limiting.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::error::{CeloError, CeloResult};

/// JSON-RPC code several providers use for "limit exceeded".
pub const RATE_LIMIT_CODE: i64 = -32005;

/// Methods without side effects; only these are ever retried.
pub const READ_ONLY_METHODS: &[&str] = &[
    "eth_blockNumber",
    "eth_chainId",
    "eth_gasPrice",
    "eth_getBalance",
    "eth_call",
    "eth_getBlockByNumber",
    "eth_getBlockByHash",
    "eth_getTransactionByHash",
    "eth_getTransactionReceipt",
    "eth_getLogs",
];

pub fn is_read_only(method: &str) -> bool {
    READ_ONLY_METHODS.contains(&method)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first; `1` disables retrying.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 250,
            max_backoff_ms: 4_000,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Delay before retry number `retry` (1-based), doubling each time.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

pub fn is_retriable(error: &CeloError) -> bool {
    match error {
        CeloError::Timeout(_) => true,
        CeloError::Transport(_) => true,
        CeloError::Rpc { code, message, .. } => {
            *code == RATE_LIMIT_CODE || message.to_ascii_lowercase().contains("rate limit")
        }
        _ => false,
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// the policy's attempts are used up.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> CeloResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CeloResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && is_retriable(&e) => {
                let delay = policy.backoff(attempt);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    label, attempt, attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(70), Duration::from_millis(350));
    }

    #[test]
    fn test_read_only_methods() {
        assert!(is_read_only("eth_call"));
        assert!(is_read_only("eth_getLogs"));
        assert!(!is_read_only("eth_sendRawTransaction"));
    }

    #[test]
    fn test_retriable_classification() {
        assert!(is_retriable(&CeloError::Transport("reset".into())));
        assert!(is_retriable(&CeloError::Rpc {
            code: RATE_LIMIT_CODE,
            message: "limit exceeded".into(),
            data: None
        }));
        assert!(!is_retriable(&CeloError::Rpc {
            code: -32602,
            message: "Invalid params".into(),
            data: None
        }));
        assert!(!is_retriable(&CeloError::UnknownNetwork("x".into())));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result = with_retry(&fast(3), "eth_blockNumber", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(CeloError::Transport("connection reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: CeloResult<()> = with_retry(&fast(2), "eth_call", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CeloError::Transport("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_policy_runs_once() {
        let calls = &AtomicU32::new(0);
        let result: CeloResult<()> = with_retry(&RetryPolicy::disabled(), "eth_call", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CeloError::Transport("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retriable_error_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: CeloResult<()> = with_retry(&fast(5), "eth_call", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CeloError::Rpc {
                code: 3,
                message: "execution reverted".into(),
                data: None,
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
