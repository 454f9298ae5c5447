//! Bounded retry with binary-exponential backoff for upstream requests.
//!
//! Every attempt failure is retried: non-2xx statuses, timeouts, transport
//! errors, and bodies that fail to parse as the advertised content type.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` is an attempt failure worth another try.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_)
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::Deserialize { .. }
    )
}

/// Executes `operation` up to `max_attempts` times.
///
/// After a retriable failure on attempt `n` (zero-based) the function sleeps
/// `backoff_base_secs * 2^n` seconds. No sleep follows the final attempt; the
/// last error is returned instead.
///
/// | Attempt | Sleep before next attempt (base = 1) |
/// |---------|--------------------------------------|
/// | 0       | 1 s                                  |
/// | 1       | 2 s                                  |
/// | 2       | none (last attempt with `max_attempts = 3`) |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt + 1 >= max_attempts {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt = attempt + 1,
            max_attempts,
            delay_secs,
            error = %err,
            "upstream attempt failed; retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn bad_status() -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://www.cargurus.com/Cars/searchResults.action".to_owned(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_payload_is_returned_without_backoff() {
        let mut attempts = 0u32;
        let started = tokio::time::Instant::now();
        let result = retry_with_backoff(3, 1, || {
            attempts += 1;
            async { Ok::<_, ScraperError>(Payload::Html("<html>listing</html>".to_owned())) }
        })
        .await;
        assert!(matches!(result, Ok(Payload::Html(ref body)) if body.contains("listing")));
        assert_eq!(attempts, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn third_attempt_success_waits_one_then_two_seconds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let started = tokio::time::Instant::now();
        let result = retry_with_backoff(3, 1, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(bad_status())
                } else {
                    Ok::<&str, ScraperError>("payload")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "payload");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_attempts_returns_last_error_without_final_sleep() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let started = tokio::time::Instant::now();
        let result = retry_with_backoff(3, 1, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(bad_status())
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::UnexpectedStatus { .. })));
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn malformed_body_is_retried() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    let e = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
                    Err(ScraperError::Deserialize {
                        context: "test".to_owned(),
                        source: e,
                    })
                } else {
                    Ok::<u32, ScraperError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_extraction_errors() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::Parse {
                    context: "detail".to_owned(),
                    reason: "missing listing".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::Parse { .. })));
    }
}
