//! Retry with exponential backoff for transient Admin API errors.
//!
//! Non-retriable errors (4xx other than 429, parse failures) are propagated
//! immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::error::UploadError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable:
/// - [`UploadError::RateLimited`] — HTTP 429; the API asked us to back off.
/// - [`UploadError::Http`] — network-level failure (reset, timeout).
/// - [`UploadError::UnexpectedStatus`] with a 5xx status.
///
/// Everything else (422 validation failures, auth errors, parse errors) is
/// returned immediately; retrying would produce the same result.
fn is_retriable(err: &UploadError) -> bool {
    match err {
        UploadError::RateLimited { .. } | UploadError::Http(_) => true,
        UploadError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds;
/// with `max_retries = 3` the operation is attempted at most 4 times total.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, UploadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UploadError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "transient upload error — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}
