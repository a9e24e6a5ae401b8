//! Bounded, fixed-delay retries.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Run `op` up to `attempts` times, sleeping `delay` between tries.
///
/// Errors for which `is_retryable` returns false are returned immediately.
/// When every attempt fails the last error is returned. `op` is called
/// afresh on each attempt, so anything it resolves is resolved again.
pub async fn retry<T, E, F, Fut, R>(
    attempts: usize,
    delay: Duration,
    label: &str,
    is_retryable: R,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 0usize;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= attempts || !is_retryable(&err) {
                    return Err(err);
                }
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:.1}s",
                    label,
                    attempt,
                    attempts,
                    err,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
