//! Bounded retry with a fixed delay.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Retries an async operation a fixed number of times.
///
/// The delay is applied between attempts only; a policy of 3 attempts
/// with a 1 second delay waits at most 2 seconds in total.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use timeslice::timing::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_secs(1));
/// assert_eq!(policy.attempts(), 3);
/// assert_eq!(policy.delay(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: usize,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a new policy. At least one attempt is always made.
    pub fn new(attempts: usize, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Maximum number of attempts.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Delay between consecutive attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds or the attempts are exhausted.
    ///
    /// The closure receives the 1-based attempt number. On exhaustion the
    /// error of the last attempt is returned.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Succeeded on attempt {}/{}", attempt, self.attempts);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, self.attempts, e, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt, self.attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failure() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::default();

        let result: Result<&str, String> = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err("connection reset".to_string())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();

        let result: Result<(), String> = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {}", attempt)) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two delays between three attempts, none after the last one.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_on_first_success() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();

        let result: Result<u32, String> = policy.run(|_| async { Ok(7) }).await;

        assert_eq!(result.unwrap(), 7);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
