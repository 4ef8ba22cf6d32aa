//! Bounded retry with linear backoff and an overall deadline

use crate::config::ReasoningConfig;
use crate::error::{Result, SkillAlignerError};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            timeout,
        }
    }

    pub fn from_config(config: &ReasoningConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Same attempt count, no sleeping between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::from_secs(30))
    }

    /// Run `call` until it succeeds, the attempts run out, or the deadline passes.
    ///
    /// The delay before attempt `n + 1` is `n × base_delay`. Errors that are not
    /// recoverable end the loop immediately.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = async {
            let mut attempt = 1;
            loop {
                match call(attempt).await {
                    Ok(value) => {
                        if attempt > 1 {
                            debug!("{} succeeded on attempt {}", operation, attempt);
                        }
                        return Ok(value);
                    }
                    Err(e) if !e.is_recoverable() || attempt >= self.max_attempts => {
                        warn!("{} failed after {} attempt(s): {}", operation, attempt, e);
                        return Err(e);
                    }
                    Err(e) => {
                        warn!("{} attempt {}/{} failed: {}", operation, attempt, self.max_attempts, e);
                        tokio::time::sleep(self.base_delay * attempt).await;
                        attempt += 1;
                    }
                }
            }
        };

        match tokio::time::timeout(self.timeout, attempts).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} exceeded its {:?} deadline", operation, self.timeout);
                Err(SkillAlignerError::Timeout {
                    operation: operation.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ReasoningConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("flaky", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(SkillAlignerError::external("stub", "transient"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("always-failing", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SkillAlignerError::external("stub", "down")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("fatal", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SkillAlignerError::Validation("bad".into())) }
            })
            .await;

        assert!(matches!(result, Err(SkillAlignerError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_resolves_hung_call() {
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::from_millis(20));

        let result: Result<()> = policy
            .run("hung", |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(SkillAlignerError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_with_each_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        let seen = std::sync::Mutex::new(Vec::new());

        let result: Result<()> = policy
            .run("backoff", |_| {
                seen.lock().unwrap().push(started.elapsed());
                async { Err(SkillAlignerError::external("stub", "busy")) }
            })
            .await;

        assert!(result.is_err());
        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![Duration::ZERO, Duration::from_millis(100), Duration::from_millis(300)]
        );
    }
}
