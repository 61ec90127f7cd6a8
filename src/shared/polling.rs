//! Fixed-interval status polling
//!
//! Repeatedly fetches a status until it reaches a terminal state or the
//! attempt budget runs out. Used to wait for the backend to finish applying
//! a recharge token or an auto-recharge run.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for polling behavior.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum number of fetches.
    pub max_attempts: u32,
    /// Delay before each fetch.
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound on how long polling can take.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

/// How polling ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// A terminal value was observed.
    Completed { value: T, attempts: u32 },
    /// Attempts were exhausted; carries the last value seen, if any.
    TimedOut { last: Option<T>, attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Poll `fetch` every `config.interval` until `is_terminal` accepts a value.
///
/// Fetch errors count as an attempt and are logged; errors for which
/// `should_abort` returns true end polling immediately with `Err`.
///
/// # Example
/// ```ignore
/// let outcome = poll_until(
///     PollConfig::default(),
///     || backend.manual_recharge(id),
///     |r| r.status.is_terminal(),
///     BackendError::is_fatal,
///     "manual_recharge",
/// ).await?;
/// ```
pub async fn poll_until<F, Fut, T, E>(
    config: PollConfig,
    mut fetch: F,
    is_terminal: impl Fn(&T) -> bool,
    should_abort: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last = None;

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match fetch().await {
            Ok(value) if is_terminal(&value) => {
                info!(operation = operation_name, attempt, "Reached terminal status");
                return Ok(PollOutcome::Completed {
                    value,
                    attempts: attempt,
                });
            }
            Ok(value) => {
                debug!(
                    operation = operation_name,
                    attempt,
                    max_attempts = config.max_attempts,
                    "Still pending"
                );
                last = Some(value);
            }
            Err(err) if should_abort(&err) => {
                warn!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Polling aborted"
                );
                return Err(err);
            }
            Err(err) => {
                debug!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Poll attempt failed"
                );
            }
        }
    }

    warn!(
        operation = operation_name,
        attempts = config.max_attempts,
        "Polling timed out"
    );
    Ok(PollOutcome::TimedOut {
        last,
        attempts: config.max_attempts,
    })
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> PollConfig {
        PollConfig::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn completes_on_terminal_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let outcome = poll_until(
            fast(10),
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok::<_, String>(n) }
            },
            |n: &u32| *n >= 3,
            |_: &String| false,
            "test",
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Completed {
                value: 3,
                attempts: 3
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_after_max_attempts() {
        let outcome = poll_until(
            fast(4),
            || async { Ok::<_, String>("pending") },
            |s: &&str| *s != "pending",
            |_: &String| false,
            "test",
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                last: Some("pending"),
                attempts: 4
            }
        );
        assert!(!outcome.is_completed());
    }

    #[tokio::test]
    async fn transient_errors_count_as_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let outcome = poll_until(
            fast(5),
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err("connection reset".to_string())
                    } else {
                        Ok("success")
                    }
                }
            },
            |s: &&str| *s == "success",
            |_: &String| false,
            "test",
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Completed {
                value: "success",
                attempts: 3
            }
        );
    }

    #[tokio::test]
    async fn fatal_error_aborts_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let result = poll_until(
            fast(10),
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>("unauthorized".to_string()) }
            },
            |_: &u32| true,
            |e: &String| e == "unauthorized",
            "test",
        )
        .await;

        assert_eq!(result, Err("unauthorized".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_errors_time_out_without_last_value() {
        let outcome = poll_until(
            fast(3),
            || async { Err::<u32, _>("boom".to_string()) },
            |_: &u32| true,
            |_: &String| false,
            "test",
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                last: None,
                attempts: 3
            }
        );
    }

    #[test]
    fn budget_is_interval_times_attempts() {
        assert_eq!(PollConfig::default().budget(), Duration::from_secs(20));
    }
}
