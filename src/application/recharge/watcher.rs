//! Recharge watcher
//!
//! Waits for the backend to finish applying a manual token or an
//! auto-recharge run by polling its status endpoints.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::application::ports::RechargeBackend;
use crate::domain::{AutoRechargeEvent, ManualRecharge};
use crate::shared::{poll_until, BackendError, PollConfig, PollOutcome};

/// Token handed out by an auto-recharge event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAllocation {
    pub event_id: i64,
    pub token: String,
}

/// Tokens mentioned in the messages of `events`.
pub fn allocations(events: &[AutoRechargeEvent]) -> Vec<TokenAllocation> {
    events
        .iter()
        .filter_map(|ev| {
            ev.token().map(|token| TokenAllocation {
                event_id: ev.id,
                token,
            })
        })
        .collect()
}

pub struct RechargeWatcher {
    backend: Arc<dyn RechargeBackend>,
    manual: PollConfig,
    auto: PollConfig,
}

impl RechargeWatcher {
    pub fn new(backend: Arc<dyn RechargeBackend>, manual: PollConfig, auto: PollConfig) -> Self {
        Self {
            backend,
            manual,
            auto,
        }
    }

    /// Poll a manual recharge until it leaves `pending`.
    pub async fn watch_manual(
        &self,
        id: i64,
    ) -> Result<PollOutcome<ManualRecharge>, BackendError> {
        info!(
            recharge_id = id,
            deadline_ms = self.manual.budget().as_millis() as u64,
            "Waiting for manual recharge verification"
        );

        let backend = self.backend.clone();
        poll_until(
            self.manual.clone(),
            || {
                let backend = backend.clone();
                async move { backend.manual_recharge(id).await }
            },
            |r: &ManualRecharge| r.status.is_terminal(),
            BackendError::is_fatal,
            "manual_recharge",
        )
        .await
    }

    /// Trigger an auto-recharge run and wait for the events it creates.
    ///
    /// Completes once at least one new event exists and every new event is
    /// `completed` or `failed`.
    pub async fn run_auto_recharge(
        &self,
    ) -> Result<PollOutcome<Vec<AutoRechargeEvent>>, BackendError> {
        let before: HashSet<i64> = self
            .backend
            .auto_recharge_events()
            .await?
            .into_iter()
            .map(|ev| ev.id)
            .collect();

        self.backend.run_auto_recharge_now().await?;
        info!(
            known_events = before.len(),
            deadline_ms = self.auto.budget().as_millis() as u64,
            "Auto recharge run started"
        );

        let backend = self.backend.clone();
        let before = Arc::new(before);
        poll_until(
            self.auto.clone(),
            || {
                let backend = backend.clone();
                let before = before.clone();
                async move {
                    let events = backend.auto_recharge_events().await?;
                    Ok::<_, BackendError>(
                        events
                            .into_iter()
                            .filter(|ev| !before.contains(&ev.id))
                            .collect::<Vec<_>>(),
                    )
                }
            },
            |fresh: &Vec<AutoRechargeEvent>| {
                !fresh.is_empty() && fresh.iter().all(|ev| ev.status.is_terminal())
            },
            BackendError::is_fatal,
            "auto_recharge_run",
        )
        .await
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::domain::{AutoRechargeStatus, RechargeStatus};

    /// Scripted backend: each call pops the next response.
    #[derive(Default)]
    struct FakeBackend {
        manual: Mutex<VecDeque<Result<ManualRecharge, BackendError>>>,
        events: Mutex<VecDeque<Vec<AutoRechargeEvent>>>,
        runs: Mutex<u32>,
    }

    #[async_trait]
    impl RechargeBackend for FakeBackend {
        async fn manual_recharge(&self, _id: i64) -> Result<ManualRecharge, BackendError> {
            self.manual
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(recharge(RechargeStatus::Pending)))
        }

        async fn auto_recharge_events(&self) -> Result<Vec<AutoRechargeEvent>, BackendError> {
            let mut events = self.events.lock().unwrap();
            if events.len() > 1 {
                Ok(events.pop_front().unwrap_or_default())
            } else {
                Ok(events.front().cloned().unwrap_or_default())
            }
        }

        async fn run_auto_recharge_now(&self) -> Result<(), BackendError> {
            *self.runs.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn recharge(status: RechargeStatus) -> ManualRecharge {
        ManualRecharge {
            id: 1,
            masked_token: Some("1234****5678".into()),
            units: None,
            status,
            message: None,
            detail: None,
            created_at: None,
            applied_at: None,
        }
    }

    fn event(id: i64, status: AutoRechargeStatus, message: Option<&str>) -> AutoRechargeEvent {
        AutoRechargeEvent {
            id,
            status,
            amount: None,
            message: message.map(String::from),
            triggered_at: None,
            executed_at: None,
        }
    }

    fn fast(max_attempts: u32) -> PollConfig {
        PollConfig::new(Duration::from_millis(1), max_attempts)
    }

    fn watcher(backend: Arc<FakeBackend>) -> RechargeWatcher {
        RechargeWatcher::new(backend, fast(5), fast(5))
    }

    #[tokio::test]
    async fn manual_recharge_completes_on_success() {
        let backend = Arc::new(FakeBackend::default());
        backend.manual.lock().unwrap().extend([
            Ok(recharge(RechargeStatus::Pending)),
            Ok(recharge(RechargeStatus::Success)),
        ]);

        let outcome = watcher(backend).watch_manual(1).await.unwrap();
        match outcome {
            PollOutcome::Completed { value, attempts } => {
                assert_eq!(value.status, RechargeStatus::Success);
                assert_eq!(attempts, 2);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn manual_recharge_times_out_while_pending() {
        let backend = Arc::new(FakeBackend::default());
        let outcome = watcher(backend).watch_manual(1).await.unwrap();
        assert!(matches!(
            outcome,
            PollOutcome::TimedOut { attempts: 5, .. }
        ));
    }

    #[tokio::test]
    async fn pending_recharge_waits_out_the_full_budget() {
        let manual = PollConfig::new(Duration::from_millis(10), 3);
        let deadline = manual.budget();
        let watcher = RechargeWatcher::new(Arc::new(FakeBackend::default()), manual, fast(1));

        let started = std::time::Instant::now();
        let outcome = watcher.watch_manual(7).await.unwrap();
        assert!(!outcome.is_completed());
        assert!(started.elapsed() >= deadline);
    }

    #[tokio::test]
    async fn manual_recharge_aborts_on_unauthorized() {
        let backend = Arc::new(FakeBackend::default());
        backend
            .manual
            .lock()
            .unwrap()
            .push_back(Err(BackendError::Unauthorized));

        let err = watcher(backend).watch_manual(1).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn auto_recharge_waits_for_new_events_to_finish() {
        let backend = Arc::new(FakeBackend::default());
        backend.events.lock().unwrap().extend([
            // snapshot before the run
            vec![event(1, AutoRechargeStatus::Completed, None)],
            // new event still pending
            vec![
                event(1, AutoRechargeStatus::Completed, None),
                event(2, AutoRechargeStatus::Pending, None),
            ],
            // new event finished
            vec![
                event(1, AutoRechargeStatus::Completed, None),
                event(2, AutoRechargeStatus::Completed, Some("Executed with token 1111-2222")),
            ],
        ]);

        let outcome = watcher(backend.clone()).run_auto_recharge().await.unwrap();
        assert_eq!(*backend.runs.lock().unwrap(), 1);

        match outcome {
            PollOutcome::Completed { value, .. } => {
                assert_eq!(value.len(), 1);
                assert_eq!(value[0].id, 2);
                assert_eq!(
                    allocations(&value),
                    vec![TokenAllocation {
                        event_id: 2,
                        token: "1111-2222".into()
                    }]
                );
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn auto_recharge_times_out_without_new_events() {
        let backend = Arc::new(FakeBackend::default());
        backend
            .events
            .lock()
            .unwrap()
            .push_back(vec![event(1, AutoRechargeStatus::Failed, None)]);

        let outcome = watcher(backend).run_auto_recharge().await.unwrap();
        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 5, .. }));
    }
}
