//! Outbound ports: interfaces for talking to the top-up backend
//!
//! [`RechargeBackend`] decouples the recharge watcher from the HTTP
//! transport. The production implementation is
//! [`BackendClient`](crate::infrastructure::backend::BackendClient).

use async_trait::async_trait;

use crate::domain::{AutoRechargeEvent, ManualRecharge};
use crate::shared::BackendError;

#[async_trait]
pub trait RechargeBackend: Send + Sync {
    /// Current state of one manual recharge.
    async fn manual_recharge(&self, id: i64) -> Result<ManualRecharge, BackendError>;

    /// All auto-recharge events visible to the authenticated user.
    async fn auto_recharge_events(&self) -> Result<Vec<AutoRechargeEvent>, BackendError>;

    /// Ask the backend to run auto-recharge checks right away.
    async fn run_auto_recharge_now(&self) -> Result<(), BackendError>;
}
