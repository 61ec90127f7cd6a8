//! HTTP client for the top-up backend REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::ports::RechargeBackend;
use crate::config::BackendConfig;
use crate::domain::{AutoRechargeEvent, Listing, ManualRecharge};
use crate::shared::BackendError;

/// Thin wrapper over `reqwest::Client` bound to one backend base URL
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, BackendError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "Backend response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        let response = self.send(self.http.get(&url), &url).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RechargeBackend for BackendClient {
    async fn manual_recharge(&self, id: i64) -> Result<ManualRecharge, BackendError> {
        self.get_json(&format!("recharges/{}/", id)).await
    }

    async fn auto_recharge_events(&self) -> Result<Vec<AutoRechargeEvent>, BackendError> {
        let listing: Listing<AutoRechargeEvent> =
            self.get_json("meters/auto-recharge/events/").await?;
        Ok(listing.into_vec())
    }

    async fn run_auto_recharge_now(&self) -> Result<(), BackendError> {
        let url = self.url("meters/auto-recharge/run-now/");
        self.send(self.http.post(&url), &url).await?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::domain::{AutoRechargeStatus, RechargeStatus};

    #[derive(Clone, Default)]
    struct StubState {
        runs: Arc<AtomicU32>,
    }

    async fn recharge(
        headers: HeaderMap,
        Path(id): Path<i64>,
    ) -> Result<Json<Value>, AxumStatus> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer good") {
            return Err(AxumStatus::UNAUTHORIZED);
        }
        if id == 404 {
            return Err(AxumStatus::NOT_FOUND);
        }
        Ok(Json(json!({
            "id": id,
            "status": "success",
            "units": "35.00",
            "masked_token": "1234****9999"
        })))
    }

    async fn events() -> Json<Value> {
        Json(json!({
            "count": 1,
            "results": [{"id": 9, "status": "completed", "amount": 10, "message": "token 4444-5555"}]
        }))
    }

    async fn run_now(State(state): State<StubState>) -> Json<Value> {
        state.runs.fetch_add(1, Ordering::SeqCst);
        Json(json!({"triggered": 1}))
    }

    async fn spawn_stub() -> (String, StubState) {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/recharges/{id}/", get(recharge))
            .route("/api/meters/auto-recharge/events/", get(events))
            .route("/api/meters/auto-recharge/run-now/", post(run_now))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/api/", addr), state)
    }

    fn client(base_url: &str, token: Option<&str>) -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: base_url.to_string(),
            token: token.map(String::from),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_manual_recharge() {
        let (base, _) = spawn_stub().await;
        let r = client(&base, Some("good")).manual_recharge(12).await.unwrap();
        assert_eq!(r.id, 12);
        assert_eq!(r.status, RechargeStatus::Success);
        assert_eq!(r.units, Some(rust_decimal::Decimal::from(35)));
    }

    #[tokio::test]
    async fn maps_401_to_unauthorized() {
        let (base, _) = spawn_stub().await;
        let err = client(&base, Some("bad")).manual_recharge(1).await.unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn maps_other_statuses() {
        let (base, _) = spawn_stub().await;
        let err = client(&base, Some("good")).manual_recharge(404).await.unwrap_err();
        match err {
            BackendError::Status { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/api/recharges/404/"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn lists_paginated_events_and_runs_now() {
        let (base, state) = spawn_stub().await;
        let c = client(&base, None);

        let events = c.auto_recharge_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, AutoRechargeStatus::Completed);
        assert_eq!(events[0].token().as_deref(), Some("4444-5555"));

        c.run_auto_recharge_now().await.unwrap();
        assert_eq!(state.runs.load(Ordering::SeqCst), 1);
    }
}
