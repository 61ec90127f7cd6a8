//! Recharge records as reported by the top-up backend

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Manual (user-entered token) recharge status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RechargeStatus {
    Pending,
    Success,
    Failed,
    Rejected,
}

impl RechargeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RechargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A manually entered token and its application status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualRecharge {
    pub id: i64,
    #[serde(default)]
    pub masked_token: Option<String>,
    #[serde(default)]
    pub units: Option<Decimal>,
    pub status: RechargeStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

impl ManualRecharge {
    /// Human readable reason, falling back to a status-specific default.
    pub fn reason(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| self.detail.clone().filter(|d| !d.is_empty()))
            .unwrap_or_else(|| match self.status {
                RechargeStatus::Success => "Your electricity has been recharged".to_string(),
                RechargeStatus::Rejected => "Token rejected".to_string(),
                RechargeStatus::Failed => "Failed to apply token".to_string(),
                RechargeStatus::Pending => "Awaiting verification".to_string(),
            })
    }
}

/// Auto-recharge event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoRechargeStatus {
    Pending,
    Completed,
    Failed,
}

impl AutoRechargeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for AutoRechargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One auto-recharge attempt for a meter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRechargeEvent {
    pub id: i64,
    pub status: AutoRechargeStatus,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
}

impl AutoRechargeEvent {
    /// Token code allocated by this event, if the message carries one.
    pub fn token(&self) -> Option<String> {
        self.message.as_deref().and_then(extract_token)
    }
}

/// Backend list payload: either a bare array or a paginated object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) => items,
            Self::Paginated { results } => results,
        }
    }
}

/// Pull a token code out of text like `"Allocated token 1234-5678"`.
pub fn extract_token(message: &str) -> Option<String> {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN_RE.get_or_init(|| {
        Regex::new(r"(?i)token\s([A-Za-z0-9\-]+)").expect("token pattern is valid")
    });
    re.captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// ── Tests ──────────────────────────────────────────────────────
