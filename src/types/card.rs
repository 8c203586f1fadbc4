//! Card, control and customer types
//!
//! These are read-only inputs to the decision engine. They are owned by the
//! provisioning side and only looked up here.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::transaction::CardId;

/// Card status as maintained by provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Inactive,
    Active,
    Frozen,
    Terminated,
}

/// Window over which a spending limit aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitInterval {
    /// Applies to each authorization on its own
    PerAuthorization,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    AllTime,
}

impl LimitInterval {
    /// Length of the rolling window, `None` when the window is unbounded
    /// or does not aggregate at all.
    pub fn window(&self) -> Option<Duration> {
        match self {
            LimitInterval::PerAuthorization | LimitInterval::AllTime => None,
            LimitInterval::Daily => Some(Duration::days(1)),
            LimitInterval::Weekly => Some(Duration::days(7)),
            LimitInterval::Monthly => Some(Duration::days(30)),
            LimitInterval::Yearly => Some(Duration::days(365)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitInterval::PerAuthorization => "per_authorization",
            LimitInterval::Daily => "daily",
            LimitInterval::Weekly => "weekly",
            LimitInterval::Monthly => "monthly",
            LimitInterval::Yearly => "yearly",
            LimitInterval::AllTime => "all_time",
        }
    }
}

/// A cap on `amount + fees` over an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimit {
    /// Minor currency units
    pub amount: i64,
    pub interval: LimitInterval,
}

/// Allow/block lists and spending limits attached to a card
///
/// An empty allow-list means "no allow-list restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlSet {
    pub allowed_channels: Vec<String>,
    pub blocked_channels: Vec<String>,
    pub allowed_merchants: Vec<String>,
    pub blocked_merchants: Vec<String>,
    pub allowed_categories: Vec<String>,
    pub blocked_categories: Vec<String>,
    pub spending_limits: Vec<SpendingLimit>,
}

/// Card state as seen by the decision engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    pub card_id: CardId,
    pub funding_account_id: String,
    pub status: CardStatus,
    #[serde(default)]
    pub controls: ControlSet,
}

impl CardState {
    pub fn is_active(&self) -> bool {
        self.status == CardStatus::Active
    }
}

/// Card holder, keyed by the funding account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: String,
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Available balance reported by the issuer for a funding account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Minor currency units
    pub available: i64,
    pub currency: String,
}
