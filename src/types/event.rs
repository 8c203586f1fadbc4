//! Webhook event kinds and their decoded payloads
//!
//! The processor sends four kinds of lifecycle events. Each kind has its own
//! payload shape; `TypedEvent` is the closed set the dispatcher routes on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::transaction::{CardId, NetworkMetadata, TransactionId, TransactionKind};

/// Status value the processor uses for an authorization awaiting a decision
pub const PENDING_MARKER: &str = "pending";

/// Closure/update status carrying an approval
pub const APPROVED_STATUS: &str = "approved";

/// Update status carrying a reversal
pub const REVERSED_STATUS: &str = "reversed";

/// Discriminator of a webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TransactionCreated,
    AuthorizationRequest,
    AuthorizationClosed,
    AuthorizationUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TransactionCreated => "card.transaction.created",
            EventKind::AuthorizationRequest => "card.authorization.request",
            EventKind::AuthorizationClosed => "card.authorization.closed",
            EventKind::AuthorizationUpdate => "card.authorization.update",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card.transaction.created" => Ok(EventKind::TransactionCreated),
            "card.authorization.request" => Ok(EventKind::AuthorizationRequest),
            "card.authorization.closed" => Ok(EventKind::AuthorizationClosed),
            "card.authorization.update" => Ok(EventKind::AuthorizationUpdate),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope metadata sent alongside every event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvelopeMetadata {
    #[serde(alias = "createdAt")]
    pub sent_at: Option<DateTime<Utc>>,
    pub event: String,
}

/// `card.transaction.created` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreatedEvent {
    pub id: TransactionId,
    #[serde(alias = "cardId")]
    pub card: CardId,
    #[serde(default, alias = "customerId")]
    pub customer: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    #[serde(default)]
    pub fees: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub network_data: NetworkMetadata,
}

/// `card.authorization.request` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequestEvent {
    pub id: TransactionId,
    #[serde(alias = "cardId")]
    pub card: CardId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub fees: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub network_data: NetworkMetadata,
}

impl AuthorizationRequestEvent {
    pub fn is_pending(&self) -> bool {
        self.status == PENDING_MARKER
    }

    pub fn total(&self) -> i64 {
        self.amount.saturating_add(self.fees)
    }
}

/// `card.authorization.closed` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationClosedEvent {
    pub id: TransactionId,
    #[serde(default, alias = "cardId")]
    pub card: CardId,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub fees: i64,
    #[serde(default)]
    pub decline_reason: Option<String>,
}

impl AuthorizationClosedEvent {
    pub fn is_approved(&self) -> bool {
        self.status == APPROVED_STATUS
    }
}

/// `card.authorization.update` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationUpdateEvent {
    pub id: TransactionId,
    #[serde(default, alias = "cardId")]
    pub card: CardId,
    pub status: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub fees: Option<i64>,
}

impl AuthorizationUpdateEvent {
    pub fn is_reversal(&self) -> bool {
        self.status == REVERSED_STATUS
    }
}

/// A decoded event, one variant per known kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedEvent {
    TransactionCreated(TransactionCreatedEvent),
    AuthorizationRequest(AuthorizationRequestEvent),
    AuthorizationClosed(AuthorizationClosedEvent),
    AuthorizationUpdate(AuthorizationUpdateEvent),
}

impl TypedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TypedEvent::TransactionCreated(_) => EventKind::TransactionCreated,
            TypedEvent::AuthorizationRequest(_) => EventKind::AuthorizationRequest,
            TypedEvent::AuthorizationClosed(_) => EventKind::AuthorizationClosed,
            TypedEvent::AuthorizationUpdate(_) => EventKind::AuthorizationUpdate,
        }
    }

    pub fn authorization_id(&self) -> &str {
        match self {
            TypedEvent::TransactionCreated(e) => &e.id,
            TypedEvent::AuthorizationRequest(e) => &e.id,
            TypedEvent::AuthorizationClosed(e) => &e.id,
            TypedEvent::AuthorizationUpdate(e) => &e.id,
        }
    }
}
