//! Transaction-related types for the authorization engine
//!
//! This module defines the ledger's unit of state (`TransactionRecord`), its
//! lifecycle status and the patch applied by closure/update events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization identifier assigned by the card processor
///
/// Used as the ledger key and as the idempotency key for redeliveries.
pub type TransactionId = String;

/// Card identifier assigned by the card processor
pub type CardId = String;

/// Kind of card transaction
///
/// A `check` is a pre-authorization balance inquiry and never reserves funds.
/// A `capture` moves money and is recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Check,
    Capture,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Check => "check",
            TransactionKind::Capture => "capture",
        }
    }
}

/// Lifecycle state of a transaction record
///
/// Legal transitions:
///
/// ```text
/// pending  ──► approved | declined | reversed
/// approved ──► approved (closure refresh) | reversed
/// declined, reversed: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Declined,
    Reversed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Declined => "declined",
            TransactionStatus::Reversed => "reversed",
        }
    }

    /// Whether a record in this status may move to `next`
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Declined)
                | (Pending, Reversed)
                | (Approved, Approved)
                | (Approved, Reversed)
        )
    }

    /// Whether the status still counts towards a card's aggregated spend
    pub fn counts_towards_spend(self) -> bool {
        matches!(self, TransactionStatus::Pending | TransactionStatus::Approved)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque network fields passed through from the processor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkMetadata {
    pub card_acceptor_name_location: String,
    pub terminal_id: String,
    pub network: String,
    #[serde(alias = "txnReference")]
    pub reference: String,
    pub rrn: String,
    pub stan: String,
}

/// Ledger record of a card transaction
///
/// Once created, `id`, `card_id`, `customer_id`, `kind` are never rewritten.
/// `amount` and `fees` are only replaced by an approved closure, which is
/// authoritative over the original estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub card_id: CardId,
    pub customer_id: String,
    /// Minor currency units
    pub amount: i64,
    /// Minor currency units
    pub fees: i64,
    pub currency: String,
    pub kind: TransactionKind,
    pub channel: String,
    #[serde(default)]
    pub network_metadata: NetworkMetadata,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// Amount plus fees, saturating rather than wrapping
    pub fn total(&self) -> i64 {
        self.amount.saturating_add(self.fees)
    }
}

/// Mutation applied to an existing record by `Ledger::update_status`
///
/// `status` is applied only if the current status may transition to it.
/// `amount`/`fees` are replaced when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPatch {
    pub status: TransactionStatus,
    pub amount: Option<i64>,
    pub fees: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl RecordPatch {
    pub fn status(status: TransactionStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status,
            amount: None,
            fees: None,
            updated_at,
        }
    }

    pub fn with_totals(mut self, amount: i64, fees: i64) -> Self {
        self.amount = Some(amount);
        self.fees = Some(fees);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pending_to_approved(TransactionStatus::Pending, TransactionStatus::Approved, true)]
    #[case::pending_to_declined(TransactionStatus::Pending, TransactionStatus::Declined, true)]
    #[case::pending_to_reversed(TransactionStatus::Pending, TransactionStatus::Reversed, true)]
    #[case::approved_refresh(TransactionStatus::Approved, TransactionStatus::Approved, true)]
    #[case::approved_to_reversed(TransactionStatus::Approved, TransactionStatus::Reversed, true)]
    #[case::approved_to_declined(TransactionStatus::Approved, TransactionStatus::Declined, false)]
    #[case::approved_to_pending(TransactionStatus::Approved, TransactionStatus::Pending, false)]
    #[case::declined_is_terminal(TransactionStatus::Declined, TransactionStatus::Approved, false)]
    #[case::reversed_is_terminal(TransactionStatus::Reversed, TransactionStatus::Approved, false)]
    #[case::reversed_reapplied(TransactionStatus::Reversed, TransactionStatus::Reversed, false)]
    fn test_transition_table(
        #[case] from: TransactionStatus,
        #[case] to: TransactionStatus,
        #[case] legal: bool,
    ) {
        assert_eq!(from.can_transition_to(to), legal);
    }

    #[test]
    fn test_network_metadata_accepts_txn_reference_alias() {
        let json = r#"{"rrn":"123","stan":"456","network":"VISA","txnReference":"ref-1"}"#;
        let metadata: NetworkMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.reference, "ref-1");
        assert_eq!(metadata.terminal_id, "");
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Capture).unwrap(),
            "\"capture\""
        );
    }
}
