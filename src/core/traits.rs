//! Collaborator traits for the ledger, the card directory and the balance oracle
//!
//! The engine only talks to its collaborators through these traits, so the
//! in-memory implementations in this crate can be swapped for database or
//! HTTP-backed ones without touching decision logic. Every method may
//! suspend; the engine bounds each call with the configured timeout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::error::Result;
use crate::types::{AccountBalance, CardState, Customer, RecordPatch, TransactionRecord};

/// Result of applying a patch to a ledger record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The patch was applied; carries the record after the change
    Applied(TransactionRecord),
    /// The record already was in the target terminal status; nothing changed
    Unchanged(TransactionRecord),
}

impl UpdateOutcome {
    pub fn record(&self) -> &TransactionRecord {
        match self {
            UpdateOutcome::Applied(record) | UpdateOutcome::Unchanged(record) => record,
        }
    }
}

/// Idempotent keyed store of transaction records
///
/// `insert_if_absent` and `update_status` are the only mutation points and
/// must each be a single atomic check-and-set per id.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Insert a record unless its id is already present
    ///
    /// Returns `Ok(false)` for an existing id; that is not an error.
    async fn insert_if_absent(&self, record: TransactionRecord) -> Result<bool>;

    /// Look up a record by id
    async fn find_by_id(&self, id: &str) -> Result<Option<TransactionRecord>>;

    /// Apply a status patch, validating the lifecycle transition under the key's lock
    ///
    /// Fails with `UnknownTransaction` for a missing id and `IllegalTransition`
    /// when the current status may not move to `patch.status`.
    async fn update_status(&self, id: &str, patch: RecordPatch) -> Result<UpdateOutcome>;

    /// Sum of `amount + fees` of a card's live records created at or after `since`
    ///
    /// `None` sums over the card's whole history.
    async fn aggregate_spend(&self, card_id: &str, since: Option<DateTime<Utc>>) -> Result<i64>;
}

/// Read-only lookup of provisioning state
#[async_trait]
pub trait CardDirectory: Send + Sync {
    async fn card(&self, card_id: &str) -> Result<Option<CardState>>;

    /// Customer owning a funding account
    async fn customer_by_account(&self, account_id: &str) -> Result<Option<Customer>>;
}

/// Available-balance lookup against the issuer
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Fails with `OracleUnavailable` when the balance cannot be obtained
    async fn available_balance(&self, account_id: &str) -> Result<AccountBalance>;
}
