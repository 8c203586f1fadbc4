//! Error types for the authorization engine
//!
//! Business-rule declines are not errors: they are decisions carried in an
//! `AuthorizationDecision`. The variants here are the failures that stop a
//! delivery from being decided normally.
//!
//! # Error Categories
//!
//! - **Rejected deliveries**: bad signature, malformed body, invalid amounts (400-class)
//! - **Accepted but ignored**: unknown event kinds (acknowledged with `success`)
//! - **Reconciliation**: unknown transaction, illegal lifecycle transition
//! - **Infrastructure**: balance oracle, card directory or ledger unavailable, call timeouts (500-class)

use thiserror::Error;

use super::decision::{AuthorizationDecision, ResponseCode};
use super::transaction::TransactionStatus;

/// Main error type for the authorization engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The declared signature does not match the body
    ///
    /// Raised before any decoding takes place.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// The envelope or the kind-specific payload could not be decoded
    #[error("Malformed payload: {reason}")]
    MalformedPayload {
        /// Description of the decoding failure
        reason: String,
    },

    /// Event kind outside the known set
    #[error("Unknown event kind '{kind}'")]
    UnknownEventKind {
        /// The unrecognized discriminator
        kind: String,
    },

    /// A closure/update referenced an id absent from the ledger
    #[error("Transaction {id} not found")]
    UnknownTransaction {
        /// Authorization id that was not found
        id: String,
    },

    /// A capture carried a negative amount or fee
    #[error("Invalid amount {amount} or fees {fees} for transaction {id}")]
    ValidationFailure {
        id: String,
        amount: i64,
        fees: i64,
    },

    /// The balance lookup failed
    #[error("Balance lookup failed for account {account}: {reason}")]
    OracleUnavailable { account: String, reason: String },

    /// The card/customer store failed (not a miss, an outage)
    #[error("Card directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },

    /// The ledger's atomic guard failed unexpectedly
    ///
    /// Never raised for an ordinary duplicate delivery.
    #[error("Ledger conflict on transaction {id}: {reason}")]
    LedgerConflict { id: String, reason: String },

    /// A status change not allowed by the lifecycle
    #[error("Illegal transition for transaction {id}: {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// A bounded collaborator call did not complete in time
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },
}

/// How a failed delivery is reported back to the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: acknowledged, body carries the outcome
    Accepted,
    /// 4xx: the delivery itself is unacceptable
    Client,
    /// 5xx: infrastructure failure, the processor will redeliver
    Server,
}

impl StatusClass {
    pub fn http_status(&self) -> u16 {
        match self {
            StatusClass::Accepted => 200,
            StatusClass::Client => 400,
            StatusClass::Server => 500,
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        AuthError::MalformedPayload {
            reason: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl AuthError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        AuthError::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn unknown_event_kind(kind: &str) -> Self {
        AuthError::UnknownEventKind {
            kind: kind.to_string(),
        }
    }

    pub fn unknown_transaction(id: &str) -> Self {
        AuthError::UnknownTransaction { id: id.to_string() }
    }

    pub fn validation_failure(id: &str, amount: i64, fees: i64) -> Self {
        AuthError::ValidationFailure {
            id: id.to_string(),
            amount,
            fees,
        }
    }

    pub fn oracle_unavailable(account: &str, reason: impl Into<String>) -> Self {
        AuthError::OracleUnavailable {
            account: account.to_string(),
            reason: reason.into(),
        }
    }

    pub fn directory_unavailable(reason: impl Into<String>) -> Self {
        AuthError::DirectoryUnavailable {
            reason: reason.into(),
        }
    }

    pub fn ledger_conflict(id: &str, reason: impl Into<String>) -> Self {
        AuthError::LedgerConflict {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn illegal_transition(id: &str, from: TransactionStatus, to: TransactionStatus) -> Self {
        AuthError::IllegalTransition {
            id: id.to_string(),
            from,
            to,
        }
    }

    pub fn timeout(operation: &str, after_ms: u64) -> Self {
        AuthError::Timeout {
            operation: operation.to_string(),
            after_ms,
        }
    }

    /// Whether this is an infrastructure failure rather than a bad delivery
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AuthError::OracleUnavailable { .. }
                | AuthError::DirectoryUnavailable { .. }
                | AuthError::LedgerConflict { .. }
                | AuthError::Timeout { .. }
        )
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            AuthError::SignatureInvalid
            | AuthError::MalformedPayload { .. }
            | AuthError::ValidationFailure { .. } => StatusClass::Client,
            AuthError::UnknownEventKind { .. }
            | AuthError::UnknownTransaction { .. }
            | AuthError::IllegalTransition { .. } => StatusClass::Accepted,
            AuthError::OracleUnavailable { .. }
            | AuthError::DirectoryUnavailable { .. }
            | AuthError::LedgerConflict { .. }
            | AuthError::Timeout { .. } => StatusClass::Server,
        }
    }

    /// Body returned in place of a normal decision
    ///
    /// Infrastructure failures always decline; nothing here approves.
    pub fn fallback_response(&self) -> AuthorizationDecision {
        match self {
            AuthError::SignatureInvalid => AuthorizationDecision::rejected("Invalid Signature"),
            AuthError::MalformedPayload { .. } => {
                AuthorizationDecision::rejected("Invalid Request")
            }
            AuthError::ValidationFailure { .. } => {
                AuthorizationDecision::decline(ResponseCode::Error)
            }
            AuthError::UnknownEventKind { .. } => AuthorizationDecision::accepted(),
            AuthError::UnknownTransaction { .. } | AuthError::IllegalTransition { .. } => {
                AuthorizationDecision::decline(ResponseCode::InvalidTransaction)
            }
            AuthError::OracleUnavailable { .. }
            | AuthError::DirectoryUnavailable { .. }
            | AuthError::LedgerConflict { .. }
            | AuthError::Timeout { .. } => AuthorizationDecision::decline(ResponseCode::Error),
        }
    }
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, AuthError>;
