//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Ledger records and their lifecycle status
//! - `card`: Card state, controls, customers and balances
//! - `event`: Webhook event kinds and decoded payloads
//! - `decision`: Decisions returned to the processor
//! - `error`: Error types for the authorization engine

pub mod card;
pub mod decision;
pub mod error;
pub mod event;
pub mod transaction;

pub use card::{
    AccountBalance, CardState, CardStatus, ControlSet, Customer, LimitInterval, SpendingLimit,
};
pub use decision::{Action, AuthorizationDecision, ResponseCode, ResponseMetadata};
pub use error::{AuthError, StatusClass};
pub use event::{
    AuthorizationClosedEvent, AuthorizationRequestEvent, AuthorizationUpdateEvent,
    EnvelopeMetadata, EventKind, TransactionCreatedEvent, TypedEvent,
};
pub use transaction::{
    CardId, NetworkMetadata, RecordPatch, TransactionId, TransactionKind, TransactionRecord,
    TransactionStatus,
};
