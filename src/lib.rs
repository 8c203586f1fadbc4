//! Card Authorization Engine Library
//! # Overview
//!
//! This library decides card-authorization webhooks sent by a card processor:
//! it verifies each delivery's signature, decodes the event, and approves or
//! declines it against card state, issuer balances, spending controls and an
//! idempotent ledger.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (records, cards, events, decisions, errors)
//! - [`config`] - Engine configuration
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::signature`] - Webhook signature verification
//!   - [`core::dispatcher`] - Envelope decoding and routing
//!   - [`core::engine`] - Authorization decisions
//!   - [`core::controls`] - Spending-control evaluation
//!   - [`core::ledger`] - Idempotent transaction ledger
//! - [`io`] - Replay input, state fixtures and ledger export
//! - [`strategy`] - Sequential and concurrent replay
//!
//! # Event Kinds
//!
//! - **card.authorization.request**: decide a pending authorization
//! - **card.transaction.created**: record a settled capture
//! - **card.authorization.closed**: reconcile the final outcome
//! - **card.authorization.update**: apply a reversal
//!
//! # Transaction Lifecycle
//!
//! Records move `pending → approved | declined | reversed`, and an approved
//! record may still be reversed. `declined` and `reversed` are terminal.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::config::{ClosurePolicy, EngineConfig};
pub use crate::core::{
    AuthorizationEngine, EngineContext, InMemoryLedger, WebhookProcessor, WebhookReply,
};
pub use io::write_ledger_csv;
pub use types::{
    AuthError, AuthorizationDecision, ResponseCode, TransactionId, TransactionRecord,
    TransactionStatus, TypedEvent,
};
