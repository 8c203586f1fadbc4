//! Core authorization logic
//!
//! This module contains the decision-making components:
//! - `traits` - Async ports for the ledger, card directory and balance oracle
//! - `signature` - Webhook signature verification
//! - `controls` - Channel/merchant/category and spending-limit evaluation
//! - `ledger` - In-memory idempotent ledger
//! - `directory` - In-memory card directory and balance oracle
//! - `engine` - Authorization decision orchestration
//! - `dispatcher` - Envelope decoding and routing to the engine

pub mod controls;
pub mod directory;
pub mod dispatcher;
pub mod engine;
pub mod ledger;
pub mod signature;
pub mod traits;

pub use directory::{InMemoryDirectory, StaticBalanceOracle};
pub use dispatcher::{WebhookProcessor, WebhookReply};
pub use engine::{AuthorizationEngine, EngineContext};
pub use ledger::InMemoryLedger;
pub use signature::SignatureVerifier;
pub use traits::{BalanceOracle, CardDirectory, Ledger, UpdateOutcome};
