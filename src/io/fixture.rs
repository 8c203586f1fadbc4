//! Replay state loaded from JSON
//!
//! ```json
//! {
//!   "cards": [{"cardId": "card_1", "fundingAccountId": "acc_1", "status": "active", "controls": {}}],
//!   "customers": [{"customerId": "cus_1", "accountId": "acc_1", "name": "Ada Obi"}],
//!   "balances": {"acc_1": {"available": 10000, "currency": "NGN"}},
//!   "ledger": []
//! }
//! ```
//!
//! Every section is optional. `ledger` seeds records that were decided before
//! the replay starts.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::core::{EngineContext, InMemoryDirectory, InMemoryLedger, StaticBalanceOracle};
use crate::types::{AccountBalance, CardState, Customer, TransactionRecord};

/// Provisioning and ledger state for a replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateFixture {
    pub cards: Vec<CardState>,
    pub customers: Vec<Customer>,
    pub balances: BTreeMap<String, AccountBalance>,
    pub ledger: Vec<TransactionRecord>,
}

impl StateFixture {
    /// Build the in-memory collaborators holding this state
    ///
    /// The ledger is returned separately so it can be exported after the replay.
    pub fn into_context(self) -> (EngineContext, Arc<InMemoryLedger>) {
        let directory = InMemoryDirectory::new();
        for card in self.cards {
            directory.upsert_card(card);
        }
        for customer in self.customers {
            directory.upsert_customer(customer);
        }

        let oracle = StaticBalanceOracle::new();
        for (account_id, balance) in self.balances {
            oracle.set_balance(account_id, balance);
        }

        let ledger = Arc::new(InMemoryLedger::with_records(self.ledger));
        let context = EngineContext::new(ledger.clone(), Arc::new(directory), Arc::new(oracle));
        (context, ledger)
    }
}

/// Load replay state from a JSON file
pub fn load_state(path: &Path) -> Result<StateFixture, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open state file '{}': {}", path.display(), e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid state file '{}': {}", path.display(), e))
}
