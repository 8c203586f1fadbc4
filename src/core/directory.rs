//! In-memory card directory and balance oracle
//!
//! Provisioning owns cards and customers; the decision engine only reads
//! them. These implementations hold that state in `DashMap`s so lookups from
//! concurrent deliveries never contend on a global lock. They back the replay
//! CLI and the tests; a deployment would implement the same traits over its
//! database and the issuer's balance endpoint.

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{BalanceOracle, CardDirectory};
use crate::types::error::Result;
use crate::types::{AccountBalance, AuthError, CardId, CardState, Customer};

/// Thread-safe lookup of cards by id and customers by funding account
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    cards: DashMap<CardId, CardState>,
    customers_by_account: DashMap<String, Customer>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a card
    pub fn upsert_card(&self, card: CardState) {
        self.cards.insert(card.card_id.clone(), card);
    }

    /// Register or replace the customer owning `customer.account_id`
    pub fn upsert_customer(&self, customer: Customer) {
        self.customers_by_account
            .insert(customer.account_id.clone(), customer);
    }
}

#[async_trait]
impl CardDirectory for InMemoryDirectory {
    async fn card(&self, card_id: &str) -> Result<Option<CardState>> {
        Ok(self.cards.get(card_id).map(|entry| entry.value().clone()))
    }

    async fn customer_by_account(&self, account_id: &str) -> Result<Option<Customer>> {
        Ok(self
            .customers_by_account
            .get(account_id)
            .map(|entry| entry.value().clone()))
    }
}

/// Balance oracle answering from a fixed table
///
/// An account without an entry is reported as an oracle failure, the same
/// way the issuer API reports an unknown account.
#[derive(Debug, Default)]
pub struct StaticBalanceOracle {
    balances: DashMap<String, AccountBalance>,
}

impl StaticBalanceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, account_id: impl Into<String>, balance: AccountBalance) {
        self.balances.insert(account_id.into(), balance);
    }
}

#[async_trait]
impl BalanceOracle for StaticBalanceOracle {
    async fn available_balance(&self, account_id: &str) -> Result<AccountBalance> {
        if account_id.is_empty() {
            return Err(AuthError::oracle_unavailable(account_id, "account id is required"));
        }
        self.balances
            .get(account_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AuthError::oracle_unavailable(account_id, "no balance for account"))
    }
}
