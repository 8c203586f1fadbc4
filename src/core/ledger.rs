//! Thread-safe in-memory ledger
//!
//! `InMemoryLedger` stores transaction records in a `DashMap` keyed by
//! authorization id. DashMap shards its locks, so deliveries for different
//! ids proceed in parallel while the two mutation points for one id,
//! `insert_if_absent` and `update_status`, each run under that key's lock:
//! two concurrent captures for the same id cannot both insert, and a status
//! check-and-set cannot interleave with another.
//!
//! Records are never removed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::traits::{Ledger, UpdateOutcome};
use crate::types::error::Result;
use crate::types::{AuthError, RecordPatch, TransactionId, TransactionRecord};

/// Thread-safe ledger of transaction records
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: DashMap<TransactionId, TransactionRecord>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Seed a ledger with existing records; later duplicates are ignored
    pub fn with_records(records: impl IntoIterator<Item = TransactionRecord>) -> Self {
        let ledger = Self::new();
        for record in records {
            ledger
                .records
                .entry(record.id.clone())
                .or_insert(record);
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of every record, sorted by id
    pub fn snapshot(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    fn insert_sync(&self, record: TransactionRecord) -> bool {
        let mut inserted = false;
        self.records.entry(record.id.clone()).or_insert_with(|| {
            inserted = true;
            record
        });
        inserted
    }

    fn update_sync(&self, id: &str, patch: RecordPatch) -> Result<UpdateOutcome> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| AuthError::unknown_transaction(id))?;
        let record = entry.value_mut();

        if !record.status.can_transition_to(patch.status) {
            // Re-applying a terminal status is a redelivery, not a conflict.
            if record.status == patch.status {
                return Ok(UpdateOutcome::Unchanged(record.clone()));
            }
            return Err(AuthError::illegal_transition(id, record.status, patch.status));
        }

        record.status = patch.status;
        if let Some(amount) = patch.amount {
            record.amount = amount;
        }
        if let Some(fees) = patch.fees {
            record.fees = fees;
        }
        record.updated_at = Some(patch.updated_at);
        Ok(UpdateOutcome::Applied(record.clone()))
    }

    fn aggregate_sync(&self, card_id: &str, since: Option<DateTime<Utc>>) -> i64 {
        self.records
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|record| record.card_id == card_id && record.status.counts_towards_spend())
            .filter(|record| since.map_or(true, |since| record.created_at >= since))
            .fold(0i64, |sum, record| sum.saturating_add(record.total()))
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn insert_if_absent(&self, record: TransactionRecord) -> Result<bool> {
        Ok(self.insert_sync(record))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TransactionRecord>> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_status(&self, id: &str, patch: RecordPatch) -> Result<UpdateOutcome> {
        self.update_sync(id, patch)
    }

    async fn aggregate_spend(&self, card_id: &str, since: Option<DateTime<Utc>>) -> Result<i64> {
        Ok(self.aggregate_sync(card_id, since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NetworkMetadata, TransactionKind, TransactionStatus};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn record(id: &str, card: &str, amount: i64, status: TransactionStatus) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            card_id: card.to_string(),
            customer_id: "cus_1".to_string(),
            amount,
            fees: 100,
            currency: "NGN".to_string(),
            kind: TransactionKind::Capture,
            channel: "pos".to_string(),
            network_metadata: NetworkMetadata::default(),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let ledger = InMemoryLedger::new();
        let original = record("auth_1", "card_1", 5000, TransactionStatus::Approved);

        assert!(ledger.insert_if_absent(original.clone()).await.unwrap());

        let found = ledger.find_by_id("auth_1").await.unwrap().unwrap();
        assert_eq!(found, original);
        assert!(ledger.find_by_id("auth_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_not_an_error() {
        let ledger = InMemoryLedger::new();
        let first = record("auth_1", "card_1", 5000, TransactionStatus::Approved);
        let second = record("auth_1", "card_2", 9999, TransactionStatus::Pending);

        assert!(ledger.insert_if_absent(first).await.unwrap());
        assert!(!ledger.insert_if_absent(second).await.unwrap());

        // First occurrence wins
        let found = ledger.find_by_id("auth_1").await.unwrap().unwrap();
        assert_eq!(found.card_id, "card_1");
        assert_eq!(found.amount, 5000);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_totals_but_not_identity() {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_if_absent(record("auth_1", "card_1", 5000, TransactionStatus::Pending))
            .await
            .unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();

        let outcome = ledger
            .update_status(
                "auth_1",
                RecordPatch::status(TransactionStatus::Approved, now).with_totals(4800, 50),
            )
            .await
            .unwrap();

        let updated = outcome.record();
        assert!(matches!(outcome, UpdateOutcome::Applied(_)));
        assert_eq!(updated.status, TransactionStatus::Approved);
        assert_eq!(updated.amount, 4800);
        assert_eq!(updated.fees, 50);
        assert_eq!(updated.updated_at, Some(now));
        assert_eq!(updated.id, "auth_1");
        assert_eq!(updated.card_id, "card_1");
    }

    #[tokio::test]
    async fn test_update_unknown_transaction() {
        let ledger = InMemoryLedger::new();
        let result = ledger
            .update_status(
                "auth_404",
                RecordPatch::status(TransactionStatus::Approved, Utc::now()),
            )
            .await;
        assert_eq!(result, Err(AuthError::unknown_transaction("auth_404")));
    }

    #[tokio::test]
    async fn test_illegal_transition_leaves_record_untouched() {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_if_absent(record("auth_1", "card_1", 5000, TransactionStatus::Declined))
            .await
            .unwrap();

        let result = ledger
            .update_status(
                "auth_1",
                RecordPatch::status(TransactionStatus::Approved, Utc::now()).with_totals(1, 1),
            )
            .await;

        assert_eq!(
            result,
            Err(AuthError::illegal_transition(
                "auth_1",
                TransactionStatus::Declined,
                TransactionStatus::Approved
            ))
        );
        let unchanged = ledger.find_by_id("auth_1").await.unwrap().unwrap();
        assert_eq!(unchanged.amount, 5000);
        assert_eq!(unchanged.updated_at, None);
    }

    #[tokio::test]
    async fn test_reapplying_terminal_status_is_unchanged() {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_if_absent(record("auth_1", "card_1", 5000, TransactionStatus::Reversed))
            .await
            .unwrap();

        let outcome = ledger
            .update_status(
                "auth_1",
                RecordPatch::status(TransactionStatus::Reversed, Utc::now()),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Unchanged(_)));
        assert_eq!(outcome.record().updated_at, None);
    }

    #[tokio::test]
    async fn test_aggregate_spend_window_and_status() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut old = record("auth_old", "card_1", 1000, TransactionStatus::Approved);
        old.created_at = base - Duration::days(3);
        let recent = record("auth_new", "card_1", 2000, TransactionStatus::Pending);
        let reversed = record("auth_rev", "card_1", 7000, TransactionStatus::Reversed);
        let other_card = record("auth_other", "card_2", 4000, TransactionStatus::Approved);
        let ledger = InMemoryLedger::with_records([old, recent, reversed, other_card]);

        let since_yesterday = ledger
            .aggregate_spend("card_1", Some(base - Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(since_yesterday, 2100);

        let all_time = ledger.aggregate_spend("card_1", None).await.unwrap();
        assert_eq!(all_time, 3200);
    }

    #[test]
    fn test_concurrent_inserts_for_same_id_insert_once() {
        use std::thread;

        let ledger = Arc::new(InMemoryLedger::new());
        let mut handles = vec![];
        for i in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger.insert_sync(record(
                    "auth_1",
                    "card_1",
                    1000 + i,
                    TransactionStatus::Approved,
                ))
            }));
        }

        let inserted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_concurrent_updates_to_different_transactions() {
        use std::thread;

        let ledger = Arc::new(InMemoryLedger::with_records((0..10).map(|i| {
            record(&format!("auth_{}", i), "card_1", 100, TransactionStatus::Pending)
        })));

        let mut handles = vec![];
        for i in 0..10 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger
                    .update_sync(
                        &format!("auth_{}", i),
                        RecordPatch::status(TransactionStatus::Approved, Utc::now()),
                    )
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for record in ledger.snapshot() {
            assert_eq!(record.status, TransactionStatus::Approved);
        }
    }
}
