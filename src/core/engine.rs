//! Authorization decision engine
//!
//! This module provides the `AuthorizationEngine`, which decides each
//! authorization lifecycle event against the card directory, the balance
//! oracle and the ledger.
//!
//! # Architecture
//!
//! ```text
//! AuthorizationEngine
//!     ├── Arc<dyn Ledger>         (idempotent transaction records)
//!     ├── Arc<dyn CardDirectory>  (read-only card and customer state)
//!     └── Arc<dyn BalanceOracle>  (issuer balance lookups)
//! ```
//!
//! # Decisions and failures
//!
//! Business-rule declines (`account-inactive`, `insufficient-funds`, ...) are
//! returned as `Ok` decisions. `Err` is reserved for deliveries that cannot
//! be decided: invalid amounts and infrastructure failures. Every
//! collaborator call is bounded by the configured timeout, and a timeout is
//! treated as a failure of that collaborator. Nothing here retries; the
//! processor redelivers.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::controls::{self, SpendAttempt, SpendTotals};
use super::traits::{BalanceOracle, CardDirectory, Ledger, UpdateOutcome};
use crate::config::{ClosurePolicy, EngineConfig};
use crate::types::error::Result;
use crate::types::{
    AuthError, AuthorizationClosedEvent, AuthorizationDecision, AuthorizationRequestEvent,
    AuthorizationUpdateEvent, CardState, LimitInterval, RecordPatch, ResponseCode,
    TransactionCreatedEvent, TransactionKind, TransactionRecord, TransactionStatus,
};

/// Collaborators handed to the engine
///
/// Passed in explicitly; the engine holds no process-wide state.
#[derive(Clone)]
pub struct EngineContext {
    pub ledger: Arc<dyn Ledger>,
    pub directory: Arc<dyn CardDirectory>,
    pub oracle: Arc<dyn BalanceOracle>,
}

impl EngineContext {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        directory: Arc<dyn CardDirectory>,
        oracle: Arc<dyn BalanceOracle>,
    ) -> Self {
        Self {
            ledger,
            directory,
            oracle,
        }
    }
}

/// Decides authorization lifecycle events
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct AuthorizationEngine {
    context: EngineContext,
    call_timeout: Duration,
    closure_policy: ClosurePolicy,
}

impl AuthorizationEngine {
    pub fn new(context: EngineContext, config: &EngineConfig) -> Self {
        Self {
            context,
            call_timeout: config.call_timeout,
            closure_policy: config.closure_policy,
        }
    }

    /// Await a collaborator call, failing with `Timeout` once the bound elapses
    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::timeout(
                operation,
                self.call_timeout.as_millis() as u64,
            )),
        }
    }

    /// Record a settled charge, or acknowledge a balance check
    ///
    /// A `check` touches nothing. A `capture` is persisted as `approved`
    /// under the processor's id; a redelivery finds the id taken and is
    /// acknowledged without being processed again.
    #[instrument(skip(self, event), fields(authorization_id = %event.id, card_id = %event.card))]
    pub async fn handle_transaction_created(
        &self,
        event: TransactionCreatedEvent,
    ) -> Result<AuthorizationDecision> {
        let accepted = AuthorizationDecision::approve().with_code(ResponseCode::Success);

        if event.kind == TransactionKind::Check {
            info!("Processing balance check");
            return Ok(accepted);
        }

        if event.amount < 0 || event.fees < 0 {
            error!(amount = event.amount, fees = event.fees, "Invalid amount or fees");
            return Err(AuthError::validation_failure(&event.id, event.amount, event.fees));
        }

        let record = TransactionRecord {
            id: event.id.clone(),
            card_id: event.card,
            customer_id: event.customer,
            amount: event.amount,
            fees: event.fees,
            currency: event.currency,
            kind: event.kind,
            channel: event.channel,
            network_metadata: event.network_data,
            status: TransactionStatus::Approved,
            created_at: Utc::now(),
            updated_at: None,
        };

        let inserted = self
            .bounded("ledger insert", self.context.ledger.insert_if_absent(record))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to store transaction"))?;

        if inserted {
            info!("Stored transaction");
        } else {
            warn!("Transaction already recorded, ignoring redelivery");
        }
        Ok(accepted)
    }

    /// Decide a pending authorization
    ///
    /// Checks run in a fixed order and the first failing one decides:
    /// pending marker, non-negative totals, card exists, card active,
    /// customer exists, balance lookup, sufficient funds (captures only),
    /// spending controls, duplicate delivery. Nothing is written to the ledger on this path.
    #[instrument(skip(self, event), fields(authorization_id = %event.id, card_id = %event.card))]
    pub async fn handle_authorization_request(
        &self,
        event: AuthorizationRequestEvent,
    ) -> Result<AuthorizationDecision> {
        if !event.is_pending() {
            warn!(status = %event.status, "Invalid authorization request status");
            return Ok(AuthorizationDecision::decline(ResponseCode::InvalidRequest));
        }

        if event.amount < 0 || event.fees < 0 {
            error!(amount = event.amount, fees = event.fees, "Invalid amount or fees");
            return Err(AuthError::validation_failure(&event.id, event.amount, event.fees));
        }

        let card = self
            .bounded("card lookup", self.context.directory.card(&event.card))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch card"))?;
        let Some(card) = card else {
            warn!("Card not found");
            return Ok(AuthorizationDecision::decline(ResponseCode::AccountNotFound));
        };

        if !card.is_active() {
            warn!(status = ?card.status, "Card is not active");
            return Ok(AuthorizationDecision::decline(ResponseCode::AccountInactive));
        }

        let account_id = card.funding_account_id.as_str();
        let customer = self
            .bounded(
                "customer lookup",
                self.context.directory.customer_by_account(account_id),
            )
            .await
            .inspect_err(|e| error!(account_id, error = %e, "Failed to fetch customer"))?;
        let Some(customer) = customer else {
            warn!(account_id, "Customer not found for funding account");
            return Ok(AuthorizationDecision::decline(ResponseCode::AccountNotFound));
        };

        let balance = self
            .bounded(
                "balance lookup",
                self.context.oracle.available_balance(account_id),
            )
            .await
            .inspect_err(|e| error!(account_id, error = %e, "Failed to fetch balance"))?;

        let total = event.total();
        if event.kind == TransactionKind::Capture && total > balance.available {
            warn!(total, available = balance.available, "Insufficient balance");
            return Ok(AuthorizationDecision::decline(ResponseCode::InsufficientFunds));
        }

        let spent = self.spend_totals(&card).await?;
        let attempt = SpendAttempt {
            channel: &event.channel,
            merchant: event.merchant.as_deref(),
            category: event.category.as_deref(),
            total,
        };
        if let Err(violation) = controls::evaluate(&card.controls, &attempt, &spent) {
            warn!(channel = %event.channel, %violation, "Spending control failed");
            return Ok(AuthorizationDecision::decline(ResponseCode::SpendingControl));
        }

        let existing = self
            .bounded("ledger lookup", self.context.ledger.find_by_id(&event.id))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to check for duplicate"))?;
        if existing.is_some() {
            warn!("Duplicate transaction");
            return Ok(AuthorizationDecision::duplicate());
        }

        info!(kind = event.kind.as_str(), total, "Authorization approved");
        Ok(AuthorizationDecision::approve().with_balance(balance.available, customer.name))
    }

    /// Reconcile a closed authorization against its ledger record
    ///
    /// An approved closure is authoritative: its amount and fees replace the
    /// recorded ones. Other closures decline and are applied to the record
    /// according to the configured `ClosurePolicy`.
    #[instrument(skip(self, event), fields(authorization_id = %event.id, card_id = %event.card))]
    pub async fn handle_authorization_closed(
        &self,
        event: AuthorizationClosedEvent,
    ) -> Result<AuthorizationDecision> {
        if event.amount < 0 || event.fees < 0 {
            error!(amount = event.amount, fees = event.fees, "Invalid amount or fees");
            return Err(AuthError::validation_failure(&event.id, event.amount, event.fees));
        }

        let original = match self.find_original(&event.id).await {
            Ok(record) => record,
            Err(AuthError::UnknownTransaction { .. }) => {
                warn!("Original transaction not found");
                return Ok(AuthorizationDecision::decline(ResponseCode::InvalidTransaction));
            }
            Err(e) => return Err(e),
        };

        if event.is_approved() {
            let patch = RecordPatch::status(TransactionStatus::Approved, Utc::now())
                .with_totals(event.amount, event.fees);
            return match self.apply_patch(&original.id, patch).await {
                Ok(_) => {
                    info!(
                        total = event.amount.saturating_add(event.fees),
                        "Authorization closed approved"
                    );
                    Ok(AuthorizationDecision::approve())
                }
                Err(AuthError::IllegalTransition { from, .. }) => {
                    warn!(%from, "Closure cannot approve transaction");
                    Ok(AuthorizationDecision::decline(ResponseCode::InvalidTransaction))
                }
                Err(e) => Err(e),
            };
        }

        let target = match self.closure_policy {
            ClosurePolicy::Ignore => None,
            ClosurePolicy::MarkDeclined => Some(TransactionStatus::Declined),
            ClosurePolicy::MarkReversed => Some(TransactionStatus::Reversed),
        };
        if let Some(target) = target {
            match self
                .apply_patch(&original.id, RecordPatch::status(target, Utc::now()))
                .await
            {
                Ok(_) => {}
                Err(AuthError::IllegalTransition { from, to, .. }) => {
                    warn!(%from, %to, "Closure status not applied to record");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            status = %event.status,
            reason = event.decline_reason.as_deref().unwrap_or(""),
            "Authorization closed without approval"
        );
        Ok(AuthorizationDecision::decline_silent())
    }

    /// Apply an authorization update, reversing the record on a reversal
    #[instrument(skip(self, event), fields(authorization_id = %event.id, card_id = %event.card))]
    pub async fn handle_authorization_update(
        &self,
        event: AuthorizationUpdateEvent,
    ) -> Result<AuthorizationDecision> {
        let amount = event.amount.unwrap_or(0);
        let fees = event.fees.unwrap_or(0);
        if amount < 0 || fees < 0 {
            error!(amount, fees, "Invalid amount or fees");
            return Err(AuthError::validation_failure(&event.id, amount, fees));
        }

        let original = match self.find_original(&event.id).await {
            Ok(record) => record,
            Err(AuthError::UnknownTransaction { .. }) => {
                warn!("Original transaction not found");
                return Ok(AuthorizationDecision::decline(ResponseCode::InvalidTransaction));
            }
            Err(e) => return Err(e),
        };

        if !event.is_reversal() {
            info!(status = %event.status, "Authorization update acknowledged");
            return Ok(AuthorizationDecision::approve());
        }

        let patch = RecordPatch::status(TransactionStatus::Reversed, Utc::now());
        match self.apply_patch(&original.id, patch).await {
            Ok(UpdateOutcome::Applied(record)) => {
                info!(total = record.total(), "Transaction reversed");
                Ok(AuthorizationDecision::approve())
            }
            Ok(UpdateOutcome::Unchanged(_)) => {
                warn!("Transaction already reversed, ignoring redelivery");
                Ok(AuthorizationDecision::approve())
            }
            Err(AuthError::IllegalTransition { from, .. }) => {
                warn!(%from, "Transaction cannot be reversed");
                Ok(AuthorizationDecision::decline(ResponseCode::InvalidTransaction))
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the record a closure/update refers to
    async fn find_original(&self, id: &str) -> Result<TransactionRecord> {
        self.bounded("ledger lookup", self.context.ledger.find_by_id(id))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch original transaction"))?
            .ok_or_else(|| AuthError::unknown_transaction(id))
    }

    async fn apply_patch(&self, id: &str, patch: RecordPatch) -> Result<UpdateOutcome> {
        self.bounded("ledger update", self.context.ledger.update_status(id, patch))
            .await
            .inspect_err(|e| {
                if e.is_infrastructure() {
                    error!(error = %e, "Failed to update transaction");
                }
            })
    }

    /// Aggregate the card's recorded spend for each limited interval
    async fn spend_totals(&self, card: &CardState) -> Result<SpendTotals> {
        let now = Utc::now();
        let mut totals = SpendTotals::new();
        for limit in &card.controls.spending_limits {
            if limit.interval == LimitInterval::PerAuthorization
                || totals.contains_key(&limit.interval)
            {
                continue;
            }
            let since = limit.interval.window().map(|window| now - window);
            let spent = self
                .bounded(
                    "spend aggregation",
                    self.context.ledger.aggregate_spend(&card.card_id, since),
                )
                .await
                .inspect_err(|e| error!(error = %e, "Failed to aggregate spend"))?;
            totals.insert(limit.interval, spent);
        }
        Ok(totals)
    }
}
