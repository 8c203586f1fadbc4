//! Batch processing with authorization-based partitioning
//!
//! This module provides the `BatchProcessor`, which decides a batch of
//! deliveries concurrently while keeping the lifecycle order of each
//! authorization.
//!
//! # Design
//!
//! Every delivery is first verified and decoded. Rejected deliveries get
//! their reply immediately. Decoded events are partitioned by authorization
//! id: events for different authorizations are decided concurrently, events
//! for the same authorization (request, capture, closure, update) are decided
//! sequentially in input order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<WebhookProcessor>  (shared verifier + engine)
//! ```
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be shared across tokio tasks; the
//! ledger it decides against serializes mutations per authorization id.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::core::{WebhookProcessor, WebhookReply};
use crate::io::Delivery;
use crate::types::{AuthorizationDecision, ResponseCode, TransactionId, TypedEvent};

/// A decoded event and its position in the batch
type Slotted = (usize, TypedEvent);

/// Batch processor with authorization-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    processor: Arc<WebhookProcessor>,
}

impl BatchProcessor {
    pub fn new(processor: Arc<WebhookProcessor>) -> Self {
        Self { processor }
    }

    /// Verify and decode a batch, partitioning decoded events by authorization id
    ///
    /// Returns the replies for deliveries rejected before dispatch, and the
    /// decoded events grouped by authorization id in input order.
    pub fn partition_by_authorization(
        &self,
        batch: Vec<Delivery>,
    ) -> (
        Vec<(usize, WebhookReply)>,
        HashMap<TransactionId, Vec<Slotted>>,
    ) {
        let mut rejected = Vec::new();
        let mut partitions: HashMap<TransactionId, Vec<Slotted>> = HashMap::new();

        for (slot, delivery) in batch.into_iter().enumerate() {
            match self
                .processor
                .verify_and_decode(delivery.raw_body(), &delivery.signature)
            {
                Ok(event) => partitions
                    .entry(event.authorization_id().to_string())
                    .or_default()
                    .push((slot, event)),
                Err(e) => rejected.push((slot, WebhookReply::from_outcome(Err(e)))),
            }
        }

        (rejected, partitions)
    }

    /// Decide one authorization's events sequentially
    pub async fn process_authorization_events(
        &self,
        events: Vec<Slotted>,
    ) -> Vec<(usize, WebhookReply)> {
        let mut replies = Vec::with_capacity(events.len());
        for (slot, event) in events {
            let outcome = self.processor.dispatch(event).await;
            replies.push((slot, WebhookReply::from_outcome(outcome)));
        }
        replies
    }

    /// Decide a batch, returning replies in input order
    pub async fn process_batch(&self, batch: Vec<Delivery>) -> Vec<WebhookReply> {
        let size = batch.len();
        let (rejected, partitions) = self.partition_by_authorization(batch);

        let mut slots: Vec<Option<WebhookReply>> = vec![None; size];
        for (slot, reply) in rejected {
            slots[slot] = Some(reply);
        }

        let mut owned_slots = Vec::with_capacity(partitions.len());
        let mut tasks = Vec::with_capacity(partitions.len());
        for (_authorization_id, events) in partitions {
            let processor = self.clone();
            owned_slots.push(events.iter().map(|(slot, _)| *slot).collect::<Vec<_>>());
            tasks.push(tokio::spawn(async move {
                processor.process_authorization_events(events).await
            }));
        }

        for (task_slots, joined) in owned_slots.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(replies) => {
                    for (slot, reply) in replies {
                        slots[slot] = Some(reply);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Task panicked");
                    // A lost task still answers every delivery it owned
                    for slot in task_slots {
                        slots[slot] = Some(WebhookReply {
                            status: 500,
                            body: AuthorizationDecision::decline(ResponseCode::Error),
                        });
                    }
                }
            }
        }

        slots.into_iter().flatten().collect()
    }
}
