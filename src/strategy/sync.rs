//! Sequential replay strategy
//!
//! Feeds deliveries one at a time through the processor on a single-threaded
//! runtime. Each delivery is fully decided before the next one is read, so
//! the replay observes exactly the order of the input file.
//!
//! # Design
//!
//! The strategy only orchestrates:
//! - reading to `SyncReader` (iterator interface)
//! - deciding to `WebhookProcessor`
//! - output to `write_reply`

use crate::core::WebhookProcessor;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_reply, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Sequential replay strategy
#[derive(Clone)]
pub struct SyncProcessingStrategy {
    processor: Arc<WebhookProcessor>,
}

impl SyncProcessingStrategy {
    pub fn new(processor: Arc<WebhookProcessor>) -> Self {
        Self { processor }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;

        // Collaborator timeouts need the time driver
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            for result in reader {
                match result {
                    Ok(delivery) => {
                        let reply = self
                            .processor
                            .respond(delivery.raw_body(), &delivery.signature)
                            .await;
                        write_reply(output, &reply)?;
                    }
                    Err(e) => warn!(error = %e, "Skipping delivery"),
                }
            }
            Ok(())
        })
    }
}
