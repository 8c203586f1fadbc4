//! Replay strategy module
//!
//! This module defines the Strategy pattern for replaying recorded webhook
//! deliveries through a `WebhookProcessor`. Sequential and concurrent
//! implementations can be selected at runtime; both emit one reply line per
//! valid delivery, in input order.

use crate::cli::StrategyType;
use crate::core::WebhookProcessor;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod batch_processor;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use batch_processor::BatchProcessor;
pub use sync::SyncProcessingStrategy;

/// Replay strategy for recorded deliveries
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the deliveries in `input_path` and write one reply per line to `output`
    ///
    /// # Arguments
    ///
    /// * `input_path` - JSON-lines file of recorded deliveries
    /// * `output` - Writer receiving `{"status", "body"}` lines
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed (individual deliveries may have failed)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// Lines that are not valid deliveries are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a replay strategy for the given type
///
/// # Arguments
///
/// * `strategy_type` - Sequential or concurrent replay
/// * `processor` - Processor shared by every delivery
/// * `config` - Batch configuration for concurrent replay (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    processor: Arc<WebhookProcessor>,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(processor)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(processor, config))
        }
    }
}

/// Write one reply as a JSON line
pub(crate) fn write_reply(
    output: &mut dyn Write,
    reply: &crate::core::WebhookReply,
) -> Result<(), String> {
    serde_json::to_writer(&mut *output, reply)
        .map_err(|e| format!("Failed to serialize reply: {}", e))?;
    output
        .write_all(b"\n")
        .map_err(|e| format!("Failed to write reply: {}", e))
}
