//! Concurrent replay strategy
//!
//! Reads deliveries in batches and decides each batch on a multi-threaded
//! runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, worker_threads)
//!     ├── AsyncReader (batch delivery reading)
//!     └── BatchProcessor (authorization partitioning + tokio tasks)
//!         └── Arc<WebhookProcessor>
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another, so an authorization whose
//! events span several batches still sees them in input order. Within a
//! batch, different authorizations are decided in parallel. Replies are
//! written in input order regardless.

use crate::core::WebhookProcessor;
use crate::io::async_reader::AsyncReader;
use crate::strategy::batch_processor::BatchProcessor;
use crate::strategy::{write_reply, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of deliveries per batch
    pub batch_size: usize,
    /// Number of runtime worker threads deciding a batch
    pub worker_threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                worker_threads,
                default = default.worker_threads,
                "Invalid worker_threads, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
        }
    }
}

/// Concurrent replay strategy
#[derive(Clone)]
pub struct AsyncProcessingStrategy {
    processor: Arc<WebhookProcessor>,
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(processor: Arc<WebhookProcessor>, config: BatchConfig) -> Self {
        Self { processor, config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            let mut reader = AsyncReader::new(BufReader::new(file));
            let processor = BatchProcessor::new(Arc::clone(&self.processor));

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                debug!(size = batch.len(), "Processing batch");
                // Finish the batch before reading the next one
                for reply in processor.process_batch(batch).await {
                    write_reply(output, &reply)?;
                }
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::signature::sign;
    use crate::io::fixture::StateFixture;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_jsonl(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn strategy(config: BatchConfig) -> AsyncProcessingStrategy {
        let (context, _) = StateFixture::default().into_context();
        let engine_config = EngineConfig::with_signing_key("key").unwrap();
        AsyncProcessingStrategy::new(
            Arc::new(WebhookProcessor::new(&engine_config, context)),
            config,
        )
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.worker_threads, num_cpus::get());
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let mut output = Vec::new();
        let result =
            strategy(BatchConfig::default()).process(Path::new("nonexistent.jsonl"), &mut output);
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_async_strategy_orders_replies_across_batches() {
        let bodies = [
            r#"{"event":"card.transaction.created","data":{"id":"auth_1","card":"card_1","type":"capture","amount":100}}"#,
            r#"{"event":"card.created","data":{}}"#,
            r#"{"event":"card.authorization.update","data":{"id":"auth_1","card":"card_1","status":"reversed"}}"#,
        ];
        let content: String = bodies
            .iter()
            .map(|body| {
                let line = serde_json::json!({
                    "signature": sign(body.as_bytes(), b"key"),
                    "body": body,
                });
                format!("{}\n", line)
            })
            .collect();
        let file = create_temp_jsonl(&content);
        let mut output = Vec::new();

        strategy(BatchConfig::new(2, 2))
            .process(file.path(), &mut output)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"status":200,"body":{"action":"approve","code":"success"}}"#,
                r#"{"status":200,"body":{"code":"success"}}"#,
                r#"{"status":200,"body":{"action":"approve","metadata":{"authorizationId":"auth_1"}}}"#,
            ]
        );
    }
}
