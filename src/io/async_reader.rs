//! Asynchronous delivery reader with batch interface
//!
//! # Design
//!
//! The AsyncReader uses:
//! - tokio's buffered line reader for streaming input
//! - Batch reading so the replay strategy can decide a batch concurrently
//!
//! # Architecture
//!
//! ```text
//! JSON lines → AsyncReader → Batches of Deliveries
//!                  ↓
//!          delivery_format module
//! ```

use crate::io::delivery_format::{parse_delivery_line, Delivery};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

/// Asynchronous reader over a replay stream
pub struct AsyncReader<R: AsyncBufRead + Unpin> {
    lines: Lines<R>,
    line_num: usize,
}

impl<R: AsyncBufRead + Unpin> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    /// Read up to `batch_size` deliveries
    ///
    /// Invalid lines are logged and skipped. Returns an empty vector at end
    /// of input or on a read error.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Delivery> {
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    self.line_num += 1;
                    match parse_delivery_line(&line) {
                        Ok(Some(delivery)) => batch.push(delivery),
                        Ok(None) => {}
                        Err(e) => warn!(line = self.line_num, error = %e, "Skipping delivery"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(line = self.line_num + 1, error = %e, "Failed to read deliveries");
                    break;
                }
            }
        }

        batch
    }
}
