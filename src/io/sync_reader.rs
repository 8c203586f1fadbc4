//! Synchronous delivery reader with iterator interface
//!
//! Streams recorded deliveries from a JSON-lines file, one line at a time.
//! Line parsing is delegated to the delivery_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Unreadable or invalid lines are yielded as `Err` with their line number
//! - Blank lines are skipped

use crate::io::delivery_format::{parse_delivery_line, Delivery};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Synchronous reader over a replay file
#[derive(Debug)]
pub struct SyncReader {
    lines: Lines<BufReader<File>>,
    line_num: usize,
}

impl SyncReader {
    /// Open a replay file for streaming iteration
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        Ok(Self {
            lines: BufReader::with_capacity(8 * 1024, file).lines(),
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Delivery, String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_num += 1;

            let parsed = line
                .map_err(|e| format!("read error: {}", e))
                .and_then(|line| parse_delivery_line(&line));
            match parsed {
                Ok(Some(delivery)) => return Some(Ok(delivery)),
                Ok(None) => continue,
                Err(e) => return Some(Err(format!("Line {}: {}", self.line_num, e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_jsonl(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.jsonl"));
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_iterates_deliveries() {
        let content = "{\"signature\":\"aa\",\"body\":\"{}\"}\n\
                       {\"signature\":\"bb\",\"body\":\"[]\"}\n";
        let file = create_temp_jsonl(content);

        let deliveries: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].as_ref().unwrap().signature, "aa");
        assert_eq!(deliveries[1].as_ref().unwrap().body, "[]");
    }

    #[test]
    fn test_sync_reader_skips_blank_lines_and_reports_line_numbers() {
        let content = "{\"signature\":\"aa\",\"body\":\"{}\"}\n\
                       \n\
                       not json\n\
                       {\"signature\":\"cc\",\"body\":\"{}\"}\n";
        let file = create_temp_jsonl(content);

        let deliveries: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(deliveries.len(), 3);
        assert!(deliveries[0].is_ok());
        let error = deliveries[1].as_ref().unwrap_err();
        assert!(error.contains("Line 3"));
        assert_eq!(deliveries[2].as_ref().unwrap().signature, "cc");
    }

    #[test]
    fn test_sync_reader_empty_file() {
        let file = create_temp_jsonl("");
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
