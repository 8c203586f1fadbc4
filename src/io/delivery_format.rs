//! Recorded webhook deliveries
//!
//! A replay file holds one delivery per line as JSON:
//!
//! ```text
//! {"signature": "<lowercase hex HMAC-SHA512>", "body": "<raw request body>"}
//! ```
//!
//! `body` is kept as the exact string that was signed; it is never
//! re-serialized before verification.

use serde::{Deserialize, Serialize};

/// One recorded webhook delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub signature: String,
    pub body: String,
}

impl Delivery {
    pub fn raw_body(&self) -> &[u8] {
        self.body.as_bytes()
    }
}

/// Parse one replay line
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_delivery_line(line: &str) -> Result<Option<Delivery>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("Invalid delivery: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_body_kept_verbatim() {
        let line = r#"{"signature":"ab12","body":"{\"event\": \"card.created\",  \"data\":{}}"}"#;
        let delivery = parse_delivery_line(line).unwrap().unwrap();
        assert_eq!(delivery.signature, "ab12");
        assert_eq!(delivery.body, r#"{"event": "card.created",  "data":{}}"#);
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("   \t")]
    fn test_blank_lines_skipped(#[case] line: &str) {
        assert_eq!(parse_delivery_line(line).unwrap(), None);
    }

    #[rstest]
    #[case::not_json("signature=ab12")]
    #[case::missing_body(r#"{"signature":"ab12"}"#)]
    #[case::body_not_string(r#"{"signature":"ab12","body":{"event":"x"}}"#)]
    fn test_invalid_lines(#[case] line: &str) {
        let error = parse_delivery_line(line).unwrap_err();
        assert!(error.starts_with("Invalid delivery"));
    }
}
