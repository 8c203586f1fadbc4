//! Engine configuration
//!
//! Everything the engine needs from the outside world besides its
//! collaborators: the webhook signing key, the bound on each collaborator
//! call, and what to do with a closure that did not approve.

use clap::ValueEnum;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default bound on each directory/oracle/ledger call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(2000);

/// Handling of `card.authorization.closed` events whose status is not `approved`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ClosurePolicy {
    /// Leave the ledger record untouched
    Ignore,
    /// Move the record to `declined` when the transition is legal
    #[default]
    MarkDeclined,
    /// Move the record to `reversed` when the transition is legal
    MarkReversed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("webhook signing key must not be empty")]
    EmptySigningKey,
}

/// Configuration handed to the webhook processor
#[derive(Clone)]
pub struct EngineConfig {
    signing_key: Vec<u8>,
    pub call_timeout: Duration,
    pub closure_policy: ClosurePolicy,
}

impl EngineConfig {
    /// Create a configuration, falling back to the default timeout on zero
    pub fn new(
        signing_key: impl Into<Vec<u8>>,
        call_timeout: Duration,
        closure_policy: ClosurePolicy,
    ) -> Result<Self, ConfigError> {
        let signing_key = signing_key.into();
        if signing_key.is_empty() {
            return Err(ConfigError::EmptySigningKey);
        }

        let call_timeout = if call_timeout.is_zero() {
            tracing::warn!(
                default_ms = DEFAULT_CALL_TIMEOUT.as_millis() as u64,
                "Invalid call timeout (0ms), using default"
            );
            DEFAULT_CALL_TIMEOUT
        } else {
            call_timeout
        };

        Ok(Self {
            signing_key,
            call_timeout,
            closure_policy,
        })
    }

    /// Configuration with default timeout and closure policy
    pub fn with_signing_key(signing_key: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        Self::new(signing_key, DEFAULT_CALL_TIMEOUT, ClosurePolicy::default())
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }
}

// Keep the key out of debug output.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("signing_key", &format_args!("<{} bytes>", self.signing_key.len()))
            .field("call_timeout", &self.call_timeout)
            .field("closure_policy", &self.closure_policy)
            .finish()
    }
}
