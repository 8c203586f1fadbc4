use crate::config::{ClosurePolicy, ConfigError, EngineConfig, DEFAULT_CALL_TIMEOUT};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay signed card-authorization webhooks through the decision engine
#[derive(Parser, Debug)]
#[command(name = "card-auth-engine")]
#[command(
    about = "Replay signed card-authorization webhooks through the decision engine",
    long_about = None
)]
pub struct CliArgs {
    /// Recorded deliveries, one `{"signature", "body"}` JSON object per line
    #[arg(value_name = "DELIVERIES", help = "Path to the JSON-lines deliveries file")]
    pub input_file: PathBuf,

    /// Cards, customers, balances and seeded ledger records
    #[arg(
        long = "state",
        value_name = "STATE",
        help = "Path to the JSON state file"
    )]
    pub state_file: PathBuf,

    #[arg(
        long = "signing-key",
        env = "WEBHOOK_SIGNING_KEY",
        value_name = "KEY",
        hide_env_values = true,
        help = "Webhook HMAC signing key"
    )]
    pub signing_key: String,

    #[arg(
        long = "timeout-ms",
        env = "AUTH_CALL_TIMEOUT_MS",
        value_name = "MS",
        default_value_t = DEFAULT_CALL_TIMEOUT.as_millis() as u64,
        help = "Bound on each card directory, balance or ledger call"
    )]
    pub timeout_ms: u64,

    #[arg(
        long = "closure-policy",
        env = "AUTH_CLOSURE_POLICY",
        value_name = "POLICY",
        value_enum,
        default_value_t = ClosurePolicy::MarkDeclined,
        help = "What a non-approved closure does to the ledger record"
    )]
    pub closure_policy: ClosurePolicy,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' for sequential or 'async' for concurrent"
    )]
    pub strategy: StrategyType,

    /// Number of deliveries per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of deliveries per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads deciding a batch (async mode only)
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Runtime worker threads deciding a batch (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    #[arg(
        long = "ledger-csv",
        value_name = "PATH",
        help = "Write the final ledger as CSV to this path"
    )]
    pub ledger_csv: Option<PathBuf>,
}

/// Available replay strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.worker_threads.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.worker_threads.unwrap_or(default.worker_threads),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create the engine configuration
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        EngineConfig::new(
            self.signing_key.as_bytes(),
            Duration::from_millis(self.timeout_ms),
            self.closure_policy,
        )
    }
}
