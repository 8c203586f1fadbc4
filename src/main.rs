//! Card Authorization Engine CLI
//!
//! Replays recorded webhook deliveries through the decision engine.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --state state.json --signing-key KEY deliveries.jsonl > replies.jsonl
//! cargo run -- --state state.json --strategy async --worker-threads 8 deliveries.jsonl
//! WEBHOOK_SIGNING_KEY=KEY cargo run -- --state state.json --ledger-csv ledger.csv deliveries.jsonl
//! ```
//!
//! Each reply is written to stdout as `{"status": <u16>, "body": <response>}`,
//! one line per delivery in input order. Logs go to stderr; set `RUST_LOG`
//! to change the level.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid configuration, unreadable state or deliveries, write failure)

use card_auth_engine::cli;
use card_auth_engine::io::{load_state, write_ledger_csv};
use card_auth_engine::strategy;
use card_auth_engine::WebhookProcessor;
use std::fs::File;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        tracing::error!(error = %e, "Replay failed");
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), String> {
    let config = args.to_engine_config().map_err(|e| e.to_string())?;
    let (context, ledger) = load_state(&args.state_file)?.into_context();
    let processor = Arc::new(WebhookProcessor::new(&config, context));

    let strategy = {
        let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), processor, batch_config)
    };

    let mut output = std::io::stdout().lock();
    strategy.process(&args.input_file, &mut output)?;

    if let Some(path) = &args.ledger_csv {
        let mut file = File::create(path)
            .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
        write_ledger_csv(&ledger.snapshot(), &mut file)?;
        tracing::info!(records = ledger.len(), path = %path.display(), "Ledger exported");
    }

    Ok(())
}
