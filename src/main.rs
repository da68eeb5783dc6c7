//! Stream Deck plugin executable.
//!
//! Exit codes: `0` when the Stream Deck host closed the connection, `1` on
//! any runtime failure, `2` on bad command-line arguments.

use std::process::ExitCode;

use meet_deck_bridge::{Bridge, BridgeConfig, Error};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Exit code for bad command-line arguments.
const USAGE_EXIT: u8 = 2;

/// Text printed when the arguments are rejected. Clap's own rendering is
/// passed through as-is.
fn usage_message(error: &Error) -> String {
    match error {
        Error::Config { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the default filter.
fn init_logging(debug: bool) {
    let default = if debug {
        "meet_deck_bridge=debug"
    } else {
        "meet_deck_bridge=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match BridgeConfig::from_args(std::env::args()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", usage_message(&e));
            return ExitCode::from(USAGE_EXIT);
        }
    };

    init_logging(config.debug);
    debug!(?config, "Starting with command line args");

    match Bridge::new(config).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Exiting");
            ExitCode::FAILURE
        }
    }
}
