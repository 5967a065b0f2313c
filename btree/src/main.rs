#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code so bad input never panics the shell.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::io;

use btree::config::ShellConfig;
use btree::shell::Shell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Logs go to stderr so they never interleave with the menu on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load configuration from environment variables
    let config = match ShellConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: min_degree={}, max_nodes={:?}",
        config.min_degree,
        config.max_nodes
    );

    let stdin = io::stdin();
    let mut shell = match Shell::from_config(&config, stdin.lock(), io::stdout()) {
        Ok(shell) => shell,
        Err(e) => {
            tracing::error!("Failed to create tree: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = shell.run() {
        tracing::error!("Shell I/O error: {e}");
        std::process::exit(1);
    }
}
