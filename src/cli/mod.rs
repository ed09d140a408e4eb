pub mod actions;
pub mod commands;
pub mod dispatch;

use actions::Action;
use anyhow::Result;

/// Parse the command line, install the tracing subscriber, and return the
/// action to run.
///
/// # Errors
///
/// Returns an error if required arguments are missing or invalid.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dispatch::handler(&matches)
}
