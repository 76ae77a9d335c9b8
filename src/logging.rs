// src/logging.rs

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Logs go to stderr; `RUST_LOG` overrides
/// the default level.
pub fn init(verbose: bool) {
    let default_level = if verbose { "git_almanac=debug" } else { "git_almanac=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a second init (e.g. from tests) leaves the first subscriber in place
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
