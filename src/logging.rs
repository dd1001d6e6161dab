//! Diagnostic logging setup.
//!
//! Library code logs through `tracing` macros; only the binary installs a
//! subscriber. Logs go to stderr so stdout stays reserved for command
//! output. `RUST_LOG` takes precedence over the `--verbose` default.

use tracing_subscriber::EnvFilter;

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "cropline=debug" } else { "cropline=info" }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
