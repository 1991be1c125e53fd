//! Logging initialization.
//!
//! The crate logs through `tracing`, with a `log` bridge installed for the
//! handful of modules that still emit `log` records.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `verbose` lowers the default level to DEBUG; `RUST_LOG` overrides either
/// way. Output goes to stderr so stdout stays free for the `--dump` JSON.
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool, json_format: bool) {
    // Errors only when a bridge/subscriber is already installed.
    let _ = tracing_log::LogTracer::init();

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .try_init();
    }
}
