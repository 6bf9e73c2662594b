//! Tracing subscriber setup for the seeding binaries.

use std::io;

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber, honouring `RUST_LOG`.
///
/// Events go to stderr so command output on stdout stays machine-readable.
/// A second call keeps the first subscriber and logs a warning.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(error) = result {
        warn!(%error, "tracing init failed");
    }
}
