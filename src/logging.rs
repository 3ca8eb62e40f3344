use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

pub const DEFAULT_FILTER: &str = "facewizard=info";

// env_filter = trace|debug|info|warn|error|off
// Logs go to stderr; stdout carries the per-face summary lines.
pub fn init_subscriber(default_filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| Error::Logging(err.to_string()))
}
