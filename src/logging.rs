use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Installs a stderr subscriber. `RUST_LOG` wins over `default_level`.
///
/// Library code only emits events; binaries call this once at startup.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("repair_router={default_level},warn")))
        .map_err(|e| Error::invalid_input(format!("log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Io(std::io::Error::other(e)))
}
