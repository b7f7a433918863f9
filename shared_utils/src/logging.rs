//! Tracing subscriber bootstrap for the workspace binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// `default_directive` is used when `RUST_LOG` is unset or unparsable
/// (e.g. `"info"` or `"kline_player=debug"`). Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
