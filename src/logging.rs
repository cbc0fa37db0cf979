/// Logging setup for the binaries.
///
/// The library only emits `tracing` events; binaries call `init_logging`
/// once at startup. `RUST_LOG` overrides the default filter, e.g.
/// `RUST_LOG=winds_service=debug` to see every stored chart.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "winds_service=info";

/// Installs a formatted subscriber on stderr. Safe to call more than once;
/// later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
