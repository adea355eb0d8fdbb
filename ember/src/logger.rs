//! Log output for the host.
//!
//! Library crates log through the `log` facade. Those records are bridged into
//! `tracing` and printed by a `tracing-subscriber` formatter.

use tracing::subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Installs the global logger.
///
/// `default_filter` is used unless `RUST_LOG` is set.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    LogTracer::init()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .finish();
    subscriber::set_global_default(fmt_subscriber)?;

    Ok(())
}
