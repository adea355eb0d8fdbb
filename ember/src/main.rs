//! Ember host binary.

use std::path::Path;

use ember::{EmberHost, logger};
use ember_core::CoreConfig;
use ember_core::config::CONFIG_FILE;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CoreConfig::load_or_create(Path::new(CONFIG_FILE))?;
    logger::init(&config.log_level)?;

    let mut host = EmberHost::new(config)?;

    let cancel_token = host.cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        log::info!("Received Ctrl-C, shutting down");
        cancel_token.cancel();
    });

    host.run().await;
    Ok(())
}
