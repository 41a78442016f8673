//! Clinic Server Binary

use anyhow::{bail, Result};
use clinic_server::{
    config::{load_config, validate_config},
    logging, Server,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    logging::init(&config.logging)?;

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    info!("Starting Clinic Server v{}", env!("CARGO_PKG_VERSION"));

    Server::new(config).run().await?;

    info!("Server shutdown complete");
    Ok(())
}
