// Deploy pipeline
pub mod deploy;
pub mod diff;
pub mod plan;

// Local tooling
pub mod doctor;
pub mod manifest;

use anyhow::{Context as _, Result};
use objstore::Client;

use crate::config::DeployConfig;

/// Object store client for the configured destination
pub fn client(config: &DeployConfig) -> Result<Client> {
    let destination = config.destination()?;
    Client::new(destination, &config.s3cmd)
        .with_context(|| format!("Could not open destination {destination}"))
}
