//! Subcommand implementations.

pub mod config;
pub mod kill;
pub mod list;
pub mod parent;

use anyhow::Result;
use portreaper_core::{ConfigStore, PortReaper};

/// Build an engine from the user's settings file.
pub async fn engine() -> Result<PortReaper> {
    let store = ConfigStore::new()?;
    Ok(PortReaper::load(&store).await?)
}
