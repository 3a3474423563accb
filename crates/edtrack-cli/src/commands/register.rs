//! Register command handler: bind a chat identity to a commander.

use anyhow::{Context, Result};

use edtrack_lib::RegistryStore;

pub fn run(
    registry: &mut RegistryStore,
    identity: &str,
    commander: &str,
    api_key: Option<String>,
) -> Result<()> {
    let stored_key = api_key.is_some();
    registry
        .bind(identity, commander, api_key)
        .context("failed to persist the registry")?;
    println!("o7 Greetings CMDR {commander}! Registered identity \"{identity}\".");
    if stored_key {
        println!("API key stored. Consider clearing your shell history so it doesn't linger.");
    }
    Ok(())
}
