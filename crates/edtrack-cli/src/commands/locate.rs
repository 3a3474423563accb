//! Locate command handler: report where a commander currently is.

use anyhow::Result;

use edtrack_lib::{locate, EdsmClient, RegistryStore};

pub fn run(registry: &RegistryStore, client: &EdsmClient, name: &str) -> Result<()> {
    println!("{}", locate(registry, client, name)?);
    Ok(())
}
