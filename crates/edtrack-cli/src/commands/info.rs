//! Info command handler: multi-section system summary.

use anyhow::Result;

use edtrack_lib::{system_summary, EdsmClient, RegistryStore};

pub fn run(registry: &RegistryStore, client: &EdsmClient, name: &str) -> Result<()> {
    println!("{}", system_summary(registry, client, name)?);
    Ok(())
}
