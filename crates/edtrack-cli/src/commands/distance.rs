//! Distance command handler.

use anyhow::Result;

use edtrack_lib::{distance_between, round2, EdsmClient, RegistryStore};

pub fn run(registry: &RegistryStore, client: &EdsmClient, from: &str, to: &str) -> Result<()> {
    // The -1 sentinel for an unresolvable endpoint is formatted into the
    // reply as-is, matching what chat users have come to expect.
    let distance = distance_between(registry, client, from, to)?;
    println!("{to} is {} LY from {from}", round2(distance));
    Ok(())
}
