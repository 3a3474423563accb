//! Travel analytics command handlers: jump rate, average jump distance,
//! travel estimates and route reconstruction.

use anyhow::Result;

use edtrack_lib::{round2, EdsmClient, FlightAnalytics, RegistryStore};

pub fn jump_rate(
    registry: &RegistryStore,
    client: &EdsmClient,
    analytics: &FlightAnalytics,
    name: &str,
    idle_threshold: i64,
) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    let rate = analytics.jump_rate(client, registry, name, idle_threshold)?;
    println!("{commander} is making {} jumps per hour", round2(rate));
    Ok(())
}

pub fn average_jump(
    registry: &RegistryStore,
    client: &EdsmClient,
    analytics: &FlightAnalytics,
    name: &str,
) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    let average = analytics.average_jump_distance(client, registry, name)?;
    println!("{commander} jumps an average of {} LY", round2(average));
    Ok(())
}

pub fn eta(
    registry: &RegistryStore,
    client: &EdsmClient,
    analytics: &FlightAnalytics,
    name: &str,
    target: &str,
) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    let estimate = analytics.travel_estimate(client, registry, name, target)?;
    println!(
        "{target} is {} LY from {commander}: about {} jumps, {} hours at their recent pace",
        round2(estimate.distance),
        estimate.jumps,
        round2(estimate.hours)
    );
    Ok(())
}

pub fn route(
    registry: &RegistryStore,
    client: &EdsmClient,
    analytics: &FlightAnalytics,
    name: &str,
) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    let route = analytics.route_coordinates(client, registry, name)?;
    if route.is_empty() {
        println!("No plottable route for {commander}.");
        return Ok(());
    }
    println!("Recent route of {commander}, newest first:");
    for (system, coords) in route {
        println!("  {system} {coords}");
    }
    Ok(())
}
