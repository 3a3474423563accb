//! Radius command handler: systems within a spherical shell of a location.

use anyhow::Result;

use edtrack_lib::{resolve_coordinates, round2, EdsmClient, RegistryStore};

/// Cap on how many hits are printed; sphere queries near the bubble can
/// return thousands of systems.
const DISPLAY_LIMIT: usize = 50;

pub fn run(
    registry: &RegistryStore,
    client: &EdsmClient,
    name: &str,
    radius: f64,
    min_radius: f64,
) -> Result<()> {
    let Some(center) = resolve_coordinates(registry, client, name)? else {
        println!("{name} could not be located");
        return Ok(());
    };

    let mut systems = client
        .systems_in_sphere(&center, min_radius, radius)?
        .unwrap_or_default();
    if systems.is_empty() {
        println!("No known systems within {radius} LY of {name}.");
        return Ok(());
    }

    systems.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    println!("{} systems within {radius} LY of {name}:", systems.len());
    for system in systems.iter().take(DISPLAY_LIMIT) {
        println!("  {} ({} LY)", system.name, round2(system.distance));
    }
    if systems.len() > DISPLAY_LIMIT {
        println!("  ...and {} more.", systems.len() - DISPLAY_LIMIT);
    }
    Ok(())
}
