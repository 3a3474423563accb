//! Turns free-form user tokens into locations and display summaries.
//!
//! A token may be a chat identity, a commander name, a POI or a raw system
//! name; callers pass whatever the end user typed and the fallback order
//! here is the one canonical interpretation.

use std::cmp::Ordering;

use crate::edsm::models::partition_stations;
use crate::edsm::EdsmClient;
use crate::error::Result;
use crate::geometry::{Coordinate, ORIGIN};
use crate::registry::RegistryStore;

/// Round a light-year or light-second figure to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Report where a commander currently is.
///
/// `input` is resolved through the registry, so it accepts a chat identity
/// as well as a commander name. When EDSM has no usable position the reply
/// names the original input, not the resolved commander.
pub fn locate(registry: &RegistryStore, client: &EdsmClient, input: &str) -> Result<String> {
    let (commander, _) = registry.resolve_identity(input);
    let position = client.commander_position(registry, input, false)?;
    match position.and_then(|position| position.system) {
        Some(system) => Ok(format!("{commander} is at {system}")),
        None => Ok(format!("{input} could not be located")),
    }
}

/// Resolve a free-form token to galactic coordinates.
///
/// Tries, in order: a POI name, a known commander's current position, and a
/// raw system-name lookup. The first hit wins; `None` means all three came
/// up empty. Transport and decode failures still surface as errors.
pub fn resolve_coordinates(
    registry: &RegistryStore,
    client: &EdsmClient,
    token: &str,
) -> Result<Option<Coordinate>> {
    if let Some(poi) = registry.get_poi(token) {
        return Ok(Some(poi.coords));
    }

    let (_, known) = registry.resolve_identity(token);
    if known {
        let position = client.commander_position(registry, token, true)?;
        if let Some(coords) = position.and_then(|position| position.coordinates) {
            return Ok(Some(coords));
        }
    }

    client.system_coordinates(token)
}

/// Straight-line distance between two resolvable tokens.
///
/// Returns `-1.0` when either side cannot be resolved. The sentinel is a
/// compatibility contract: callers format the value straight into replies.
pub fn distance_between(
    registry: &RegistryStore,
    client: &EdsmClient,
    token_a: &str,
    token_b: &str,
) -> Result<f64> {
    let Some(coord_a) = resolve_coordinates(registry, client, token_a)? else {
        return Ok(-1.0);
    };
    let Some(coord_b) = resolve_coordinates(registry, client, token_b)? else {
        return Ok(-1.0);
    };
    Ok(coord_a.distance_to(&coord_b))
}

/// Assemble a multi-line summary of a system (or of the system backing a
/// POI). Every section is independently optional; only the ones EDSM
/// returned data for are rendered.
pub fn system_summary(
    registry: &RegistryStore,
    client: &EdsmClient,
    name: &str,
) -> Result<String> {
    let system_name = registry
        .get_poi(name)
        .map(|poi| poi.system.clone())
        .unwrap_or_else(|| name.to_string());

    let Some(detail) = client.system_detail(&system_name)? else {
        return Ok(format!(
            "Could not find information for system \"{system_name}\""
        ));
    };

    let bodies = client.bodies(&system_name)?;
    let stations = client.stations(&system_name)?;
    let traffic = client.traffic(&system_name)?;
    let deaths = client.deaths(&system_name)?;
    let estimated = client.estimated_value(&system_name)?;

    let mut lines = vec![format!("Information for {system_name}:")];

    if let Some(info) = &detail.information {
        let mut parts = Vec::new();
        if let Some(government) = &info.government {
            parts.push(government.clone());
        }
        if let Some(allegiance) = &info.allegiance {
            parts.push(allegiance.clone());
        }
        if let Some(faction) = &info.faction {
            parts.push(faction.clone());
        }
        if let Some(population) = info.population {
            parts.push(format!("pop. {population}"));
        }
        if !parts.is_empty() {
            lines.push(parts.join(" - "));
        }
    }

    if detail.require_permit {
        match &detail.permit_name {
            Some(permit) => lines.push(format!("Entry requires the {permit} permit.")),
            None => lines.push("Entry requires a permit.".to_string()),
        }
    }

    if let Some(star) = &detail.primary_star {
        if let Some(star_type) = &star.star_type {
            let mut line = format!("Primary Star: {star_type}");
            if star.is_scoopable {
                line.push_str(" (scoopable)");
            }
            lines.push(line);
        }
    }

    if let Some(bodies) = &bodies {
        if !bodies.is_empty() {
            lines.push(format!("{} known bodies in system.", bodies.len()));
        }
    }

    if let Some(stations) = stations {
        let (fixed, carriers) = partition_stations(stations);
        if !fixed.is_empty() {
            let mut line = format!("{} stations in system.", fixed.len());
            let closest = fixed
                .iter()
                .filter_map(|station| {
                    station
                        .distance_to_arrival
                        .map(|distance| (station, distance))
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            if let Some((station, distance)) = closest {
                line.push_str(&format!(
                    " Closest is {} ({} ls)",
                    station.name,
                    round2(distance)
                ));
            }
            lines.push(line);
        }
        if !carriers.is_empty() {
            lines.push(format!("{} fleet carriers in system.", carriers.len()));
        }
    }

    if let (Some(traffic), Some(deaths)) = (traffic, deaths) {
        lines.push(format!(
            "{}/{} CMDRs died in the system in the last 7 days.",
            deaths.week, traffic.week
        ));
    }

    if let Some(estimated) = estimated {
        lines.push(format!(
            "Estimated scan value: {} cr (mapped: {} cr)",
            estimated.estimated_value, estimated.estimated_value_mapped
        ));
    }

    if let Some(coords) = detail.coords {
        lines.push(format!(
            "Location: {} LY from Sol {}",
            round2(ORIGIN.distance_to(&coords)),
            coords
        ));
    }

    Ok(lines.join("\n"))
}
