//! POI command handlers: add, remove, show and list points of interest.

use anyhow::Result;
use clap::Subcommand;

use edtrack_lib::{round2, EdsmClient, PointOfInterest, RegistryStore, ORIGIN};

#[derive(Subcommand, Debug)]
pub enum PoiCommand {
    /// Add or overwrite a named POI anchored to a system.
    Add { name: String, system: String },
    /// Remove a POI by name (case-insensitive).
    Remove { name: String },
    /// Show one POI.
    Show { name: String },
    /// List all POIs, ordered by name.
    List,
}

pub fn run(registry: &mut RegistryStore, client: &EdsmClient, command: PoiCommand) -> Result<()> {
    match command {
        PoiCommand::Add { name, system } => {
            let poi = registry.add_poi(client, &name, &system)?;
            println!("Added {}", describe(&poi));
        }
        PoiCommand::Remove { name } => {
            if registry.remove_poi(&name)? {
                println!("Removed POI {name}");
            } else {
                println!("No POI named \"{name}\"");
            }
        }
        PoiCommand::Show { name } => {
            let poi = registry.require_poi(&name)?;
            println!("{}", describe(poi));
        }
        PoiCommand::List => {
            let pois: Vec<&PointOfInterest> = registry.list_pois().collect();
            if pois.is_empty() {
                println!("No POIs stored.");
            } else {
                println!("{} POIs:", pois.len());
                for poi in pois {
                    println!("  {}", describe(poi));
                }
            }
        }
    }
    Ok(())
}

fn describe(poi: &PointOfInterest) -> String {
    format!(
        "{} at {} {}, {} LY from Sol",
        poi.name,
        poi.system,
        poi.coords,
        round2(ORIGIN.distance_to(&poi.coords))
    )
}
