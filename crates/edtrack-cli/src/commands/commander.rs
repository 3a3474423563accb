//! Commander profile command handlers: balance, ranks and inventories.

use anyhow::Result;
use clap::ValueEnum;

use edtrack_lib::edsm::models::InventoryKind;
use edtrack_lib::{EdsmClient, RegistryStore};

/// Inventory classes selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryArg {
    /// Raw crafting materials.
    Materials,
    /// Commodity cargo hold.
    Cargo,
    /// Encoded data scans.
    Data,
}

impl From<InventoryArg> for InventoryKind {
    fn from(arg: InventoryArg) -> Self {
        match arg {
            InventoryArg::Materials => InventoryKind::Materials,
            InventoryArg::Cargo => InventoryKind::Cargo,
            InventoryArg::Data => InventoryKind::Data,
        }
    }
}

impl InventoryArg {
    fn label(self) -> &'static str {
        match self {
            InventoryArg::Materials => "materials",
            InventoryArg::Cargo => "cargo",
            InventoryArg::Data => "encoded data",
        }
    }
}

pub fn balance(registry: &RegistryStore, client: &EdsmClient, name: &str) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    match client.credits(registry, name)? {
        Some(snapshot) => {
            let mut line = format!(
                "{commander} has {} credits",
                group_thousands(snapshot.balance)
            );
            if let Some(loan) = snapshot.loan.filter(|loan| *loan > 0) {
                line.push_str(&format!(" (and a {} credit loan)", group_thousands(loan)));
            }
            println!("{line}");
        }
        None => println!(
            "{commander} must be an unidentified Thargoid; EDSM has no credit record for them."
        ),
    }
    Ok(())
}

/// Rank categories in their customary display order.
const RANK_CATEGORIES: [&str; 6] = ["Combat", "Trade", "Explore", "CQC", "Federation", "Empire"];

pub fn ranks(registry: &RegistryStore, client: &EdsmClient, name: &str) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    match client.ranks(registry, name)? {
        Some(ranks) => {
            println!("Ranks for {commander}:");
            for category in RANK_CATEGORIES {
                if let Some(rank) = ranks.ranks_verbose.get(category) {
                    println!("  {category}: {rank}");
                }
            }
        }
        None => println!("EDSM has no rank record for {commander}."),
    }
    Ok(())
}

pub fn materials(
    registry: &RegistryStore,
    client: &EdsmClient,
    name: &str,
    kind: InventoryArg,
) -> Result<()> {
    let (commander, _) = registry.resolve_identity(name);
    match client.inventory(registry, name, kind.into())? {
        Some(items) if !items.is_empty() => {
            println!("{} of {commander}:", capitalize(kind.label()));
            for item in items {
                println!("  {} x{}", item.label(), item.quantity);
            }
        }
        _ => println!("EDSM has no {} record for {commander}.", kind.label()),
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Group a credit amount into thousands for display, e.g. `1234567` into
/// `1,234,567`.
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    let len = digits.len();
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
