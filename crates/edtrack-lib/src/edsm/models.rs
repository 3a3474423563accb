//! Typed views over EDSM API payloads.
//!
//! Each struct mirrors one of the JSON shapes served by EDSM. Responses are
//! fetched as loose JSON first so the client can recognise the API's
//! "reachable but absent" shapes (empty arrays, non-100 message numbers)
//! before converting into these types.

use crate::geometry::Coordinate;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// EDSM timestamps look like `2021-08-01 12:34:56` and are always UTC.
pub(crate) mod edsm_date {
    use super::*;
    use serde::Deserializer;

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(naive.and_utc())
    }
}

/// Some EDSM endpoints serve an empty JSON array where an object would
/// otherwise be, for example `information` on an unpopulated system. This
/// maps anything that is not an object to `None`.
fn object_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_object() {
        serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    } else {
        Ok(None)
    }
}

/// Result of the `system` endpoint with coordinates requested.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemRecord {
    pub name: String,
    pub coords: Option<Coordinate>,
}

/// Full `system` endpoint response with coordinates, information and primary
/// star requested.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDetail {
    pub name: String,
    pub coords: Option<Coordinate>,
    #[serde(default, deserialize_with = "object_or_none")]
    pub information: Option<SystemInformation>,
    #[serde(default, deserialize_with = "object_or_none")]
    pub primary_star: Option<PrimaryStar>,
    #[serde(default)]
    pub require_permit: bool,
    pub permit_name: Option<String>,
}

/// The `information` block of a populated system. Unpopulated systems serve
/// an empty array in its place, which the client maps to `None` before this
/// type is ever deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInformation {
    pub allegiance: Option<String>,
    pub government: Option<String>,
    pub faction: Option<String>,
    pub faction_state: Option<String>,
    pub population: Option<u64>,
    pub security: Option<String>,
    pub economy: Option<String>,
}

/// The `primaryStar` block of the `system` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryStar {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub star_type: Option<String>,
    #[serde(default)]
    pub is_scoopable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StationsPayload {
    #[serde(default)]
    pub stations: Vec<Station>,
}

/// A single station from the `stations` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub name: String,
    #[serde(rename = "type")]
    pub station_type: String,
    /// Supercruise distance from the main star, in light seconds.
    #[serde(default)]
    pub distance_to_arrival: Option<f64>,
}

impl Station {
    /// Fleet carriers move around and are counted separately from the
    /// system's fixed stations.
    pub fn is_fleet_carrier(&self) -> bool {
        self.station_type == "Fleet Carrier"
    }
}

/// Split a station list into fixed stations and fleet carriers, in that
/// order.
pub fn partition_stations(stations: Vec<Station>) -> (Vec<Station>, Vec<Station>) {
    stations
        .into_iter()
        .partition(|station| !station.is_fleet_carrier())
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BodiesPayload {
    #[serde(default)]
    pub bodies: Vec<Body>,
}

/// A single body from the `bodies` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub name: String,
    #[serde(rename = "type")]
    pub body_type: String,
    pub sub_type: Option<String>,
    #[serde(default)]
    pub is_main_star: bool,
    #[serde(default)]
    pub is_scoopable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeathsPayload {
    pub deaths: Deaths,
}

/// Commander death tallies from the `deaths` endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Deaths {
    pub total: u64,
    pub week: u64,
    pub day: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TrafficPayload {
    pub traffic: Traffic,
}

/// Ship traffic tallies from the `traffic` endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Traffic {
    pub total: u64,
    pub week: u64,
    pub day: u64,
}

/// Exploration value estimate from the `estimated-value` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedValue {
    pub estimated_value: i64,
    pub estimated_value_mapped: i64,
    #[serde(default)]
    pub valuable_bodies: Vec<ValuableBody>,
}

/// A body worth mapping, listed by the `estimated-value` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuableBody {
    pub body_name: String,
    pub value_max: i64,
}

/// One hit from the `sphere-systems` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SphereSystem {
    pub name: String,
    #[serde(default)]
    pub distance: f64,
    pub coords: Option<Coordinate>,
}

/// Inventory classes served by the `get-materials` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryKind {
    /// Raw crafting materials.
    Materials,
    /// Commodity cargo hold.
    Cargo,
    /// Encoded data scans.
    Data,
}

impl InventoryKind {
    pub fn as_param(self) -> &'static str {
        match self {
            InventoryKind::Materials => "materials",
            InventoryKind::Cargo => "cargo",
            InventoryKind::Data => "data",
        }
    }
}

/// Last known position of a commander, from `get-position`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommanderPosition {
    /// Absent when the commander hides their flight log.
    pub system: Option<String>,
    pub date: Option<String>,
    pub coordinates: Option<Coordinate>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FlightLogPayload {
    #[serde(default)]
    pub logs: Vec<FlightLogEntry>,
}

/// One jump record from `get-logs`, newest first as EDSM serves them.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightLogEntry {
    pub system: String,
    #[serde(with = "edsm_date")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreditsPayload {
    #[serde(default)]
    pub credits: Vec<CreditsBalance>,
}

/// A balance snapshot from `get-credits`. The API returns the most recent
/// snapshot first.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsBalance {
    pub balance: i64,
    pub loan: Option<i64>,
    pub date: Option<String>,
}

/// Rank summary from `get-ranks`. `ranks_verbose` carries the human-readable
/// names ("Elite", "Tycoon") keyed by the same categories as `ranks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommanderRanks {
    #[serde(default)]
    pub ranks: BTreeMap<String, i64>,
    #[serde(default)]
    pub progress: BTreeMap<String, i64>,
    #[serde(default)]
    pub ranks_verbose: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MaterialsPayload {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub cargo: Vec<Material>,
    #[serde(default)]
    pub data: Vec<Material>,
}

impl MaterialsPayload {
    /// The API puts the inventory under a key named after the requested
    /// type, so exactly one of the three lists is populated.
    pub(crate) fn into_items(self) -> Vec<Material> {
        if !self.materials.is_empty() {
            self.materials
        } else if !self.cargo.is_empty() {
            self.cargo
        } else {
            self.data
        }
    }
}

/// One inventory line from `get-materials`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(rename = "type", default)]
    pub material_type: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "qty")]
    pub quantity: i64,
}

impl Material {
    /// Display label, whichever of the two naming fields the API filled in.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.material_type.as_deref())
            .unwrap_or("unknown")
    }
}
