//! Blocking client for the EDSM REST API.
//!
//! The client owns request composition (base URL, category prefix, identity
//! and credential parameters) and normalizes responses at the boundary, so
//! nothing outside this module inspects raw EDSM payloads. Two failure
//! channels are kept apart on purpose: transport and decode problems are hard
//! errors, while "EDSM is reachable but has no data" surfaces as `Ok(None)`.

pub mod models;

use std::collections::HashSet;
use std::env;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::Coordinate;
use crate::registry::RegistryStore;

use models::{
    BodiesPayload, Body, CommanderPosition, CommanderRanks, CreditsBalance, CreditsPayload,
    Deaths, DeathsPayload, EstimatedValue, FlightLogEntry, FlightLogPayload, InventoryKind,
    Material, MaterialsPayload, SphereSystem, Station, StationsPayload, SystemDetail,
    SystemRecord, Traffic, TrafficPayload,
};

const DEFAULT_BASE_URL: &str = "https://www.edsm.net";
const BASE_URL_ENV: &str = "EDTRACK_EDSM_URL";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// EDSM caps one batch coordinate call at this many system names.
pub const BATCH_COORDINATE_LIMIT: usize = 100;

/// Message number EDSM uses for a successful commander or log response.
const MSGNUM_OK: i64 = 100;

/// Endpoint families on EDSM, each served under its own URL prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCategory {
    /// `api-v1`: system, systems and sphere queries.
    General,
    /// `api-system-v1`: per-system detail feeds (bodies, stations, traffic).
    System,
    /// `api-commander-v1`: commander profile data.
    Commander,
    /// `api-logs-v1`: flight logs and positions.
    Logs,
}

impl ApiCategory {
    fn path_prefix(self) -> &'static str {
        match self {
            ApiCategory::General => "api-v1",
            ApiCategory::System => "api-system-v1",
            ApiCategory::Commander => "api-commander-v1",
            ApiCategory::Logs => "api-logs-v1",
        }
    }
}

/// Blocking EDSM API client.
#[derive(Debug)]
pub struct EdsmClient {
    http: Client,
    base_url: String,
}

impl EdsmClient {
    /// Build a client against the public EDSM instance, or against the URL
    /// in `EDTRACK_EDSM_URL` when set.
    pub fn new() -> Result<Self> {
        let base_url =
            env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    /// Build a client against a specific base URL. Tests point this at a
    /// local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET against `endpoint` in `category` and parse the JSON body.
    ///
    /// Network failures, HTTP error statuses and non-JSON bodies are hard
    /// errors and are never retried. Absence of data is not detected here;
    /// the accessors check for their expected key and map absence to `None`.
    pub fn request(
        &self,
        category: ApiCategory,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let url = format!("{}/{}/{}", self.base_url, category.path_prefix(), endpoint);
        debug!(%url, params = params.len(), "EDSM request");
        let response = self
            .http
            .get(&url)
            .query(params)
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|err| {
            warn!(%url, payload = %truncate_payload(&body), "EDSM returned an undecodable body");
            Error::Decode {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        })
    }

    /// Resolve `identity` through the registry, inject the commander name
    /// and any stored credential into the parameters, and delegate to
    /// [`request`](Self::request).
    pub fn request_as_commander(
        &self,
        category: ApiCategory,
        endpoint: &str,
        registry: &RegistryStore,
        identity: &str,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let (commander, _) = registry.resolve_identity(identity);
        let mut params = params.to_vec();
        params.push(("commanderName", commander.clone()));
        if let Some(credential) = registry.credential_for(&commander) {
            params.push(("apiKey", credential.to_string()));
        }
        self.request(category, endpoint, &params)
    }

    /// Coordinates of a named system, or `None` when EDSM does not know it.
    pub fn system_coordinates(&self, system_name: &str) -> Result<Option<Coordinate>> {
        let value = self.request(
            ApiCategory::General,
            "system",
            &[
                ("systemName", system_name.to_string()),
                ("showCoordinates", "1".to_string()),
            ],
        )?;
        match value.get("coords") {
            Some(coords) if coords.is_object() => {
                Ok(Some(decode_value("system", coords.clone())?))
            }
            _ => {
                debug!(system = system_name, "no coordinates known for system");
                Ok(None)
            }
        }
    }

    /// Full system record with coordinates, controlling-faction information
    /// and primary star, or `None` for an unknown system.
    pub fn system_detail(&self, system_name: &str) -> Result<Option<SystemDetail>> {
        let value = self.request(
            ApiCategory::General,
            "system",
            &[
                ("systemName", system_name.to_string()),
                ("showCoordinates", "1".to_string()),
                ("showInformation", "1".to_string()),
                ("showPrimaryStar", "1".to_string()),
                ("showPermit", "1".to_string()),
            ],
        )?;
        if value.get("name").is_none() {
            debug!(system = system_name, "system not known to EDSM");
            return Ok(None);
        }
        Ok(Some(decode_value("system", value)?))
    }

    /// Celestial bodies of a system, or `None` when EDSM has no body data.
    pub fn bodies(&self, system_name: &str) -> Result<Option<Vec<Body>>> {
        let value = self.request(
            ApiCategory::System,
            "bodies",
            &[("systemName", system_name.to_string())],
        )?;
        if value.get("bodies").is_none() {
            debug!(system = system_name, "no body data for system");
            return Ok(None);
        }
        let payload: BodiesPayload = decode_value("bodies", value)?;
        Ok(Some(payload.bodies))
    }

    /// Stations of a system, fleet carriers included, or `None` when EDSM
    /// has no station data. Use [`models::partition_stations`] to separate
    /// fixed stations from carriers.
    pub fn stations(&self, system_name: &str) -> Result<Option<Vec<Station>>> {
        let value = self.request(
            ApiCategory::System,
            "stations",
            &[("systemName", system_name.to_string())],
        )?;
        if value.get("stations").is_none() {
            debug!(system = system_name, "no station data for system");
            return Ok(None);
        }
        let payload: StationsPayload = decode_value("stations", value)?;
        Ok(Some(payload.stations))
    }

    /// Ship traffic tallies for a system.
    pub fn traffic(&self, system_name: &str) -> Result<Option<Traffic>> {
        let value = self.request(
            ApiCategory::System,
            "traffic",
            &[("systemName", system_name.to_string())],
        )?;
        match value.get("traffic") {
            Some(traffic) if is_populated_object(traffic) => {
                let payload: TrafficPayload = decode_value("traffic", value.clone())?;
                Ok(Some(payload.traffic))
            }
            _ => {
                debug!(system = system_name, "no traffic data for system");
                Ok(None)
            }
        }
    }

    /// Commander death tallies for a system.
    pub fn deaths(&self, system_name: &str) -> Result<Option<Deaths>> {
        let value = self.request(
            ApiCategory::System,
            "deaths",
            &[("systemName", system_name.to_string())],
        )?;
        match value.get("deaths") {
            Some(deaths) if is_populated_object(deaths) => {
                let payload: DeathsPayload = decode_value("deaths", value.clone())?;
                Ok(Some(payload.deaths))
            }
            _ => {
                debug!(system = system_name, "no death data for system");
                Ok(None)
            }
        }
    }

    /// Estimated exploration scan value of a system.
    pub fn estimated_value(&self, system_name: &str) -> Result<Option<EstimatedValue>> {
        let value = self.request(
            ApiCategory::System,
            "estimated-value",
            &[("systemName", system_name.to_string())],
        )?;
        if value.get("estimatedValue").is_none() {
            debug!(system = system_name, "no estimated value for system");
            return Ok(None);
        }
        Ok(Some(decode_value("estimated-value", value)?))
    }

    /// Last known position of a commander, or `None` when EDSM has no
    /// position for them (unknown commander, hidden profile).
    pub fn commander_position(
        &self,
        registry: &RegistryStore,
        identity: &str,
        with_coordinates: bool,
    ) -> Result<Option<CommanderPosition>> {
        let mut params = Vec::new();
        if with_coordinates {
            params.push(("showCoordinates", "1".to_string()));
        }
        let value = self.request_as_commander(
            ApiCategory::Logs,
            "get-position",
            registry,
            identity,
            &params,
        )?;
        if !envelope_ok(&value, "get-position") {
            return Ok(None);
        }
        Ok(Some(decode_value("get-position", value)?))
    }

    /// Flight log of a commander, optionally bounded to a date range.
    /// Entries come back in EDSM order, which callers must not trust; see
    /// [`crate::analytics::extract_system_sequence`].
    pub fn flight_log(
        &self,
        registry: &RegistryStore,
        identity: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Option<Vec<FlightLogEntry>>> {
        let mut params = Vec::new();
        if let Some(start) = start {
            params.push((
                "startDateTime",
                start.format(models::edsm_date::FORMAT).to_string(),
            ));
        }
        if let Some(end) = end {
            params.push((
                "endDateTime",
                end.format(models::edsm_date::FORMAT).to_string(),
            ));
        }
        let value = self.request_as_commander(
            ApiCategory::Logs,
            "get-logs",
            registry,
            identity,
            &params,
        )?;
        if !envelope_ok(&value, "get-logs") {
            return Ok(None);
        }
        let payload: FlightLogPayload = decode_value("get-logs", value)?;
        Ok(Some(payload.logs))
    }

    /// Most recent credit balance of a commander.
    pub fn credits(
        &self,
        registry: &RegistryStore,
        identity: &str,
    ) -> Result<Option<CreditsBalance>> {
        let value = self.request_as_commander(
            ApiCategory::Commander,
            "get-credits",
            registry,
            identity,
            &[],
        )?;
        if !envelope_ok(&value, "get-credits") {
            return Ok(None);
        }
        let payload: CreditsPayload = decode_value("get-credits", value)?;
        Ok(payload.credits.into_iter().next())
    }

    /// Rank summary of a commander.
    pub fn ranks(
        &self,
        registry: &RegistryStore,
        identity: &str,
    ) -> Result<Option<CommanderRanks>> {
        let value = self.request_as_commander(
            ApiCategory::Commander,
            "get-ranks",
            registry,
            identity,
            &[],
        )?;
        if !envelope_ok(&value, "get-ranks") {
            return Ok(None);
        }
        Ok(Some(decode_value("get-ranks", value)?))
    }

    /// One of a commander's inventories (raw materials, cargo hold or
    /// encoded data).
    pub fn inventory(
        &self,
        registry: &RegistryStore,
        identity: &str,
        kind: InventoryKind,
    ) -> Result<Option<Vec<Material>>> {
        let value = self.request_as_commander(
            ApiCategory::Commander,
            "get-materials",
            registry,
            identity,
            &[("type", kind.as_param().to_string())],
        )?;
        if !envelope_ok(&value, "get-materials") {
            return Ok(None);
        }
        let payload: MaterialsPayload = decode_value("get-materials", value)?;
        Ok(Some(payload.into_items()))
    }

    /// Systems within a spherical shell around `center`, distances included.
    pub fn systems_in_sphere(
        &self,
        center: &Coordinate,
        min_radius: f64,
        radius: f64,
    ) -> Result<Option<Vec<SphereSystem>>> {
        let value = self.request(
            ApiCategory::General,
            "sphere-systems",
            &[
                ("x", center.x.to_string()),
                ("y", center.y.to_string()),
                ("z", center.z.to_string()),
                ("minRadius", min_radius.to_string()),
                ("radius", radius.to_string()),
            ],
        )?;
        if !value.is_array() {
            debug!("sphere query returned no usable payload");
            return Ok(None);
        }
        Ok(Some(decode_value("sphere-systems", value)?))
    }

    /// Batch coordinate lookup for many systems at once. Duplicates are
    /// collapsed and the remainder is chunked to
    /// [`BATCH_COORDINATE_LIMIT`] names per call. Systems EDSM does not know
    /// are simply absent from the result.
    pub fn coordinates_of_systems(&self, names: &[String]) -> Result<Vec<SystemRecord>> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for name in names {
            if seen.insert(name.as_str()) {
                unique.push(name.as_str());
            }
        }

        let mut records = Vec::new();
        for chunk in unique.chunks(BATCH_COORDINATE_LIMIT) {
            let mut params: Vec<(&str, String)> = vec![("showCoordinates", "1".to_string())];
            for name in chunk {
                params.push(("systemName[]", (*name).to_string()));
            }
            let value = self.request(ApiCategory::General, "systems", &params)?;
            if !value.is_array() {
                debug!(chunk = chunk.len(), "batch lookup returned no usable payload");
                continue;
            }
            let chunk_records: Vec<SystemRecord> = decode_value("systems", value)?;
            records.extend(chunk_records);
        }
        Ok(records)
    }
}

fn user_agent() -> String {
    format!(
        "edtrack/{version} ({repo})",
        version = env!("CARGO_PKG_VERSION"),
        repo = "https://github.com/edtrack/edtrack-rs"
    )
}

/// True when the response carries the commander-API success envelope.
fn envelope_ok(value: &Value, endpoint: &str) -> bool {
    match value.get("msgnum").and_then(Value::as_i64) {
        Some(MSGNUM_OK) => true,
        msgnum => {
            let msg = value.get("msg").and_then(Value::as_str).unwrap_or("");
            debug!(endpoint, ?msgnum, msg, "EDSM reported no data");
            false
        }
    }
}

fn is_populated_object(value: &Value) -> bool {
    value.as_object().map(|map| !map.is_empty()).unwrap_or(false)
}

fn decode_value<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| Error::Decode {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

fn truncate_payload(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
