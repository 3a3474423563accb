//! Travel analytics derived from commander flight logs.
//!
//! Everything here is computed per call from EDSM log data; nothing is
//! persisted. The only state is a cache of unconstrained log fetches keyed
//! by commander and current system, so repeated analytics queries while a
//! commander sits in one place do not hammer the API.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::edsm::models::{FlightLogEntry, SystemRecord};
use crate::edsm::EdsmClient;
use crate::error::{Error, Result};
use crate::geometry::Coordinate;
use crate::registry::RegistryStore;
use crate::resolver::resolve_coordinates;

/// Consecutive jumps further apart than this many seconds are treated as a
/// break between play sessions.
pub const DEFAULT_IDLE_THRESHOLD_SECS: i64 = 7200;

/// System names visited, most recent first.
///
/// EDSM's declared ordering is not trusted; entries are re-sorted by
/// timestamp descending before the names are taken.
pub fn extract_system_sequence(log: &[FlightLogEntry]) -> Vec<String> {
    let mut entries: Vec<&FlightLogEntry> = log.iter().collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.into_iter().map(|entry| entry.system.clone()).collect()
}

/// A travel estimate toward a target system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelEstimate {
    /// Straight-line distance to the target, in light years.
    pub distance: f64,
    /// Jumps needed at the commander's average jump distance.
    pub jumps: u64,
    /// Hours of flying at the commander's recent jump rate.
    pub hours: f64,
}

/// Flight-log analytics over the EDSM client.
///
/// The cache key pairs a commander with their current system, so it
/// invalidates itself as soon as the commander moves. Entries are never
/// explicitly evicted; growth is bounded by the distinct (commander, system)
/// pairs seen over the process lifetime, which is accepted.
#[derive(Debug, Default)]
pub struct FlightAnalytics {
    log_cache: Mutex<HashMap<String, Vec<FlightLogEntry>>>,
}

impl FlightAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a commander's flight log, serving repeated unconstrained
    /// fetches from the cache while the commander stays in one system. Any
    /// fetch with explicit date bounds bypasses the cache entirely. A
    /// commander EDSM does not know yields an empty log.
    pub fn flight_log(
        &self,
        client: &EdsmClient,
        registry: &RegistryStore,
        identity: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<FlightLogEntry>> {
        if start.is_some() || end.is_some() {
            debug!(identity, "date-bounded log fetch bypasses the cache");
            return Ok(client
                .flight_log(registry, identity, start, end)?
                .unwrap_or_default());
        }

        let (commander, _) = registry.resolve_identity(identity);
        let current_system = client
            .commander_position(registry, identity, false)?
            .and_then(|position| position.system);
        let key = current_system.map(|system| format!("{commander}@{system}"));

        if let Some(key) = &key {
            let cache = self.lock_cache();
            if let Some(entries) = cache.get(key) {
                debug!(key = %key, "serving flight log from cache");
                return Ok(entries.clone());
            }
        }

        let entries = client
            .flight_log(registry, identity, None, None)?
            .unwrap_or_default();
        if let Some(key) = key {
            debug!(key = %key, entries = entries.len(), "caching flight log");
            self.lock_cache().insert(key, entries.clone());
        }
        Ok(entries)
    }

    /// Jumps per hour over the commander's recent play sessions.
    ///
    /// Walks the log newest to oldest, accumulating a consecutive-pair time
    /// delta only when it stays below `idle_threshold_secs`; larger gaps are
    /// breaks between sessions and count toward neither the jump tally nor
    /// the elapsed time. Fails with [`Error::NoFlightData`] when no usable
    /// elapsed time remains, which covers both an empty log and a log of
    /// simultaneous entries.
    pub fn jump_rate(
        &self,
        client: &EdsmClient,
        registry: &RegistryStore,
        identity: &str,
        idle_threshold_secs: i64,
    ) -> Result<f64> {
        let log = self.flight_log(client, registry, identity, None, None)?;
        jump_rate_from_log(&log, idle_threshold_secs).ok_or_else(|| {
            let (commander, _) = registry.resolve_identity(identity);
            Error::NoFlightData { commander }
        })
    }

    /// Mean length of the commander's recent jumps, in light years.
    ///
    /// Returns `0.0` when fewer than two logged systems resolve to
    /// coordinates; an empty route is valid, just uninformative.
    pub fn average_jump_distance(
        &self,
        client: &EdsmClient,
        registry: &RegistryStore,
        identity: &str,
    ) -> Result<f64> {
        let log = self.flight_log(client, registry, identity, None, None)?;
        let sequence = extract_system_sequence(&log);
        let records = client.coordinates_of_systems(&sequence)?;
        Ok(average_distance(&sequence, &records))
    }

    /// Distance, jump count and flying time from a commander's current
    /// position to `target`.
    ///
    /// The target token goes through the same fallback order as every other
    /// free-form token: POI name, then known commander, then raw system
    /// name.
    pub fn travel_estimate(
        &self,
        client: &EdsmClient,
        registry: &RegistryStore,
        identity: &str,
        target: &str,
    ) -> Result<TravelEstimate> {
        let target = resolve_coordinates(registry, client, target)?.ok_or_else(|| {
            Error::SystemNotFound {
                name: target.to_string(),
            }
        })?;
        let (commander, _) = registry.resolve_identity(identity);
        let origin = client
            .commander_position(registry, identity, true)?
            .and_then(|position| position.coordinates)
            .ok_or_else(|| Error::CommanderNotFound {
                name: commander.clone(),
            })?;

        let rate = self.jump_rate(client, registry, identity, DEFAULT_IDLE_THRESHOLD_SECS)?;
        let average = self.average_jump_distance(client, registry, identity)?;
        if average <= 0.0 {
            return Err(Error::NoFlightData { commander });
        }

        let distance = origin.distance_to(&target);
        let jumps = (distance / average).ceil() as u64;
        let hours = jumps as f64 / rate;
        Ok(TravelEstimate {
            distance,
            jumps,
            hours,
        })
    }

    /// Reconstruct the coordinate series of a commander's recent route,
    /// most recent system first. Systems without known coordinates are
    /// dropped from the series.
    pub fn route_coordinates(
        &self,
        client: &EdsmClient,
        registry: &RegistryStore,
        identity: &str,
    ) -> Result<Vec<(String, Coordinate)>> {
        let log = self.flight_log(client, registry, identity, None, None)?;
        let sequence = extract_system_sequence(&log);
        let records = client.coordinates_of_systems(&sequence)?;
        let coords_by_name = index_coordinates(&records);
        Ok(sequence
            .into_iter()
            .filter_map(|name| {
                coords_by_name
                    .get(name.as_str())
                    .copied()
                    .map(|coords| (name, coords))
            })
            .collect())
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, Vec<FlightLogEntry>>> {
        match self.log_cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn index_coordinates(records: &[SystemRecord]) -> HashMap<&str, Coordinate> {
    records
        .iter()
        .filter_map(|record| record.coords.map(|coords| (record.name.as_str(), coords)))
        .collect()
}

fn jump_rate_from_log(log: &[FlightLogEntry], idle_threshold_secs: i64) -> Option<f64> {
    let mut entries: Vec<&FlightLogEntry> = log.iter().collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    let mut jumps = 0u32;
    let mut elapsed_secs = 0i64;
    for pair in entries.windows(2) {
        let delta = (pair[0].date - pair[1].date).num_seconds();
        if delta < idle_threshold_secs {
            jumps += 1;
            elapsed_secs += delta;
        }
    }
    if elapsed_secs <= 0 {
        return None;
    }
    Some(f64::from(jumps) / (elapsed_secs as f64 / 3600.0))
}

fn average_distance(sequence: &[String], records: &[SystemRecord]) -> f64 {
    let coords_by_name = index_coordinates(records);
    let mut total = 0.0;
    let mut jumps = 0u32;
    let mut previous: Option<Coordinate> = None;
    for name in sequence {
        let Some(coords) = coords_by_name.get(name.as_str()).copied() else {
            continue;
        };
        if let Some(prev) = previous {
            total += prev.distance_to(&coords);
            jumps += 1;
        }
        previous = Some(coords);
    }
    if jumps == 0 {
        0.0
    } else {
        total / f64::from(jumps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(system: &str, offset_secs: i64) -> FlightLogEntry {
        let base = Utc.with_ymd_and_hms(2021, 8, 1, 12, 0, 0).unwrap();
        FlightLogEntry {
            system: system.to_string(),
            date: base + Duration::seconds(offset_secs),
        }
    }

    fn record(name: &str, x: f64, y: f64, z: f64) -> SystemRecord {
        SystemRecord {
            name: name.to_string(),
            coords: Some(Coordinate::new(x, y, z)),
        }
    }

    #[test]
    fn sequence_is_sorted_newest_first_even_when_the_api_lies() {
        let log = vec![entry("Oldest", 0), entry("Newest", 120), entry("Middle", 60)];
        assert_eq!(
            extract_system_sequence(&log),
            vec!["Newest", "Middle", "Oldest"]
        );
    }

    #[test]
    fn empty_log_yields_empty_sequence() {
        assert!(extract_system_sequence(&[]).is_empty());
    }

    #[test]
    fn two_jumps_an_hour_apart_rate_exactly_one() {
        let log = vec![entry("A", 3600), entry("B", 0)];
        assert_eq!(jump_rate_from_log(&log, 7200), Some(1.0));
    }

    #[test]
    fn single_entry_has_no_rate() {
        let log = vec![entry("A", 0)];
        assert_eq!(jump_rate_from_log(&log, 7200), None);
    }

    #[test]
    fn idle_gaps_are_excluded_from_the_rate() {
        // Two sessions of two jumps each, separated by a ten-hour break.
        let log = vec![
            entry("D", 36_000 + 1800),
            entry("C", 36_000),
            entry("B", 600),
            entry("A", 0),
        ];
        // 1800s and 600s count, the 9.8h gap does not: 2 jumps in 2400s.
        let rate = jump_rate_from_log(&log, 7200).unwrap();
        assert!((rate - 3.0).abs() < 1e-9);
    }

    #[test]
    fn simultaneous_entries_have_no_usable_elapsed_time() {
        let log = vec![entry("A", 0), entry("B", 0)];
        assert_eq!(jump_rate_from_log(&log, 7200), None);
    }

    #[test]
    fn average_distance_pairs_consecutive_resolvable_systems() {
        let sequence = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let records = vec![
            record("A", 0.0, 0.0, 0.0),
            record("B", 3.0, 4.0, 0.0),
            record("C", 3.0, 4.0, 12.0),
        ];
        // A-B is 5 LY, B-C is 12 LY.
        assert!((average_distance(&sequence, &records) - 8.5).abs() < 1e-9);
    }

    #[test]
    fn unresolvable_systems_are_bridged_over() {
        let sequence = vec!["A".to_string(), "Mystery".to_string(), "B".to_string()];
        let records = vec![record("A", 0.0, 0.0, 0.0), record("B", 3.0, 4.0, 0.0)];
        assert!((average_distance(&sequence, &records) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_resolvable_systems_average_zero() {
        let sequence = vec!["A".to_string(), "B".to_string()];
        let records = vec![record("A", 1.0, 2.0, 3.0)];
        assert_eq!(average_distance(&sequence, &records), 0.0);

        assert_eq!(average_distance(&[], &[]), 0.0);
    }

    #[test]
    fn unknown_coordinates_do_not_count_as_resolvable() {
        let sequence = vec!["A".to_string(), "B".to_string()];
        let records = vec![
            record("A", 0.0, 0.0, 0.0),
            SystemRecord {
                name: "B".to_string(),
                coords: None,
            },
        ];
        assert_eq!(average_distance(&sequence, &records), 0.0);
    }
}
