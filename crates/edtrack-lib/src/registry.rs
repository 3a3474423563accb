//! Durable registry of commander bindings and points of interest.
//!
//! The registry is the single owner of both collections. It loads fully into
//! memory at startup and rewrites the backing files on every mutation, so a
//! process crash can lose at most the mutation in flight. Files are rewritten
//! through a temp file in the same directory and atomically renamed over the
//! old copy.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use directories::ProjectDirs;
use strsim::jaro_winkler;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::edsm::EdsmClient;
use crate::error::{Error, Result};
use crate::geometry::Coordinate;

const COMMANDERS_FILE: &str = "commanders.csv";
const POI_FILE: &str = "pois.csv";
const DATA_DIR_ENV: &str = "EDTRACK_DATA_DIR";

/// Minimum similarity score for a POI name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Associates one chat identity with a commander name and an optional EDSM
/// API key. An identity holds at most one binding; re-registering overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommanderBinding {
    pub identity: String,
    pub commander: String,
    pub credential: Option<String>,
}

/// A named location pinned to a system and its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub name: String,
    pub system: String,
    pub coords: Coordinate,
}

/// In-memory registry backed by two CSV files in a data directory.
#[derive(Debug)]
pub struct RegistryStore {
    dir: PathBuf,
    bindings: BTreeMap<String, CommanderBinding>,
    pois: BTreeMap<String, PointOfInterest>,
}

impl RegistryStore {
    /// Open the registry in `dir`, creating the directory if needed and
    /// loading any existing records.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let mut store = Self {
            dir,
            bindings: BTreeMap::new(),
            pois: BTreeMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Open the registry in the default data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_data_dir()?)
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    /// Bind `identity` to `commander`, overwriting any existing binding for
    /// that identity. A `None` credential keeps whatever credential the
    /// identity had before, so re-registering a name does not log you out.
    pub fn bind(
        &mut self,
        identity: &str,
        commander: &str,
        credential: Option<String>,
    ) -> Result<()> {
        let credential = credential.or_else(|| {
            self.bindings
                .get(identity)
                .and_then(|existing| existing.credential.clone())
        });
        self.bindings.insert(
            identity.to_string(),
            CommanderBinding {
                identity: identity.to_string(),
                commander: commander.to_string(),
                credential,
            },
        );
        self.flush()
    }

    /// Interpret `input` as either a chat identity or a commander name.
    ///
    /// Returns the bound commander name and `true` when `input` is a stored
    /// identity; otherwise returns `input` unchanged, with `true` only when
    /// it already appears as a commander name in some binding. Callers pass
    /// whatever the end user typed and use the flag to tell "registered"
    /// from "never seen".
    pub fn resolve_identity(&self, input: &str) -> (String, bool) {
        if let Some(binding) = self.bindings.get(input) {
            return (binding.commander.clone(), true);
        }
        let known = self
            .bindings
            .values()
            .any(|binding| binding.commander == input);
        (input.to_string(), known)
    }

    /// Credential of the first identity bound to `commander`, if any.
    ///
    /// The reverse mapping is not unique; when two identities registered the
    /// same commander name the first match in identity order wins.
    pub fn credential_for(&self, commander: &str) -> Option<&str> {
        self.bindings
            .values()
            .find(|binding| binding.commander == commander)
            .and_then(|binding| binding.credential.as_deref())
    }

    pub fn binding_for(&self, identity: &str) -> Option<&CommanderBinding> {
        self.bindings.get(identity)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &CommanderBinding> {
        self.bindings.values()
    }

    /// Create or overwrite a POI named `name` at `system`, resolving the
    /// system's coordinates through the EDSM client.
    pub fn add_poi(
        &mut self,
        client: &EdsmClient,
        name: &str,
        system: &str,
    ) -> Result<PointOfInterest> {
        let coords = client
            .system_coordinates(system)?
            .ok_or_else(|| Error::SystemNotFound {
                name: system.to_string(),
            })?;
        let poi = PointOfInterest {
            name: name.to_string(),
            system: system.to_string(),
            coords,
        };
        self.pois.insert(poi.name.clone(), poi.clone());
        self.flush()?;
        Ok(poi)
    }

    /// Remove a POI by name (case-insensitive). Returns whether anything was
    /// removed.
    pub fn remove_poi(&mut self, name: &str) -> Result<bool> {
        let canonical = match self.get_poi(name) {
            Some(poi) => poi.name.clone(),
            None => return Ok(false),
        };
        self.pois.remove(&canonical);
        self.flush()?;
        Ok(true)
    }

    /// Look up a POI, trying an exact name match before a case-insensitive
    /// scan.
    pub fn get_poi(&self, name: &str) -> Option<&PointOfInterest> {
        if let Some(poi) = self.pois.get(name) {
            return Some(poi);
        }
        let lowered = name.to_lowercase();
        self.pois
            .values()
            .find(|poi| poi.name.to_lowercase() == lowered)
    }

    /// Like [`get_poi`](Self::get_poi) but fails with name suggestions when
    /// nothing matches.
    pub fn require_poi(&self, name: &str) -> Result<&PointOfInterest> {
        self.get_poi(name).ok_or_else(|| Error::PoiNotFound {
            name: name.to_string(),
            suggestions: self.similar_poi_names(name, 3),
        })
    }

    /// All POIs ordered by name.
    pub fn list_pois(&self) -> impl Iterator<Item = &PointOfInterest> {
        self.pois.values()
    }

    /// Closest POI names to `name` by Jaro-Winkler similarity, best first.
    pub fn similar_poi_names(&self, name: &str, limit: usize) -> Vec<String> {
        let target = name.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .pois
            .values()
            .map(|poi| {
                (
                    jaro_winkler(&target, &poi.name.to_lowercase()),
                    poi.name.as_str(),
                )
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Reload both collections from disk. Missing files leave the matching
    /// collection empty; malformed records are skipped with a diagnostic.
    pub fn load(&mut self) -> Result<()> {
        self.bindings.clear();
        self.pois.clear();

        let commanders_path = self.dir.join(COMMANDERS_FILE);
        if commanders_path.exists() {
            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(Trim::All)
                .from_path(&commanders_path)?;
            for record in reader.records() {
                let record = match record {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(file = COMMANDERS_FILE, error = %err, "skipping unreadable record");
                        continue;
                    }
                };
                // The format is always three fields; the credential is
                // written as an empty string when absent.
                if record.len() != 3 {
                    warn!(
                        file = COMMANDERS_FILE,
                        fields = record.len(),
                        "skipping malformed commander record"
                    );
                    continue;
                }
                let identity = record[0].to_string();
                let commander = record[1].to_string();
                let credential =
                    Some(record[2].to_string()).filter(|value| !value.is_empty());
                self.bindings.insert(
                    identity.clone(),
                    CommanderBinding {
                        identity,
                        commander,
                        credential,
                    },
                );
            }
        } else {
            debug!(path = %commanders_path.display(), "no commander registry on disk yet");
        }

        let poi_path = self.dir.join(POI_FILE);
        if poi_path.exists() {
            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(Trim::All)
                .from_path(&poi_path)?;
            for record in reader.records() {
                let record = match record {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(file = POI_FILE, error = %err, "skipping unreadable record");
                        continue;
                    }
                };
                if record.len() != 5 {
                    warn!(
                        file = POI_FILE,
                        fields = record.len(),
                        "skipping malformed POI record"
                    );
                    continue;
                }
                let coords = match parse_poi_coords(&record[2], &record[3], &record[4]) {
                    Some(coords) => coords,
                    None => {
                        warn!(
                            file = POI_FILE,
                            name = &record[0],
                            "skipping POI record with unparseable coordinates"
                        );
                        continue;
                    }
                };
                let poi = PointOfInterest {
                    name: record[0].to_string(),
                    system: record[1].to_string(),
                    coords,
                };
                self.pois.insert(poi.name.clone(), poi);
            }
        } else {
            debug!(path = %poi_path.display(), "no POI store on disk yet");
        }

        info!(
            bindings = self.bindings.len(),
            pois = self.pois.len(),
            "loaded registry"
        );
        Ok(())
    }

    /// Rewrite both backing files from the in-memory state.
    pub fn flush(&self) -> Result<()> {
        self.write_atomic(COMMANDERS_FILE, |writer| {
            for binding in self.bindings.values() {
                writer.write_record([
                    binding.identity.as_str(),
                    binding.commander.as_str(),
                    binding.credential.as_deref().unwrap_or(""),
                ])?;
            }
            Ok(())
        })?;
        self.write_atomic(POI_FILE, |writer| {
            for poi in self.pois.values() {
                writer.write_record([
                    poi.name.as_str(),
                    poi.system.as_str(),
                    &poi.coords.x.to_string(),
                    &poi.coords.y.to_string(),
                    &poi.coords.z.to_string(),
                ])?;
            }
            Ok(())
        })?;
        debug!(
            bindings = self.bindings.len(),
            pois = self.pois.len(),
            "flushed registry"
        );
        Ok(())
    }

    fn write_atomic<F>(&self, file_name: &str, write_records: F) -> Result<()>
    where
        F: FnOnce(&mut csv::Writer<&mut std::fs::File>) -> Result<()>,
    {
        let path = self.dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            write_records(&mut writer)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|err| err.error)?;
        Ok(())
    }
}

fn parse_poi_coords(x: &str, y: &str, z: &str) -> Option<Coordinate> {
    Some(Coordinate::new(
        x.parse().ok()?,
        y.parse().ok()?,
        z.parse().ok()?,
    ))
}

/// Resolve the registry's data directory: the `EDTRACK_DATA_DIR` environment
/// variable when set, otherwise the platform-specific project data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let dirs = ProjectDirs::from("com", "edtrack", "edtrack").ok_or(Error::DataDirUnavailable)?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty_store() -> (TempDir, RegistryStore) {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn resolve_identity_is_identity_for_unknown_input() {
        let (_dir, store) = empty_store();
        assert_eq!(
            store.resolve_identity("Nobody"),
            ("Nobody".to_string(), false)
        );
    }

    #[test]
    fn bind_then_resolve_round_trips() {
        let (_dir, mut store) = empty_store();
        store.bind("42", "CMDR Alpha", None).unwrap();
        assert_eq!(
            store.resolve_identity("42"),
            ("CMDR Alpha".to_string(), true)
        );
    }

    #[test]
    fn resolve_identity_recognises_commander_names() {
        let (_dir, mut store) = empty_store();
        store.bind("42", "CMDR Alpha", None).unwrap();
        assert_eq!(
            store.resolve_identity("CMDR Alpha"),
            ("CMDR Alpha".to_string(), true)
        );
    }

    #[test]
    fn rebinding_without_credential_keeps_the_old_one() {
        let (_dir, mut store) = empty_store();
        store
            .bind("42", "CMDR Alpha", Some("secret".to_string()))
            .unwrap();
        store.bind("42", "CMDR Beta", None).unwrap();
        assert_eq!(store.credential_for("CMDR Beta"), Some("secret"));
    }

    #[test]
    fn credential_for_uses_first_matching_binding() {
        let (_dir, mut store) = empty_store();
        store.bind("1", "CMDR Shared", None).unwrap();
        store
            .bind("2", "CMDR Shared", Some("later-key".to_string()))
            .unwrap();
        // Identity "1" sorts first and has no credential stored.
        assert_eq!(store.credential_for("CMDR Shared"), None);
    }

    #[test]
    fn bindings_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = RegistryStore::open(dir.path()).unwrap();
            store
                .bind("42", "CMDR Alpha", Some("key".to_string()))
                .unwrap();
        }
        let store = RegistryStore::open(dir.path()).unwrap();
        let binding = store.binding_for("42").unwrap();
        assert_eq!(binding.commander, "CMDR Alpha");
        assert_eq!(binding.credential.as_deref(), Some("key"));
    }

    #[test]
    fn malformed_records_are_skipped_but_later_rows_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("commanders.csv"),
            "1,CMDR One,\nonly-one-field\n2,CMDR Two\n3,CMDR Three,with-key\n",
        )
        .unwrap();
        let store = RegistryStore::open(dir.path()).unwrap();
        // Both wrong-field-count rows are dropped, including the two-field
        // one; rows below them still load.
        assert_eq!(store.bindings().count(), 2);
        assert_eq!(store.resolve_identity("2"), ("2".to_string(), false));
        assert_eq!(
            store.resolve_identity("3"),
            ("CMDR Three".to_string(), true)
        );
        assert_eq!(store.credential_for("CMDR One"), None);
        assert_eq!(store.credential_for("CMDR Three"), Some("with-key"));
    }

    #[test]
    fn poi_records_with_bad_coordinates_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pois.csv"),
            "Broken,Sol,not-a-number,0,0\nHomeBase,Sol,0,0,0\n",
        )
        .unwrap();
        let store = RegistryStore::open(dir.path()).unwrap();
        assert!(store.get_poi("Broken").is_none());
        assert!(store.get_poi("HomeBase").is_some());
    }

    #[test]
    fn poi_lookup_falls_back_to_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pois.csv"), "HomeBase,Sol,0,0,0\n").unwrap();
        let store = RegistryStore::open(dir.path()).unwrap();
        assert_eq!(store.get_poi("homebase").unwrap().name, "HomeBase");
    }

    #[test]
    fn remove_poi_matches_case_insensitively() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pois.csv"), "HomeBase,Sol,0,0,0\n").unwrap();
        let mut store = RegistryStore::open(dir.path()).unwrap();
        assert!(store.remove_poi("HOMEBASE").unwrap());
        assert!(store.get_poi("HomeBase").is_none());
        assert!(!store.remove_poi("HomeBase").unwrap());
    }

    #[test]
    fn similar_poi_names_offers_close_matches() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pois.csv"),
            "HomeBase,Sol,0,0,0\nWaypoint Nine,Colonia,1,2,3\n",
        )
        .unwrap();
        let store = RegistryStore::open(dir.path()).unwrap();
        let suggestions = store.similar_poi_names("homebse", 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("HomeBase"));
    }

    #[test]
    fn poi_names_with_commas_survive_a_flush_and_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = RegistryStore::open(dir.path()).unwrap();
            store.pois.insert(
                "Core, Deep".to_string(),
                PointOfInterest {
                    name: "Core, Deep".to_string(),
                    system: "Sagittarius A*".to_string(),
                    coords: Coordinate::new(25.21875, -20.90625, 25899.96875),
                },
            );
            store.flush().unwrap();
        }
        let store = RegistryStore::open(dir.path()).unwrap();
        let poi = store.get_poi("Core, Deep").unwrap();
        assert_eq!(poi.system, "Sagittarius A*");
        assert_eq!(poi.coords.z, 25899.96875);
    }
}
