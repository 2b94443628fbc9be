//! City gazetteer: an ordered, immutable list of named coordinates.
//!
//! The on-disk format is a JSON array of `{ "city", "lat", "long" }`
//! records. [`spawn_gazetteer_loader`] reads it on a background task and
//! hands the finished list over through a `oneshot` channel, so consumers
//! only ever see "not yet loaded" or "fully loaded".
//!
//! `gpsinfo import-cities` builds that file from a local world-cities CSV
//! (`city`, `lat`, `lng` columns; anything else is ignored).

use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::geo::Coordinate;

/// One gazetteer record as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerRecord {
    pub city: String,
    pub lat: f64,
    pub long: f64,
}

/// A named city location.
#[derive(Debug, Clone, PartialEq)]
pub struct CityEntry {
    pub coordinate: Coordinate,
    pub name: String,
}

impl From<GazetteerRecord> for CityEntry {
    fn from(r: GazetteerRecord) -> Self {
        Self {
            coordinate: Coordinate::new(r.lat, r.long),
            name: r.city,
        }
    }
}

/// Result of a closest-city search that had entries to look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nearest<'a> {
    /// Closest entry strictly inside the search radius.
    City {
        entry: &'a CityEntry,
        distance_m: f64,
    },
    /// Nothing inside the search radius.
    BeyondRadius,
}

/// Display text used when no city lies within `radius_m`.
#[must_use]
pub fn beyond_radius_label(radius_m: f64) -> String {
    format!("<More than {} km away>", radius_m / 1000.0)
}

/// Shared, read-only city list. Cloning only bumps a reference count.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: Arc<[CityEntry]>,
}

impl Gazetteer {
    #[must_use]
    pub fn new(entries: Vec<CityEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Decode a JSON array of records, preserving their order.
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let records: Vec<GazetteerRecord> =
            serde_json::from_slice(bytes).map_err(|e| format!("bad gazetteer JSON: {e}"))?;
        Ok(Self::new(records.into_iter().map(CityEntry::from).collect()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CityEntry> {
        self.entries.iter()
    }

    /// Linear scan for the entry closest to `from`.
    ///
    /// Only entries strictly closer than `radius_m` qualify, and on equal
    /// distances the earlier entry wins. Returns `None` for an empty
    /// gazetteer.
    #[must_use]
    pub fn closest(&self, from: &Coordinate, radius_m: f64) -> Option<Nearest<'_>> {
        if self.entries.is_empty() {
            return None;
        }

        let mut best = Nearest::BeyondRadius;
        let mut best_distance = radius_m;
        for entry in self.entries.iter() {
            let d = from.distance_to(&entry.coordinate);
            if d < best_distance {
                best_distance = d;
                best = Nearest::City {
                    entry,
                    distance_m: d,
                };
            }
        }
        Some(best)
    }
}

/// Read and decode a gazetteer file.
pub async fn load_gazetteer(path: &Path) -> Result<Gazetteer, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("read gazetteer {}: {e}", path.display()))?;
    let gazetteer = Gazetteer::from_json(&bytes).map_err(|e| format!("{}: {e}", path.display()))?;
    info!(
        "Gazetteer: loaded {} cities from {}",
        gazetteer.len(),
        path.display()
    );
    Ok(gazetteer)
}

/// Load the gazetteer on a background task. The receiver resolves exactly
/// once with the whole list or the load error.
pub fn spawn_gazetteer_loader(path: PathBuf) -> oneshot::Receiver<Result<Gazetteer, String>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = load_gazetteer(&path).await;
        if tx.send(result).is_err() {
            debug!("Gazetteer: receiver dropped before load finished");
        }
    });
    rx
}

/// Row of a world-cities CSV. Only the columns we keep are named.
#[derive(Deserialize)]
struct CsvCity {
    city: String,
    lat: f64,
    lng: f64,
}

/// Parse a world-cities CSV (with header row) into gazetteer records.
pub fn records_from_csv<R: Read>(reader: R) -> Result<Vec<GazetteerRecord>, String> {
    let mut r = csv::Reader::from_reader(reader);

    let mut records = Vec::new();
    for row in r.deserialize() {
        let row: CsvCity = row.map_err(|e| format!("bad CSV row: {e}"))?;
        records.push(GazetteerRecord {
            city: row.city,
            lat: row.lat,
            long: row.lng,
        });
    }
    Ok(records)
}

/// Convert `csv_path` into a gazetteer JSON file at `out_path`.
///
/// Returns the number of cities written.
pub fn import_cities(csv_path: &Path, out_path: &Path) -> Result<usize, String> {
    let input = std::fs::File::open(csv_path)
        .map_err(|e| format!("open {}: {e}", csv_path.display()))?;
    let records = records_from_csv(input).map_err(|e| format!("{}: {e}", csv_path.display()))?;

    let out = std::fs::File::create(out_path)
        .map_err(|e| format!("create {}: {e}", out_path.display()))?;
    let mut writer = BufWriter::new(out);
    serde_json::to_writer(&mut writer, &records)
        .map_err(|e| format!("write {}: {e}", out_path.display()))?;
    writer
        .flush()
        .map_err(|e| format!("write {}: {e}", out_path.display()))?;

    info!(
        "Imported {} cities from {} into {}",
        records.len(),
        csv_path.display(),
        out_path.display()
    );
    Ok(records.len())
}
