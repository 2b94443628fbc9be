//! Location-update processing.
//!
//! [`LocationProcessor`] folds a stream of [`Fix`]es into a [`Snapshot`] of
//! displayable readings. The closest-city lookup is the only expensive step,
//! so it is debounced: the gazetteer is rescanned only when no city is known
//! yet or the position has moved at least `debounce_distance_m` since the
//! last scan.
//!
//! The processor is single-writer. It is owned by one event loop and every
//! call runs to completion before the next one starts; nothing in here
//! blocks or awaits.

use serde::Serialize;
use tracing::{debug, warn};

use crate::fix::Fix;
use crate::gazetteer::{beyond_radius_label, Gazetteer, Nearest};
use crate::geo::Coordinate;
use crate::readout::Readout;

/// Default distance a fix must move before the closest city is recomputed.
pub const DEFAULT_DEBOUNCE_DISTANCE_M: f64 = 1_000.0;

/// Default radius of the closest-city search.
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 100_000.0;

/// Tunables for [`LocationProcessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorSettings {
    pub debounce_distance_m: f64,
    pub search_radius_m: f64,
    /// Whether the reference marker feature is available.
    pub markers: bool,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            debounce_distance_m: DEFAULT_DEBOUNCE_DISTANCE_M,
            search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            markers: true,
        }
    }
}

/// Current readings. Each field is absent when its source axis was invalid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub horizontal_accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub vertical_accuracy: Option<f64>,
    /// Speed in m/s.
    pub speed: Option<f64>,
    pub closest_city: Option<String>,
}

impl Snapshot {
    #[must_use]
    pub fn position(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }
}

/// A user-captured reference point with live readouts against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub altitude: f64,
    /// Distance from the current position in meters.
    pub distance_m: Option<f64>,
    /// Current altitude minus the marker altitude, in meters.
    pub altitude_difference_m: Option<f64>,
}

/// Where the last closest-city search ran.
#[derive(Debug, Default)]
struct DebounceState {
    reference: Option<Coordinate>,
}

impl DebounceState {
    fn should_refresh(&self, position: &Coordinate, city_known: bool, threshold_m: f64) -> bool {
        match self.reference {
            None => true,
            Some(_) if !city_known => true,
            Some(ref last) => last.distance_to(position) >= threshold_m,
        }
    }
}

/// Turns fixes into a [`Snapshot`], resolving the closest city and tracking
/// an optional [`Marker`].
#[derive(Debug)]
pub struct LocationProcessor {
    settings: ProcessorSettings,
    snapshot: Snapshot,
    gazetteer: Option<Gazetteer>,
    debounce: DebounceState,
    marker: Option<Marker>,
    searches: u64,
}

impl LocationProcessor {
    #[must_use]
    pub fn new(settings: ProcessorSettings) -> Self {
        Self {
            settings,
            snapshot: Snapshot::default(),
            gazetteer: None,
            debounce: DebounceState::default(),
            marker: None,
            searches: 0,
        }
    }

    /// Hand over the loaded gazetteer. Only the first delivery is kept; the
    /// city list is immutable once the processor has it.
    pub fn set_gazetteer(&mut self, gazetteer: Gazetteer) {
        if self.gazetteer.is_some() {
            warn!("Gazetteer already set, ignoring second delivery");
            return;
        }
        debug!("Processor: gazetteer received ({} cities)", gazetteer.len());
        self.gazetteer = Some(gazetteer);
    }

    #[must_use]
    pub fn has_gazetteer(&self) -> bool {
        self.gazetteer.is_some()
    }

    #[must_use]
    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Number of closest-city searches run so far.
    #[must_use]
    pub fn search_count(&self) -> u64 {
        self.searches
    }

    /// Fold one fix into the snapshot.
    pub fn ingest_fix(&mut self, fix: &Fix) {
        if let Some(position) = fix.position() {
            self.snapshot.latitude = Some(position.latitude);
            self.snapshot.longitude = Some(position.longitude);
            self.snapshot.horizontal_accuracy = Some(fix.horizontal_accuracy);

            let city_known = self.snapshot.closest_city.is_some();
            if self.debounce.should_refresh(
                &position,
                city_known,
                self.settings.debounce_distance_m,
            ) {
                self.debounce.reference = Some(position);
                if let Some(city) = self.search_closest_city(&position) {
                    self.snapshot.closest_city = Some(city);
                }
            }

            if let Some(marker) = self.marker.as_mut() {
                marker.distance_m = Some(position.distance_to(&marker.coordinate));
                marker.altitude_difference_m = Some(fix.altitude - marker.altitude);
            }
        } else {
            self.snapshot.latitude = None;
            self.snapshot.longitude = None;
            self.snapshot.horizontal_accuracy = None;
            self.snapshot.closest_city = None;
            self.debounce.reference = None;

            if let Some(marker) = self.marker.as_mut() {
                marker.distance_m = None;
                marker.altitude_difference_m = None;
            }
        }

        if fix.has_altitude() {
            self.snapshot.altitude = Some(fix.altitude);
            self.snapshot.vertical_accuracy = Some(fix.vertical_accuracy);
        }

        self.snapshot.speed = fix.has_speed().then_some(fix.speed);
    }

    /// Whether [`set_marker`](Self::set_marker) would succeed right now.
    #[must_use]
    pub fn can_set_marker(&self) -> bool {
        self.settings.markers
            && self.snapshot.position().is_some()
            && self.snapshot.altitude.is_some()
    }

    /// Capture the current position and altitude as the marker.
    ///
    /// Returns `false` and changes nothing when markers are disabled or the
    /// snapshot lacks a position or altitude.
    pub fn set_marker(&mut self) -> bool {
        if !self.settings.markers {
            debug!("Processor: markers disabled, set_marker ignored");
            return false;
        }
        let (Some(coordinate), Some(altitude)) =
            (self.snapshot.position(), self.snapshot.altitude)
        else {
            debug!("Processor: no position/altitude yet, set_marker ignored");
            return false;
        };

        debug!(
            "Processor: marker set at {:.6},{:.6} alt={altitude:.1}m",
            coordinate.latitude, coordinate.longitude
        );
        self.marker = Some(Marker {
            coordinate,
            altitude,
            distance_m: Some(0.0),
            altitude_difference_m: Some(0.0),
        });
        true
    }

    /// Formatted view of the current state.
    #[must_use]
    pub fn readout(&self) -> Readout {
        Readout::build(&self.snapshot, self.settings.markers, self.marker.as_ref())
    }

    /// Run the gazetteer scan. `None` means nothing to scan yet and the
    /// previous closest city should stay as it is.
    fn search_closest_city(&mut self, position: &Coordinate) -> Option<String> {
        self.searches += 1;
        let radius = self.settings.search_radius_m;
        let nearest = self.gazetteer.as_ref()?.closest(position, radius)?;

        let name = match nearest {
            Nearest::City { entry, distance_m } => {
                debug!(
                    "Processor: closest city {} at {:.0}m",
                    entry.name, distance_m
                );
                entry.name.clone()
            }
            Nearest::BeyondRadius => {
                debug!("Processor: no city within {radius:.0}m");
                beyond_radius_label(radius)
            }
        };
        Some(name)
    }
}

impl Default for LocationProcessor {
    fn default() -> Self {
        Self::new(ProcessorSettings::default())
    }
}
