//! Display formatting of processor state.
//!
//! A readout is a fixed, ordered list of labelled rows grouped into
//! sections. Each row is produced by a plain function over the
//! [`Snapshot`] (or the [`Marker`]); a value that is not available renders
//! as [`PLACEHOLDER`] rather than an empty string or zero.

use std::fmt;

use serde::Serialize;

use crate::processor::{Marker, Snapshot};

/// Shown in place of any value that is not currently known.
pub const PLACEHOLDER: &str = "—";

/// m/s → km/h.
const MS_TO_KMH: f64 = 3600.0 / 1000.0;

type SnapshotField = fn(&Snapshot) -> Option<String>;
type MarkerField = fn(&Marker) -> Option<String>;

const CURRENT_FIELDS: [(&str, SnapshotField); 7] = [
    ("Latitude", latitude),
    ("Longitude", longitude),
    ("Position Accuracy", position_accuracy),
    ("Altitude", altitude),
    ("Altitude Accuracy", altitude_accuracy),
    ("Speed", speed),
    ("Closest City", closest_city),
];

const MARKER_FIELDS: [(&str, MarkerField); 3] = [
    ("Location", |m| Some(marker_location(m))),
    ("Distance", marker_distance),
    ("Altitude Difference", marker_altitude_difference),
];

/// One labelled value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub label: &'static str,
    pub value: String,
}

/// A titled group of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub rows: Vec<Row>,
}

/// Formatted view of the current readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub sections: Vec<Section>,
}

impl Readout {
    /// Build the readout. The marker section is included only when
    /// `markers_enabled`; with no marker set, its rows show the placeholder.
    #[must_use]
    pub fn build(snapshot: &Snapshot, markers_enabled: bool, marker: Option<&Marker>) -> Self {
        let mut sections = vec![Section {
            title: "Current",
            rows: CURRENT_FIELDS
                .iter()
                .map(|&(label, field)| Row {
                    label,
                    value: field(snapshot).unwrap_or_else(|| PLACEHOLDER.to_string()),
                })
                .collect(),
        }];

        if markers_enabled {
            sections.push(Section {
                title: "Marker",
                rows: MARKER_FIELDS
                    .iter()
                    .map(|&(label, field)| Row {
                        label,
                        value: marker
                            .and_then(field)
                            .unwrap_or_else(|| PLACEHOLDER.to_string()),
                    })
                    .collect(),
            });
        }

        Self { sections }
    }

    /// Value of the first row with `label`, across all sections.
    #[must_use]
    pub fn value(&self, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| &s.rows)
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .sections
            .iter()
            .flat_map(|s| &s.rows)
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);

        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.title)?;
            for row in &section.rows {
                writeln!(f, "  {:<width$}  {}", row.label, row.value)?;
            }
        }
        Ok(())
    }
}

// ── Field formatters ─────────────────────────────────────────────────

fn degrees(value: f64) -> String {
    format!("{value:.6}°")
}

/// Meters below 1 km, kilometers above.
fn distance(meters: f64) -> String {
    if meters.abs() < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

fn latitude(s: &Snapshot) -> Option<String> {
    s.latitude.map(degrees)
}

fn longitude(s: &Snapshot) -> Option<String> {
    s.longitude.map(degrees)
}

fn position_accuracy(s: &Snapshot) -> Option<String> {
    s.horizontal_accuracy.map(|a| format!("±{a:.1} m"))
}

fn altitude(s: &Snapshot) -> Option<String> {
    s.altitude.map(|a| format!("{a:.1} m"))
}

fn altitude_accuracy(s: &Snapshot) -> Option<String> {
    s.vertical_accuracy.map(|a| format!("±{a:.1} m"))
}

fn speed(s: &Snapshot) -> Option<String> {
    s.speed.map(|v| format!("{v:.2} m/s ({:.2} km/h)", v * MS_TO_KMH))
}

fn closest_city(s: &Snapshot) -> Option<String> {
    s.closest_city.clone()
}

fn marker_location(m: &Marker) -> String {
    format!(
        "{}, {}",
        degrees(m.coordinate.latitude),
        degrees(m.coordinate.longitude)
    )
}

fn marker_distance(m: &Marker) -> Option<String> {
    m.distance_m.map(distance)
}

fn marker_altitude_difference(m: &Marker) -> Option<String> {
    m.altitude_difference_m.map(|d| format!("{d:+.1} m"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn labels(readout: &Readout) -> Vec<&'static str> {
        readout
            .sections
            .iter()
            .flat_map(|s| &s.rows)
            .map(|r| r.label)
            .collect()
    }

    #[test]
    fn test_empty_snapshot_is_all_placeholders() {
        let r = Readout::build(&Snapshot::default(), false, None);
        assert_eq!(r.sections.len(), 1);
        let rows = &r.sections[0].rows;
        assert!(rows.iter().all(|row| row.value == PLACEHOLDER));
    }

    #[test]
    fn test_row_order() {
        let r = Readout::build(&Snapshot::default(), true, None);
        assert_eq!(
            labels(&r),
            [
                "Latitude",
                "Longitude",
                "Position Accuracy",
                "Altitude",
                "Altitude Accuracy",
                "Speed",
                "Closest City",
                "Location",
                "Distance",
                "Altitude Difference",
            ]
        );
        assert_eq!(r.sections[1].title, "Marker");
        assert_eq!(r.value("Distance"), Some(PLACEHOLDER));
    }

    #[test]
    fn test_speed_in_both_units() {
        let s = Snapshot {
            speed: Some(10.0),
            ..Snapshot::default()
        };
        let r = Readout::build(&s, false, None);
        let speed = r.value("Speed").unwrap();
        assert!(speed.contains("10.00 m/s"), "{speed}");
        assert!(speed.contains("36.00 km/h"), "{speed}");
    }

    #[test]
    fn test_snapshot_values() {
        let s = Snapshot {
            latitude: Some(45.5017),
            longitude: Some(-73.5673),
            horizontal_accuracy: Some(4.0),
            altitude: Some(36.0),
            vertical_accuracy: Some(6.0),
            speed: None,
            closest_city: Some("Montreal".into()),
        };
        let r = Readout::build(&s, false, None);
        assert_eq!(r.value("Latitude"), Some("45.501700°"));
        assert_eq!(r.value("Longitude"), Some("-73.567300°"));
        assert_eq!(r.value("Position Accuracy"), Some("±4.0 m"));
        assert_eq!(r.value("Altitude"), Some("36.0 m"));
        assert_eq!(r.value("Altitude Accuracy"), Some("±6.0 m"));
        assert_eq!(r.value("Speed"), Some(PLACEHOLDER));
        assert_eq!(r.value("Closest City"), Some("Montreal"));
    }

    #[test]
    fn test_marker_values() {
        let m = Marker {
            coordinate: Coordinate::new(10.0, 20.0),
            altitude: 100.0,
            distance_m: Some(1534.0),
            altitude_difference_m: Some(-5.0),
        };
        let r = Readout::build(&Snapshot::default(), true, Some(&m));
        assert_eq!(r.value("Location"), Some("10.000000°, 20.000000°"));
        assert_eq!(r.value("Distance"), Some("1.53 km"));
        assert_eq!(r.value("Altitude Difference"), Some("-5.0 m"));

        let near = Marker {
            distance_m: Some(42.4),
            altitude_difference_m: Some(5.0),
            ..m
        };
        let r = Readout::build(&Snapshot::default(), true, Some(&near));
        assert_eq!(r.value("Distance"), Some("42 m"));
        assert_eq!(r.value("Altitude Difference"), Some("+5.0 m"));
    }

    #[test]
    fn test_marker_without_position_shows_placeholders() {
        let m = Marker {
            coordinate: Coordinate::new(10.0, 20.0),
            altitude: 100.0,
            distance_m: None,
            altitude_difference_m: None,
        };
        let r = Readout::build(&Snapshot::default(), true, Some(&m));
        assert_eq!(r.value("Location"), Some("10.000000°, 20.000000°"));
        assert_eq!(r.value("Distance"), Some(PLACEHOLDER));
        assert_eq!(r.value("Altitude Difference"), Some(PLACEHOLDER));
    }

    #[test]
    fn test_display_table() {
        let s = Snapshot {
            closest_city: Some("Bern".into()),
            ..Snapshot::default()
        };
        let text = Readout::build(&s, true, None).to_string();
        assert!(text.starts_with("[Current]\n"));
        assert!(text.contains("\n[Marker]\n"));
        assert!(text.contains("  Closest City         Bern\n"), "{text}");
    }

    #[test]
    fn test_serializes_to_json() {
        let r = Readout::build(&Snapshot::default(), false, None);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["sections"][0]["title"], "Current");
        assert_eq!(v["sections"][0]["rows"][0]["label"], "Latitude");
        assert_eq!(v["sections"][0]["rows"][0]["value"], PLACEHOLDER);
    }
}
