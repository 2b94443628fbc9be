//! Raw position observations as delivered by a fix source.
//!
//! Every accuracy-like field uses a negative value as the "not available"
//! sentinel, the same convention platform location APIs use. Validity of the
//! horizontal, vertical and speed axes is independent: a fix may carry a
//! usable altitude with no position, or the reverse.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A single raw GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Horizontal accuracy radius in meters. Negative = no position.
    pub horizontal_accuracy: f64,
    /// Latitude in degrees. Meaningful only when `horizontal_accuracy >= 0`.
    pub latitude: f64,
    /// Longitude in degrees. Meaningful only when `horizontal_accuracy >= 0`.
    pub longitude: f64,
    /// Vertical accuracy in meters. Negative = no altitude.
    pub vertical_accuracy: f64,
    /// Altitude above sea level in meters.
    pub altitude: f64,
    /// Ground speed in m/s. Negative = unavailable.
    pub speed: f64,
}

impl Fix {
    /// Coordinate of this fix, or `None` when the horizontal axis is invalid.
    #[must_use]
    pub fn position(&self) -> Option<Coordinate> {
        (self.horizontal_accuracy >= 0.0).then(|| Coordinate::new(self.latitude, self.longitude))
    }

    #[must_use]
    pub fn has_altitude(&self) -> bool {
        self.vertical_accuracy >= 0.0
    }

    #[must_use]
    pub fn has_speed(&self) -> bool {
        self.speed >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(h: f64, v: f64, speed: f64) -> Fix {
        Fix {
            horizontal_accuracy: h,
            latitude: 45.5,
            longitude: -73.5,
            vertical_accuracy: v,
            altitude: 30.0,
            speed,
        }
    }

    #[test]
    fn test_position_requires_horizontal_accuracy() {
        let expected = Some(Coordinate::new(45.5, -73.5));
        assert_eq!(fix(5.0, -1.0, -1.0).position(), expected);
        assert_eq!(fix(0.0, -1.0, -1.0).position(), expected);
        assert_eq!(fix(-1.0, 3.0, 1.0).position(), None);
    }

    #[test]
    fn test_axes_are_independent() {
        let f = fix(-1.0, 3.0, -1.0);
        assert!(f.position().is_none());
        assert!(f.has_altitude());
        assert!(!f.has_speed());
    }

    #[test]
    fn test_deserialize_snake_case() {
        let f: Fix = serde_json::from_str(
            r#"{"horizontal_accuracy":4.0,"latitude":10.0,"longitude":20.0,
                "vertical_accuracy":-1.0,"altitude":0.0,"speed":1.5}"#,
        )
        .unwrap();
        assert_eq!(f.position(), Some(Coordinate::new(10.0, 20.0)));
        assert!(!f.has_altitude());
        assert!((f.speed - 1.5).abs() < f64::EPSILON);
    }
}
