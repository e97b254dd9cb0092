//! Location model for the observing site

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{AstroForecastError, Result};

/// Observing site coordinates. Immutable once constructed.
///
/// Deserialization goes through [`Location::new`], so a stored site is
/// validated like a configured one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "LocationFields", into = "LocationFields")]
pub struct Location {
    latitude: f64,
    longitude: f64,
    elevation: f64,
    timezone: Tz,
    name: String,
}

/// Serialized form of [`Location`]
#[derive(Serialize, Deserialize)]
struct LocationFields {
    latitude: f64,
    longitude: f64,
    elevation: f64,
    timezone: Tz,
    name: String,
}

impl TryFrom<LocationFields> for Location {
    type Error = AstroForecastError;

    fn try_from(fields: LocationFields) -> Result<Self> {
        Self::new(
            fields.latitude,
            fields.longitude,
            fields.elevation,
            fields.timezone,
            fields.name,
        )
    }
}

impl From<Location> for LocationFields {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            elevation: location.elevation,
            timezone: location.timezone,
            name: location.name,
        }
    }
}

impl Location {
    /// Create a validated location
    pub fn new(
        latitude: f64,
        longitude: f64,
        elevation: f64,
        timezone: Tz,
        name: impl Into<String>,
    ) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AstroForecastError::validation(format!(
                "latitude {latitude} outside -90..=90"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AstroForecastError::validation(format!(
                "longitude {longitude} outside -180..=180"
            )));
        }
        if !elevation.is_finite() || !(-500.0..=9000.0).contains(&elevation) {
            return Err(AstroForecastError::validation(format!(
                "elevation {elevation} m is not plausible"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            elevation,
            timezone,
            name: name.into(),
        })
    }

    /// Create a location from an IANA timezone name such as `Europe/Rome`
    pub fn with_timezone_name(
        latitude: f64,
        longitude: f64,
        elevation: f64,
        timezone: &str,
        name: impl Into<String>,
    ) -> Result<Self> {
        let tz: Tz = timezone.parse().map_err(|_| {
            AstroForecastError::validation(format!("unknown timezone '{timezone}'"))
        })?;
        Self::new(latitude, longitude, elevation, tz, name)
    }

    /// Latitude in decimal degrees
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees, east positive
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Elevation above sea level in meters
    #[must_use]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Stable key for the astronomical events of one local date.
    ///
    /// Events never change for a fixed site and date, so callers may cache
    /// them under this key indefinitely.
    #[must_use]
    pub fn ephemeris_key(&self, date: NaiveDate) -> String {
        let (lat, lon) = self.rounded_coordinates(3);
        format!(
            "ephemeris:{lat:.3}:{lon:.3}:{:.0}:{}:{date}",
            self.elevation, self.timezone
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_ephemeris_key() {
        let location = Location::new(45.0701, 7.6869, 239.0, chrono_tz::Europe::Rome, "Torino")
            .unwrap();
        let key = location.ephemeris_key(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(key, "ephemeris:45.070:7.687:239:Europe/Rome:2024-03-01");
    }

    #[test]
    fn test_location_rounded_coordinates() {
        let location =
            Location::new(46.818_234, 8.227_456, 0.0, chrono_tz::UTC, "Test").unwrap();
        let (lat, lon) = location.rounded_coordinates(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }

    #[test]
    fn test_location_rejects_out_of_range() {
        assert!(Location::new(91.0, 0.0, 0.0, chrono_tz::UTC, "x").is_err());
        assert!(Location::new(0.0, -181.0, 0.0, chrono_tz::UTC, "x").is_err());
        assert!(Location::new(0.0, 0.0, f64::NAN, chrono_tz::UTC, "x").is_err());
    }

    #[test]
    fn test_location_deserialization_is_validated() {
        let location = Location::with_timezone_name(45.0, 7.0, 500.0, "Europe/Rome", "Alps").unwrap();
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["timezone"], "Europe/Rome");
        let back: Location = serde_json::from_value(json).unwrap();
        assert_eq!(back, location);

        let invalid = serde_json::json!({
            "latitude": 200.0,
            "longitude": 7.0,
            "elevation": 500.0,
            "timezone": "Europe/Rome",
            "name": "Nowhere"
        });
        let err = serde_json::from_value::<Location>(invalid).unwrap_err();
        assert!(err.to_string().contains("latitude 200"), "{err}");

        let bad_zone = serde_json::json!({
            "latitude": 45.0,
            "longitude": 7.0,
            "elevation": 500.0,
            "timezone": "Mars/Olympus",
            "name": "Nowhere"
        });
        assert!(serde_json::from_value::<Location>(bad_zone).is_err());
    }

    #[test]
    fn test_location_timezone_name() {
        let location = Location::with_timezone_name(45.0, 7.0, 500.0, "Europe/Rome", "Alps").unwrap();
        assert_eq!(location.timezone(), chrono_tz::Europe::Rome);
        assert!(Location::with_timezone_name(45.0, 7.0, 500.0, "Mars/Olympus", "x").is_err());
    }
}
