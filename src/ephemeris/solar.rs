//! Solar position from the NOAA low-precision series.
//!
//! Accuracy is about 0.01° for dates within a few decades of J2000.

use chrono::{DateTime, Utc};

use super::coordinates::{
    DEG, ecliptic_to_equatorial, equatorial_to_horizontal, julian_century, julian_date,
    local_sidereal_time, normalize_degrees, obliquity_corrected,
};

/// Solar position at a specific instant
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Geometric altitude of the sun centre, degrees
    pub altitude: f64,
    pub azimuth: f64,
    pub declination: f64,
    /// Apparent ecliptic longitude, degrees
    pub ecliptic_longitude: f64,
}

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

/// Apparent ecliptic longitude of the sun, degrees
#[must_use]
pub fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    normalize_degrees(
        sun_mean_longitude(t) + sun_equation_of_center(t) - 0.00569 - 0.00478 * (omega * DEG).sin(),
    )
}

/// Compute the solar position for a UTC instant and observer coordinates
#[must_use]
pub fn solar_position(at: DateTime<Utc>, latitude: f64, longitude: f64) -> SolarPosition {
    let jd = julian_date(at);
    let t = julian_century(jd);

    let lambda = sun_apparent_longitude(t);
    let (ra, dec) = ecliptic_to_equatorial(lambda, 0.0, obliquity_corrected(t));
    let lst = local_sidereal_time(jd, longitude);
    let (altitude, azimuth) = equatorial_to_horizontal(ra, dec, latitude, lst);

    SolarPosition {
        altitude,
        azimuth,
        declination: dec,
        ecliptic_longitude: lambda,
    }
}

/// Geometric altitude of the sun centre, degrees
#[must_use]
pub fn solar_altitude(at: DateTime<Utc>, latitude: f64, longitude: f64) -> f64 {
    solar_position(at, latitude, longitude).altitude
}
