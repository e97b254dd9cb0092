//! Time scales and coordinate transforms shared by the solar and lunar models.
//!
//! Formulas follow Meeus, "Astronomical Algorithms", simplified where the
//! loss of accuracy stays well below a minute of event time.

use chrono::{DateTime, Utc};
use std::f64::consts::PI;

pub(crate) const DEG: f64 = PI / 180.0;

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000: f64 = 2_451_545.0;

/// Julian Date of a UTC instant
#[must_use]
pub fn julian_date(at: DateTime<Utc>) -> f64 {
    let seconds = at.timestamp() as f64 + f64::from(at.timestamp_subsec_millis()) / 1000.0;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Julian centuries since J2000.0
#[must_use]
pub fn julian_century(jd: f64) -> f64 {
    (jd - J2000) / 36_525.0
}

/// Wrap an angle into [0, 360)
#[must_use]
pub fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Wrap an angle into (-180, 180]
#[must_use]
pub fn signed_degrees(deg: f64) -> f64 {
    let d = normalize_degrees(deg);
    if d > 180.0 { d - 360.0 } else { d }
}

fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

/// Obliquity of the ecliptic corrected for nutation, degrees
#[must_use]
pub fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * (omega * DEG).cos()
}

/// Local sidereal time in degrees
#[must_use]
pub fn local_sidereal_time(jd: f64, longitude: f64) -> f64 {
    let t = julian_century(jd);
    let gmst = normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * (jd - J2000) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    );
    normalize_degrees(gmst + longitude)
}

/// Ecliptic to equatorial transform. Returns (right ascension, declination) in degrees.
#[must_use]
pub fn ecliptic_to_equatorial(longitude: f64, latitude: f64, obliquity: f64) -> (f64, f64) {
    let lon_r = longitude * DEG;
    let lat_r = latitude * DEG;
    let obl_r = obliquity * DEG;

    let sin_ra = lon_r.sin() * obl_r.cos() - lat_r.tan() * obl_r.sin();
    let ra = normalize_degrees(sin_ra.atan2(lon_r.cos()) / DEG);

    let sin_dec = lat_r.sin() * obl_r.cos() + lat_r.cos() * obl_r.sin() * lon_r.sin();
    (ra, sin_dec.clamp(-1.0, 1.0).asin() / DEG)
}

/// Equatorial to horizontal transform. Returns (altitude, azimuth) in degrees.
#[must_use]
pub fn equatorial_to_horizontal(ra: f64, dec: f64, latitude: f64, lst: f64) -> (f64, f64) {
    let ha = normalize_degrees(lst - ra) * DEG;
    let dec_r = dec * DEG;
    let lat_r = latitude * DEG;

    let sin_alt = (lat_r.sin() * dec_r.sin() + lat_r.cos() * dec_r.cos() * ha.cos()).clamp(-1.0, 1.0);
    let alt = sin_alt.asin();

    let denominator = alt.cos() * lat_r.cos();
    let azimuth = if denominator.abs() > 1e-10 {
        let cos_az = (dec_r.sin() - sin_alt * lat_r.sin()) / denominator;
        let az = cos_az.clamp(-1.0, 1.0).acos() / DEG;
        if ha.sin() > 0.0 { 360.0 - az } else { az }
    } else {
        0.0
    };

    (alt / DEG, azimuth)
}

/// Depression of the visible horizon for an observer at the given elevation, degrees
#[must_use]
pub fn horizon_dip(elevation: f64) -> f64 {
    0.0353 * elevation.max(0.0).sqrt()
}
