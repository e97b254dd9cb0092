//! Lunar position from Meeus, "Astronomical Algorithms" chapter 47.
//!
//! Uses the leading periodic terms of tables 47.A and 47.B, good to roughly
//! 0.3°, which is plenty for rise/set times and illumination.

use chrono::{DateTime, Utc};

use super::coordinates::{
    DEG, ecliptic_to_equatorial, equatorial_to_horizontal, julian_century, julian_date,
    local_sidereal_time, normalize_degrees, obliquity_corrected,
};
use super::solar::sun_apparent_longitude;

const EARTH_RADIUS_KM: f64 = 6378.14;

/// Lunar position at a specific instant
#[derive(Debug, Clone, Copy)]
pub struct LunarPosition {
    pub ecliptic_longitude: f64,
    pub ecliptic_latitude: f64,
    pub distance_km: f64,
    /// Parallax-corrected altitude of the moon centre, degrees
    pub altitude: f64,
    pub azimuth: f64,
}

// (D, M, M', F, sum_l coefficient in 1e-6 degrees, sum_r coefficient in metres)
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6_288_774.0, -20_905_355.0),
    (2.0, 0.0, -1.0, 0.0, 1_274_027.0, -3_699_111.0),
    (2.0, 0.0, 0.0, 0.0, 658_314.0, -2_955_968.0),
    (0.0, 0.0, 2.0, 0.0, 213_618.0, -569_925.0),
    (0.0, 1.0, 0.0, 0.0, -185_116.0, 48_888.0),
    (0.0, 0.0, 0.0, 2.0, -114_332.0, -3_149.0),
    (2.0, 0.0, -2.0, 0.0, 58_793.0, 246_158.0),
    (2.0, -1.0, -1.0, 0.0, 57_066.0, -152_138.0),
    (2.0, 0.0, 1.0, 0.0, 53_322.0, -170_733.0),
    (2.0, -1.0, 0.0, 0.0, 45_758.0, -204_586.0),
    (0.0, 1.0, -1.0, 0.0, -40_923.0, -129_620.0),
    (1.0, 0.0, 0.0, 0.0, -34_720.0, 108_743.0),
    (0.0, 1.0, 1.0, 0.0, -30_383.0, 104_755.0),
    (2.0, 0.0, 0.0, -2.0, 15_327.0, 10_321.0),
    (0.0, 0.0, 1.0, 2.0, -12_528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10_980.0, 79_661.0),
    (4.0, 0.0, -1.0, 0.0, 10_675.0, -34_782.0),
    (0.0, 0.0, 3.0, 0.0, 10_034.0, -23_210.0),
    (4.0, 0.0, -2.0, 0.0, 8_548.0, -21_636.0),
    (2.0, 1.0, -1.0, 0.0, -7_888.0, 24_208.0),
];

// (D, M, M', F, sum_b coefficient in 1e-6 degrees)
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5_128_122.0),
    (0.0, 0.0, 1.0, 1.0, 280_602.0),
    (0.0, 0.0, 1.0, -1.0, 277_693.0),
    (2.0, 0.0, 0.0, -1.0, 173_237.0),
    (2.0, 0.0, -1.0, 1.0, 55_413.0),
    (2.0, 0.0, -1.0, -1.0, 46_271.0),
    (2.0, 0.0, 0.0, 1.0, 32_573.0),
    (0.0, 0.0, 2.0, 1.0, 17_198.0),
    (2.0, 0.0, 1.0, -1.0, 9_266.0),
    (0.0, 0.0, 2.0, -1.0, 8_822.0),
    (2.0, -1.0, 0.0, -1.0, 8_216.0),
    (2.0, 0.0, -2.0, -1.0, 4_324.0),
    (2.0, 0.0, 1.0, 1.0, 4_200.0),
    (2.0, 1.0, 0.0, -1.0, -3_359.0),
    (2.0, -1.0, -1.0, 1.0, 2_463.0),
    (2.0, -1.0, 0.0, 1.0, 2_211.0),
    (2.0, -1.0, -1.0, -1.0, 2_065.0),
    (0.0, 1.0, -1.0, -1.0, -1_870.0),
    (4.0, 0.0, -1.0, -1.0, 1_828.0),
    (0.0, 1.0, 0.0, 1.0, -1_794.0),
];

fn polynomial(t: f64, c0: f64, c1: f64, c2: f64, inv3: f64, inv4: f64) -> f64 {
    let mut value = c0 + c1 * t + c2 * t * t;
    if inv3 != 0.0 {
        value += t * t * t / inv3;
    }
    if inv4 != 0.0 {
        value += t * t * t * t / inv4;
    }
    normalize_degrees(value)
}

fn eccentricity_factor(m: f64, e: f64) -> f64 {
    match m.abs() as i32 {
        1 => e,
        2 => e * e,
        _ => 1.0,
    }
}

/// Geocentric ecliptic longitude, latitude (degrees) and distance (km)
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let lp = polynomial(t, 218.316_447_7, 481_267.881_234_21, -0.001_578_6, 538_841.0, -65_194_000.0);
    let d = polynomial(t, 297.850_192_1, 445_267.111_403_4, -0.001_881_9, 545_868.0, -113_065_000.0);
    let m = polynomial(t, 357.529_109_2, 35_999.050_290_9, -0.000_153_6, 24_490_000.0, 0.0);
    let mp = polynomial(t, 134.963_396_4, 477_198.867_505_5, 0.008_741_4, 69_699.0, -14_712_000.0);
    let f = polynomial(t, 93.272_095_0, 483_202.017_523_3, -0.003_653_9, -3_526_000.0, 863_310_000.0);

    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;

    let (mut sum_l, sum_r) = TERMS_LR.iter().fold(
        (0.0_f64, 0.0_f64),
        |(l, r), &(td, tm, tmp, tf, cl, cr)| {
            let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
            let factor = eccentricity_factor(tm, e);
            (l + cl * factor * arg.sin(), r + cr * factor * arg.cos())
        },
    );
    let mut sum_b = TERMS_B.iter().fold(0.0_f64, |b, &(td, tm, tmp, tf, cb)| {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        b + cb * eccentricity_factor(tm, e) * arg.sin()
    });

    let a1 = normalize_degrees(119.75 + 131.849 * t);
    let a2 = normalize_degrees(53.09 + 479_264.290 * t);
    let a3 = normalize_degrees(313.45 + 481_266.484 * t);

    sum_l += 3958.0 * (a1 * DEG).sin() + 1962.0 * ((lp - f) * DEG).sin() + 318.0 * (a2 * DEG).sin();

    sum_b += -2235.0 * (lp * DEG).sin()
        + 382.0 * (a3 * DEG).sin()
        + 175.0 * ((a1 - f) * DEG).sin()
        + 175.0 * ((a1 + f) * DEG).sin()
        + 127.0 * ((lp - mp) * DEG).sin()
        - 115.0 * ((lp + mp) * DEG).sin();

    (
        normalize_degrees(lp + sum_l / 1_000_000.0),
        sum_b / 1_000_000.0,
        385_000.56 + sum_r / 1000.0,
    )
}

/// Reduce a geocentric altitude to the observer's position on the surface
fn topocentric_altitude(geocentric: f64, distance_km: f64) -> f64 {
    let sin_hp = EARTH_RADIUS_KM / distance_km;
    let parallax = (sin_hp * (geocentric * DEG).cos()).asin();
    geocentric - parallax / DEG
}

/// Compute the lunar position for a UTC instant and observer coordinates
#[must_use]
pub fn lunar_position(at: DateTime<Utc>, latitude: f64, longitude: f64) -> LunarPosition {
    let jd = julian_date(at);
    let t = julian_century(jd);

    let (lon, lat, distance) = moon_ecliptic(t);
    let (ra, dec) = ecliptic_to_equatorial(lon, lat, obliquity_corrected(t));
    let lst = local_sidereal_time(jd, longitude);
    let (geocentric, azimuth) = equatorial_to_horizontal(ra, dec, latitude, lst);

    LunarPosition {
        ecliptic_longitude: lon,
        ecliptic_latitude: lat,
        distance_km: distance,
        altitude: topocentric_altitude(geocentric, distance),
        azimuth,
    }
}

/// Topocentric altitude of the moon centre, degrees
#[must_use]
pub fn lunar_altitude(at: DateTime<Utc>, latitude: f64, longitude: f64) -> f64 {
    lunar_position(at, latitude, longitude).altitude
}

/// Moon minus sun ecliptic longitude in [0, 360): 0 at new moon, 180 at full moon
#[must_use]
pub fn longitude_difference(at: DateTime<Utc>) -> f64 {
    let t = julian_century(julian_date(at));
    let (moon_lon, _, _) = moon_ecliptic(t);
    normalize_degrees(moon_lon - sun_apparent_longitude(t))
}

/// Angular separation of moon and sun in [0, 180] degrees
#[must_use]
pub fn elongation(at: DateTime<Utc>) -> f64 {
    let t = julian_century(julian_date(at));
    let (moon_lon, moon_lat, _) = moon_ecliptic(t);
    let d_lon = (moon_lon - sun_apparent_longitude(t)) * DEG;
    let cos_elongation = (moon_lat * DEG).cos() * d_lon.cos();
    cos_elongation.clamp(-1.0, 1.0).acos() / DEG
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meeus_example_47a() {
        // 1992 April 12, 0h TD
        let at = Utc.with_ymd_and_hms(1992, 4, 12, 0, 0, 0).unwrap();
        let (lon, lat, dist) = moon_ecliptic(julian_century(julian_date(at)));

        assert!((lon - 133.17).abs() < 0.5, "longitude {lon:.2}");
        assert!((lat + 3.23).abs() < 0.5, "latitude {lat:.2}");
        assert!((dist - 368_409.0).abs() < 2000.0, "distance {dist:.0}");
    }

    #[test]
    fn test_new_moon_elongation() {
        // New moon on 2026-02-17 around 12:00 UTC
        let at = Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0).unwrap();
        assert!(elongation(at) < 10.0);
        let difference = longitude_difference(at);
        assert!(difference < 10.0 || difference > 350.0);
    }

    #[test]
    fn test_full_moon_elongation() {
        let at = Utc.with_ymd_and_hms(2025, 1, 13, 22, 0, 0).unwrap();
        assert!(elongation(at) > 170.0);
        assert!((longitude_difference(at) - 180.0).abs() < 10.0);
    }

    #[test]
    fn test_parallax_lowers_altitude() {
        let at = Utc.with_ymd_and_hms(2026, 2, 18, 15, 30, 0).unwrap();
        let pos = lunar_position(at, 21.4225, 39.8262);
        assert!((-90.0..=90.0).contains(&pos.altitude));
        assert!(pos.distance_km > 350_000.0 && pos.distance_km < 410_000.0);
        assert!(topocentric_altitude(0.0, pos.distance_km) < -0.85);
    }
}
