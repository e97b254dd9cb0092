//! 7Timer astro product steps
//!
//! 7Timer reports 3-hourly steps as offsets (`timepoint`, hours) from the run
//! time (`init`, `YYYYMMDDHH`), with most quantities on index scales.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::{NormalizedHour, check_temperature, truncate_to_hour};
use crate::models::{CloudCover, DerivedParameters, HourlyRecord, PrecipitationType, Sourced};
use crate::{AstroForecastError, Result};

/// Sentinel 7Timer uses for values it cannot provide
pub const NOT_AVAILABLE: i64 = -9999;

/// Seeing in arcseconds per index 1..=8
pub const SEEING: [f64; 8] = [0.25, 0.625, 0.875, 1.125, 1.375, 1.75, 2.25, 2.5];

/// Magnitude degradation per transparency index 1..=8
pub const MAGNITUDE_DEGRADATION: [f64; 8] = [0.15, 0.35, 0.45, 0.55, 0.65, 0.775, 0.925, 1.0];

/// Cloud cover in percent per index 1..=9
const CLOUD_COVER: [f64; 9] = [3.0, 12.5, 25.0, 37.5, 50.0, 62.5, 75.0, 87.5, 97.0];

/// Wind speed in m/s per index 1..=8
const WIND_SPEED: [f64; 8] = [0.15, 1.85, 5.7, 9.4, 14.0, 20.85, 28.55, 32.6];

/// Lifted index in °C per reported key
const LIFTED_INDEX: [(i64, f64); 8] = [
    (-10, -7.0),
    (-6, -6.0),
    (-4, -4.0),
    (-1, -1.5),
    (2, 0.0),
    (6, 1.5),
    (10, 4.0),
    (15, 7.0),
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SevenTimerWind {
    pub direction: Option<String>,
    pub speed: Option<i64>,
}

/// One 7Timer astro dataseries step, flattened with the run's `init`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SevenTimerHour {
    pub init: Option<String>,
    pub timepoint: Option<i64>,
    pub cloudcover: Option<i64>,
    pub seeing: Option<i64>,
    pub transparency: Option<i64>,
    pub lifted_index: Option<i64>,
    pub rh2m: Option<i64>,
    pub wind10m: Option<SevenTimerWind>,
    pub temp2m: Option<f64>,
    pub prec_type: Option<String>,
}

impl SevenTimerHour {
    pub fn normalize(&self) -> Result<NormalizedHour> {
        let mut record = HourlyRecord::new(self.timestamp()?, check_temperature("temp2m", self.temp2m)?);

        record.cloud_cover = available(self.cloudcover)
            .map(|index| CloudCover::from_total(CLOUD_COVER[scale_index(index, 9)]));
        record.relative_humidity = available(self.rh2m).map(humidity_percent);
        if let Some(wind) = &self.wind10m {
            record.wind_speed = available(wind.speed).map(|index| WIND_SPEED[scale_index(index, 8)]);
            record.wind_direction = wind.direction.as_deref().and_then(compass_degrees);
        }
        record.precipitation_type = self
            .prec_type
            .as_deref()
            .map_or(Ok(PrecipitationType::None), precipitation_type)?;

        let native = DerivedParameters {
            seeing: available(self.seeing).map(|index| Sourced::native(SEEING[scale_index(index, 8)])),
            transparency: available(self.transparency)
                .map(|index| Sourced::native(1.0 - MAGNITUDE_DEGRADATION[scale_index(index, 8)])),
            lifted_index: available(self.lifted_index).map(|key| Sourced::native(lifted_index(key))),
        };

        Ok(NormalizedHour { record, native })
    }

    fn timestamp(&self) -> Result<chrono::DateTime<chrono::Utc>> {
        let init = self
            .init
            .as_deref()
            .ok_or_else(|| AstroForecastError::missing("init"))?;
        let timepoint = self
            .timepoint
            .ok_or_else(|| AstroForecastError::missing("timepoint"))?;

        let run = NaiveDateTime::parse_from_str(&format!("{init}00"), "%Y%m%d%H%M")
            .map_err(|e| AstroForecastError::malformed("init", init, e.to_string()))?
            .and_utc();
        let at = TimeDelta::try_hours(timepoint)
            .and_then(|offset| run.checked_add_signed(offset))
            .ok_or_else(|| AstroForecastError::malformed("timepoint", timepoint, "out of range"))?;
        truncate_to_hour("timepoint", at)
    }
}

fn available(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != NOT_AVAILABLE)
}

/// Zero-based table position for a one-based index, clamped into the table
fn scale_index(index: i64, len: usize) -> usize {
    let max = i64::try_from(len).unwrap_or(i64::MAX);
    usize::try_from(index.clamp(1, max) - 1).unwrap_or(0)
}

/// Relative humidity in percent for an rh2m index (-4..=16)
fn humidity_percent(index: i64) -> f64 {
    match index.clamp(-4, 16) {
        16 => 100.0,
        v => 5.0 * (v as f64 + 4.0) + 2.5,
    }
}

/// Lifted index in °C for the nearest reported key
fn lifted_index(key: i64) -> f64 {
    LIFTED_INDEX
        .iter()
        .min_by_key(|(k, _)| (k - key).abs())
        .map_or(0.0, |(_, value)| *value)
}

fn precipitation_type(code: &str) -> Result<PrecipitationType> {
    match code {
        "none" => Ok(PrecipitationType::None),
        "rain" => Ok(PrecipitationType::Rain),
        "snow" => Ok(PrecipitationType::Snow),
        "frzr" => Ok(PrecipitationType::FreezingRain),
        "icep" => Ok(PrecipitationType::IcePellets),
        other => Err(AstroForecastError::malformed("prec_type", other, "unknown precipitation type")),
    }
}

/// Degrees for an 8-point compass name
fn compass_degrees(direction: &str) -> Option<f64> {
    match direction {
        "N" => Some(0.0),
        "NE" => Some(45.0),
        "E" => Some(90.0),
        "SE" => Some(135.0),
        "S" => Some(180.0),
        "SW" => Some(225.0),
        "W" => Some(270.0),
        "NW" => Some(315.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn step() -> SevenTimerHour {
        SevenTimerHour {
            init: Some("2024030112".to_string()),
            timepoint: Some(9),
            cloudcover: Some(2),
            seeing: Some(3),
            transparency: Some(4),
            lifted_index: Some(2),
            rh2m: Some(6),
            wind10m: Some(SevenTimerWind {
                direction: Some("NW".to_string()),
                speed: Some(2),
            }),
            temp2m: Some(4.0),
            prec_type: Some("none".to_string()),
        }
    }

    #[test]
    fn test_normalize_step() {
        let normalized = step().normalize().unwrap();
        let record = &normalized.record;
        assert_eq!(record.timestamp.to_rfc3339(), "2024-03-01T21:00:00+00:00");
        assert_eq!(record.total_cloud_cover(), Some(12.5));
        assert_eq!(record.relative_humidity, Some(52.5));
        assert_eq!(record.wind_speed, Some(1.85));
        assert_eq!(record.wind_direction, Some(315.0));

        let native = normalized.native;
        assert_eq!(native.seeing.unwrap().value, 0.875);
        assert!((native.transparency.unwrap().value - 0.45).abs() < 1e-9);
        assert_eq!(native.lifted_index.unwrap().value, 0.0);
        assert!(!native.seeing.unwrap().is_estimated());
    }

    #[test]
    fn test_not_available_stays_absent() {
        let raw = SevenTimerHour {
            seeing: Some(NOT_AVAILABLE),
            transparency: None,
            ..step()
        };
        let native = raw.normalize().unwrap().native;
        assert!(native.seeing.is_none());
        assert!(native.transparency.is_none());
        assert!(native.lifted_index.is_some());
    }

    #[rstest]
    #[case(-4, 2.5)]
    #[case(0, 22.5)]
    #[case(15, 97.5)]
    #[case(16, 100.0)]
    #[case(40, 100.0)]
    fn test_humidity_scale(#[case] index: i64, #[case] expected: f64) {
        assert_eq!(humidity_percent(index), expected);
    }

    #[rstest]
    #[case("frzr", PrecipitationType::FreezingRain)]
    #[case("icep", PrecipitationType::IcePellets)]
    #[case("snow", PrecipitationType::Snow)]
    fn test_precipitation_types(#[case] code: &str, #[case] expected: PrecipitationType) {
        let raw = SevenTimerHour {
            prec_type: Some(code.to_string()),
            ..step()
        };
        assert_eq!(raw.normalize().unwrap().record.precipitation_type, expected);
    }

    #[test]
    fn test_unknown_precipitation_rejects_step() {
        let raw = SevenTimerHour {
            prec_type: Some("hail".to_string()),
            ..step()
        };
        assert!(raw.normalize().unwrap_err().is_hour_local());
    }

    #[test]
    fn test_missing_init_rejects_step() {
        let raw = SevenTimerHour {
            init: None,
            ..step()
        };
        assert!(raw.normalize().is_err());
    }
}
