//! Canonical hourly weather record and display helpers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cloud cover split by altitude band, each in percent (0-100)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CloudCover {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub total: f64,
}

impl CloudCover {
    /// Build cover from the three bands; the total is the largest band
    #[must_use]
    pub fn from_bands(low: f64, medium: f64, high: f64) -> Self {
        let low = clamp_percent(low);
        let medium = clamp_percent(medium);
        let high = clamp_percent(high);
        Self {
            low,
            medium,
            high,
            total: low.max(medium).max(high),
        }
    }

    /// Build cover from a total only; every band carries the total
    #[must_use]
    pub fn from_total(total: f64) -> Self {
        let total = clamp_percent(total);
        Self {
            low: total,
            medium: total,
            high: total,
            total,
        }
    }

    /// Build cover with an explicit total alongside the bands
    #[must_use]
    pub fn with_total(low: f64, medium: f64, high: f64, total: f64) -> Self {
        Self {
            total: clamp_percent(total),
            ..Self::from_bands(low, medium, high)
        }
    }

    /// Build cover from whatever a provider reported.
    ///
    /// A missing band carries the total when there is one and counts as clear
    /// otherwise. Without a total the densest reported band stands in for it.
    #[must_use]
    pub fn from_parts(
        low: Option<f64>,
        medium: Option<f64>,
        high: Option<f64>,
        total: Option<f64>,
    ) -> Option<Self> {
        match (low, medium, high, total) {
            (None, None, None, None) => None,
            (None, None, None, Some(total)) => Some(Self::from_total(total)),
            (low, medium, high, total) => {
                let fill = total.unwrap_or(0.0);
                let bands = Self::from_bands(
                    low.unwrap_or(fill),
                    medium.unwrap_or(fill),
                    high.unwrap_or(fill),
                );
                Some(match total {
                    Some(total) => Self {
                        total: clamp_percent(total),
                        ..bands
                    },
                    None => bands,
                })
            }
        }
    }
}

/// Canonical precipitation category
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationType {
    #[default]
    None,
    Rain,
    Snow,
    FreezingRain,
    IcePellets,
}

impl fmt::Display for PrecipitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrecipitationType::None => "none",
            PrecipitationType::Rain => "rain",
            PrecipitationType::Snow => "snow",
            PrecipitationType::FreezingRain => "freezing rain",
            PrecipitationType::IcePellets => "ice pellets",
        };
        write!(f, "{name}")
    }
}

/// One normalized forecast hour, independent of the provider it came from
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyRecord {
    /// Start of the hour in UTC
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub relative_humidity: Option<f64>,
    /// Dew point in Celsius
    pub dew_point: Option<f64>,
    /// Sea level pressure in hPa
    pub pressure: Option<f64>,
    pub cloud_cover: Option<CloudCover>,
    /// Fog area fraction in percent
    pub fog: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: Option<f64>,
    pub precipitation_type: PrecipitationType,
    /// Precipitation amount in mm/h
    pub precipitation_amount: Option<f64>,
}

impl HourlyRecord {
    /// Record with only the mandatory fields set
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, temperature: f64) -> Self {
        Self {
            timestamp,
            temperature,
            relative_humidity: None,
            dew_point: None,
            pressure: None,
            cloud_cover: None,
            fog: None,
            wind_speed: None,
            wind_direction: None,
            precipitation_type: PrecipitationType::None,
            precipitation_amount: None,
        }
    }

    /// Convert wind direction from degrees to a 16-point cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Convert wind direction from degrees to an 8-point direction
    #[must_use]
    pub fn wind_direction_to_octant(degrees: f64) -> &'static str {
        const OCTANTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
        let index = ((degrees + 22.5).rem_euclid(360.0) / 45.0) as usize;
        OCTANTS[index.min(7)]
    }

    /// Plain description of a wind speed in m/s
    #[must_use]
    pub fn wind_speed_plain(speed: f64) -> &'static str {
        match speed {
            s if s < 0.5 => "Calm",
            s if s < 2.0 => "Light air",
            s if s < 3.5 => "Light breeze",
            s if s < 5.5 => "Gentle breeze",
            s if s < 8.5 => "Moderate breeze",
            s if s < 11.0 => "Fresh breeze",
            s if s < 14.0 => "Strong breeze",
            _ => "Moderate gale",
        }
    }

    /// 16-point compass rendering of the wind direction, if known
    #[must_use]
    pub fn wind_cardinal(&self) -> Option<&'static str> {
        self.wind_direction
            .map(|d| Self::wind_direction_to_cardinal(d.rem_euclid(360.0).round() as u16))
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        match (self.wind_speed, self.wind_cardinal()) {
            (Some(speed), Some(direction)) => format!("{speed:.1} m/s {direction}"),
            (Some(speed), None) => format!("{speed:.1} m/s"),
            _ => "n/a".to_string(),
        }
    }

    /// Total cloud cover in percent, if known
    #[must_use]
    pub fn total_cloud_cover(&self) -> Option<f64> {
        self.cloud_cover.map(|c| c.total)
    }
}

/// Clamp a percentage into 0..=100
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
