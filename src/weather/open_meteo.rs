//! `OpenMeteo` hourly forecast rows
//!
//! The collaborator transposes the column-oriented `hourly` block into one
//! object per hour and copies the request units alongside.

use serde::{Deserialize, Serialize};

use super::{
    NormalizedHour, WindSpeedUnit, check_humidity, check_non_negative, check_temperature,
    fahrenheit_to_celsius, parse_timestamp,
};
use crate::Result;
use crate::models::{CloudCover, HourlyRecord, PrecipitationType};

/// Temperature unit requested from `OpenMeteo`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    #[serde(alias = "°C")]
    Celsius,
    #[serde(alias = "°F")]
    Fahrenheit,
}

impl TemperatureUnit {
    #[must_use]
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => fahrenheit_to_celsius(value),
        }
    }
}

/// One hourly row from `OpenMeteo`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct OpenMeteoHour {
    pub time: Option<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub relative_humidity: Option<f64>,
    #[serde(rename = "dew_point_2m")]
    pub dew_point: Option<f64>,
    #[serde(rename = "pressure_msl")]
    pub pressure: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub cloud_cover_low: Option<f64>,
    #[serde(rename = "cloud_cover_mid")]
    pub cloud_cover_medium: Option<f64>,
    pub cloud_cover_high: Option<f64>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<u8>,
    #[serde(default)]
    pub wind_speed_unit: WindSpeedUnit,
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

impl OpenMeteoHour {
    pub fn normalize(&self) -> Result<NormalizedHour> {
        let temperature = self.temperature.map(|t| self.temperature_unit.to_celsius(t));
        let mut record = HourlyRecord::new(
            parse_timestamp("time", self.time.as_deref())?,
            check_temperature("temperature_2m", temperature)?,
        );

        record.relative_humidity =
            check_humidity("relative_humidity_2m", self.relative_humidity)?;
        record.dew_point = self.dew_point.map(|t| self.temperature_unit.to_celsius(t));
        record.pressure = self.pressure;
        record.cloud_cover = self.cloud_cover();
        record.wind_speed = check_non_negative("wind_speed_10m", self.wind_speed)?
            .map(|speed| self.wind_speed_unit.to_meters_per_second(speed));
        record.wind_direction = self.wind_direction;
        record.precipitation_amount = check_non_negative("precipitation", self.precipitation)?;
        record.precipitation_type = self
            .weather_code
            .map_or(PrecipitationType::None, weather_code_precipitation);
        // WMO fog codes carry no area fraction; treat them as full cover
        if matches!(self.weather_code, Some(45 | 48)) {
            record.fog = Some(100.0);
        }

        Ok(NormalizedHour::without_native(record))
    }

    fn cloud_cover(&self) -> Option<CloudCover> {
        CloudCover::from_parts(
            self.cloud_cover_low,
            self.cloud_cover_medium,
            self.cloud_cover_high,
            self.cloud_cover,
        )
    }
}

/// Precipitation category of a WMO weather interpretation code
#[must_use]
pub fn weather_code_precipitation(code: u8) -> PrecipitationType {
    match code {
        56 | 57 | 66 | 67 => PrecipitationType::FreezingRain,
        71 | 73 | 75 | 85 | 86 => PrecipitationType::Snow,
        77 => PrecipitationType::IcePellets,
        51 | 53 | 55 | 61 | 63 | 65 | 80 | 81 | 82 | 95 | 96 | 99 => PrecipitationType::Rain,
        _ => PrecipitationType::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(0, PrecipitationType::None)]
    #[case(3, PrecipitationType::None)]
    #[case(57, PrecipitationType::FreezingRain)]
    #[case(63, PrecipitationType::Rain)]
    #[case(75, PrecipitationType::Snow)]
    #[case(77, PrecipitationType::IcePellets)]
    #[case(95, PrecipitationType::Rain)]
    fn test_weather_code_precipitation(#[case] code: u8, #[case] expected: PrecipitationType) {
        assert_eq!(weather_code_precipitation(code), expected);
    }

    #[test]
    fn test_units_default_to_kmh_and_celsius() {
        let raw: OpenMeteoHour = serde_json::from_value(json!({
            "time": "2024-03-01T23:00",
            "temperature_2m": 3.0,
            "wind_speed_10m": 18.0,
            "cloud_cover_low": 5.0,
            "cloud_cover_mid": 20.0,
            "cloud_cover_high": 70.0
        }))
        .unwrap();

        let record = raw.normalize().unwrap().record;
        assert_eq!(record.temperature, 3.0);
        assert!((record.wind_speed.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(record.total_cloud_cover(), Some(70.0));
    }

    #[test]
    fn test_partial_bands_without_total() {
        let raw: OpenMeteoHour = serde_json::from_value(json!({
            "time": "2024-03-01T23:00",
            "temperature_2m": 3.0,
            "cloud_cover_low": 15.0,
            "cloud_cover_high": 60.0
        }))
        .unwrap();

        let clouds = raw.normalize().unwrap().record.cloud_cover.unwrap();
        assert_eq!((clouds.low, clouds.medium, clouds.high), (15.0, 0.0, 60.0));
        assert_eq!(clouds.total, 60.0);
    }

    #[test]
    fn test_fahrenheit_and_knots() {
        let raw: OpenMeteoHour = serde_json::from_value(json!({
            "time": "2024-03-01T23:00",
            "temperature_2m": 50.0,
            "dew_point_2m": 32.0,
            "wind_speed_10m": 10.0,
            "wind_speed_unit": "kn",
            "temperature_unit": "fahrenheit",
            "weather_code": 45
        }))
        .unwrap();

        let record = raw.normalize().unwrap().record;
        assert!((record.temperature - 10.0).abs() < 1e-9);
        assert!(record.dew_point.unwrap().abs() < 1e-9);
        assert!((record.wind_speed.unwrap() - 5.144_44).abs() < 1e-6);
        assert_eq!(record.fog, Some(100.0));
    }

    #[test]
    fn test_humidity_out_of_range_rejected() {
        let raw = OpenMeteoHour {
            time: Some("2024-03-01T23:00".to_string()),
            temperature: Some(3.0),
            relative_humidity: Some(-3.0),
            ..OpenMeteoHour::default()
        };
        assert!(raw.normalize().unwrap_err().is_hour_local());
    }
}
