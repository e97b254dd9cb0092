//! Met.no locationforecast hours
//!
//! The collaborator flattens `data.instant.details` and the `next_1_hours`
//! summary and details of each timeseries entry into one object.

use serde::{Deserialize, Serialize};

use super::{
    NormalizedHour, check_humidity, check_non_negative, check_temperature, parse_timestamp,
};
use crate::Result;
use crate::models::{CloudCover, HourlyRecord, PrecipitationType, clamp_percent};

/// One Met.no timeseries entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MetNoHour {
    pub time: Option<String>,
    pub air_temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub dew_point_temperature: Option<f64>,
    pub air_pressure_at_sea_level: Option<f64>,
    pub cloud_area_fraction: Option<f64>,
    pub cloud_area_fraction_low: Option<f64>,
    pub cloud_area_fraction_medium: Option<f64>,
    pub cloud_area_fraction_high: Option<f64>,
    pub fog_area_fraction: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
    pub wind_from_direction: Option<f64>,
    /// Next hour precipitation in mm
    pub precipitation_amount: Option<f64>,
    /// Next hour symbol, e.g. `lightsnowshowers_night`
    pub symbol_code: Option<String>,
}

impl MetNoHour {
    pub fn normalize(&self) -> Result<NormalizedHour> {
        let mut record = HourlyRecord::new(
            parse_timestamp("time", self.time.as_deref())?,
            check_temperature("air_temperature", self.air_temperature)?,
        );

        record.relative_humidity = check_humidity("relative_humidity", self.relative_humidity)?;
        record.dew_point = self.dew_point_temperature;
        record.pressure = self.air_pressure_at_sea_level;
        record.cloud_cover = self.cloud_cover();
        record.fog = self.fog_area_fraction.map(clamp_percent);
        record.wind_speed = check_non_negative("wind_speed", self.wind_speed)?;
        record.wind_direction = self.wind_from_direction;
        record.precipitation_amount =
            check_non_negative("precipitation_amount", self.precipitation_amount)?;
        record.precipitation_type = self
            .symbol_code
            .as_deref()
            .map_or(PrecipitationType::None, symbol_precipitation);

        Ok(NormalizedHour::without_native(record))
    }

    fn cloud_cover(&self) -> Option<CloudCover> {
        CloudCover::from_parts(
            self.cloud_area_fraction_low,
            self.cloud_area_fraction_medium,
            self.cloud_area_fraction_high,
            self.cloud_area_fraction,
        )
    }
}

/// Precipitation category of a Met.no symbol code
#[must_use]
pub fn symbol_precipitation(symbol: &str) -> PrecipitationType {
    let base = symbol.split('_').next().unwrap_or(symbol);
    if base.contains("sleet") {
        PrecipitationType::IcePellets
    } else if base.contains("snow") {
        PrecipitationType::Snow
    } else if base.contains("rain") {
        PrecipitationType::Rain
    } else {
        PrecipitationType::None
    }
}
