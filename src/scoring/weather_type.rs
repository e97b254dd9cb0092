//! Categorical weather type label per hour

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{HourlyRecord, PrecipitationType};
use crate::{AstroForecastError, Result};

/// Precipitation rate in mm/h from which the heavy variant applies
pub const HEAVY_PRECIPITATION: f64 = 4.0;
/// Relative humidity above which a clear-ish hour is labeled humid
pub const HUMID_THRESHOLD: f64 = 90.0;
/// Cloud cover below which the humid label may apply
pub const HUMID_MAX_CLOUD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCategory {
    Clear,
    PartlyCloudy,
    MostlyCloudy,
    Cloudy,
    Humid,
    LightRain,
    Rain,
    LightSnow,
    Snow,
    FreezingRain,
    IcePellets,
    Undetermined,
}

impl WeatherCategory {
    const ALL: [WeatherCategory; 12] = [
        WeatherCategory::Clear,
        WeatherCategory::PartlyCloudy,
        WeatherCategory::MostlyCloudy,
        WeatherCategory::Cloudy,
        WeatherCategory::Humid,
        WeatherCategory::LightRain,
        WeatherCategory::Rain,
        WeatherCategory::LightSnow,
        WeatherCategory::Snow,
        WeatherCategory::FreezingRain,
        WeatherCategory::IcePellets,
        WeatherCategory::Undetermined,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            WeatherCategory::Clear => "clear",
            WeatherCategory::PartlyCloudy => "pcloudy",
            WeatherCategory::MostlyCloudy => "mcloudy",
            WeatherCategory::Cloudy => "cloudy",
            WeatherCategory::Humid => "humid",
            WeatherCategory::LightRain => "lightrain",
            WeatherCategory::Rain => "rain",
            WeatherCategory::LightSnow => "lightsnow",
            WeatherCategory::Snow => "snow",
            WeatherCategory::FreezingRain => "freezingrain",
            WeatherCategory::IcePellets => "icepellets",
            WeatherCategory::Undetermined => "undetermined",
        }
    }

    #[must_use]
    pub fn is_snow(self) -> bool {
        matches!(self, WeatherCategory::LightSnow | WeatherCategory::Snow)
    }
}

/// Weather category with its day/night suffix, e.g. `clearday`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct WeatherType {
    pub category: WeatherCategory,
    pub daylight: bool,
}

impl WeatherType {
    #[must_use]
    pub fn label(&self) -> String {
        let suffix = if self.daylight { "day" } else { "night" };
        format!("{}{}", self.category.code(), suffix)
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<WeatherType> for String {
    fn from(weather_type: WeatherType) -> Self {
        weather_type.label()
    }
}

impl FromStr for WeatherType {
    type Err = AstroForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let (code, daylight) = if let Some(code) = s.strip_suffix("night") {
            (code, false)
        } else if let Some(code) = s.strip_suffix("day") {
            (code, true)
        } else {
            return Err(AstroForecastError::validation(format!(
                "weather type '{s}' has no day/night suffix"
            )));
        };

        WeatherCategory::ALL
            .into_iter()
            .find(|category| category.code() == code)
            .map(|category| WeatherType { category, daylight })
            .ok_or_else(|| AstroForecastError::validation(format!("unknown weather type '{s}'")))
    }
}

impl TryFrom<String> for WeatherType {
    type Error = AstroForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Classify one hour.
///
/// Precipitation wins over everything else. Without precipitation a humid
/// hour is only labeled so when cloud cover stays below 60 %; otherwise the
/// total cloud cover decides.
#[must_use]
pub fn classify(record: &HourlyRecord, daylight: bool) -> WeatherType {
    WeatherType {
        category: category(record),
        daylight,
    }
}

fn category(record: &HourlyRecord) -> WeatherCategory {
    let amount = record.precipitation_amount;
    let heavy = amount.is_some_and(|mm| mm >= HEAVY_PRECIPITATION);

    let kind = match record.precipitation_type {
        PrecipitationType::None if amount.is_some_and(|mm| mm > 0.0) => {
            if record.temperature <= 0.0 {
                PrecipitationType::Snow
            } else {
                PrecipitationType::Rain
            }
        }
        kind => kind,
    };

    match kind {
        PrecipitationType::FreezingRain => return WeatherCategory::FreezingRain,
        PrecipitationType::IcePellets => return WeatherCategory::IcePellets,
        PrecipitationType::Snow if heavy => return WeatherCategory::Snow,
        PrecipitationType::Snow => return WeatherCategory::LightSnow,
        PrecipitationType::Rain if heavy => return WeatherCategory::Rain,
        PrecipitationType::Rain => return WeatherCategory::LightRain,
        PrecipitationType::None => {}
    }

    let Some(cloud) = record.total_cloud_cover() else {
        return WeatherCategory::Undetermined;
    };

    match cloud {
        c if c < HUMID_MAX_CLOUD && record.relative_humidity.is_some_and(|rh| rh > HUMID_THRESHOLD) => {
            WeatherCategory::Humid
        }
        c if c < 20.0 => WeatherCategory::Clear,
        c if c < 60.0 => WeatherCategory::PartlyCloudy,
        c if c <= 80.0 => WeatherCategory::MostlyCloudy,
        _ => WeatherCategory::Cloudy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CloudCover;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn record(cloud: Option<f64>, humidity: f64) -> HourlyRecord {
        let mut record = HourlyRecord::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(), 10.0);
        record.cloud_cover = cloud.map(CloudCover::from_total);
        record.relative_humidity = Some(humidity);
        record
    }

    #[rstest]
    #[case(5.0, 40.0, "clearday")]
    #[case(19.9, 40.0, "clearday")]
    #[case(20.0, 40.0, "pcloudyday")]
    #[case(60.0, 40.0, "mcloudyday")]
    #[case(80.0, 40.0, "mcloudyday")]
    #[case(80.5, 40.0, "cloudyday")]
    #[case(30.0, 95.0, "humidday")]
    #[case(70.0, 95.0, "mcloudyday")]
    fn test_cloud_and_humidity_rules(#[case] cloud: f64, #[case] humidity: f64, #[case] label: &str) {
        assert_eq!(classify(&record(Some(cloud), humidity), true).label(), label);
    }

    #[rstest]
    #[case(PrecipitationType::Rain, Some(1.0), "lightrain")]
    #[case(PrecipitationType::Rain, Some(4.0), "rain")]
    #[case(PrecipitationType::Rain, None, "lightrain")]
    #[case(PrecipitationType::Snow, Some(10.0), "snow")]
    #[case(PrecipitationType::Snow, Some(0.5), "lightsnow")]
    #[case(PrecipitationType::FreezingRain, Some(10.0), "freezingrain")]
    #[case(PrecipitationType::IcePellets, Some(0.2), "icepellets")]
    fn test_precipitation_rules(
        #[case] kind: PrecipitationType,
        #[case] amount: Option<f64>,
        #[case] code: &str,
    ) {
        let mut wet = record(Some(10.0), 99.0);
        wet.precipitation_type = kind;
        wet.precipitation_amount = amount;
        assert_eq!(classify(&wet, false).label(), format!("{code}night"));
    }

    #[test]
    fn test_untyped_precipitation_uses_temperature() {
        let mut cold = record(Some(100.0), 80.0);
        cold.temperature = -3.0;
        cold.precipitation_amount = Some(10.0);
        assert_eq!(classify(&cold, true).category, WeatherCategory::Snow);

        cold.temperature = 5.0;
        assert_eq!(classify(&cold, true).category, WeatherCategory::Rain);
    }

    #[test]
    fn test_missing_cloud_cover_is_undetermined() {
        assert_eq!(classify(&record(None, 50.0), false).label(), "undeterminednight");
    }

    #[test]
    fn test_label_round_trips_through_serde() {
        let weather_type = classify(&record(Some(5.0), 40.0), true);
        let json = serde_json::to_string(&weather_type).unwrap();
        assert_eq!(json, "\"clearday\"");
        let back: WeatherType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weather_type);
        assert!("cloudy".parse::<WeatherType>().is_err());
    }
}
