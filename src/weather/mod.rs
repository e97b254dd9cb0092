//! Raw forecast adapter: provider payloads into canonical hourly records
//!
//! Each provider hour is first deserialized into its provider-native shape
//! (`RawObservation`) and then normalized. Nothing past this module knows
//! which provider a record came from.

pub mod met_no;
pub mod open_meteo;
pub mod seven_timer;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, DurationRound, NaiveDateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::models::{DerivedParameters, HourlyRecord};
use crate::{AstroForecastError, Result};

pub use met_no::MetNoHour;
pub use open_meteo::OpenMeteoHour;
pub use seven_timer::SevenTimerHour;

/// Supported forecast providers
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    MetNo,
    SevenTimer,
    OpenMeteo,
}

impl ProviderKind {
    /// Derived values the provider supplies natively
    #[must_use]
    pub fn native_capabilities(self) -> NativeCapabilities {
        match self {
            ProviderKind::SevenTimer => NativeCapabilities {
                seeing: true,
                transparency: true,
                lifted_index: true,
            },
            ProviderKind::MetNo | ProviderKind::OpenMeteo => NativeCapabilities::default(),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AstroForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "met_no" | "metno" | "met.no" => Ok(ProviderKind::MetNo),
            "seven_timer" | "seventimer" | "7timer" => Ok(ProviderKind::SevenTimer),
            "open_meteo" | "openmeteo" | "open-meteo" => Ok(ProviderKind::OpenMeteo),
            _ => Err(AstroForecastError::unsupported_provider(s)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::MetNo => write!(f, "met_no"),
            ProviderKind::SevenTimer => write!(f, "seven_timer"),
            ProviderKind::OpenMeteo => write!(f, "open_meteo"),
        }
    }
}

/// Which derived parameters a provider supplies itself
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeCapabilities {
    #[serde(default)]
    pub seeing: bool,
    #[serde(default)]
    pub transparency: bool,
    #[serde(default)]
    pub lifted_index: bool,
}

impl NativeCapabilities {
    /// Drop native values the provider is not trusted to supply
    #[must_use]
    pub fn filter(&self, derived: DerivedParameters) -> DerivedParameters {
        DerivedParameters {
            seeing: derived.seeing.filter(|_| self.seeing),
            transparency: derived.transparency.filter(|_| self.transparency),
            lifted_index: derived.lifted_index.filter(|_| self.lifted_index),
        }
    }
}

/// Raw provider response as handed over by the data-fetch collaborator
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawPayload {
    pub provider: String,
    /// Defaults to what the provider is known to supply
    #[serde(default)]
    pub capabilities: Option<NativeCapabilities>,
    /// One JSON object of provider-native field names per hour
    pub hours: Vec<Map<String, Value>>,
}

/// One provider-native hour
#[derive(Debug, Clone, PartialEq)]
pub enum RawObservation {
    MetNo(MetNoHour),
    SevenTimer(SevenTimerHour),
    OpenMeteo(OpenMeteoHour),
}

impl RawObservation {
    /// Deserialize one hour of provider-native fields
    pub fn from_fields(kind: ProviderKind, fields: &Map<String, Value>) -> Result<Self> {
        Ok(match kind {
            ProviderKind::MetNo => RawObservation::MetNo(deserialize_hour(fields)?),
            ProviderKind::SevenTimer => RawObservation::SevenTimer(deserialize_hour(fields)?),
            ProviderKind::OpenMeteo => RawObservation::OpenMeteo(deserialize_hour(fields)?),
        })
    }

    /// Convert into the canonical record plus any natively supplied derived values
    pub fn normalize(&self) -> Result<NormalizedHour> {
        match self {
            RawObservation::MetNo(hour) => hour.normalize(),
            RawObservation::SevenTimer(hour) => hour.normalize(),
            RawObservation::OpenMeteo(hour) => hour.normalize(),
        }
    }
}

/// Canonical hour produced by the adapter
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHour {
    pub record: HourlyRecord,
    pub native: DerivedParameters,
}

impl NormalizedHour {
    #[must_use]
    pub fn without_native(record: HourlyRecord) -> Self {
        Self {
            record,
            native: DerivedParameters::default(),
        }
    }
}

/// Normalize a whole payload.
///
/// Malformed hours are logged and skipped. Output is chronological with one
/// record per UTC hour; the first occurrence of a duplicated hour wins.
#[instrument(skip(payload), fields(provider = %payload.provider, hours = payload.hours.len()))]
pub fn adapt(payload: &RawPayload) -> Result<Vec<NormalizedHour>> {
    let kind: ProviderKind = payload.provider.parse()?;
    let capabilities = payload
        .capabilities
        .unwrap_or_else(|| kind.native_capabilities());

    let mut hours = Vec::with_capacity(payload.hours.len());
    let mut rejected = 0usize;

    for fields in &payload.hours {
        match RawObservation::from_fields(kind, fields).and_then(|raw| raw.normalize()) {
            Ok(mut hour) => {
                hour.native = capabilities.filter(hour.native);
                hours.push(hour);
            }
            Err(e) if e.is_hour_local() => {
                warn!("Rejected {} hour: {}", kind, e);
                rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    hours.sort_by_key(|hour| hour.record.timestamp);
    hours.dedup_by_key(|hour| hour.record.timestamp);

    debug!(
        "Normalized {} hours from {} ({} rejected)",
        hours.len(),
        kind,
        rejected
    );

    Ok(hours)
}

fn deserialize_hour<T: DeserializeOwned>(fields: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|e| {
        let time = fields
            .get("time")
            .or_else(|| fields.get("timepoint"))
            .map_or_else(|| "<unknown time>".to_string(), Value::to_string);
        AstroForecastError::malformed("hour", time, e.to_string())
    })
}

/// Parse an RFC 3339 or naive (UTC) timestamp and truncate it to the hour
pub(crate) fn parse_timestamp(field: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = value.ok_or_else(|| AstroForecastError::missing(field))?;
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").map(|dt| dt.and_utc()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.and_utc()))
        .map_err(|e| AstroForecastError::malformed(field, raw, e.to_string()))?;
    truncate_to_hour(field, parsed)
}

pub(crate) fn truncate_to_hour(field: &str, at: DateTime<Utc>) -> Result<DateTime<Utc>> {
    at.duration_trunc(TimeDelta::hours(1))
        .map_err(|e| AstroForecastError::malformed(field, at, e.to_string()))
}

/// Mandatory temperature in °C within the plausible range
pub(crate) fn check_temperature(field: &str, value: Option<f64>) -> Result<f64> {
    let celsius = value.ok_or_else(|| AstroForecastError::missing(field))?;
    if !(-90.0..=60.0).contains(&celsius) {
        return Err(AstroForecastError::malformed(field, celsius, "outside -90..=60 °C"));
    }
    Ok(celsius)
}

pub(crate) fn check_humidity(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(rh) if !(0.0..=100.0).contains(&rh) => {
            Err(AstroForecastError::malformed(field, rh, "outside 0..=100 %"))
        }
        other => Ok(other),
    }
}

pub(crate) fn check_non_negative(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if v < 0.0 => Err(AstroForecastError::malformed(field, v, "negative")),
        other => Ok(other),
    }
}

/// Wind speed units used by providers
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindSpeedUnit {
    #[serde(rename = "ms", alias = "m/s")]
    MetersPerSecond,
    #[default]
    #[serde(rename = "kmh", alias = "km/h")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
    #[serde(rename = "kn", alias = "knots")]
    Knots,
}

impl WindSpeedUnit {
    #[must_use]
    pub fn to_meters_per_second(self, speed: f64) -> f64 {
        match self {
            WindSpeedUnit::MetersPerSecond => speed,
            WindSpeedUnit::KilometersPerHour => speed / 3.6,
            WindSpeedUnit::MilesPerHour => speed * 0.447_04,
            WindSpeedUnit::Knots => speed * 0.514_444,
        }
    }
}

#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hours(values: Vec<Value>) -> Vec<Map<String, Value>> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("met.no".parse::<ProviderKind>().unwrap(), ProviderKind::MetNo);
        assert_eq!("7Timer".parse::<ProviderKind>().unwrap(), ProviderKind::SevenTimer);
        assert_eq!("open_meteo".parse::<ProviderKind>().unwrap(), ProviderKind::OpenMeteo);

        let err = "wetter.com".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, AstroForecastError::UnsupportedProvider { .. }));
    }

    #[test]
    fn test_unknown_provider_fails_whole_call() {
        let payload = RawPayload {
            provider: "acme".to_string(),
            capabilities: None,
            hours: hours(vec![json!({"time": "2024-03-01T00:00:00Z"})]),
        };
        assert!(matches!(
            adapt(&payload),
            Err(AstroForecastError::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn test_malformed_hours_are_skipped() {
        let payload = RawPayload {
            provider: "met_no".to_string(),
            capabilities: None,
            hours: hours(vec![
                json!({"time": "2024-03-01T01:00:00Z", "air_temperature": 4.0}),
                json!({"time": "2024-03-01T02:00:00Z", "air_temperature": 4.0, "relative_humidity": 140.0}),
                json!({"time": "2024-03-01T03:00:00Z"}),
                json!({"time": "2024-03-01T00:30:00Z", "air_temperature": 3.0}),
            ]),
        };

        let normalized = adapt(&payload).unwrap();
        let timestamps: Vec<_> = normalized.iter().map(|h| h.record.timestamp).collect();
        assert_eq!(timestamps.len(), 2);
        assert_eq!(timestamps[0].to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(timestamps[1].to_rfc3339(), "2024-03-01T01:00:00+00:00");
    }

    #[test]
    fn test_duplicate_hours_keep_first() {
        let payload = RawPayload {
            provider: "met_no".to_string(),
            capabilities: None,
            hours: hours(vec![
                json!({"time": "2024-03-01T01:00:00Z", "air_temperature": 4.0}),
                json!({"time": "2024-03-01T01:20:00Z", "air_temperature": 9.0}),
            ]),
        };
        let normalized = adapt(&payload).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].record.temperature, 4.0);
    }

    #[test]
    fn test_capabilities_override_native_values() {
        let payload = RawPayload {
            provider: "seven_timer".to_string(),
            capabilities: Some(NativeCapabilities {
                seeing: true,
                transparency: false,
                lifted_index: false,
            }),
            hours: hours(vec![json!({
                "init": "2024030100", "timepoint": 3, "temp2m": 5,
                "seeing": 3, "transparency": 2, "lifted_index": 2
            })]),
        };
        let normalized = adapt(&payload).unwrap();
        assert!(normalized[0].native.seeing.is_some());
        assert!(normalized[0].native.transparency.is_none());
        assert!(normalized[0].native.lifted_index.is_none());
    }

    #[test]
    fn test_unit_conversions() {
        assert!((WindSpeedUnit::KilometersPerHour.to_meters_per_second(36.0) - 10.0).abs() < 1e-9);
        assert!((WindSpeedUnit::Knots.to_meters_per_second(10.0) - 5.144_44).abs() < 1e-6);
        assert!((WindSpeedUnit::MilesPerHour.to_meters_per_second(10.0) - 4.4704).abs() < 1e-9);
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_timestamp_parsing() {
        let naive = parse_timestamp("time", Some("2024-03-01T05:00")).unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-03-01T05:00:00+00:00");

        let offset = parse_timestamp("time", Some("2024-03-01T05:45:00+02:00")).unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-03-01T03:00:00+00:00");

        assert!(parse_timestamp("time", Some("yesterday")).is_err());
        assert!(parse_timestamp("time", None).unwrap_err().is_hour_local());
    }
}
