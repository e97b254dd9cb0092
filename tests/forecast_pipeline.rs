//! End-to-end tests for the forecast pipeline and the CLI

use std::process::Command;

use astroforecast::config::ForecastSettings;
use astroforecast::ephemeris::{astronomical_day, moon_state};
use astroforecast::models::{Event, Location};
use astroforecast::scoring::{ConditionWeights, WeatherCategory};
use astroforecast::{ForecastService, RawPayload};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn site() -> Location {
    Location::with_timezone_name(45.0, 7.0, 500.0, "Europe/Rome", "Test site").unwrap()
}

fn service(provider: &str, experimental: bool) -> ForecastService {
    ForecastService::new(
        site(),
        ConditionWeights::default(),
        &ForecastSettings {
            provider: provider.to_string(),
            horizon_hours: 72,
            experimental_features: experimental,
        },
    )
    .unwrap()
}

fn payload(provider: &str, hours: Vec<Value>) -> RawPayload {
    RawPayload {
        provider: provider.to_string(),
        capabilities: None,
        hours: hours
            .into_iter()
            .filter_map(|hour| hour.as_object().cloned())
            .collect::<Vec<Map<String, Value>>>(),
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

fn open_meteo_hour(time: DateTime<Utc>, band: f64) -> Value {
    json!({
        "time": time.format("%Y-%m-%dT%H:%M").to_string(),
        "temperature_2m": 8.0,
        "relative_humidity_2m": 40.0,
        "cloud_cover_low": band,
        "cloud_cover_mid": band,
        "cloud_cover_high": band,
        "wind_speed_10m": 2.0,
        "wind_speed_unit": "ms",
        "precipitation": 0.0,
        "weather_code": 0
    })
}

#[test]
fn test_clear_day_scores_best() {
    let hours = vec![
        open_meteo_hour(at(11), 5.0),
        open_meteo_hour(at(12), 20.0),
        open_meteo_hour(at(13), 45.0),
        open_meteo_hour(at(14), 90.0),
    ];
    let forecast = service("open_meteo", false)
        .build(&[payload("open_meteo", hours)], at(0))
        .unwrap();

    let hourly = forecast.hourly();
    assert_eq!(hourly.len(), 4);
    assert_eq!(hourly[0].score.weather_type.label(), "clearday");

    let scores: Vec<f64> = hourly.iter().map(|h| h.score.score.unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] < w[1]), "{scores:?}");
    assert_eq!(
        forecast.best_hour().map(|h| h.timestamp()),
        Some(at(11))
    );
}

#[test]
fn test_heavy_snow_is_snow_regardless_of_clouds() {
    let hours = [0.0, 50.0, 100.0]
        .into_iter()
        .enumerate()
        .map(|(i, cloud)| {
            json!({
                "time": (at(20) + Duration::hours(i as i64)).to_rfc3339(),
                "air_temperature": -2.0,
                "relative_humidity": 95.0,
                "cloud_area_fraction": cloud,
                "precipitation_amount": 10.0,
                "symbol_code": "heavysnow"
            })
        })
        .collect();

    let forecast = service("met_no", false)
        .build(&[payload("met_no", hours)], at(0))
        .unwrap();

    for hour in forecast.hourly() {
        assert_eq!(hour.score.weather_type.category, WeatherCategory::Snow);
        assert_eq!(hour.score.weather_type.label(), "snownight");
        assert_eq!(hour.score.condition_percentage, Some(0));
    }
}

#[test]
fn test_estimation_disabled_keeps_fields_absent() {
    let hours = vec![open_meteo_hour(at(22), 10.0)];
    let forecast = service("open_meteo", false)
        .build(&[payload("open_meteo", hours.clone())], at(0))
        .unwrap();
    let hour = &forecast.hourly()[0];
    assert!(hour.derived.seeing.is_none());
    assert!(hour.derived.transparency.is_none());
    assert!(hour.derived.lifted_index.is_none());
    assert!(hour.score.score.is_some());
    assert!(hour.score.contributions.iter().all(|c| !c.estimated));

    let estimated = service("open_meteo", true)
        .build(&[payload("open_meteo", hours)], at(0))
        .unwrap();
    let hour = &estimated.hourly()[0];
    assert!(hour.derived.seeing.unwrap().is_estimated());
    assert!(hour.derived.transparency.unwrap().is_estimated());
    assert!(hour.derived.lifted_index.unwrap().is_estimated());
}

#[test]
fn test_malformed_hours_are_skipped() {
    let hours = vec![
        open_meteo_hour(at(20), 10.0),
        json!({ "time": "2024-03-01T21:00", "temperature_2m": 8.0, "relative_humidity_2m": 140.0 }),
        json!({ "time": "2024-03-01T22:00" }),
        open_meteo_hour(at(23), 10.0),
    ];
    let forecast = service("open_meteo", false)
        .build(&[payload("open_meteo", hours)], at(0))
        .unwrap();
    let times: Vec<_> = forecast.hourly().iter().map(|h| h.timestamp()).collect();
    assert_eq!(times, vec![at(20), at(23)]);
}

#[test]
fn test_forecast_serializes_weather_labels() {
    let forecast = service("open_meteo", false)
        .build(&[payload("open_meteo", vec![open_meteo_hour(at(22), 5.0)])], at(0))
        .unwrap();
    let json = serde_json::to_value(&forecast).unwrap();
    assert_eq!(json["hourly"][0]["score"]["weather_type"], "clearnight");
    assert_eq!(json["location"]["timezone"], "Europe/Rome");
    assert!(json["days"][0]["sunrise"].is_object());
}

#[test]
fn test_cli_prints_forecast() {
    let dir = tempfile::tempdir().unwrap();

    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[location]\nlatitude = 45.0\nlongitude = 7.0\nelevation = 500\ntimezone = \"Europe/Rome\"\n\n[forecast]\nprovider = \"open_meteo\"\n",
    )
    .unwrap();

    let now = Utc::now().with_minute(0).unwrap().with_second(0).unwrap();
    let hours = (1..=6)
        .map(|i| open_meteo_hour(now + Duration::hours(i), 10.0))
        .collect();
    let payload_file = dir.path().join("open_meteo.json");
    std::fs::write(
        &payload_file,
        serde_json::to_string(&payload("open_meteo", hours)).unwrap(),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_astroforecast"))
        .arg("--config")
        .arg(&config)
        .arg(&payload_file)
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let forecast: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(forecast["hourly"].as_array().map(Vec::len), Some(6));
    assert!(forecast["sun"]["azimuth"].is_f64());
    assert!(forecast["moon"]["altitude"].is_f64());
}

#[test]
fn test_cli_without_payload_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_astroforecast"))
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no payload file"));
}

#[test]
fn test_cli_help_lists_options() {
    let output = Command::new(env!("CARGO_BIN_EXE_astroforecast"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.contains("--config"), "{help}");
    assert!(help.contains("payloads"), "{help}");
}

#[test]
fn test_cli_rejects_unknown_option() {
    let output = Command::new(env!("CARGO_BIN_EXE_astroforecast"))
        .arg("--frobnicate")
        .arg("payload.json")
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
}

fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_phase_repeats_after_synodic_month(offset_hours in 0i64..(24 * 365 * 20)) {
        let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap() + Duration::hours(offset_hours);
        let later = start + Duration::seconds((29.530_588 * 86_400.0) as i64);
        let first = moon_state(start).phase_angle;
        let second = moon_state(later).phase_angle;
        prop_assert!(angular_distance(first, second) < 10.0, "{first} vs {second}");
    }

    #[test]
    fn prop_twilight_is_monotonic(
        latitude in -45.0f64..=45.0,
        longitude in -180.0f64..=180.0,
        zone_skew in -1i32..=2,
        day in 0u64..365,
    ) {
        // Civil time often runs ahead of solar time, so the zone may sit east of the site
        let offset = ((longitude / 15.0).round() as i32 + zone_skew).clamp(-12, 12);
        let timezone = match offset {
            0 => "UTC".to_string(),
            east if east > 0 => format!("Etc/GMT-{east}"),
            west => format!("Etc/GMT+{}", -west),
        };
        let location = Location::with_timezone_name(latitude, longitude, 0.0, &timezone, "prop").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(day);
        let d = astronomical_day(&location, date);

        let sequence = [
            d.astronomical.start,
            d.nautical.start,
            d.civil.start,
            d.sunrise,
            d.sunset,
            d.civil.end,
            d.nautical.end,
            d.astronomical.end,
        ];
        let times: Vec<DateTime<Utc>> = sequence.iter().filter_map(Event::time).collect();
        prop_assert_eq!(times.len(), 8, "{:?}", sequence);
        prop_assert!(times.windows(2).all(|w| w[0] <= w[1]), "{:?}", times);
        prop_assert!(times[7] - times[0] < Duration::hours(24), "{:?}", times);
    }
}
