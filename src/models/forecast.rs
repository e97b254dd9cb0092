//! Assembled astronomy forecast

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{AstronomicalDay, DerivedParameters, HourlyRecord, Location, SkyPosition, Twilight};
use crate::scoring::{ConditionRating, ConditionScore, WeatherType};

/// One forecast hour with its derived parameters and score
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyForecast {
    pub record: HourlyRecord,
    pub derived: DerivedParameters,
    pub score: ConditionScore,
}

impl HourlyForecast {
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.record.timestamp
    }
}

/// Observing summary of one night, from dusk of `date` to dawn of the next day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NightSummary {
    /// Local date on which the night starts
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Darkest twilight bounding the night
    pub darkness: Twilight,
    /// Condition percentages of the forecast hours inside the night
    pub hourly_conditions: Vec<u8>,
    pub mean_condition: Option<f64>,
    pub rating: Option<ConditionRating>,
    pub duration_hours: f64,
    /// Part of the night with the moon below the horizon
    pub moon_free_hours: f64,
    pub deep_sky_view: bool,
    /// Most frequent weather label among the night's hours
    pub weather_type: Option<WeatherType>,
    /// Precipitation summed over the night's hours, mm
    pub precipitation_amount: Option<f64>,
}

impl NightSummary {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Forecast for one location, rebuilt on every refresh
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Forecast {
    pub location: Location,
    pub reference_time: DateTime<Utc>,
    /// Sun position at the reference time
    pub sun: SkyPosition,
    /// Moon position at the reference time
    pub moon: SkyPosition,
    /// Hourly entries sorted by timestamp
    pub hourly: Vec<HourlyForecast>,
    /// Astronomical days covering the hourly span
    pub days: Vec<AstronomicalDay>,
    pub nights: Vec<NightSummary>,
}

impl Forecast {
    #[must_use]
    pub fn hourly(&self) -> &[HourlyForecast] {
        &self.hourly
    }

    #[must_use]
    pub fn astronomical_days(&self) -> &[AstronomicalDay] {
        &self.days
    }

    #[must_use]
    pub fn nights(&self) -> &[NightSummary] {
        &self.nights
    }

    /// First hour at or after the reference time
    #[must_use]
    pub fn current(&self) -> Option<&HourlyForecast> {
        self.hourly.first()
    }

    /// Hours falling on a local calendar date
    #[must_use]
    pub fn daily_forecast(&self, date: NaiveDate) -> Vec<&HourlyForecast> {
        let tz = self.location.timezone();
        self.hourly
            .iter()
            .filter(|h| h.timestamp().with_timezone(&tz).date_naive() == date)
            .collect()
    }

    #[must_use]
    pub fn astronomical_day(&self, date: NaiveDate) -> Option<&AstronomicalDay> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Hour with the best condition percentage, earliest first on ties
    #[must_use]
    pub fn best_hour(&self) -> Option<&HourlyForecast> {
        self.hourly
            .iter()
            .filter(|h| h.score.condition_percentage.is_some())
            .fold(None, |best: Option<&HourlyForecast>, h| match best {
                Some(b) if b.score.condition_percentage >= h.score.condition_percentage => Some(b),
                _ => Some(h),
            })
    }
}
