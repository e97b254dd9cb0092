//! Forecast assembly
//!
//! Combines normalized hours, derived parameters, scores and ephemeris days
//! into a [`Forecast`]. Computation lives in the adapter, estimator, scorer and
//! ephemeris modules; this module only wires them together.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::config::{AstroForecastConfig, ForecastSettings};
use crate::ephemeris::{astronomical_day, moon_free_duration, moon_position, sun_position};
use crate::estimator::Estimator;
use crate::models::{
    AstronomicalDay, DerivedParameters, Forecast, HourlyForecast, Location, NightSummary,
};
use crate::scoring::{
    ConditionRating, ConditionWeights, DEEP_SKY_THRESHOLD, WeatherType, score_hour,
};
use crate::weather::{NormalizedHour, ProviderKind, RawPayload, adapt, truncate_to_hour};
use crate::{AstroForecastError, Result};

/// How far back a supplementary step may lie and still apply to an hour
const SUPPLEMENT_WINDOW_HOURS: i64 = 3;

/// Data-fetch collaborator delivering one raw provider payload
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<RawPayload>;
}

/// Builds forecasts for one observing site
#[derive(Debug, Clone)]
pub struct ForecastService {
    location: Location,
    weights: ConditionWeights,
    provider: ProviderKind,
    horizon: TimeDelta,
    estimator: Estimator,
}

impl ForecastService {
    /// Create a service from validated settings
    pub fn new(
        location: Location,
        weights: ConditionWeights,
        settings: &ForecastSettings,
    ) -> Result<Self> {
        weights.validate()?;
        let provider = settings.provider_kind()?;
        let estimator = Estimator::new(location.elevation(), settings.experimental_features);

        Ok(Self {
            location,
            weights,
            provider,
            horizon: TimeDelta::hours(i64::from(settings.horizon_hours)),
            estimator,
        })
    }

    pub fn from_config(config: &AstroForecastConfig) -> Result<Self> {
        Self::new(
            config.location.to_location()?,
            config.condition,
            &config.forecast,
        )
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Fetch every source concurrently, then build the forecast
    pub async fn refresh(
        &self,
        sources: &[Box<dyn ForecastSource>],
        reference_time: DateTime<Utc>,
    ) -> Result<Forecast> {
        let payloads =
            try_join_all(sources.iter().map(|source| source.fetch(&self.location))).await?;
        debug!("Fetched {} payloads", payloads.len());
        self.build(&payloads, reference_time)
    }

    /// Assemble a forecast from raw payloads.
    ///
    /// The active provider's payload supplies the hours; every other payload
    /// only contributes native derived values the active one lacks.
    #[instrument(skip(self, payloads), fields(location = %self.location.name(), provider = %self.provider))]
    pub fn build(&self, payloads: &[RawPayload], reference_time: DateTime<Utc>) -> Result<Forecast> {
        let mut primary = None;
        let mut supplements = Vec::new();
        for payload in payloads {
            let kind: ProviderKind = payload.provider.parse()?;
            if kind == self.provider && primary.is_none() {
                primary = Some(adapt(payload)?);
            } else {
                supplements.push(adapt(payload)?);
            }
        }
        let primary = primary.ok_or_else(|| {
            AstroForecastError::validation(format!("no payload for provider {}", self.provider))
        })?;

        let first_hour = truncate_to_hour("reference_time", reference_time)?;
        let last_hour = first_hour + self.horizon;
        let mut days = DayCache::new(&self.location);

        let hourly: Vec<HourlyForecast> = primary
            .into_iter()
            .filter(|hour| (first_hour..last_hour).contains(&hour.record.timestamp))
            .map(|hour| {
                let native = supplement(hour.native, hour.record.timestamp, &supplements);
                let derived = self.estimator.derive(&hour.record, native);
                let daylight = days
                    .for_instant(hour.record.timestamp)
                    .is_daylight(hour.record.timestamp);
                let score = score_hour(&hour.record, &derived, &self.weights, daylight);
                HourlyForecast {
                    record: hour.record,
                    derived,
                    score,
                }
            })
            .collect();

        let (astronomical_days, nights) = match (hourly.first(), hourly.last()) {
            (Some(first), Some(last)) => {
                let tz = self.location.timezone();
                let first_date = first.timestamp().with_timezone(&tz).date_naive();
                let last_date = last.timestamp().with_timezone(&tz).date_naive();
                let span = (first.timestamp(), last.timestamp() + TimeDelta::hours(1));

                let covered: Vec<AstronomicalDay> = dates(first_date, last_date)
                    .map(|date| days.for_date(date).clone())
                    .collect();
                let nights = dates(first_date.pred_opt().unwrap_or(first_date), last_date)
                    .filter_map(|date| self.night(&mut days, date, &hourly))
                    .filter(|night| night.start < span.1 && night.end > span.0)
                    .collect();
                (covered, nights)
            }
            _ => (Vec::new(), Vec::new()),
        };

        info!(
            "Built forecast with {} hours, {} days and {} nights",
            hourly.len(),
            astronomical_days.len(),
            nights.len()
        );

        Ok(Forecast {
            location: self.location.clone(),
            reference_time,
            sun: sun_position(&self.location, reference_time),
            moon: moon_position(&self.location, reference_time),
            hourly,
            days: astronomical_days,
            nights,
        })
    }

    /// Summary of the night starting on `date`
    fn night(
        &self,
        days: &mut DayCache<'_>,
        date: NaiveDate,
        hourly: &[HourlyForecast],
    ) -> Option<NightSummary> {
        let (darkness, start) = days.for_date(date).dusk()?;
        let next = days.for_date(date.succ_opt()?);
        let end = next
            .dawn_of(darkness)
            .or_else(|| next.dawn().map(|(_, at)| at))
            .filter(|end| *end > start)?;

        let inside: Vec<&HourlyForecast> = hourly
            .iter()
            .filter(|h| start <= h.timestamp() && h.timestamp() < end)
            .collect();
        let hourly_conditions: Vec<u8> = inside
            .iter()
            .filter_map(|h| h.score.condition_percentage)
            .collect();
        let mean_condition = (!hourly_conditions.is_empty()).then(|| {
            hourly_conditions.iter().map(|p| f64::from(*p)).sum::<f64>()
                / hourly_conditions.len() as f64
        });

        Some(NightSummary {
            date,
            start,
            end,
            darkness,
            mean_condition,
            rating: mean_condition.map(ConditionRating::from_percentage),
            duration_hours: hours(end - start),
            moon_free_hours: hours(moon_free_duration(&self.location, start, end)),
            deep_sky_view: mean_condition.is_some_and(|m| m >= f64::from(DEEP_SKY_THRESHOLD)),
            weather_type: prevailing_weather(&inside),
            precipitation_amount: inside
                .iter()
                .filter_map(|h| h.record.precipitation_amount)
                .reduce(|total, amount| total + amount),
            hourly_conditions,
        })
    }
}

/// Astronomical days computed during one build, keyed by their ephemeris key
struct DayCache<'a> {
    location: &'a Location,
    days: HashMap<String, AstronomicalDay>,
}

impl<'a> DayCache<'a> {
    fn new(location: &'a Location) -> Self {
        Self {
            location,
            days: HashMap::new(),
        }
    }

    fn for_date(&mut self, date: NaiveDate) -> &AstronomicalDay {
        let location = self.location;
        self.days
            .entry(location.ephemeris_key(date))
            .or_insert_with(|| astronomical_day(location, date))
    }

    fn for_instant(&mut self, at: DateTime<Utc>) -> &AstronomicalDay {
        let date = at.with_timezone(&self.location.timezone()).date_naive();
        self.for_date(date)
    }
}

/// Fill absent native values from the latest supplementary step at or before `at`
fn supplement(
    mut native: DerivedParameters,
    at: DateTime<Utc>,
    supplements: &[Vec<NormalizedHour>],
) -> DerivedParameters {
    let window = TimeDelta::hours(SUPPLEMENT_WINDOW_HOURS);
    for series in supplements {
        // Series are sorted by the adapter
        let covering = series.partition_point(|hour| hour.record.timestamp <= at);
        let Some(step) = covering.checked_sub(1).map(|i| &series[i]) else {
            continue;
        };
        if at - step.record.timestamp >= window {
            continue;
        }
        native.seeing = native.seeing.or(step.native.seeing);
        native.transparency = native.transparency.or(step.native.transparency);
        native.lifted_index = native.lifted_index.or(step.native.lifted_index);
    }
    native
}

/// Most frequent weather label, the earliest one winning ties
fn prevailing_weather(hours: &[&HourlyForecast]) -> Option<WeatherType> {
    let mut counts: Vec<(WeatherType, usize)> = Vec::new();
    for hour in hours {
        let label = hour.score.weather_type;
        match counts.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<(WeatherType, usize)>, &(label, count)| match best {
            Some((_, most)) if most >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}

fn dates(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    first.iter_days().take_while(move |date| *date <= last)
}

fn hours(duration: TimeDelta) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}
