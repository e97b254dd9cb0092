//! Weighted observing condition score
//!
//! Every axis is normalized to [0,1] with 1 as the worst case. Axes without
//! data drop out of numerator and denominator alike, so an hour is scored
//! from whatever it has.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::weather_type::{WeatherType, classify};
use crate::models::{DerivedParameters, HourlyRecord, PrecipitationType, Sourced};
use crate::{AstroForecastError, Result};

/// Seeing at or above this many arcseconds counts as worst case
pub const SEEING_MAX: f64 = 2.5;
/// Wind speed in m/s at or above which calmness counts as worst case
pub const WIND_MAX: f64 = 16.5;
/// Condition percentage from which deep-sky observing is worthwhile
pub const DEEP_SKY_THRESHOLD: u8 = 75;

/// Relative importance of each condition axis
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ConditionWeights {
    #[serde(default = "default_cloud_cover")]
    pub cloud_cover: f64,
    #[serde(default = "default_weakening")]
    pub cloud_high_weakening: f64,
    #[serde(default = "default_weakening")]
    pub cloud_medium_weakening: f64,
    #[serde(default = "default_weakening")]
    pub cloud_low_weakening: f64,
    #[serde(default = "default_fog")]
    pub fog: f64,
    #[serde(default = "default_seeing")]
    pub seeing: f64,
    #[serde(default = "default_transparency")]
    pub transparency: f64,
    #[serde(default = "default_calm")]
    pub calm: f64,
    /// Multiplier applied to the weight of estimated axes
    #[serde(default = "default_estimated_discount")]
    pub estimated_discount: f64,
}

fn default_cloud_cover() -> f64 {
    3.0
}

fn default_weakening() -> f64 {
    1.0
}

fn default_fog() -> f64 {
    3.0
}

fn default_seeing() -> f64 {
    2.0
}

fn default_transparency() -> f64 {
    1.0
}

fn default_calm() -> f64 {
    2.0
}

fn default_estimated_discount() -> f64 {
    1.0
}

impl Default for ConditionWeights {
    fn default() -> Self {
        Self {
            cloud_cover: default_cloud_cover(),
            cloud_high_weakening: default_weakening(),
            cloud_medium_weakening: default_weakening(),
            cloud_low_weakening: default_weakening(),
            fog: default_fog(),
            seeing: default_seeing(),
            transparency: default_transparency(),
            calm: default_calm(),
            estimated_discount: default_estimated_discount(),
        }
    }
}

impl ConditionWeights {
    /// Reject weights the scorer cannot work with
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("cloud_cover", self.cloud_cover),
            ("fog", self.fog),
            ("seeing", self.seeing),
            ("transparency", self.transparency),
            ("calm", self.calm),
        ];
        let fractions = [
            ("cloud_high_weakening", self.cloud_high_weakening),
            ("cloud_medium_weakening", self.cloud_medium_weakening),
            ("cloud_low_weakening", self.cloud_low_weakening),
            ("estimated_discount", self.estimated_discount),
        ];

        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(AstroForecastError::config(format!(
                    "weight {name} = {value} must be a non-negative number"
                )));
            }
        }
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(AstroForecastError::config(format!(
                    "{name} = {value} must be within 0..=1"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(AstroForecastError::config("all condition weights are zero"));
        }

        Ok(())
    }

    /// Sum of the configured axis weights; upper bound of any score
    #[must_use]
    pub fn total(&self) -> f64 {
        self.cloud_cover
            * (self.cloud_low_weakening + self.cloud_medium_weakening + self.cloud_high_weakening)
            + self.fog
            + self.seeing
            + self.transparency
            + self.calm
    }
}

/// Condition axes
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    CloudLow,
    CloudMedium,
    CloudHigh,
    Fog,
    Seeing,
    Transparency,
    Calm,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::CloudLow => "low clouds",
            Axis::CloudMedium => "medium clouds",
            Axis::CloudHigh => "high clouds",
            Axis::Fog => "fog",
            Axis::Seeing => "seeing",
            Axis::Transparency => "transparency",
            Axis::Calm => "wind",
        };
        write!(f, "{name}")
    }
}

/// One axis as it entered the score
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct AxisContribution {
    pub axis: Axis,
    /// Normalized badness in [0,1]
    pub value: f64,
    /// Effective weight after weakening and estimation discount
    pub weight: f64,
    pub estimated: bool,
}

/// Plain text rating of a condition percentage
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

impl ConditionRating {
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p > 80.0 => ConditionRating::Excellent,
            p if p > 60.0 => ConditionRating::Good,
            p if p > 40.0 => ConditionRating::Fair,
            p if p > 20.0 => ConditionRating::Poor,
            _ => ConditionRating::Bad,
        }
    }
}

impl fmt::Display for ConditionRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionRating::Excellent => write!(f, "excellent"),
            ConditionRating::Good => write!(f, "good"),
            ConditionRating::Fair => write!(f, "fair"),
            ConditionRating::Poor => write!(f, "poor"),
            ConditionRating::Bad => write!(f, "bad"),
        }
    }
}

/// Observing quality of one hour
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConditionScore {
    /// Weighted mean scaled by the total configured weight; lower is better
    pub score: Option<f64>,
    /// Weighted mean of the present axes in [0,1]
    pub normalized: Option<f64>,
    pub contributions: Vec<AxisContribution>,
    /// 0-100, higher is better, precipitation penalized
    pub condition_percentage: Option<u8>,
    pub rating: Option<ConditionRating>,
    pub deep_sky_view: bool,
    pub weather_type: WeatherType,
}

/// Cloud band or fog fraction in percent as badness
#[must_use]
pub fn normalize_percent(percent: f64) -> f64 {
    (percent / 100.0).clamp(0.0, 1.0)
}

#[must_use]
pub fn normalize_seeing(arcseconds: f64) -> f64 {
    (arcseconds / SEEING_MAX).clamp(0.0, 1.0)
}

#[must_use]
pub fn normalize_transparency(transparency: f64) -> f64 {
    (1.0 - transparency).clamp(0.0, 1.0)
}

#[must_use]
pub fn normalize_wind(speed: f64) -> f64 {
    (speed / WIND_MAX).clamp(0.0, 1.0)
}

/// Present axes of one hour with their effective weights
#[must_use]
pub fn contributions(
    record: &HourlyRecord,
    derived: &DerivedParameters,
    weights: &ConditionWeights,
) -> Vec<AxisContribution> {
    let measured = |axis: Axis, value: f64, weight: f64| AxisContribution {
        axis,
        value,
        weight,
        estimated: false,
    };
    let sourced = |axis: Axis, source: Sourced<f64>, normalize: fn(f64) -> f64, weight: f64| {
        let estimated = source.is_estimated();
        AxisContribution {
            axis,
            value: normalize(source.value),
            weight: if estimated {
                weight * weights.estimated_discount
            } else {
                weight
            },
            estimated,
        }
    };

    let mut axes = Vec::with_capacity(7);
    if let Some(cloud) = record.cloud_cover {
        axes.push(measured(
            Axis::CloudLow,
            normalize_percent(cloud.low),
            weights.cloud_cover * weights.cloud_low_weakening,
        ));
        axes.push(measured(
            Axis::CloudMedium,
            normalize_percent(cloud.medium),
            weights.cloud_cover * weights.cloud_medium_weakening,
        ));
        axes.push(measured(
            Axis::CloudHigh,
            normalize_percent(cloud.high),
            weights.cloud_cover * weights.cloud_high_weakening,
        ));
    }
    if let Some(fog) = record.fog {
        axes.push(measured(Axis::Fog, normalize_percent(fog), weights.fog));
    }
    if let Some(seeing) = derived.seeing {
        axes.push(sourced(Axis::Seeing, seeing, normalize_seeing, weights.seeing));
    }
    if let Some(transparency) = derived.transparency {
        axes.push(sourced(
            Axis::Transparency,
            transparency,
            normalize_transparency,
            weights.transparency,
        ));
    }
    if let Some(wind) = record.wind_speed {
        axes.push(measured(Axis::Calm, normalize_wind(wind), weights.calm));
    }
    axes
}

/// Score one hour
#[must_use]
pub fn score_hour(
    record: &HourlyRecord,
    derived: &DerivedParameters,
    weights: &ConditionWeights,
    daylight: bool,
) -> ConditionScore {
    let contributions = contributions(record, derived, weights);
    let weight_sum: f64 = contributions.iter().map(|c| c.weight).sum();

    let normalized = (weight_sum > 0.0).then(|| {
        contributions.iter().map(|c| c.value * c.weight).sum::<f64>() / weight_sum
    });
    // A dry hour may omit the amount; typed precipitation of unknown amount cannot be weighed
    let precipitation = match (record.precipitation_amount, record.precipitation_type) {
        (Some(amount), _) => Some(amount),
        (None, PrecipitationType::None) => Some(0.0),
        (None, _) => None,
    };
    let condition_percentage = normalized.zip(precipitation).map(|(mean, precipitation)| {
        let percentage = 100.0 * (1.0 - mean) - 100.0 * precipitation;
        percentage.clamp(0.0, 100.0) as u8
    });

    ConditionScore {
        score: normalized.map(|mean| mean * weights.total()),
        normalized,
        contributions,
        condition_percentage,
        rating: condition_percentage.map(|p| ConditionRating::from_percentage(f64::from(p))),
        deep_sky_view: condition_percentage.is_some_and(|p| p >= DEEP_SKY_THRESHOLD),
        weather_type: classify(record, daylight),
    }
}
