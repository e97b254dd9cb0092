//! Condition scoring and weather type classification

pub mod condition;
pub mod weather_type;

pub use condition::{
    Axis, AxisContribution, ConditionRating, ConditionScore, ConditionWeights, DEEP_SKY_THRESHOLD,
    score_hour,
};
pub use weather_type::{WeatherCategory, WeatherType, classify};
