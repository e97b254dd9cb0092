//! Data models for the astronomy forecast
//!
//! - Location: validated site with elevation and timezone
//! - Weather: canonical hourly record shared by all providers
//! - Derived: seeing, transparency and lifted index with provenance
//! - Astronomy: twilight, sun and moon events of a local day
//! - Forecast: assembled hourly entries, days and nights

pub mod astronomy;
pub mod derived;
pub mod forecast;
pub mod location;
pub mod weather;

pub use astronomy::{
    Absence, AstronomicalDay, Event, MoonPhase, MoonState, SkyPosition, Twilight, TwilightWindow,
};
pub use derived::{DerivedParameters, Provenance, Sourced};
pub use forecast::{Forecast, HourlyForecast, NightSummary};
pub use location::Location;
pub use weather::{CloudCover, HourlyRecord, PrecipitationType, clamp_percent};
