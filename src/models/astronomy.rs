//! Daily astronomical events for an observing site

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Why an event does not occur on a given day
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Absence {
    /// The body stays above the threshold all day
    AlwaysAbove,
    /// The body stays below the threshold all day
    AlwaysBelow,
    /// The body crosses the threshold, but not in this direction today
    NotThisDay,
}

/// An astronomical event that either happens at a time or does not happen at all
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    At(DateTime<Utc>),
    Absent(Absence),
}

impl Event {
    /// Time of the event, if it occurs
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            Event::At(at) => Some(*at),
            Event::Absent(_) => None,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Event::Absent(_))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::At(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M UTC")),
            Event::Absent(Absence::AlwaysAbove) => write!(f, "always above"),
            Event::Absent(Absence::AlwaysBelow) => write!(f, "always below"),
            Event::Absent(Absence::NotThisDay) => write!(f, "not this day"),
        }
    }
}

/// Morning start and evening end of one twilight kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TwilightWindow {
    /// Morning crossing of the depression angle
    pub start: Event,
    /// Evening crossing of the depression angle
    pub end: Event,
}

/// Twilight kinds, ordered from brightest to darkest
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Twilight {
    Civil,
    Nautical,
    Astronomical,
}

impl Twilight {
    /// Sun centre altitude at which this twilight begins or ends, in degrees
    #[must_use]
    pub fn sun_altitude(self) -> f64 {
        match self {
            Twilight::Civil => -6.0,
            Twilight::Nautical => -12.0,
            Twilight::Astronomical => -18.0,
        }
    }
}

impl fmt::Display for Twilight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Twilight::Civil => write!(f, "civil"),
            Twilight::Nautical => write!(f, "nautical"),
            Twilight::Astronomical => write!(f, "astronomical"),
        }
    }
}

/// Horizontal position of the sun or moon at one instant
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    /// Degrees above the horizon, negative below
    pub altitude: f64,
    /// Degrees clockwise from north
    pub azimuth: f64,
}

impl SkyPosition {
    #[must_use]
    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }
}

/// Named lunar phase
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Phase name for a sun-moon ecliptic longitude difference in degrees
    #[must_use]
    pub fn from_longitude_difference(difference: f64) -> Self {
        let sector = ((difference + 22.5).rem_euclid(360.0) / 45.0) as usize;
        match sector {
            0 => MoonPhase::NewMoon,
            1 => MoonPhase::WaxingCrescent,
            2 => MoonPhase::FirstQuarter,
            3 => MoonPhase::WaxingGibbous,
            4 => MoonPhase::FullMoon,
            5 => MoonPhase::WaningGibbous,
            6 => MoonPhase::LastQuarter,
            _ => MoonPhase::WaningCrescent,
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        };
        write!(f, "{name}")
    }
}

/// Lunar illumination state at a reference instant
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MoonState {
    /// Phase angle in degrees (0 = full, 180 = new)
    pub phase_angle: f64,
    /// Illuminated fraction of the disk (0-1)
    pub illuminated_fraction: f64,
    /// Angular separation from the sun in degrees (0-180)
    pub elongation: f64,
    pub phase: MoonPhase,
}

/// All astronomical events of one local calendar date.
///
/// Sun and twilight events belong to the solar day around `solar_noon`, so an
/// evening twilight may end after local midnight.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AstronomicalDay {
    pub date: NaiveDate,
    pub sunrise: Event,
    pub sunset: Event,
    /// Solar transit, the sun's highest point of the day
    pub solar_noon: DateTime<Utc>,
    pub civil: TwilightWindow,
    pub nautical: TwilightWindow,
    pub astronomical: TwilightWindow,
    pub moonrise: Event,
    pub moonset: Event,
    /// Moon state at local noon
    pub moon: MoonState,
    pub next_new_moon: Option<DateTime<Utc>>,
    pub next_full_moon: Option<DateTime<Utc>>,
}

impl AstronomicalDay {
    /// Twilight window of the given kind
    #[must_use]
    pub fn twilight(&self, kind: Twilight) -> &TwilightWindow {
        match kind {
            Twilight::Civil => &self.civil,
            Twilight::Nautical => &self.nautical,
            Twilight::Astronomical => &self.astronomical,
        }
    }

    /// Whether the sun is up at the given instant
    #[must_use]
    pub fn is_daylight(&self, at: DateTime<Utc>) -> bool {
        match (self.sunrise, self.sunset) {
            (Event::At(rise), Event::At(set)) if rise <= set => rise <= at && at < set,
            (Event::At(rise), Event::At(set)) => at < set || at >= rise,
            (Event::At(rise), Event::Absent(_)) => at >= rise,
            (Event::Absent(_), Event::At(set)) => at < set,
            (Event::Absent(Absence::AlwaysAbove), _) => true,
            (Event::Absent(_), Event::Absent(_)) => false,
        }
    }

    /// Evening end of the darkest twilight that occurs today
    #[must_use]
    pub fn dusk(&self) -> Option<(Twilight, DateTime<Utc>)> {
        [Twilight::Astronomical, Twilight::Nautical, Twilight::Civil]
            .into_iter()
            .find_map(|kind| self.twilight(kind).end.time().map(|at| (kind, at)))
    }

    /// Morning start of the darkest twilight that occurs today
    #[must_use]
    pub fn dawn(&self) -> Option<(Twilight, DateTime<Utc>)> {
        [Twilight::Astronomical, Twilight::Nautical, Twilight::Civil]
            .into_iter()
            .find_map(|kind| self.twilight(kind).start.time().map(|at| (kind, at)))
    }

    /// Morning start of the given twilight kind
    #[must_use]
    pub fn dawn_of(&self, kind: Twilight) -> Option<DateTime<Utc>> {
        self.twilight(kind).start.time()
    }
}
