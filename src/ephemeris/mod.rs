//! Astronomical ephemeris: twilight, sun and moon events for a site and date
//!
//! Events are located numerically. Altitude is sampled across a search window
//! and every sign change against the threshold is refined by bisection, so
//! polar day and night fall out naturally as absent events.
//!
//! Sun events are anchored on the solar transit of the local date: morning
//! crossings are searched in the half day before it and evening crossings in
//! the half day after it. Dusk may therefore fall after local midnight, which
//! happens at sites far west of their timezone meridian in summer. Moon events
//! stay within the local calendar day.

pub mod coordinates;
pub mod lunar;
pub mod solar;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::{
    Absence, AstronomicalDay, Event, Location, MoonPhase, MoonState, SkyPosition, Twilight,
    TwilightWindow,
};
use coordinates::{horizon_dip, signed_degrees};

/// Refraction plus semi-diameter at the horizon, degrees
pub const HORIZON_REFRACTION: f64 = 0.833;

const SCAN_STEP_MINUTES: i64 = 10;
const HALF_DAY_HOURS: i64 = 12;
const PHASE_SCAN_STEP_HOURS: i64 = 6;
const MAX_PHASE_SCAN_STEPS: usize = 4 * 31;

/// Rising and setting crossings of one threshold inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Crossings {
    rising: Event,
    setting: Event,
}

/// Compute every astronomical event of a local calendar date
#[must_use]
pub fn astronomical_day(location: &Location, date: NaiveDate) -> AstronomicalDay {
    let (start, end) = local_day_window(location.timezone(), date);
    let (lat, lon) = (location.latitude(), location.longitude());
    let horizon = -HORIZON_REFRACTION - horizon_dip(location.elevation());

    let sun = |at: DateTime<Utc>| solar::solar_altitude(at, lat, lon);
    let moon = |at: DateTime<Utc>| lunar::lunar_altitude(at, lat, lon);

    let transit = solar_transit(sun, start, end);
    let half_day = TimeDelta::hours(HALF_DAY_HOURS);
    let sun_crossings = |threshold: f64| Crossings {
        rising: find_crossings(sun, transit - half_day, transit, threshold).rising,
        setting: find_crossings(sun, transit, transit + half_day, threshold).setting,
    };
    let twilight = |kind: Twilight| {
        let crossings = sun_crossings(kind.sun_altitude());
        TwilightWindow {
            start: crossings.rising,
            end: crossings.setting,
        }
    };

    let sun_events = sun_crossings(horizon);
    let moon_events = find_crossings(moon, start, end, horizon);
    let noon = start + (end - start) / 2;

    let day = AstronomicalDay {
        date,
        sunrise: sun_events.rising,
        sunset: sun_events.setting,
        solar_noon: transit,
        civil: twilight(Twilight::Civil),
        nautical: twilight(Twilight::Nautical),
        astronomical: twilight(Twilight::Astronomical),
        moonrise: moon_events.rising,
        moonset: moon_events.setting,
        moon: moon_state(noon),
        next_new_moon: next_new_moon(start),
        next_full_moon: next_full_moon(start),
    };

    debug!(
        "Ephemeris for {} on {}: sunrise {}, sunset {}, moon {}",
        location.name(),
        date,
        day.sunrise,
        day.sunset,
        day.moon.phase
    );

    day
}

/// Where the sun stands for an observer at the given instant
#[must_use]
pub fn sun_position(location: &Location, at: DateTime<Utc>) -> SkyPosition {
    let position = solar::solar_position(at, location.latitude(), location.longitude());
    SkyPosition {
        altitude: position.altitude,
        azimuth: position.azimuth,
    }
}

/// Where the moon stands for an observer at the given instant, parallax included
#[must_use]
pub fn moon_position(location: &Location, at: DateTime<Utc>) -> SkyPosition {
    let position = lunar::lunar_position(at, location.latitude(), location.longitude());
    SkyPosition {
        altitude: position.altitude,
        azimuth: position.azimuth,
    }
}

/// Lunar illumination state at an instant
#[must_use]
pub fn moon_state(at: DateTime<Utc>) -> MoonState {
    let difference = lunar::longitude_difference(at);
    let phase_angle = (180.0 - difference).rem_euclid(360.0);
    MoonState {
        phase_angle,
        illuminated_fraction: (1.0 + phase_angle.to_radians().cos()) / 2.0,
        elongation: lunar::elongation(at),
        phase: MoonPhase::from_longitude_difference(difference),
    }
}

/// First new moon strictly after the given instant
#[must_use]
pub fn next_new_moon(from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    next_longitude_difference(from, 0.0)
}

/// First full moon strictly after the given instant
#[must_use]
pub fn next_full_moon(from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    next_longitude_difference(from, 180.0)
}

/// Time within [start, end) during which the moon is below the horizon
#[must_use]
pub fn moon_free_duration(
    location: &Location,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> TimeDelta {
    let horizon = -HORIZON_REFRACTION - horizon_dip(location.elevation());
    let mut total = TimeDelta::zero();
    let mut t = start;
    while t < end {
        let next = (t + TimeDelta::minutes(SCAN_STEP_MINUTES)).min(end);
        let midpoint = t + (next - t) / 2;
        if lunar::lunar_altitude(midpoint, location.latitude(), location.longitude()) < horizon {
            total += next - t;
        }
        t = next;
    }
    total
}

/// UTC bounds of the local calendar day [00:00, 24:00)
#[must_use]
pub fn local_day_window(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(date);
    (local_midnight(tz, date), local_midnight(tz, next))
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.with_timezone(&Utc),
        // Midnight skipped by a DST jump; the day starts at the first valid instant
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
            .map_or_else(|| naive.and_utc(), |at| at.with_timezone(&Utc)),
    }
}

fn find_crossings<F>(altitude: F, start: DateTime<Utc>, end: DateTime<Utc>, threshold: f64) -> Crossings
where
    F: Fn(DateTime<Utc>) -> f64,
{
    let offset = |at: DateTime<Utc>| altitude(at) - threshold;

    let mut rising = None;
    let mut setting = None;
    let mut prev = offset(start);
    let mut seen_above = prev >= 0.0;
    let mut seen_below = prev < 0.0;
    let mut t = start;

    while t < end {
        let next = (t + TimeDelta::minutes(SCAN_STEP_MINUTES)).min(end);
        let current = offset(next);
        seen_above |= current >= 0.0;
        seen_below |= current < 0.0;

        if prev < 0.0 && current >= 0.0 && rising.is_none() {
            rising = Some(bisect(&offset, t, next));
        } else if prev >= 0.0 && current < 0.0 && setting.is_none() {
            setting = Some(bisect(&offset, t, next));
        }

        prev = current;
        t = next;
    }

    let absence = if !seen_below {
        Absence::AlwaysAbove
    } else if !seen_above {
        Absence::AlwaysBelow
    } else {
        Absence::NotThisDay
    };
    let to_event = |found: Option<DateTime<Utc>>| match found {
        Some(at) if at < end => Event::At(at),
        _ => Event::Absent(absence),
    };

    Crossings {
        rising: to_event(rising),
        setting: to_event(setting),
    }
}

/// Instant of the highest solar altitude within [start, end)
fn solar_transit<F>(altitude: F, start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    let step = TimeDelta::minutes(SCAN_STEP_MINUTES);
    let mut best = start;
    let mut highest = altitude(start);
    let mut t = start;
    while t < end {
        t = (t + step).min(end);
        let current = altitude(t);
        if current > highest {
            best = t;
            highest = current;
        }
    }

    // Ternary search around the best sample, the altitude is unimodal there
    let (mut lo, mut hi) = (best - step, best + step);
    while hi - lo > TimeDelta::seconds(1) {
        let third = (hi - lo) / 3;
        let (a, b) = (lo + third, hi - third);
        if altitude(a) < altitude(b) {
            lo = a;
        } else {
            hi = b;
        }
    }
    lo + (hi - lo) / 2
}

/// Refine a sign change of `f` between `lo` and `hi` to within a second
fn bisect<F>(f: &F, mut lo: DateTime<Utc>, mut hi: DateTime<Utc>) -> DateTime<Utc>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    let lo_negative = f(lo) < 0.0;
    while hi - lo > TimeDelta::seconds(1) {
        let mid = lo + (hi - lo) / 2;
        if (f(mid) < 0.0) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo + (hi - lo) / 2
}

fn next_longitude_difference(from: DateTime<Utc>, target: f64) -> Option<DateTime<Utc>> {
    let offset = |at: DateTime<Utc>| signed_degrees(lunar::longitude_difference(at) - target);

    let mut t = from;
    let mut prev = offset(t);
    for _ in 0..MAX_PHASE_SCAN_STEPS {
        let next = t + TimeDelta::hours(PHASE_SCAN_STEP_HOURS);
        let current = offset(next);
        // The difference only grows, so the target is passed going from negative to positive
        if prev < 0.0 && current >= 0.0 {
            return Some(bisect(&offset, t, next));
        }
        prev = current;
        t = next;
    }
    None
}
