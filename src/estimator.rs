//! Experimental estimation of seeing, transparency and a lifted-index proxy
//!
//! The heuristics are deliberately simple: they rank hours sensibly against
//! each other but are not calibrated against measurements.

use tracing::trace;

use crate::models::{DerivedParameters, HourlyRecord, Sourced};

/// Seeing bounds in arcseconds
const SEEING_MIN: f64 = 0.25;
const SEEING_MAX: f64 = 5.0;

/// Scale height of the aerosol and water vapour layer in meters
const AEROSOL_SCALE_HEIGHT: f64 = 8500.0;

/// Standard height of the 500 hPa surface in meters
const LEVEL_500_HPA: f64 = 5574.0;
/// LCL rise per °C of dew-point depression in meters
const LCL_PER_DEGREE: f64 = 125.0;
const DRY_LAPSE_RATE: f64 = 9.8;
const MOIST_LAPSE_RATE: f64 = 5.5;
const ENVIRONMENT_LAPSE_RATE: f64 = 6.5;

const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12;

/// Fills in derived parameters for one site
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    elevation: f64,
    experimental: bool,
}

impl Estimator {
    #[must_use]
    pub fn new(elevation: f64, experimental: bool) -> Self {
        Self {
            elevation,
            experimental,
        }
    }

    /// Derived parameters for one hour.
    ///
    /// Native values always win. Missing ones are estimated only when
    /// experimental estimation is enabled and the needed inputs exist.
    #[must_use]
    pub fn derive(&self, record: &HourlyRecord, native: DerivedParameters) -> DerivedParameters {
        if !self.experimental {
            return native;
        }

        let derived = DerivedParameters {
            seeing: native.seeing.or_else(|| {
                let wind = record.wind_speed?;
                let humidity = record.relative_humidity?;
                Some(Sourced::estimated(estimate_seeing(wind, humidity)))
            }),
            transparency: native.transparency.or_else(|| {
                let cloud = record.total_cloud_cover()?;
                let humidity = record.relative_humidity?;
                Some(Sourced::estimated(estimate_transparency(
                    cloud,
                    humidity,
                    self.elevation,
                )))
            }),
            lifted_index: native.lifted_index.or_else(|| {
                let dew_point = record
                    .dew_point
                    .or_else(|| magnus_dew_point(record.temperature, record.relative_humidity?))?;
                Some(Sourced::estimated(estimate_lifted_index(
                    record.temperature,
                    dew_point,
                    self.elevation,
                )))
            }),
        };

        trace!("Derived parameters for {}: {:?}", record.timestamp, derived);
        derived
    }
}

/// Seeing in arcseconds from wind speed (m/s) and relative humidity (%)
#[must_use]
pub fn estimate_seeing(wind_speed: f64, humidity: f64) -> f64 {
    let h = humidity.clamp(0.0, 100.0) / 100.0;
    (0.6 + 0.15 * wind_speed.max(0.0) + 0.4 * h * h).clamp(SEEING_MIN, SEEING_MAX)
}

/// Transparency index in [0,1] from cloud cover (%), humidity (%) and site elevation (m)
#[must_use]
pub fn estimate_transparency(cloud_cover: f64, humidity: f64, elevation: f64) -> f64 {
    let c = cloud_cover.clamp(0.0, 100.0) / 100.0;
    let h = humidity.clamp(0.0, 100.0) / 100.0;
    let extinction = 0.6 * c + 0.4 * h * h * (-elevation.max(0.0) / AEROSOL_SCALE_HEIGHT).exp();
    1.0 - extinction.clamp(0.0, 1.0)
}

/// Lifted index proxy in °C for a surface parcel lifted to the 500 hPa height
#[must_use]
pub fn estimate_lifted_index(temperature: f64, dew_point: f64, elevation: f64) -> f64 {
    let lift = (LEVEL_500_HPA - elevation).max(0.0);
    let lcl = (LCL_PER_DEGREE * (temperature - dew_point).max(0.0)).min(lift);

    let parcel =
        temperature - DRY_LAPSE_RATE * lcl / 1000.0 - MOIST_LAPSE_RATE * (lift - lcl) / 1000.0;
    let environment = temperature - ENVIRONMENT_LAPSE_RATE * lift / 1000.0;
    environment - parcel
}

/// Dew point in °C from temperature (°C) and relative humidity (%)
#[must_use]
pub fn magnus_dew_point(temperature: f64, humidity: f64) -> Option<f64> {
    if humidity <= 0.0 {
        return None;
    }
    let gamma = (humidity.min(100.0) / 100.0).ln() + MAGNUS_A * temperature / (MAGNUS_B + temperature);
    Some(MAGNUS_B * gamma / (MAGNUS_A - gamma))
}
