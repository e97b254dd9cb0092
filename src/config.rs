//! Configuration management for astroforecast
//!
//! Loads the observing site, condition weights and forecast settings from a
//! TOML file layered with `ASTROFORECAST_` environment variables, then
//! validates everything before the pipeline sees it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::AstroForecastError;
use crate::models::Location;
use crate::scoring::ConditionWeights;
use crate::weather::ProviderKind;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstroForecastConfig {
    /// Observing site
    pub location: LocationConfig,
    /// Condition scoring weights
    #[serde(default)]
    pub condition: ConditionWeights,
    #[serde(default)]
    pub forecast: ForecastSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Observing site as written in the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation above sea level in meters
    #[serde(default)]
    pub elevation: f64,
    /// IANA timezone identifier
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_location_name")]
    pub name: String,
}

/// Forecast assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Provider whose hours make up the forecast
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Hours after the reference time to keep
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    /// Estimate seeing, transparency and lifted index when not supplied
    #[serde(default)]
    pub experimental_features: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_location_name() -> String {
    "Home".to_string()
}

fn default_provider() -> String {
    ProviderKind::MetNo.to_string()
}

fn default_horizon_hours() -> u32 {
    72
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            horizon_hours: default_horizon_hours(),
            experimental_features: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LocationConfig {
    /// Build the validated site
    pub fn to_location(&self) -> crate::Result<Location> {
        Location::with_timezone_name(
            self.latitude,
            self.longitude,
            self.elevation,
            &self.timezone,
            self.name.clone(),
        )
    }
}

impl ForecastSettings {
    /// Active provider
    pub fn provider_kind(&self) -> crate::Result<ProviderKind> {
        self.provider.parse()
    }
}

impl AstroForecastConfig {
    /// Configuration with default settings for a site
    #[must_use]
    pub fn for_location(location: LocationConfig) -> Self {
        Self {
            location,
            condition: ConditionWeights::default(),
            forecast: ForecastSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(|| PathBuf::from("astroforecast.toml"));

        let mut builder = Config::builder();
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.as_path())
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        // ASTROFORECAST_FORECAST__HORIZON_HOURS=48 overrides forecast.horizon_hours
        builder = builder.add_source(
            Environment::with_prefix("ASTROFORECAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::from_builder(builder)
            .with_context(|| format!("Failed to load configuration from {}", config_file.display()))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AstroForecastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.location.timezone.is_empty() {
            self.location.timezone = default_timezone();
        }
        if self.location.name.is_empty() {
            self.location.name = default_location_name();
        }
        if self.forecast.provider.is_empty() {
            self.forecast.provider = default_provider();
        }
        if self.forecast.horizon_hours == 0 {
            self.forecast.horizon_hours = default_horizon_hours();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        self.location.to_location().map_err(|e| match e {
            AstroForecastError::Validation { message } => {
                AstroForecastError::config(format!("location: {message}"))
            }
            other => other,
        })?;
        self.condition.validate()?;
        self.forecast
            .provider_kind()
            .map_err(|_| AstroForecastError::config(format!(
                "forecast.provider = '{}' is not a supported provider",
                self.forecast.provider
            )))?;
        self.validate_string_values()
    }

    fn validate_string_values(&self) -> crate::Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AstroForecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AstroForecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        Ok(())
    }
}
