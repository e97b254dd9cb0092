use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use argh::FromArgs;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use astroforecast::config::{AstroForecastConfig, LoggingConfig};
use astroforecast::forecast_service::{ForecastService, ForecastSource};
use astroforecast::models::Location;
use astroforecast::weather::RawPayload;
use astroforecast::AstroForecastError;

#[derive(FromArgs)]
/// Astronomy forecast from saved weather provider payloads
struct Args {
    /// path to the configuration file (default: astroforecast.toml)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// raw provider payload files, at least one
    #[argh(positional)]
    payloads: Vec<PathBuf>,
}

/// Raw payload saved to disk by an earlier fetch
struct FileSource {
    path: PathBuf,
}

#[async_trait]
impl ForecastSource for FileSource {
    async fn fetch(&self, _location: &Location) -> astroforecast::Result<RawPayload> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&raw).map_err(|e| {
            AstroForecastError::validation(format!("{}: {e}", self.path.display()))
        })
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("astroforecast={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    if args.payloads.is_empty() {
        bail!("no payload file given, see --help");
    }

    let config = AstroForecastConfig::load_from_path(args.config)?;
    init_logging(&config.logging);
    info!("astroforecast {} for {}", astroforecast::VERSION, config.location.name);

    let service = ForecastService::from_config(&config).context("Invalid forecast settings")?;
    let sources: Vec<Box<dyn ForecastSource>> = args
        .payloads
        .into_iter()
        .map(|path| Box::new(FileSource { path }) as Box<dyn ForecastSource>)
        .collect();

    let forecast = match service.refresh(&sources, Utc::now()).await {
        Ok(forecast) => forecast,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(anyhow::Error::new(e).context("Failed to build forecast"));
        }
    };

    println!("{}", serde_json::to_string_pretty(&forecast)?);
    Ok(())
}
