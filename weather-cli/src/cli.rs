use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use tracing::info;
use yandex_weather_core::{
    Config, EntityState, HttpClient, UpdateOutcome, WeatherView, YandexClient,
    config::{DEFAULT_NAME, validate_coordinates},
    provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "yandex-weather", version, about = "Yandex.Weather entity CLI")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the entity name, API key and location.
    Configure,

    /// Fetch once and print the entity state.
    Show {
        /// Print JSON instead of a human-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Poll the entity on a fixed cadence until interrupted.
    Watch {
        /// Seconds between update attempts; real requests stay throttled to one per 45 minutes.
        #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Print JSON instead of a human-readable summary.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;

        match self.command {
            Command::Configure => configure(config, self.config.as_deref()),
            Command::Show { json } => {
                let view = build_view(&config)?;
                view.update().await;
                print_state(&view.state(), json)
            }
            Command::Watch { interval, json } => {
                let view = build_view(&config)?;
                watch(&view, Duration::from_secs(interval), json).await
            }
        }
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

fn build_view(config: &Config) -> Result<WeatherView<YandexClient>> {
    let http = reqwest_client()?;
    let client = provider_from_config(config, http)?;
    Ok(WeatherView::new(config.name(), client))
}

fn reqwest_client() -> Result<HttpClient> {
    HttpClient::builder()
        .user_agent(concat!("yandex-weather/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

async fn watch(view: &WeatherView<YandexClient>, every: Duration, json: bool) -> Result<()> {
    let mut ticker = tokio::time::interval(every);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    info!(entity = view.unique_id(), every_secs = every.as_secs(), "Watching");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if view.update().await != UpdateOutcome::Throttled {
                    print_state(&view.state(), json)?;
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                return Ok(());
            }
        }
    }
}

fn print_state(state: &EntityState, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(state).context("Failed to serialize entity state")?;
        println!("{out}");
    } else {
        print!("{}", render::human(state));
    }
    Ok(())
}

fn configure(mut config: Config, path: Option<&std::path::Path>) -> Result<()> {
    let name = Text::new("Entity name:")
        .with_default(if config.yandex.name.is_empty() {
            DEFAULT_NAME
        } else {
            config.yandex.name.as_str()
        })
        .prompt()
        .context("Failed to read entity name")?;

    let api_key = Password::new("Yandex.Weather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let latitude = prompt_coordinate("Latitude (empty to use home location):")?;
    let longitude = prompt_coordinate("Longitude (empty to use home location):")?;

    if let (Some(lat), Some(lon)) = (latitude, longitude) {
        validate_coordinates(lat, lon)?;
    }

    config.yandex.name = name;
    config.yandex.api_key = Some(api_key.trim().to_string());
    config.yandex.latitude = latitude;
    config.yandex.longitude = longitude;

    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }

    println!("Configuration saved.");
    Ok(())
}

fn prompt_coordinate(label: &str) -> Result<Option<f64>> {
    let raw = Text::new(label)
        .prompt()
        .with_context(|| format!("Failed to read {label}"))?;

    parse_optional_coordinate(&raw)
}

fn parse_optional_coordinate(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value = raw
        .replace(',', ".")
        .parse::<f64>()
        .with_context(|| format!("'{raw}' is not a number"))?;
    Ok(Some(value))
}
