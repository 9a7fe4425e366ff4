//! Core library for the Yandex.Weather entity.
//!
//! This crate defines:
//! - The informers client that fetches and stores raw fragments
//! - The weather view that turns them into normalized entity state
//! - Configuration & credentials handling
//!
//! It is used by the `yandex-weather` binary, but can also be embedded by other hosts.

pub mod condition;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod throttle;
pub mod view;

pub use condition::Condition;
pub use config::Config;
pub use error::FetchError;
pub use model::{
    Attributes, Coordinates, CurrentConditions, EntityState, ForecastEntry, ForecastFragment,
    ForecastPart, Snapshot,
};
pub use provider::{HttpClient, WeatherProvider, YandexClient, provider_from_config};
pub use throttle::{MIN_TIME_BETWEEN_UPDATES, Throttle};
pub use view::{UpdateOutcome, WeatherView};
