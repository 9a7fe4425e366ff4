use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    Config,
    error::FetchError,
    model::{Coordinates, Snapshot},
};

pub mod yandex;

pub use reqwest::Client as HttpClient;
pub use yandex::YandexClient;

/// Source of raw weather fragments consumed by a [`crate::WeatherView`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Perform one request and, on success, replace the stored snapshot.
    async fn fetch(&self) -> Result<(), FetchError>;

    /// Last successfully stored snapshot, `None` until the first success.
    fn snapshot(&self) -> Option<Arc<Snapshot>>;

    fn coordinates(&self) -> Coordinates;
}

/// Build a Yandex client from config, reusing the caller's HTTP client.
pub fn provider_from_config(config: &Config, http: reqwest::Client) -> anyhow::Result<YandexClient> {
    let api_key = config.api_key()?;
    let coordinates = config.resolve_coordinates()?;

    Ok(YandexClient::new(coordinates, api_key.to_owned(), http))
}
