use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::{
    error::FetchError,
    model::{Coordinates, CurrentConditions, ForecastFragment, InformersResponse, Snapshot},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weather.yandex.ru";

/// Upper bound on one informers round trip, connect through body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const API_KEY_HEADER: &str = "X-Yandex-API-Key";

/// Client for the Yandex.Weather "informers" endpoint.
///
/// Holds the last successful snapshot; a failed fetch never touches it.
pub struct YandexClient {
    coordinates: Coordinates,
    api_key: String,
    http: Client,
    base_url: String,
    timeout: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl YandexClient {
    pub fn new(coordinates: Coordinates, api_key: String, http: Client) -> Self {
        Self {
            coordinates,
            api_key,
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: FETCH_TIMEOUT,
            snapshot: RwLock::new(None),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn current(&self) -> Option<CurrentConditions> {
        self.snapshot().and_then(|s| s.current.clone())
    }

    pub fn forecast(&self) -> Option<ForecastFragment> {
        self.snapshot().and_then(|s| s.forecast.clone())
    }

    /// One request, no side effects on the stored snapshot.
    pub async fn try_fetch(&self) -> Result<Snapshot, FetchError> {
        let url = format!("{}/v2/informers", self.base_url);

        let request = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("lat", self.coordinates.latitude),
                ("lon", self.coordinates.longitude),
            ]);

        let round_trip = async {
            let res = request.send().await?;
            let status = res.status();
            let body = res.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        // Errors come back in-band, so the body is read whatever the HTTP status.
        let parsed: InformersResponse =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                http_status: status.as_u16(),
                source,
            })?;

        if let Some(code) = parsed.status {
            return Err(FetchError::Provider {
                status: status_text(&code),
                message: parsed.message.unwrap_or_default(),
            });
        }

        Ok(Snapshot {
            current: parsed.fact,
            forecast: parsed.forecast,
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl WeatherProvider for YandexClient {
    #[instrument(
        skip(self),
        fields(lat = self.coordinates.latitude, lon = self.coordinates.longitude)
    )]
    async fn fetch(&self) -> Result<(), FetchError> {
        match self.try_fetch().await {
            Ok(snapshot) => {
                debug!(current = ?snapshot.current, "Current data");
                debug!(forecast = ?snapshot.forecast, "Forecast data");
                *self.snapshot.write() = Some(Arc::new(snapshot));
                Ok(())
            }
            Err(err) => {
                log_failure(&err);
                Err(err)
            }
        }
    }

    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    fn coordinates(&self) -> Coordinates {
        self.coordinates
    }
}

impl std::fmt::Debug for YandexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexClient")
            .field("coordinates", &self.coordinates)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("has_data", &self.snapshot.read().is_some())
            .finish()
    }
}

fn log_failure(err: &FetchError) {
    match err {
        FetchError::Provider { status, message } => error!(
            kind = err.kind(),
            %status,
            provider_message = %message,
            "Error fetching data from Yandex.Weather"
        ),
        _ => error!(
            kind = err.kind(),
            error = %err,
            "Error fetching data from Yandex.Weather"
        ),
    }
}

fn status_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
