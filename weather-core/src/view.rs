//! Presentation side of the weather entity.
//!
//! [`WeatherView`] never caches derived values: every accessor re-reads the
//! provider's current snapshot and computes its answer from it.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::{
    condition::Condition,
    model::{
        Attributes, CurrentConditions, EntityState, ForecastEntry, ForecastFragment,
        NATIVE_UNITS, Snapshot,
    },
    provider::WeatherProvider,
    throttle::Throttle,
};

pub const ATTRIBUTION: &str = "Data provided by Yandex.Weather";

/// Observation time layout used in the attributes bag.
pub const TIME_STR_FORMAT: &str = "%H:%M %d.%m.%Y";

/// Timestamps given to the first two forecast parts, in minutes from now.
const FORECAST_OFFSETS_MINUTES: [i64; 2] = [350, 700];

/// What a call to [`WeatherView::update`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Fetched,
    Failed,
    Throttled,
}

/// A named weather entity backed by a [`WeatherProvider`].
#[derive(Debug)]
pub struct WeatherView<P> {
    name: String,
    unique_id: String,
    provider: P,
    throttle: Mutex<Throttle>,
}

impl<P: WeatherProvider> WeatherView<P> {
    pub fn new(name: impl Into<String>, provider: P) -> Self {
        Self::with_throttle(name, provider, Throttle::default())
    }

    pub fn with_throttle(name: impl Into<String>, provider: P, throttle: Throttle) -> Self {
        let name = name.into();
        let coords = provider.coordinates();
        // Debug keeps the fractional part of whole-degree coordinates ("37.0").
        let unique_id = format!("{}_{:?}_{:?}", name, coords.longitude, coords.latitude);

        Self {
            name,
            unique_id,
            provider,
            throttle: Mutex::new(throttle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Refresh from the provider unless the last real fetch is too recent.
    ///
    /// The throttle lock is held across the request, so overlapping calls
    /// run one after another and the later ones see the fresh timestamp.
    #[instrument(skip(self), fields(entity = %self.unique_id))]
    pub async fn update(&self) -> UpdateOutcome {
        let mut throttle = self.throttle.lock().await;

        if !throttle.try_acquire(Utc::now()) {
            debug!(last_call = ?throttle.last_call(), "Update throttled");
            return UpdateOutcome::Throttled;
        }

        match self.provider.fetch().await {
            Ok(()) => UpdateOutcome::Fetched,
            Err(_) => UpdateOutcome::Failed,
        }
    }

    pub fn available(&self) -> bool {
        self.provider
            .snapshot()
            .is_some_and(|s| s.current.is_some())
    }

    pub fn condition(&self) -> Option<Condition> {
        self.read_current(|c| Some(Condition::from_optional(c.condition.as_deref())))
    }

    pub fn native_temperature(&self) -> Option<f64> {
        self.read_current(|c| c.temp)
    }

    pub fn native_apparent_temperature(&self) -> Option<f64> {
        self.read_current(|c| c.feels_like)
    }

    pub fn humidity(&self) -> Option<f64> {
        self.read_current(|c| c.humidity)
    }

    pub fn native_wind_speed(&self) -> Option<f64> {
        self.read_current(|c| c.wind_speed)
    }

    pub fn wind_bearing(&self) -> Option<String> {
        self.read_current(|c| c.wind_dir.clone())
    }

    pub fn native_pressure(&self) -> Option<f64> {
        self.read_current(|c| c.pressure_pa)
    }

    pub fn condition_icon(&self) -> Option<String> {
        self.read_current(|c| c.icon.clone())
    }

    pub fn observation_time(&self) -> Option<DateTime<Utc>> {
        self.read_current(observation_time)
    }

    pub fn forecast(&self) -> Option<Vec<ForecastEntry>> {
        self.forecast_at(Utc::now())
    }

    /// Forecast list with timestamps relative to `now`.
    pub fn forecast_at(&self, now: DateTime<Utc>) -> Option<Vec<ForecastEntry>> {
        let snapshot = self.provider.snapshot()?;
        snapshot
            .forecast
            .as_ref()
            .map(|forecast| forecast_entries(forecast, now))
    }

    pub fn attributes(&self) -> Option<Attributes> {
        self.attributes_in(&Local)
    }

    pub fn attributes_in<Tz>(&self, tz: &Tz) -> Option<Attributes>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.read_current(|c| Some(attributes(c, tz)))
    }

    pub fn state(&self) -> EntityState {
        self.state_at(Utc::now(), &Local)
    }

    /// Full entity surface computed from one snapshot read.
    pub fn state_at<Tz>(&self, now: DateTime<Utc>, tz: &Tz) -> EntityState
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let snapshot = self.provider.snapshot();
        let current = snapshot.as_deref().and_then(|s| s.current.as_ref());
        let forecast = snapshot.as_deref().and_then(|s| s.forecast.as_ref());

        EntityState {
            name: self.name.clone(),
            unique_id: self.unique_id.clone(),
            attribution: ATTRIBUTION,
            available: current.is_some(),
            condition: current.map(|c| Condition::from_optional(c.condition.as_deref())),
            native_temperature: current.and_then(|c| c.temp),
            native_apparent_temperature: current.and_then(|c| c.feels_like),
            humidity: current.and_then(|c| c.humidity),
            native_wind_speed: current.and_then(|c| c.wind_speed),
            wind_bearing: current.and_then(|c| c.wind_dir.clone()),
            native_pressure: current.and_then(|c| c.pressure_pa),
            condition_icon: current.and_then(|c| c.icon.clone()),
            observation_time: current.and_then(observation_time),
            units: NATIVE_UNITS,
            forecast: forecast.map(|f| forecast_entries(f, now)),
            attributes: current.map(|c| attributes(c, tz)),
        }
    }

    fn read_current<T>(&self, f: impl FnOnce(&CurrentConditions) -> Option<T>) -> Option<T> {
        let snapshot: std::sync::Arc<Snapshot> = self.provider.snapshot()?;
        snapshot.current.as_ref().and_then(f)
    }
}

fn observation_time(current: &CurrentConditions) -> Option<DateTime<Utc>> {
    current
        .obs_time
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
}

fn attributes<Tz>(current: &CurrentConditions, tz: &Tz) -> Attributes
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    Attributes {
        feels_like: current.feels_like,
        weather_icon: current.icon.clone(),
        observation_time: observation_time(current)
            .map(|t| t.with_timezone(tz).format(TIME_STR_FORMAT).to_string()),
    }
}

fn forecast_entries(forecast: &ForecastFragment, now: DateTime<Utc>) -> Vec<ForecastEntry> {
    forecast
        .parts
        .iter()
        .enumerate()
        .map(|(index, part)| ForecastEntry {
            datetime: FORECAST_OFFSETS_MINUTES
                .get(index)
                .map(|minutes| now + Duration::minutes(*minutes)),
            native_temperature: part.temp_max,
            native_templow: part.temp_min,
            condition: Condition::from_optional(part.condition.as_deref()),
            weather_icon: part.icon.clone(),
            feels_like: part.feels_like,
            precipitation_probability: part.prec_prob,
            native_precipitation: part.prec_mm,
            native_wind_speed: part.wind_speed,
            wind_bearing: part.wind_dir.clone(),
            native_pressure: part.pressure_pa,
            humidity: part.humidity,
            part_of_day: part.part_name.clone(),
        })
        .collect()
}
