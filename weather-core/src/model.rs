use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::condition::Condition;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// The `fact` object of an informers response.
///
/// Every field is optional: a missing key reads back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConditions {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_dir: Option<String>,
    pub pressure_pa: Option<f64>,
    pub pressure_mm: Option<f64>,
    pub condition: Option<String>,
    pub icon: Option<String>,
    pub obs_time: Option<i64>,
    pub daytime: Option<String>,
    pub season: Option<String>,
}

/// One day or night segment of the `forecast` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPart {
    pub part_name: Option<String>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_avg: Option<f64>,
    pub feels_like: Option<f64>,
    pub icon: Option<String>,
    pub condition: Option<String>,
    pub daytime: Option<String>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_dir: Option<String>,
    pub pressure_pa: Option<f64>,
    pub pressure_mm: Option<f64>,
    pub humidity: Option<f64>,
    pub prec_mm: Option<f64>,
    pub prec_period: Option<f64>,
    pub prec_prob: Option<f64>,
}

/// The `forecast` object of an informers response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastFragment {
    pub date: Option<String>,
    pub date_ts: Option<i64>,
    pub week: Option<i64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moon_code: Option<i64>,
    pub moon_text: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub parts: Vec<ForecastPart>,
}

/// Raw body of `GET /v2/informers`.
///
/// A successful reply carries `fact`/`forecast`; an error reply carries
/// `status` (number or string) and usually `message`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InformersResponse {
    /// `Some` whenever the key is present, including `"status": null`.
    #[serde(deserialize_with = "present")]
    pub status: Option<serde_json::Value>,
    pub message: Option<String>,
    pub fact: Option<CurrentConditions>,
    pub forecast: Option<ForecastFragment>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Both fragments of one successful fetch, replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current: Option<CurrentConditions>,
    pub forecast: Option<ForecastFragment>,
    pub fetched_at: DateTime<Utc>,
}

/// One normalized forecast entry as shown to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub datetime: Option<DateTime<Utc>>,
    pub native_temperature: Option<f64>,
    pub native_templow: Option<f64>,
    pub condition: Condition,
    pub weather_icon: Option<String>,
    pub feels_like: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub native_precipitation: Option<f64>,
    pub native_wind_speed: Option<f64>,
    pub wind_bearing: Option<String>,
    pub native_pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub part_of_day: Option<String>,
}

/// Extra state attributes reported next to the main fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attributes {
    pub feels_like: Option<f64>,
    pub weather_icon: Option<String>,
    pub observation_time: Option<String>,
}

/// Native units of every numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Units {
    pub temperature: &'static str,
    pub pressure: &'static str,
    pub wind_speed: &'static str,
    pub precipitation: &'static str,
}

pub const NATIVE_UNITS: Units = Units {
    temperature: "°C",
    pressure: "hPa",
    wind_speed: "m/s",
    precipitation: "mm",
};

/// Everything the entity exposes to its host at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub name: String,
    pub unique_id: String,
    pub attribution: &'static str,
    pub available: bool,
    pub condition: Option<Condition>,
    pub native_temperature: Option<f64>,
    pub native_apparent_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub native_wind_speed: Option<f64>,
    pub wind_bearing: Option<String>,
    pub native_pressure: Option<f64>,
    pub condition_icon: Option<String>,
    pub observation_time: Option<DateTime<Utc>>,
    pub units: Units,
    pub forecast: Option<Vec<ForecastEntry>>,
    pub attributes: Option<Attributes>,
}
