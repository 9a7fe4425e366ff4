use serde::{Deserialize, Serialize};

/// Normalized weather condition exposed by the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "sunny")]
    Sunny,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    #[serde(rename = "cloudy")]
    Cloudy,
    #[serde(rename = "pouring")]
    Pouring,
    #[serde(rename = "rainy")]
    Rainy,
    #[serde(rename = "lightning-rainy")]
    LightningRainy,
    #[serde(rename = "snowy-rainy")]
    SnowyRainy,
    #[serde(rename = "snowy")]
    Snowy,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Yandex condition codes grouped by normalized category.
///
/// Lookup walks the table top to bottom and takes the first category that
/// lists the code, so the order of rows matters.
pub static CONDITION_CLASSES: &[(Condition, &[&str])] = &[
    (Condition::Sunny, &["clear"]),
    (Condition::PartlyCloudy, &["partly-cloudy"]),
    (Condition::Cloudy, &["cloudy", "overcast"]),
    (
        Condition::Pouring,
        &["heavy-rain", "continuous-heavy-rain", "showers", "hail"],
    ),
    (
        Condition::Rainy,
        &["drizzle", "light-rain", "rain", "moderate-rain"],
    ),
    (
        Condition::LightningRainy,
        &["thunderstorm", "thunderstorm-with-rain", "thunderstorm-with-hail"],
    ),
    (Condition::SnowyRainy, &["wet-snow"]),
    (Condition::Snowy, &["light-snow", "snow", "snow-showers"]),
];

impl Condition {
    /// Map a Yandex condition code to its category, `Unknown` if no row lists it.
    pub fn from_code(code: &str) -> Self {
        CONDITION_CLASSES
            .iter()
            .find(|(_, codes)| codes.contains(&code))
            .map(|(condition, _)| *condition)
            .unwrap_or(Condition::Unknown)
    }

    pub fn from_optional(code: Option<&str>) -> Self {
        code.map(Self::from_code).unwrap_or(Condition::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "sunny",
            Condition::PartlyCloudy => "partlycloudy",
            Condition::Cloudy => "cloudy",
            Condition::Pouring => "pouring",
            Condition::Rainy => "rainy",
            Condition::LightningRainy => "lightning-rainy",
            Condition::SnowyRainy => "snowy-rainy",
            Condition::Snowy => "snowy",
            Condition::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
