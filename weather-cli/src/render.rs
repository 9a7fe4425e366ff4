use std::fmt::Write;

use yandex_weather_core::EntityState;

/// Human-readable summary of the entity state.
pub fn human(state: &EntityState) -> String {
    let mut out = String::new();
    let units = state.units;

    let _ = writeln!(out, "{} ({})", state.name, state.unique_id);

    if !state.available {
        let _ = writeln!(out, "  unavailable: no data received yet");
        return out;
    }

    if let Some(condition) = state.condition {
        let _ = writeln!(out, "  condition:   {condition}");
    }
    line(&mut out, "temperature", state.native_temperature, units.temperature);
    line(&mut out, "feels like", state.native_apparent_temperature, units.temperature);
    line(&mut out, "humidity", state.humidity, "%");
    line(&mut out, "wind", state.native_wind_speed, units.wind_speed);
    if let Some(bearing) = &state.wind_bearing {
        let _ = writeln!(out, "  wind dir:    {bearing}");
    }
    line(&mut out, "pressure", state.native_pressure, units.pressure);

    if let Some(observed) = state
        .attributes
        .as_ref()
        .and_then(|a| a.observation_time.as_deref())
    {
        let _ = writeln!(out, "  observed:    {observed}");
    }

    if let Some(forecast) = &state.forecast {
        let _ = writeln!(out, "  forecast:");
        for entry in forecast {
            let _ = writeln!(
                out,
                "    {:<10} {:<16} {} / {} {}, precip {}",
                entry.part_of_day.as_deref().unwrap_or("-"),
                entry.condition,
                value(entry.native_temperature),
                value(entry.native_templow),
                units.temperature,
                entry
                    .precipitation_probability
                    .map(|p| format!("{p}%"))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    let _ = writeln!(out, "  {}", state.attribution);
    out
}

fn line(out: &mut String, label: &str, v: Option<f64>, unit: &str) {
    if let Some(v) = v {
        let _ = writeln!(out, "  {:<12} {v} {unit}", format!("{label}:"));
    }
}

fn value(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
