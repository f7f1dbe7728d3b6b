//! Weather collaborator contract and its deterministic fallback.
//!
//! Real weather comes from an external service behind [`WeatherProvider`].
//! Whenever that fails the UI still gets something to show: a pseudo-random
//! reading derived from the date alone, identical on every call.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_FORECAST_DAYS: u32 = 5;

const DESCRIPTIONS: [&str; 9] = [
    "Clear sky",
    "Few clouds",
    "Scattered clouds",
    "Broken clouds",
    "Shower rain",
    "Rain",
    "Thunderstorm",
    "Snow",
    "Mist",
];

const ICONS: [&str; 9] = ["01d", "02d", "03d", "04d", "09d", "10d", "11d", "13d", "50d"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// Degrees Celsius.
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    /// Percent.
    pub humidity: u32,
    /// km/h.
    pub wind_speed: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub daily: Vec<WeatherData>,
    pub current: Option<WeatherData>,
}

/// An external weather source. Errors are opaque to the core; any failure
/// means "use the fallback".
pub trait WeatherProvider {
    type Error: std::fmt::Display;

    fn weather(&self, at: Coordinates, date: NaiveDate) -> Result<WeatherData, Self::Error>;

    fn forecast(
        &self,
        at: Coordinates,
        start: NaiveDate,
        days: u32,
    ) -> Result<Forecast, Self::Error>;
}

/// Deterministic stand-in reading for `date`.
pub fn mock_weather(date: NaiveDate) -> WeatherData {
    let seed: u32 = date
        .format("%Y-%m-%d")
        .to_string()
        .bytes()
        .map(u32::from)
        .sum();
    let index = (seed % DESCRIPTIONS.len() as u32) as usize;
    WeatherData {
        temperature: (10 + seed % 25) as f64,
        description: DESCRIPTIONS[index].to_string(),
        icon: ICONS[index].to_string(),
        humidity: 30 + seed % 60,
        wind_speed: (2 + seed % 18) as f64,
        date,
    }
}

pub fn mock_forecast(start: NaiveDate, days: u32) -> Forecast {
    let daily: Vec<WeatherData> = (0..days as u64)
        .filter_map(|i| start.checked_add_days(Days::new(i)))
        .map(mock_weather)
        .collect();
    Forecast {
        current: daily.first().cloned(),
        daily,
    }
}

pub fn weather_or_fallback<P: WeatherProvider>(
    provider: &P,
    at: Coordinates,
    date: NaiveDate,
) -> WeatherData {
    provider.weather(at, date).unwrap_or_else(|e| {
        warn!(error = %e, %date, "weather lookup failed, using fallback");
        mock_weather(date)
    })
}

pub fn forecast_or_fallback<P: WeatherProvider>(
    provider: &P,
    at: Coordinates,
    start: NaiveDate,
    days: u32,
) -> Forecast {
    provider.forecast(at, start, days).unwrap_or_else(|e| {
        warn!(error = %e, %start, days, "forecast lookup failed, using fallback");
        mock_forecast(start, days)
    })
}
