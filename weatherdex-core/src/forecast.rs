//! Daily forecast records as returned by the OpenWeather One Call API.
//!
//! Every field is optional: the upstream payload may omit any of them and
//! absence is a valid state, not a decode error. No defaults are substituted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forecast response for a single coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i64>,
    #[serde(default)]
    pub daily: Option<Vec<DailyForecast>>,
}

impl Forecast {
    pub fn days(&self) -> &[DailyForecast] {
        self.daily.as_deref().unwrap_or_default()
    }
}

/// One day of forecast data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Cloudiness, %.
    pub clouds: Option<u32>,
    pub dew_point: Option<f64>,
    /// Forecast time, unix seconds UTC.
    pub dt: Option<i64>,
    pub feels_like: Option<FeelsLike>,
    /// Humidity, %.
    pub humidity: Option<u32>,
    /// 0 and 1 are new moon, 0.5 is full moon.
    pub moon_phase: Option<f64>,
    pub moonrise: Option<i64>,
    pub moonset: Option<i64>,
    /// Probability of precipitation, 0..=1.
    pub pop: Option<f64>,
    /// Sea level pressure, hPa.
    pub pressure: Option<u32>,
    /// Precipitation volume, mm.
    pub rain: Option<f64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temp: Option<Temperature>,
    pub uvi: Option<f64>,
    pub weather: Option<Vec<WeatherCondition>>,
    pub wind_deg: Option<u32>,
    pub wind_gust: Option<f64>,
    pub wind_speed: Option<f64>,
}

impl DailyForecast {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(unix_to_utc)
    }

    pub fn sunrise_time(&self) -> Option<DateTime<Utc>> {
        self.sunrise.and_then(unix_to_utc)
    }

    pub fn sunset_time(&self) -> Option<DateTime<Utc>> {
        self.sunset.and_then(unix_to_utc)
    }

    pub fn moonrise_time(&self) -> Option<DateTime<Utc>> {
        self.moonrise.and_then(unix_to_utc)
    }

    pub fn moonset_time(&self) -> Option<DateTime<Utc>> {
        self.moonset.and_then(unix_to_utc)
    }

    /// Description of the first reported condition, if any.
    pub fn summary(&self) -> Option<&str> {
        self.weather
            .as_ref()?
            .first()?
            .description
            .as_deref()
    }
}

/// Perceived temperature over the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeelsLike {
    pub day: Option<f64>,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

/// Temperature breakdown over the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub day: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: Option<u32>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
