use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::LookupError,
    forecast::Forecast,
    model::{City, Units},
    provider::{read_body, validate_query},
};

use super::{CityLookup, ForecastProvider};

const BASE_URL: &str = "https://api.openweathermap.org";
const GEOCODING_PATH: &str = "/geo/1.0/direct";
const ONE_CALL_PATH: &str = "/data/3.0/onecall";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    limit: u32,
    base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, http, limit: 5, base_url: BASE_URL.to_string() }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Points both the geocoding and the One Call requests at another host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoCity {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

impl From<OwGeoCity> for City {
    fn from(raw: OwGeoCity) -> Self {
        // The geocoding endpoint does not report population.
        City::new(raw.name, raw.country.unwrap_or_default(), raw.lat, raw.lon)
    }
}

fn parse_cities(body: &str) -> Result<Vec<City>, LookupError> {
    let parsed: Vec<OwGeoCity> = serde_json::from_str(body)?;
    Ok(parsed.into_iter().map(City::from).collect())
}

fn parse_forecast(body: &str) -> Result<Forecast, LookupError> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl CityLookup for OpenWeatherProvider {
    async fn search(&self, query: &str) -> Result<Vec<City>, LookupError> {
        let query = validate_query(query)?;
        let limit = self.limit.to_string();

        debug!(query, "OpenWeather geocoding request");

        let res = self
            .http
            .get(format!("{}{GEOCODING_PATH}", self.base_url))
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body = read_body(res).await?;
        parse_cities(&body)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn forecast(&self, latitude: f64, longitude: f64, units: Units) -> Result<Forecast, LookupError> {
        debug!(latitude, longitude, %units, "OpenWeather one call request");

        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let res = self
            .http
            .get(format!("{}{ONE_CALL_PATH}", self.base_url))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", units.as_str()),
                ("exclude", "current,minutely,hourly,alerts"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body = read_body(res).await?;
        parse_forecast(&body)
    }
}
