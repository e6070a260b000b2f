use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::LookupError,
    model::City,
    provider::{read_body, validate_query},
};

use super::CityLookup;

const BASE_URL: &str = "https://api.api-ninjas.com";
const CITY_PATH: &str = "/v1/city";

/// City lookup backed by the API Ninjas city endpoint, which reports population.
#[derive(Debug, Clone)]
pub struct ApiNinjasProvider {
    api_key: String,
    http: Client,
    limit: u32,
    base_url: String,
}

impl ApiNinjasProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, http, limit: 5, base_url: BASE_URL.to_string() }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct NinjaCity {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    population: Option<u64>,
}

impl From<NinjaCity> for City {
    fn from(raw: NinjaCity) -> Self {
        City {
            name: raw.name,
            country: raw.country.unwrap_or_default(),
            latitude: raw.latitude,
            longitude: raw.longitude,
            population: raw.population,
        }
    }
}

fn parse_cities(body: &str) -> Result<Vec<City>, LookupError> {
    let parsed: Vec<NinjaCity> = serde_json::from_str(body)?;
    Ok(parsed.into_iter().map(City::from).collect())
}

#[async_trait]
impl CityLookup for ApiNinjasProvider {
    async fn search(&self, query: &str) -> Result<Vec<City>, LookupError> {
        let query = validate_query(query)?;
        let limit = self.limit.to_string();

        debug!(query, "API Ninjas city request");

        let res = self
            .http
            .get(format!("{}{CITY_PATH}", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[("name", query), ("limit", limit.as_str())])
            .send()
            .await?;

        let body = read_body(res).await?;
        parse_cities(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cities_with_population() {
        let body = r#"[{
            "name": "Berlin",
            "latitude": 52.52,
            "longitude": 13.4,
            "country": "DE",
            "population": 3645000,
            "is_capital": true
        }]"#;

        let cities = parse_cities(body).expect("valid payload");

        assert_eq!(
            cities,
            vec![City::new("Berlin", "DE", 52.52, 13.4).with_population(3_645_000)]
        );
    }

    #[test]
    fn zero_population_stays_zero() {
        let body = r#"[{ "name": "Pripyat", "latitude": 51.4, "longitude": 30.05, "country": "UA", "population": 0 }]"#;
        let cities = parse_cities(body).unwrap();
        assert_eq!(cities[0].population, Some(0));
    }

    #[test]
    fn missing_population_is_unknown() {
        let body = r#"[{ "name": "Berlin", "latitude": 52.52, "longitude": 13.4, "country": "DE" }]"#;
        let cities = parse_cities(body).unwrap();
        assert_eq!(cities[0].population, None);
    }

    #[test]
    fn malformed_entries_are_decode_errors() {
        let err = parse_cities(r#"[{ "name": "Berlin" }]"#).unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)));
    }
}
