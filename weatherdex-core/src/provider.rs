use crate::{
    Config,
    error::LookupError,
    forecast::Forecast,
    model::{City, Units},
    provider::{apininjas::ApiNinjasProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod apininjas;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    ApiNinjas,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::ApiNinjas => "apininjas",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::ApiNinjas]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "apininjas" => Ok(ProviderId::ApiNinjas),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, apininjas."
            )),
        }
    }
}

/// Resolves free-text queries into candidate cities.
#[async_trait]
pub trait CityLookup: Send + Sync + Debug {
    async fn search(&self, query: &str) -> Result<Vec<City>, LookupError>;
}

/// Fetches daily forecast data for a coordinate.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast(&self, latitude: f64, longitude: f64, units: Units) -> Result<Forecast, LookupError>;
}

/// Construct a city lookup from config and explicit ProviderId.
pub fn provider_from_config(id: ProviderId, config: &Config) -> anyhow::Result<Arc<dyn CityLookup>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weatherdex configure {id}` and enter your API key."
        )
    })?;

    let http = http_client(config.http.timeout())?;
    let limit = config.search.result_limit;

    let lookup: Arc<dyn CityLookup> = match id {
        ProviderId::OpenWeather => {
            Arc::new(OpenWeatherProvider::new(api_key.to_owned(), http).with_limit(limit))
        }
        ProviderId::ApiNinjas => {
            Arc::new(ApiNinjasProvider::new(api_key.to_owned(), http).with_limit(limit))
        }
    };

    Ok(lookup)
}

/// Construct the default city lookup from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn CityLookup>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Forecasts always come from OpenWeather, whichever city provider is the default.
pub fn forecast_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn ForecastProvider>> {
    let api_key = config.provider_api_key(ProviderId::OpenWeather).ok_or_else(|| {
        anyhow::anyhow!(
            "Forecasts require an OpenWeather API key.\n\
                 Hint: run `weatherdex configure openweather` and enter your API key."
        )
    })?;

    let http = http_client(config.http.timeout())?;
    Ok(Arc::new(OpenWeatherProvider::new(api_key.to_owned(), http)))
}

pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    use anyhow::Context;

    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("weatherdex/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Trimmed query, or `EmptyQuery` when nothing is left.
pub(crate) fn validate_query(query: &str) -> Result<&str, LookupError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(LookupError::EmptyQuery);
    }
    Ok(trimmed)
}

/// Read the body of a response, mapping non-success statuses to `LookupError::Api`.
pub(crate) async fn read_body(res: Response) -> Result<String, LookupError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(LookupError::Api { status, body: truncate_body(&body) });
    }

    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
