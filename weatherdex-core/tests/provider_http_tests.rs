//! HTTP-level tests for the city and forecast providers.
//!
//! Each test starts a local mock server and points a provider at it, so status
//! codes, bodies and delays reach the real request/response path.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use weatherdex_core::{
    City, CityLookup, ForecastProvider, LookupError, Units,
    provider::{apininjas::ApiNinjasProvider, openweather::OpenWeatherProvider},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

const GEOCODING: &str = "/geo/1.0/direct";
const ONE_CALL: &str = "/data/3.0/onecall";
const NINJAS_CITY: &str = "/v1/city";

fn client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().expect("client builds")
}

fn openweather(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new("OW_KEY".to_string(), client(Duration::from_secs(5))).with_base_url(server.uri())
}

fn apininjas(server: &MockServer) -> ApiNinjasProvider {
    ApiNinjasProvider::new("NINJA_KEY".to_string(), client(Duration::from_secs(5))).with_base_url(server.uri())
}

async fn respond(server: &MockServer, at: &str, template: ResponseTemplate) {
    Mock::given(method("GET")).and(path(at)).respond_with(template).mount(server).await;
}

#[tokio::test]
async fn test_openweather_search_sends_query_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODING))
        .and(query_param("q", "Berlin"))
        .and(query_param("limit", "3"))
        .and(query_param("appid", "OW_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{ "name": "Berlin", "lat": 52.52, "lon": 13.4, "country": "DE" }]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let cities = openweather(&server).with_limit(3).search("  Berlin ").await.expect("lookup succeeds");

    assert_eq!(cities, vec![City::new("Berlin", "DE", 52.52, 13.4)]);
}

#[tokio::test]
async fn test_blank_query_never_reaches_the_server() {
    let server = MockServer::start().await;
    respond(&server, GEOCODING, ResponseTemplate::new(200).set_body_string("[]")).await;

    let err = openweather(&server).search("   ").await.unwrap_err();

    assert!(matches!(err, LookupError::EmptyQuery));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_rate_limited_response_is_an_api_error() {
    let server = MockServer::start().await;
    respond(&server, GEOCODING, ResponseTemplate::new(429).set_body_string("slow down")).await;

    let err = openweather(&server).search("Berlin").await.unwrap_err();

    match &err {
        LookupError::Api { status, body } => {
            assert_eq!(*status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert!(err.is_rate_limited());
    assert!(err.user_message().contains("Too many requests"));
}

#[tokio::test]
async fn test_rejected_key_points_at_configure() {
    let server = MockServer::start().await;
    respond(
        &server,
        NINJAS_CITY,
        ResponseTemplate::new(401).set_body_string(r#"{ "error": "Invalid API Key." }"#),
    )
    .await;

    let err = apininjas(&server).search("Berlin").await.unwrap_err();

    assert!(matches!(err, LookupError::Api { status, .. } if status == StatusCode::UNAUTHORIZED));
    assert!(!err.is_rate_limited());
    assert!(err.user_message().contains("weatherdex configure"));
}

#[tokio::test]
async fn test_long_error_bodies_are_truncated() {
    let server = MockServer::start().await;
    respond(&server, GEOCODING, ResponseTemplate::new(502).set_body_string("x".repeat(1_000))).await;

    let err = openweather(&server).search("Berlin").await.unwrap_err();

    let LookupError::Api { body, .. } = err else {
        panic!("expected an API error");
    };
    assert!(body.len() < 1_000);
    assert!(body.ends_with("..."));
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    respond(&server, NINJAS_CITY, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let err = apininjas(&server).search("Berlin").await.unwrap_err();

    assert!(matches!(err, LookupError::Decode(_)));
    assert!(err.user_message().contains("unexpected response"));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    respond(
        &server,
        GEOCODING,
        ResponseTemplate::new(200).set_body_string("[]").set_delay(Duration::from_secs(3)),
    )
    .await;

    let provider = OpenWeatherProvider::new("OW_KEY".to_string(), client(Duration::from_millis(200)))
        .with_base_url(server.uri());
    let err = provider.search("Berlin").await.unwrap_err();

    assert!(matches!(err, LookupError::Network { timed_out: true, .. }), "{err:?}");
    assert!(err.user_message().contains("too long"));
}

#[tokio::test]
async fn test_apininjas_sends_key_header_and_keeps_population() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NINJAS_CITY))
        .and(header("X-Api-Key", "NINJA_KEY"))
        .and(query_param("name", "Berlin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{ "name": "Berlin", "latitude": 52.52, "longitude": 13.4, "country": "DE", "population": 3645000 }]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let cities = apininjas(&server).search("Berlin").await.expect("lookup succeeds");

    assert_eq!(cities[0].population, Some(3_645_000));
}

#[tokio::test]
async fn test_forecast_requests_daily_data_in_units() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ONE_CALL))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.4"))
        .and(query_param("units", "imperial"))
        .and(query_param("exclude", "current,minutely,hourly,alerts"))
        .and(query_param("appid", "OW_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "lat": 52.52, "lon": 13.4, "timezone_offset": 3600, "daily": [{ "dt": 1700046000 }, {}] }"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let forecast = openweather(&server).forecast(52.52, 13.4, Units::Imperial).await.expect("forecast succeeds");

    assert_eq!(forecast.days().len(), 2);
    assert_eq!(forecast.days()[1].dt, None);
}

#[tokio::test]
async fn test_forecast_server_error_is_an_api_error() {
    let server = MockServer::start().await;
    respond(&server, ONE_CALL, ResponseTemplate::new(503)).await;

    let err = openweather(&server).forecast(52.52, 13.4, Units::Metric).await.unwrap_err();

    assert!(matches!(err, LookupError::Api { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
    assert!(err.user_message().contains("503"));
}
