use std::time::Duration;

use globemate::api::countries::{COUNTRY_FIELDS, CountriesClient};
use globemate::api::geocode::GeocodeClient;
use globemate::api::rates::RatesClient;
use globemate::api::{ApiError, build_client};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client() -> reqwest::Client {
    build_client(Duration::from_secs(5))
}

// ============================================================================
// Countries
// ============================================================================

#[tokio::test]
async fn test_countries_all_requests_limited_fields() {
    let mock_server = MockServer::start().await;
    let body = json!([
        {
            "name": { "common": "Japan", "official": "Japan" },
            "cca3": "JPN",
            "capital": ["Tokyo"],
            "region": "Asia",
            "population": 125836021,
            "languages": { "jpn": "Japanese" },
            "currencies": { "JPY": { "name": "Japanese yen", "symbol": "¥" } },
            "flags": { "png": "https://flagcdn.com/w320/jp.png", "svg": "" },
            "idd": { "root": "+8", "suffixes": ["1"] },
            "car": { "side": "left" }
        },
        {
            "name": { "common": "Antarctica" },
            "cca3": "ATA",
            "region": "Antarctic"
        }
    ]);
    Mock::given(method("GET"))
        .and(path("/v3.1/all"))
        .and(query_param("fields", COUNTRY_FIELDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let countries = CountriesClient::new(client(), format!("{}/v3.1", mock_server.uri()))
        .all()
        .await
        .unwrap();

    assert_eq!(countries.len(), 2);
    let japan = &countries[0];
    assert_eq!(japan.capital_display(), "Tokyo");
    assert_eq!(japan.population_display(), "125,836,021");
    assert_eq!(japan.currency_display(), "Japanese yen (¥)");
    assert_eq!(japan.calling_code(), "+81");
    assert_eq!(japan.driving_side(), "Left");

    let antarctica = &countries[1];
    assert_eq!(antarctica.capital_display(), "N/A");
    assert_eq!(antarctica.population_display(), "N/A");
    assert_eq!(antarctica.languages_display(), "N/A");
    assert_eq!(antarctica.calling_code(), "N/A");
    assert_eq!(antarctica.driving_side(), "Right");
}

#[tokio::test]
async fn test_countries_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let result = CountriesClient::new(client(), mock_server.uri()).all().await;
    match result {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

// ============================================================================
// Rates
// ============================================================================

#[tokio::test]
async fn test_rates_latest_usd() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base": "USD",
            "rates": { "USD": 1.0, "EUR": 0.5, "JPY": 150.0 },
            "time_last_updated": 1700000000
        })))
        .mount(&mock_server)
        .await;

    let table = RatesClient::new(client(), mock_server.uri())
        .latest_usd()
        .await
        .unwrap();

    assert_eq!(table.time_last_updated, Some(1_700_000_000));
    assert_eq!(table.convert(10.0, "EUR", "USD"), Some(20.0));
    assert_eq!(table.cross_rate("EUR", "JPY"), Some(300.0));
    assert_eq!(table.rate("GBP"), None);
}

#[tokio::test]
async fn test_rates_without_table_is_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": {} })))
        .mount(&mock_server)
        .await;

    let result = RatesClient::new(client(), mock_server.uri()).latest_usd().await;
    assert!(matches!(result, Err(ApiError::Parse(_))));
}

#[tokio::test]
async fn test_rates_malformed_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = RatesClient::new(client(), mock_server.uri()).latest_usd().await;
    assert!(matches!(result, Err(ApiError::Parse(_))));
}

// ============================================================================
// Geocoding
// ============================================================================

#[tokio::test]
async fn test_geocode_search() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "eiffel tower"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "lat": "48.8582599",
                "lon": "2.2945006",
                "display_name": "Eiffel Tower, Avenue Gustave Eiffel, Paris, France",
                "address": { "city": "Paris", "country": "France", "state": "" }
            },
            {
                "lat": "not a number",
                "lon": "2.0",
                "display_name": "Broken, Nowhere"
            }
        ])))
        .mount(&mock_server)
        .await;

    let results = GeocodeClient::new(client(), mock_server.uri())
        .search("eiffel tower")
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert!((hit.lat - 48.8582599).abs() < 1e-9);
    assert!((hit.lng - 2.2945006).abs() < 1e-9);
    assert_eq!(hit.details.name, "Eiffel Tower");
    assert_eq!(hit.details.place_line().as_deref(), Some("Paris, France"));
    assert_eq!(hit.details.state, None);
}

#[tokio::test]
async fn test_geocode_reverse() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "47.5622"))
        .and(query_param("lon", "13.6493"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "",
            "display_name": "Seestraße, Hallstatt, Austria",
            "address": { "road": "Seestraße", "village": "Hallstatt", "country": "Austria" }
        })))
        .mount(&mock_server)
        .await;

    let details = GeocodeClient::new(client(), mock_server.uri())
        .reverse(47.5622, 13.6493)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(details.name, "Seestraße");
    assert_eq!(details.city.as_deref(), Some("Hallstatt"));
    assert_eq!(details.full_address.as_deref(), Some("Seestraße, Hallstatt, Austria"));
}

#[tokio::test]
async fn test_geocode_reverse_unknown_point() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "Unable to geocode" })),
        )
        .mount(&mock_server)
        .await;

    let details = GeocodeClient::new(client(), mock_server.uri())
        .reverse(0.0, -160.0)
        .await
        .unwrap();
    assert_eq!(details, None);
}
