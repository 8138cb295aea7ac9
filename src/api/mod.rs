//! # Feature APIs
//!
//! Thin reqwest clients for the public services the feature pages use.
//! Each client takes its base URL at construction so tests can point it at
//! a mock server.
//!
//! - [`countries`]: REST Countries
//! - [`rates`]: exchange rates against USD
//! - [`geocode`]: Nominatim search and reverse geocoding

pub mod countries;
pub mod geocode;
pub mod rates;

use std::fmt;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;

const USER_AGENT: &str = concat!("globemate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub enum ApiError {
    Network(String),
    Status { status: u16, message: String },
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Status { status, message } => write!(f, "API error {status}: {message}"),
            ApiError::Parse(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Shared HTTP client with a request timeout and a user agent (Nominatim
/// rejects anonymous clients).
pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client ({e}), using defaults");
            reqwest::Client::new()
        })
}

/// Send `request` and decode a JSON body, mapping failures to `ApiError`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    debug!("{} -> {}", response.url(), response.status());

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ApiError::Status { status, message });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

pub(crate) fn trim_base(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
