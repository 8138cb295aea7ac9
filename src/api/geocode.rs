//! Nominatim search and reverse geocoding.

use serde::{Deserialize, Serialize};

use super::{ApiError, get_json, trim_base};

pub const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Address {
    fn city(&self) -> Option<String> {
        self.city
            .clone()
            .or_else(|| self.town.clone())
            .or_else(|| self.village.clone())
            .or_else(|| self.municipality.clone())
            .or_else(|| self.county.clone())
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    name: Option<String>,
    display_name: Option<String>,
    address: Option<Address>,
}

/// What the map knows about a point beyond its coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDetails {
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub full_address: Option<String>,
}

impl LocationDetails {
    /// "City, Country", falling back to whichever half exists.
    pub fn place_line(&self) -> Option<String> {
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub lat: f64,
    pub lng: f64,
    pub details: LocationDetails,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let limit = SEARCH_LIMIT.to_string();
        let request = self.client.get(format!("{}/search", self.base_url)).query(&[
            ("format", "json"),
            ("q", query),
            ("limit", limit.as_str()),
            ("addressdetails", "1"),
        ]);
        let hits: Vec<SearchHit> = get_json(request).await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let lat = hit.lat.parse().ok()?;
                let lng = hit.lon.parse().ok()?;
                let name = hit
                    .display_name
                    .split(',')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Some(SearchResult {
                    lat,
                    lng,
                    details: LocationDetails {
                        name,
                        city: non_empty(hit.address.city),
                        country: non_empty(hit.address.country),
                        state: non_empty(hit.address.state),
                        full_address: Some(hit.display_name),
                    },
                })
            })
            .take(SEARCH_LIMIT)
            .collect())
    }

    /// `None` when the service knows nothing about the point.
    pub async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<LocationDetails>, ApiError> {
        let (lat, lng) = (lat.to_string(), lng.to_string());
        let request = self.client.get(format!("{}/reverse", self.base_url)).query(&[
            ("format", "json"),
            ("lat", lat.as_str()),
            ("lon", lng.as_str()),
            ("zoom", "18"),
            ("addressdetails", "1"),
        ]);
        let hit: ReverseHit = get_json(request).await?;
        let Some(address) = hit.address else {
            return Ok(None);
        };
        let name = non_empty(hit.name)
            .or_else(|| address.road.clone())
            .or_else(|| address.suburb.clone())
            .or_else(|| address.neighbourhood.clone())
            .unwrap_or_else(|| "Location".to_string());
        Ok(Some(LocationDetails {
            name,
            city: non_empty(address.city()),
            country: non_empty(address.country),
            state: non_empty(address.state),
            full_address: hit.display_name,
        }))
    }
}
