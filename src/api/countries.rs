//! REST Countries client and the country record the explorer page shows.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use super::{ApiError, get_json, trim_base};
use crate::core::format::format_number;

/// The API allows at most ten fields per request.
pub const COUNTRY_FIELDS: &str =
    "name,capital,region,population,languages,currencies,flags,cca3,idd,car";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryName {
    pub common: String,
    #[serde(default)]
    pub official: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    #[serde(default)]
    pub name: String,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default)]
    pub svg: String,
    #[serde(default)]
    pub png: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Idd {
    pub root: Option<String>,
    #[serde(default)]
    pub suffixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub side: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: CountryName,
    #[serde(default)]
    pub cca3: String,
    #[serde(default)]
    pub capital: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    #[serde(default)]
    pub currencies: BTreeMap<String, CurrencyInfo>,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub idd: Idd,
    #[serde(default)]
    pub car: Car,
}

impl Country {
    pub fn capital_display(&self) -> String {
        self.capital.first().cloned().unwrap_or_else(|| "N/A".to_string())
    }

    pub fn region_display(&self) -> String {
        if self.region.is_empty() { "N/A".to_string() } else { self.region.clone() }
    }

    pub fn population_display(&self) -> String {
        if self.population == 0 {
            "N/A".to_string()
        } else {
            format_number(self.population)
        }
    }

    pub fn languages_display(&self) -> String {
        if self.languages.is_empty() {
            "N/A".to_string()
        } else {
            self.languages.values().cloned().collect::<Vec<_>>().join(", ")
        }
    }

    /// First currency as "Name (symbol)".
    pub fn currency_display(&self) -> String {
        match self.currencies.values().next() {
            Some(CurrencyInfo { name, symbol: Some(symbol) }) => format!("{name} ({symbol})"),
            Some(CurrencyInfo { name, symbol: None }) => name.clone(),
            None => "N/A".to_string(),
        }
    }

    /// Root plus the first suffix, e.g. "+33".
    pub fn calling_code(&self) -> String {
        match &self.idd.root {
            Some(root) => format!("{root}{}", self.idd.suffixes.first().map_or("", String::as_str)),
            None => "N/A".to_string(),
        }
    }

    pub fn driving_side(&self) -> &'static str {
        if self.car.side.as_deref() == Some("left") { "Left" } else { "Right" }
    }

    /// Case-insensitive substring match on the common or official name.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.name.common.to_lowercase().contains(query_lower)
            || self.name.official.to_lowercase().contains(query_lower)
    }
}

pub struct CountriesClient {
    client: reqwest::Client,
    base_url: String,
}

impl CountriesClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    pub async fn all(&self) -> Result<Vec<Country>, ApiError> {
        let request = self
            .client
            .get(format!("{}/all", self.base_url))
            .query(&[("fields", COUNTRY_FIELDS)]);
        let countries: Vec<Country> = get_json(request).await?;
        info!("Loaded {} countries", countries.len());
        Ok(countries)
    }
}

/// Used when the API is unreachable.
pub fn fallback_countries() -> Vec<Country> {
    fn entry(
        common: &str,
        official: &str,
        cca3: &str,
        flag: &str,
        capital: &str,
        region: &str,
        population: u64,
    ) -> Country {
        Country {
            name: CountryName {
                common: common.to_string(),
                official: official.to_string(),
            },
            cca3: cca3.to_string(),
            capital: vec![capital.to_string()],
            region: region.to_string(),
            population,
            flags: Flags {
                svg: format!("https://flagcdn.com/{flag}.svg"),
                png: String::new(),
            },
            ..Default::default()
        }
    }

    vec![
        entry(
            "United States",
            "United States of America",
            "USA",
            "us",
            "Washington, D.C.",
            "Americas",
            331_002_651,
        ),
        entry(
            "United Kingdom",
            "United Kingdom of Great Britain and Northern Ireland",
            "GBR",
            "gb",
            "London",
            "Europe",
            67_886_011,
        ),
        entry("Canada", "Canada", "CAN", "ca", "Ottawa", "Americas", 38_005_238),
        entry(
            "Australia",
            "Commonwealth of Australia",
            "AUS",
            "au",
            "Canberra",
            "Oceania",
            25_687_041,
        ),
        entry("Japan", "Japan", "JPN", "jp", "Tokyo", "Asia", 125_836_021),
        entry(
            "Germany",
            "Federal Republic of Germany",
            "DEU",
            "de",
            "Berlin",
            "Europe",
            83_240_525,
        ),
        entry("France", "French Republic", "FRA", "fr", "Paris", "Europe", 67_391_582),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_api_shape() {
        let json = r#"{
            "name": {"common": "France", "official": "French Republic", "nativeName": {}},
            "cca3": "FRA",
            "capital": ["Paris"],
            "region": "Europe",
            "population": 67391582,
            "languages": {"fra": "French"},
            "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
            "flags": {"png": "https://flagcdn.com/w320/fr.png", "svg": "https://flagcdn.com/fr.svg", "alt": "..."},
            "idd": {"root": "+3", "suffixes": ["3"]},
            "car": {"signs": ["F"], "side": "right"}
        }"#;
        let country: Country = serde_json::from_str(json).unwrap();
        assert_eq!(country.capital_display(), "Paris");
        assert_eq!(country.population_display(), "67,391,582");
        assert_eq!(country.languages_display(), "French");
        assert_eq!(country.currency_display(), "Euro (€)");
        assert_eq!(country.calling_code(), "+33");
        assert_eq!(country.driving_side(), "Right");
    }

    #[test]
    fn test_sparse_record_uses_placeholders() {
        let country: Country =
            serde_json::from_str(r#"{"name": {"common": "Antarctica"}}"#).unwrap();
        assert_eq!(country.capital_display(), "N/A");
        assert_eq!(country.region_display(), "N/A");
        assert_eq!(country.population_display(), "N/A");
        assert_eq!(country.currency_display(), "N/A");
        assert_eq!(country.calling_code(), "N/A");
        assert_eq!(country.driving_side(), "Right");
    }

    #[test]
    fn test_matches_common_or_official() {
        let countries = fallback_countries();
        let gb = countries.iter().find(|c| c.cca3 == "GBR").unwrap();
        assert!(gb.matches("kingdom"));
        assert!(gb.matches("northern ireland"));
        assert!(!gb.matches("france"));
    }

    #[test]
    fn test_fallback_has_seven_countries() {
        let countries = fallback_countries();
        assert_eq!(countries.len(), 7);
        assert!(countries.iter().all(|c| c.cca3.len() == 3));
    }
}
