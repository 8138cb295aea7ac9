//! # Feature Pages
//!
//! One controller per interactive page. `home` has none and renders as
//! static markup.
//!
//! | Page           | Controller                                  | Storage keys             |
//! |----------------|---------------------------------------------|--------------------------|
//! | `trip-planner` | [`trip_planner::TripPlanner`]               | `trips`                  |
//! | `country-info` | [`country_info::CountryExplorer`]           |                          |
//! | `safety`       | [`safety::SafetyCenter`]                    |                          |
//! | `packing`      | [`packing::PackingList`]                    | `packingList`            |
//! | `currency`     | [`currency::CurrencyConverter`]             |                          |
//! | `documents`    | [`documents::DocumentStore`]                | `documents`, `reminders` |
//! | `maps`         | [`maps::MapExplorer`]                       | `savedPlaces`            |

pub mod country_info;
pub mod currency;
pub mod documents;
pub mod maps;
pub mod packing;
pub mod safety;
pub mod trip_planner;

use std::sync::Arc;

use crate::api::build_client;
use crate::api::countries::CountriesClient;
use crate::api::geocode::GeocodeClient;
use crate::api::rates::RatesClient;
use crate::core::config::ResolvedConfig;
use crate::core::router::Router;
use crate::core::storage::LocalStore;

/// Everything the controllers need from the outside world.
#[derive(Clone)]
pub struct FeatureDeps {
    pub store: LocalStore,
    pub countries: Arc<CountriesClient>,
    pub rates: Arc<RatesClient>,
    pub geocode: Arc<GeocodeClient>,
}

impl FeatureDeps {
    /// Build the API clients from resolved configuration.
    pub fn from_config(config: &ResolvedConfig, store: LocalStore) -> Self {
        let client = build_client(config.timeout);
        Self {
            store,
            countries: Arc::new(CountriesClient::new(client.clone(), &config.countries_url)),
            rates: Arc::new(RatesClient::new(client.clone(), &config.rates_url)),
            geocode: Arc::new(GeocodeClient::new(client, &config.geocode_url)),
        }
    }
}

/// Register every feature controller under its page id.
pub fn register_all(router: &mut Router, deps: &FeatureDeps) {
    router.register_module(
        "trip-planner",
        Box::new(trip_planner::TripPlanner::new(deps.store.clone())),
    );
    router.register_module(
        "country-info",
        Box::new(country_info::CountryExplorer::new(Arc::clone(&deps.countries))),
    );
    router.register_module("safety", Box::new(safety::SafetyCenter::new()));
    router.register_module(
        "packing",
        Box::new(packing::PackingList::new(deps.store.clone())),
    );
    router.register_module(
        "currency",
        Box::new(currency::CurrencyConverter::new(Arc::clone(&deps.rates))),
    );
    router.register_module(
        "documents",
        Box::new(documents::DocumentStore::new(deps.store.clone())),
    );
    router.register_module(
        "maps",
        Box::new(maps::MapExplorer::new(
            deps.store.clone(),
            Arc::clone(&deps.geocode),
        )),
    );
}
