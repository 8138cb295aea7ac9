//! # Country Explorer
//!
//! Search the REST Countries catalogue, show one country's facts, and give
//! a rough visa answer for a passport/destination pair.
//!
//! The catalogue is fetched once per process and kept across activations.
//! If the service fails, a small built-in list is used instead.

use std::sync::Arc;

use log::{debug, warn};

use crate::api::ApiError;
use crate::api::countries::{CountriesClient, Country, fallback_countries};
use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::markup::escape;
use crate::core::toast::ToastKind;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_SUGGESTIONS: usize = 8;

const STRONG_PASSPORTS: &[&str] = &["USA", "GBR", "CAN", "AUS", "DEU", "FRA", "JPN", "ITA", "ESP"];
const EASY_DESTINATIONS: &[&str] = &[
    "USA", "GBR", "CAN", "AUS", "DEU", "FRA", "JPN", "ITA", "ESP", "NLD", "BEL", "CHE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisaStatus {
    Free,
    Required,
}

impl VisaStatus {
    fn class(self) -> &'static str {
        match self {
            VisaStatus::Free => "visa-free",
            VisaStatus::Required => "visa-required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisaRequirement {
    pub status: VisaStatus,
    pub title: &'static str,
    pub message: &'static str,
}

/// Simplified lookup keyed on ISO alpha-3 codes.
pub fn visa_requirement(passport: &str, destination: &str) -> VisaRequirement {
    if passport == destination {
        return VisaRequirement {
            status: VisaStatus::Free,
            title: "No Visa Required",
            message: "You are a citizen of this country.",
        };
    }
    if STRONG_PASSPORTS.contains(&passport) && EASY_DESTINATIONS.contains(&destination) {
        return VisaRequirement {
            status: VisaStatus::Free,
            title: "Visa-Free Entry",
            message: "You can enter without a visa for tourism (typically 90 days).",
        };
    }
    VisaRequirement {
        status: VisaStatus::Required,
        title: "Visa Required",
        message: "You need to apply for a visa before traveling. \
                  Check with the embassy for requirements.",
    }
}

/// Up to [`MAX_SUGGESTIONS`] countries whose names contain `query`.
pub fn search<'a>(countries: &'a [Country], query: &str) -> Vec<&'a Country> {
    let query = query.to_lowercase();
    countries
        .iter()
        .filter(|c| c.matches(&query))
        .take(MAX_SUGGESTIONS)
        .collect()
}

struct CountriesLoaded(Result<Vec<Country>, ApiError>);

pub struct CountryExplorer {
    client: Arc<CountriesClient>,
    countries: Vec<Country>,
    current: Option<String>,
    loading: bool,
}

impl CountryExplorer {
    pub fn new(client: Arc<CountriesClient>) -> Self {
        Self {
            client,
            countries: Vec::new(),
            current: None,
            loading: false,
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn current_country(&self) -> Option<&Country> {
        let code = self.current.as_deref()?;
        self.countries.iter().find(|c| c.cca3 == code)
    }

    fn load_countries(&mut self, ctx: &mut PageContext<'_>) {
        if self.loading {
            return;
        }
        self.loading = true;
        ctx.toast("Loading countries data...", ToastKind::Info);
        let client = Arc::clone(&self.client);
        ctx.spawn(async move { CountriesLoaded(client.all().await) });
    }

    fn on_loaded(
        &mut self,
        result: Result<Vec<Country>, ApiError>,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        self.loading = false;
        match result {
            Ok(countries) => {
                self.countries = countries;
                ctx.toast("Countries loaded successfully!", ToastKind::Success);
            }
            Err(e) => {
                warn!("Country catalogue unavailable: {e}");
                ctx.toast("Failed to load countries. Using cached data.", ToastKind::Error);
                self.countries = fallback_countries();
            }
        }
        self.populate_passports(ctx)
    }

    fn populate_passports(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.countries.is_empty() {
            return Ok(());
        }
        let mut sorted: Vec<&Country> = self.countries.iter().collect();
        sorted.sort_by(|a, b| a.name.common.cmp(&b.name.common));

        let mut options = String::from(r#"<option value="">Select your passport country</option>"#);
        for country in sorted {
            options.push_str(&format!(
                r#"<option value="{}">{}</option>"#,
                escape(&country.cca3),
                escape(&country.name.common)
            ));
        }
        ctx.set_html("passportCountry", &options)
    }

    fn show_suggestions(
        &self,
        query: &str,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return ctx.set_hidden("countrySuggestions", true);
        }
        let markup = if self.countries.is_empty() {
            r#"<div class="suggestion-item"><span>Loading countries, please wait...</span></div>"#
                .to_string()
        } else {
            let matches = search(&self.countries, query);
            debug!("{} matches for {query:?}", matches.len());
            if matches.is_empty() {
                format!(
                    r#"<div class="suggestion-item"><span>No countries found for "{}"</span></div>"#,
                    escape(query)
                )
            } else {
                matches
                    .iter()
                    .map(|country| {
                        format!(
                            r#"<div class="suggestion-item" data-action="select-country" data-id="{}"><strong>{}</strong> <small>{}</small></div>"#,
                            escape(&country.cca3),
                            escape(&country.name.common),
                            escape(&country.name.official)
                        )
                    })
                    .collect()
            }
        };
        ctx.set_html("countrySuggestions", &markup)?;
        ctx.set_hidden("countrySuggestions", false)
    }

    fn select_country(
        &mut self,
        code: &str,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let Some(country) = self.countries.iter().find(|c| c.cca3 == code) else {
            warn!("Country not found: {code}");
            return Ok(());
        };
        ctx.set_text("countryName", &country.name.common)?;
        ctx.set_text("countryOfficialName", &country.name.official)?;
        ctx.set_text("countryCapital", &country.capital_display())?;
        ctx.set_text("countryRegion", &country.region_display())?;
        ctx.set_text("countryPopulation", &country.population_display())?;
        ctx.set_text("countryLanguages", &country.languages_display())?;
        ctx.set_text("countryCurrency", &country.currency_display())?;
        ctx.set_text("countryCallingCode", &country.calling_code())?;
        ctx.set_text("countryDriving", country.driving_side())?;
        ctx.set_hidden("countryResult", false)?;
        ctx.set_hidden("countrySuggestions", true)?;
        ctx.set_value("countrySearch", &country.name.common)?;
        ctx.set_html("visaResult", "")?;
        ctx.set_hidden("visaResult", true)?;
        self.current = Some(country.cca3.clone());
        Ok(())
    }

    fn check_visa(&self, passport: &str, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if passport.is_empty() {
            ctx.toast("Please select your passport country", ToastKind::Warning);
            return Ok(());
        }
        let Some(destination) = self.current_country() else {
            ctx.toast("Please select a destination country first", ToastKind::Warning);
            return Ok(());
        };
        let visa = visa_requirement(passport, &destination.cca3);
        ctx.set_html(
            "visaResult",
            &format!(
                r#"<div class="visa-status {}"><h4>{}</h4><p>{}</p></div>"#,
                visa.status.class(),
                visa.title,
                visa.message
            ),
        )?;
        ctx.set_hidden("visaResult", false)
    }
}

impl Controller for CountryExplorer {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.countries.is_empty() {
            self.load_countries(ctx);
            Ok(())
        } else {
            self.populate_passports(ctx)
        }
    }

    fn cleanup(&mut self) {
        self.current = None;
        // An in-flight load belongs to the old activation and is dropped.
        self.loading = false;
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match event {
            PageEvent::Task(output) => match output.downcast::<CountriesLoaded>() {
                Ok(loaded) => self.on_loaded(loaded.0, ctx),
                Err(_) => Ok(()),
            },
            PageEvent::Submit { form, data } => match form.as_str() {
                "countrySearchForm" => self.show_suggestions(data.get("query"), ctx),
                "visaForm" => self.check_visa(data.get("passport"), ctx),
                _ => Ok(()),
            },
            PageEvent::Action { name, value } if name == "select-country" => {
                self.select_country(value.as_deref().unwrap_or_default(), ctx)
            }
            PageEvent::Action { .. } => Ok(()),
        }
    }
}
