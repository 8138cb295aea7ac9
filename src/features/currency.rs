//! # Currency Converter
//!
//! Converts between currencies through USD-based rates. Rates are fetched
//! on every activation; if the service is down a built-in table is used.
//! Results, quick-convert chips and popular rates all follow the form's
//! current amount and currency pair.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};

use crate::api::ApiError;
use crate::api::rates::{RateTable, RatesClient, fallback_rates};
use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::markup::escape;
use crate::core::toast::ToastKind;

/// Currencies offered in the selectors, as (code, name).
pub const CURRENCIES: &[(&str, &str)] = &[
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("AUD", "Australian Dollar"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CNY", "Chinese Yuan"),
    ("INR", "Indian Rupee"),
    ("MXN", "Mexican Peso"),
    ("BRL", "Brazilian Real"),
    ("ZAR", "South African Rand"),
    ("SGD", "Singapore Dollar"),
    ("HKD", "Hong Kong Dollar"),
    ("SEK", "Swedish Krona"),
    ("NOK", "Norwegian Krone"),
    ("KRW", "South Korean Won"),
    ("TRY", "Turkish Lira"),
    ("RUB", "Russian Ruble"),
    ("THB", "Thai Baht"),
    ("NZD", "New Zealand Dollar"),
    ("PLN", "Polish Zloty"),
    ("DKK", "Danish Krone"),
    ("AED", "UAE Dirham"),
    ("SAR", "Saudi Riyal"),
];

const POPULAR: &[&str] = &["USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "CNY", "INR", "MXN"];
const POPULAR_SHOWN: usize = 6;
const QUICK_AMOUNTS: &[u32] = &[10, 50, 100, 500, 1000];

const DEFAULT_FROM: &str = "USD";
const DEFAULT_TO: &str = "EUR";

/// "just now", "5 minutes ago", "3 hours ago", then a plain date.
pub fn time_ago(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    match seconds {
        0..60 => "just now".to_string(),
        60..3600 => format!("{} minutes ago", seconds / 60),
        3600..86400 => format!("{} hours ago", seconds / 3600),
        _ => then.format("%b %-d, %Y").to_string(),
    }
}

struct RatesLoaded(Result<RateTable, ApiError>);

pub struct CurrencyConverter {
    client: Arc<RatesClient>,
    rates: Option<RateTable>,
    last_updated: Option<DateTime<Utc>>,
}

impl CurrencyConverter {
    pub fn new(client: Arc<RatesClient>) -> Self {
        Self {
            client,
            rates: None,
            last_updated: None,
        }
    }

    pub fn rates(&self) -> Option<&RateTable> {
        self.rates.as_ref()
    }

    fn populate_selects(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let options: String = CURRENCIES
            .iter()
            .map(|(code, name)| format!(r#"<option value="{code}">{code} - {name}</option>"#))
            .collect();
        ctx.set_html("currencyFrom", &options)?;
        ctx.set_html("currencyTo", &options)?;
        ctx.set_value("currencyFrom", DEFAULT_FROM)?;
        ctx.set_value("currencyTo", DEFAULT_TO)
    }

    fn on_rates(
        &mut self,
        result: Result<RateTable, ApiError>,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match result {
            Ok(table) => {
                debug!("Loaded {} exchange rates", table.rates.len());
                self.last_updated = table
                    .time_last_updated
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                    .or_else(|| Some(Utc::now()));
                self.rates = Some(table);
                ctx.toast("Exchange rates updated!", ToastKind::Success);
            }
            Err(e) => {
                warn!("Exchange rates unavailable: {e}");
                ctx.toast("Using cached exchange rates", ToastKind::Warning);
                self.rates = Some(fallback_rates());
                self.last_updated = Some(Utc::now());
            }
        }
        self.convert(ctx)
    }

    /// Recompute every output from the form's current values.
    fn convert(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let amount: f64 = ctx.value("amountFrom")?.trim().parse().unwrap_or(0.0);
        let from = ctx.value("currencyFrom")?;
        let to = ctx.value("currencyTo")?;

        if amount.is_nan() || amount <= 0.0 {
            return ctx.set_text("amountTo", "0.00");
        }
        let Some(rates) = &self.rates else {
            debug!("Rates not available yet");
            return Ok(());
        };
        let missing = [&from, &to].into_iter().find(|code| rates.rate(code).is_none());
        if let Some(code) = missing {
            ctx.toast(format!("Exchange rate for {code} is not available"), ToastKind::Warning);
            return Ok(());
        }
        let (Some(result), Some(rate)) = (
            rates.convert(amount, &from, &to),
            rates.cross_rate(&from, &to),
        ) else {
            return Ok(());
        };

        ctx.set_text("amountTo", &format!("{result:.2}"))?;
        ctx.set_text("exchangeRate", &format!("1 {from} = {rate:.4} {to}"))?;
        if let Some(updated) = self.last_updated {
            let ago = time_ago(Utc::now(), updated);
            ctx.set_text("exchangeDate", &format!("Last updated: {ago}"))?;
        }

        let chips: String = QUICK_AMOUNTS
            .iter()
            .filter_map(|quick| {
                let converted = rates.convert(f64::from(*quick), &from, &to)?;
                Some(format!(
                    r#"<button class="quick-convert-chip" data-action="set-amount" data-id="{quick}">{quick} {from} = {converted:.2} {to}</button>"#,
                    from = escape(&from),
                    to = escape(&to),
                ))
            })
            .collect();
        ctx.set_html("currencyChips", &chips)?;

        let popular: String = POPULAR
            .iter()
            .filter(|code| **code != from)
            .take(POPULAR_SHOWN)
            .filter_map(|code| {
                let rate = rates.cross_rate(&from, code)?;
                Some(format!(
                    r#"<div class="rate-item"><span class="rate-currency">{code}</span> <span class="rate-value">{rate:.4}</span></div>"#
                ))
            })
            .collect();
        ctx.set_html("exchangeRates", &popular)
    }

    fn swap(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let from = ctx.value("currencyFrom")?;
        let to = ctx.value("currencyTo")?;
        ctx.set_value("currencyFrom", &to)?;
        ctx.set_value("currencyTo", &from)?;
        self.convert(ctx)
    }
}

impl Controller for CurrencyConverter {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.populate_selects(ctx)?;
        if self.rates.is_some() {
            self.convert(ctx)?;
        }
        ctx.toast("Fetching exchange rates...", ToastKind::Info);
        let client = Arc::clone(&self.client);
        ctx.spawn(async move { RatesLoaded(client.latest_usd().await) });
        Ok(())
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match event {
            PageEvent::Task(output) => match output.downcast::<RatesLoaded>() {
                Ok(loaded) => self.on_rates(loaded.0, ctx),
                Err(_) => Ok(()),
            },
            PageEvent::Submit { form, data } if form == "currencyForm" => {
                ctx.set_value("amountFrom", data.get("amount"))?;
                if !data.get("from").is_empty() {
                    ctx.set_value("currencyFrom", data.get("from"))?;
                }
                if !data.get("to").is_empty() {
                    ctx.set_value("currencyTo", data.get("to"))?;
                }
                self.convert(ctx)
            }
            PageEvent::Action { name, value } => match name.as_str() {
                "swap" => self.swap(ctx),
                "set-amount" => {
                    ctx.set_value("amountFrom", value.as_deref().unwrap_or_default())?;
                    self.convert(ctx)
                }
                _ => Ok(()),
            },
            PageEvent::Submit { .. } => Ok(()),
        }
    }
}
