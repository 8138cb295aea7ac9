//! # Safety Center
//!
//! Mock safety report for a named country: a score, a level band,
//! emergency numbers and general travel tips. Scores are random; the
//! generator is injectable so tests can seed it.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::markup::escape;
use crate::core::toast::ToastKind;

const EMERGENCY_NUMBERS: &[&str] = &["112", "911", "999", "100", "101", "102", "108"];

pub const SAFETY_TIPS: &[&str] = &[
    "Keep copies of important documents in a secure location",
    "Register with your embassy upon arrival",
    "Avoid displaying expensive jewelry or electronics",
    "Be aware of your surroundings, especially in crowded areas",
    "Use official taxis or ride-sharing services",
    "Keep emergency numbers saved in your phone",
    "Inform someone of your travel itinerary",
    "Purchase comprehensive travel insurance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyLevel {
    VerySafe,
    Safe,
    Moderate,
    ExerciseCaution,
}

impl SafetyLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => SafetyLevel::VerySafe,
            70..=79 => SafetyLevel::Safe,
            60..=69 => SafetyLevel::Moderate,
            _ => SafetyLevel::ExerciseCaution,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            SafetyLevel::VerySafe => "Very Safe",
            SafetyLevel::Safe => "Safe",
            SafetyLevel::Moderate => "Moderate",
            SafetyLevel::ExerciseCaution => "Exercise Caution",
        }
    }

    fn class(self) -> &'static str {
        match self {
            SafetyLevel::VerySafe => "level-very-safe",
            SafetyLevel::Safe => "level-safe",
            SafetyLevel::Moderate => "level-moderate",
            SafetyLevel::ExerciseCaution => "level-caution",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyNumbers {
    pub ambulance: &'static str,
    pub fire: &'static str,
    pub police: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyReport {
    pub country: String,
    pub score: u8,
    pub level: SafetyLevel,
    pub emergency: EmergencyNumbers,
    pub tips: &'static [&'static str],
}

pub struct SafetyCenter {
    rng: Box<dyn RngCore + Send>,
}

impl Default for SafetyCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyCenter {
    pub fn new() -> Self {
        Self::with_rng(Box::new(StdRng::from_entropy()))
    }

    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        Self { rng }
    }

    pub fn report(&mut self, country: &str) -> SafetyReport {
        let score: u8 = self.rng.gen_range(60..100);
        SafetyReport {
            country: country.to_string(),
            score,
            level: SafetyLevel::from_score(score),
            emergency: EmergencyNumbers {
                ambulance: self.emergency_number(),
                fire: self.emergency_number(),
                police: self.emergency_number(),
            },
            tips: SAFETY_TIPS,
        }
    }

    fn emergency_number(&mut self) -> &'static str {
        EMERGENCY_NUMBERS.choose(&mut self.rng).copied().unwrap_or("112")
    }

    fn show(
        &self,
        report: &SafetyReport,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        ctx.set_text("safetyCountry", &report.country)?;
        ctx.set_text("safetyScore", &report.score.to_string())?;

        let gauge = ctx.element("safetyGauge")?;
        ctx.doc.set_attr(gauge, "value", &report.score.to_string());

        ctx.set_text("safetyLevel", report.level.text())?;
        let level = ctx.element("safetyLevel")?;
        ctx.doc.set_attr(level, "class", report.level.class());

        ctx.set_text("emergencyAmbulance", report.emergency.ambulance)?;
        ctx.set_text("emergencyFire", report.emergency.fire)?;
        ctx.set_text("emergencyPolice", report.emergency.police)?;

        let tips: String = report
            .tips
            .iter()
            .map(|tip| format!("<li>{}</li>", escape(tip)))
            .collect();
        ctx.set_html("safetyTips", &tips)?;
        ctx.set_hidden("safetyResult", false)
    }
}

impl Controller for SafetyCenter {
    fn init(&mut self, _ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        Ok(())
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let PageEvent::Submit { form, data } = event else {
            return Ok(());
        };
        if form != "safetyForm" {
            return Ok(());
        }
        let country = data.get("country");
        if country.is_empty() {
            ctx.toast("Please enter a country name", ToastKind::Warning);
            return Ok(());
        }
        let report = self.report(country);
        self.show(&report, ctx)
    }
}
