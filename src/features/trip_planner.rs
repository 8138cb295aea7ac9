//! # Trip Planner
//!
//! Trips with nested activities, persisted under the `trips` key.
//!
//! | Trigger                    | Effect                                   |
//! |----------------------------|------------------------------------------|
//! | submit `tripForm`          | add a trip                               |
//! | submit `activityForm`      | add an activity to the selected trip     |
//! | `view-trip` / id           | select a trip, show its itinerary        |
//! | `delete-trip` / id         | remove a trip                            |
//! | `delete-activity` / id     | remove an activity from the selected trip|

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::format::{format_amount, format_date};
use crate::core::markup::{FormData, escape};
use crate::core::storage::LocalStore;
use crate::core::toast::ToastKind;

pub const STORAGE_KEY: &str = "trips";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub created_at: String,
}

pub struct TripPlanner {
    store: LocalStore,
    trips: Vec<Trip>,
    current_trip: Option<String>,
}

impl TripPlanner {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            trips: Vec::new(),
            current_trip: None,
        }
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn selected_trip(&self) -> Option<&Trip> {
        let id = self.current_trip.as_deref()?;
        self.trips.iter().find(|t| t.id == id)
    }

    fn persist(&self) -> Result<(), ControllerError> {
        self.store.save(STORAGE_KEY, &self.trips)?;
        Ok(())
    }

    // ── Mutations ──────────────────────────────────────────────────────

    fn save_trip(
        &mut self,
        data: &FormData,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        if !data.missing(&["destination", "startDate", "endDate"]).is_empty() {
            ctx.toast("Please enter a destination and travel dates", ToastKind::Warning);
            return Ok(());
        }
        let trip = Trip {
            id: uuid::Uuid::new_v4().to_string(),
            destination: data.get("destination").to_string(),
            start_date: data.get("startDate").to_string(),
            end_date: data.get("endDate").to_string(),
            budget: data.number("budget"),
            activities: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
        };
        debug!("Adding trip to {}", trip.destination);
        ctx.toast(format!("Trip to {} saved!", trip.destination), ToastKind::Success);
        self.trips.push(trip);
        self.persist()?;
        ctx.reset_form("tripForm")?;
        self.render_trips(ctx)
    }

    fn add_activity(
        &mut self,
        data: &FormData,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let Some(current) = self.current_trip.clone() else {
            ctx.toast("Select a trip before adding activities", ToastKind::Warning);
            return Ok(());
        };
        if !data.missing(&["title", "date"]).is_empty() {
            ctx.toast("Please enter an activity and a date", ToastKind::Warning);
            return Ok(());
        }
        let Some(trip) = self.trips.iter_mut().find(|t| t.id == current) else {
            return Ok(());
        };
        trip.activities.push(Activity {
            id: uuid::Uuid::new_v4().to_string(),
            title: data.get("title").to_string(),
            date: data.get("date").to_string(),
            time: data.get("time").to_string(),
            location: data.get("location").to_string(),
            notes: data.get("notes").to_string(),
        });
        self.persist()?;
        ctx.reset_form("activityForm")?;
        self.render_activities(ctx)?;
        self.render_trips(ctx)
    }

    fn view_trip(&mut self, id: &str, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if !self.trips.iter().any(|t| t.id == id) {
            return Ok(());
        }
        self.current_trip = Some(id.to_string());
        self.render_activities(ctx)
    }

    fn delete_trip(&mut self, id: &str, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let before = self.trips.len();
        self.trips.retain(|t| t.id != id);
        if self.trips.len() == before {
            return Ok(());
        }
        if self.current_trip.as_deref() == Some(id) {
            self.current_trip = None;
        }
        self.persist()?;
        ctx.toast("Trip deleted", ToastKind::Warning);
        self.render_trips(ctx)?;
        self.render_activities(ctx)
    }

    fn delete_activity(
        &mut self,
        id: &str,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let Some(current) = self.current_trip.clone() else {
            return Ok(());
        };
        if let Some(trip) = self.trips.iter_mut().find(|t| t.id == current) {
            trip.activities.retain(|a| a.id != id);
            self.persist()?;
            self.render_activities(ctx)?;
            self.render_trips(ctx)?;
        }
        Ok(())
    }

    // ── Rendering ──────────────────────────────────────────────────────

    fn render_trips(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.trips.is_empty() {
            return ctx.set_html(
                "savedTrips",
                r#"<div class="empty-state"><p>No trips planned yet. Create your first trip above!</p></div>"#,
            );
        }
        let cards: String = self.trips.iter().map(trip_card).collect();
        ctx.set_html("savedTrips", &cards)
    }

    fn render_activities(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let Some(trip) = self.selected_trip() else {
            ctx.set_text("selectedTrip", "Select a trip to view its itinerary.")?;
            return ctx.set_html("itineraryList", "");
        };
        ctx.set_text(
            "selectedTrip",
            &format!(
                "{}: {} to {}",
                trip.destination,
                format_date(&trip.start_date),
                format_date(&trip.end_date)
            ),
        )?;
        if trip.activities.is_empty() {
            return ctx.set_html(
                "itineraryList",
                r#"<div class="empty-state"><p>No activities planned yet</p></div>"#,
            );
        }
        let items: String = trip.activities.iter().map(activity_item).collect();
        ctx.set_html("itineraryList", &items)
    }
}

fn trip_card(trip: &Trip) -> String {
    let budget = trip
        .budget
        .map(|b| format!("<p>Budget: ${}</p>", format_amount(b)))
        .unwrap_or_default();
    format!(
        r#"<div class="trip-card">
  <h4>{destination}</h4>
  <p>{start} to {end}</p>
  {budget}
  <p>{count} activities</p>
  <button class="btn btn-secondary btn-sm" data-action="view-trip" data-id="{id}">View Details</button>
  <button class="btn-icon" data-action="delete-trip" data-id="{id}">Delete</button>
</div>"#,
        destination = escape(&trip.destination),
        start = format_date(&trip.start_date),
        end = format_date(&trip.end_date),
        count = trip.activities.len(),
        id = trip.id,
    )
}

fn activity_item(activity: &Activity) -> String {
    let notes = if activity.notes.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="activity-notes">{}</p>"#, escape(&activity.notes))
    };
    let location = if activity.location.is_empty() {
        String::new()
    } else {
        format!("<p>@ {}</p>", escape(&activity.location))
    };
    format!(
        r#"<div class="activity-item">
  <p class="activity-time">{date} {time}</p>
  <h4>{title}</h4>
  {location}
  {notes}
  <button class="btn-icon" data-action="delete-activity" data-id="{id}">Remove</button>
</div>"#,
        date = format_date(&activity.date),
        time = escape(&activity.time),
        title = escape(&activity.title),
        id = activity.id,
    )
}

impl Controller for TripPlanner {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.trips = self.store.load(STORAGE_KEY).unwrap_or_default();
        self.render_trips(ctx)?;
        self.render_activities(ctx)
    }

    fn cleanup(&mut self) {
        self.current_trip = None;
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match event {
            PageEvent::Submit { form, data } => match form.as_str() {
                "tripForm" => self.save_trip(&data, ctx),
                "activityForm" => self.add_activity(&data, ctx),
                _ => Ok(()),
            },
            PageEvent::Action { name, value } => {
                let id = value.unwrap_or_default();
                match name.as_str() {
                    "view-trip" => self.view_trip(&id, ctx),
                    "delete-trip" => self.delete_trip(&id, ctx),
                    "delete-activity" => self.delete_activity(&id, ctx),
                    _ => Ok(()),
                }
            }
            PageEvent::Task(_) => Ok(()),
        }
    }
}
