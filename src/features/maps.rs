//! # Map Explorer
//!
//! An interactive map with search, dropped pins and saved places.
//!
//! The controller owns a [`MapView`] while the page is active and mirrors
//! it into the `#map` element: `data-lat`, `data-lng` and `data-zoom` on
//! the element, one `span.marker` child per marker. The terminal host
//! draws the canvas from those attributes and reports clicks back as a
//! `drop-pin` action carrying `"lat,lng"`.
//!
//! Saved places persist under the `savedPlaces` key.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::api::geocode::{GeocodeClient, LocationDetails, SearchResult};
use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::markup::{FormData, escape};
use crate::core::storage::LocalStore;
use crate::core::toast::ToastKind;

pub const STORAGE_KEY: &str = "savedPlaces";
pub const MAP_ELEMENT_ID: &str = "map";

pub const DEFAULT_CENTER: (f64, f64) = (20.0, 0.0);
pub const DEFAULT_ZOOM: u8 = 2;
pub const FOCUS_ZOOM: u8 = 13;

/// Two places closer than this in both axes are the same place.
const SAME_PLACE_EPSILON: f64 = 0.0001;

const DROPPED_PIN: &str = "Dropped Pin";

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub details: Option<LocationDetails>,
    /// Waiting on reverse geocoding.
    pub pending: bool,
}

impl Marker {
    /// "City, Country" when known, else the marker name.
    pub fn display_name(&self) -> String {
        match &self.details {
            Some(details) => {
                let country = details.country.clone().unwrap_or_else(|| self.name.clone());
                match &details.city {
                    Some(city) => format!("{city}, {country}"),
                    None => country,
                }
            }
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            markers: Vec::new(),
        }
    }
}

impl MapView {
    pub fn set_view(&mut self, lat: f64, lng: f64, zoom: u8) {
        self.center = (lat, lng);
        self.zoom = zoom;
    }

    pub fn add_marker(&mut self, marker: Marker) -> usize {
        self.markers.push(marker);
        self.markers.len() - 1
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    #[serde(default)]
    pub location_details: Option<LocationDetails>,
}

impl SavedPlace {
    fn is_near(&self, lat: f64, lng: f64) -> bool {
        (self.lat - lat).abs() < SAME_PLACE_EPSILON && (self.lng - lng).abs() < SAME_PLACE_EPSILON
    }
}

/// Parse a `"lat,lng"` pair, rejecting out-of-range coordinates.
pub fn parse_coordinates(value: &str) -> Option<(f64, f64)> {
    let (lat, lng) = value.split_once(',')?;
    valid_coordinates(lat.trim().parse().ok()?, lng.trim().parse().ok()?)
}

fn valid_coordinates(lat: f64, lng: f64) -> Option<(f64, f64)> {
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some((lat, lng))
}

enum MapTask {
    Search(Result<Vec<SearchResult>, ApiError>),
    Reverse {
        lat: f64,
        lng: f64,
        details: Option<LocationDetails>,
    },
}

pub struct MapExplorer {
    store: LocalStore,
    client: Arc<GeocodeClient>,
    view: Option<MapView>,
    results: Vec<SearchResult>,
    saved: Vec<SavedPlace>,
}

impl MapExplorer {
    pub fn new(store: LocalStore, client: Arc<GeocodeClient>) -> Self {
        Self {
            store,
            client,
            view: None,
            results: Vec::new(),
            saved: Vec::new(),
        }
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn saved_places(&self) -> &[SavedPlace] {
        &self.saved
    }

    fn view_mut(&mut self) -> Result<&mut MapView, ControllerError> {
        self.view
            .as_mut()
            .ok_or_else(|| ControllerError::Invalid("map is not initialized".to_string()))
    }

    // ── Search ─────────────────────────────────────────────────────────

    fn search(&mut self, data: &FormData, ctx: &mut PageContext<'_>) {
        let query = data.get("query").to_string();
        if query.is_empty() {
            return;
        }
        debug!("Map search for {query:?}");
        let client = Arc::clone(&self.client);
        ctx.spawn(async move { MapTask::Search(client.search(&query).await) });
    }

    fn on_search(
        &mut self,
        result: Result<Vec<SearchResult>, ApiError>,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match result {
            Ok(results) => {
                self.results = results;
                self.render_results(ctx)
            }
            Err(e) => {
                warn!("Map search failed: {e}");
                ctx.toast("Search failed. Please try again.", ToastKind::Error);
                Ok(())
            }
        }
    }

    fn render_results(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.results.is_empty() {
            return ctx.set_html(
                "mapSearchResults",
                r#"<p class="text-muted">No results found</p>"#,
            );
        }
        let items: String = self
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let place = r
                    .details
                    .place_line()
                    .map(|line| format!(" <small>{}</small>", escape(&line)))
                    .unwrap_or_default();
                format!(
                    r#"<div class="map-result-item" data-action="goto-result" data-id="{i}"><strong>{}</strong>{place}</div>"#,
                    escape(&r.details.name)
                )
            })
            .collect();
        ctx.set_html("mapSearchResults", &items)
    }

    // ── Markers ────────────────────────────────────────────────────────

    fn go_to(
        &mut self,
        lat: f64,
        lng: f64,
        name: String,
        details: Option<LocationDetails>,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let view = self.view_mut()?;
        view.set_view(lat, lng, FOCUS_ZOOM);
        view.add_marker(Marker {
            lat,
            lng,
            name,
            details,
            pending: false,
        });
        self.results.clear();
        ctx.set_html("mapSearchResults", "")?;
        self.sync(ctx)
    }

    fn drop_pin(
        &mut self,
        lat: f64,
        lng: f64,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        self.view_mut()?.add_marker(Marker {
            lat,
            lng,
            name: "Getting location...".to_string(),
            details: None,
            pending: true,
        });
        let client = Arc::clone(&self.client);
        ctx.spawn(async move {
            let details = match client.reverse(lat, lng).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("Reverse geocoding failed: {e}");
                    None
                }
            };
            MapTask::Reverse { lat, lng, details }
        });
        self.sync(ctx)
    }

    fn on_reverse(
        &mut self,
        lat: f64,
        lng: f64,
        details: Option<LocationDetails>,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let Some(view) = self.view.as_mut() else {
            return Ok(());
        };
        // Markers cleared in the meantime stay cleared.
        let Some(marker) = view
            .markers
            .iter_mut()
            .find(|m| m.pending && m.lat == lat && m.lng == lng)
        else {
            return Ok(());
        };
        marker.name = details
            .as_ref()
            .map(|d| d.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DROPPED_PIN.to_string());
        marker.details = details;
        marker.pending = false;
        self.sync(ctx)
    }

    fn clear_markers(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.view_mut()?.clear();
        self.results.clear();
        ctx.set_html("mapSearchResults", "")?;
        ctx.toast("All markers cleared", ToastKind::Success);
        self.sync(ctx)
    }

    // ── Saved places ───────────────────────────────────────────────────

    fn save_marker(
        &mut self,
        index: usize,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let Some(marker) = self.view.as_ref().and_then(|v| v.markers.get(index)).cloned() else {
            return Ok(());
        };
        if marker.pending {
            return Ok(());
        }
        if self.saved.iter().any(|p| p.is_near(marker.lat, marker.lng)) {
            ctx.toast("Place already saved", ToastKind::Warning);
            return Ok(());
        }
        let name = marker.display_name();
        self.saved.push(SavedPlace {
            id: uuid::Uuid::new_v4().to_string(),
            lat: marker.lat,
            lng: marker.lng,
            name: name.clone(),
            location_details: marker.details,
        });
        self.store.save(STORAGE_KEY, &self.saved)?;
        self.render_saved(ctx)?;
        ctx.toast(format!("{name} saved successfully!"), ToastKind::Success);
        Ok(())
    }

    fn goto_place(&mut self, id: &str, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let Some(place) = self.saved.iter().find(|p| p.id == id).cloned() else {
            return Ok(());
        };
        self.go_to(place.lat, place.lng, place.name, place.location_details, ctx)
    }

    fn delete_place(&mut self, id: &str, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.saved.retain(|p| p.id != id);
        self.store.save(STORAGE_KEY, &self.saved)?;
        self.render_saved(ctx)?;
        ctx.toast("Place removed", ToastKind::Success);
        Ok(())
    }

    fn render_saved(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.saved.is_empty() {
            return ctx.set_html(
                "savedPlaces",
                r#"<p class="text-muted">Click on map to save places</p>"#,
            );
        }
        let items: String = self
            .saved
            .iter()
            .map(|p| {
                let city = p
                    .location_details
                    .as_ref()
                    .and_then(|d| d.city.as_deref())
                    .map(|city| format!(" <small>{}</small>", escape(city)))
                    .unwrap_or_default();
                format!(
                    r#"<div class="saved-place-item" data-action="goto-place" data-id="{id}"><span>{name}</span>{city} <button class="btn-icon" data-action="delete-place" data-id="{id}">Remove</button></div>"#,
                    id = p.id,
                    name = escape(&p.name),
                )
            })
            .collect();
        ctx.set_html("savedPlaces", &items)
    }

    // ── Mirroring ──────────────────────────────────────────────────────

    /// Write the view into `#map` and the marker list.
    fn sync(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        let Some(view) = &self.view else {
            return Ok(());
        };
        let map = ctx.element(MAP_ELEMENT_ID)?;
        ctx.doc.set_attr(map, "data-lat", &view.center.0.to_string());
        ctx.doc.set_attr(map, "data-lng", &view.center.1.to_string());
        ctx.doc.set_attr(map, "data-zoom", &view.zoom.to_string());
        let pins: String = view
            .markers
            .iter()
            .map(|m| {
                format!(
                    r#"<span class="marker" data-lat="{}" data-lng="{}">{}</span>"#,
                    m.lat,
                    m.lng,
                    escape(&m.name)
                )
            })
            .collect();
        ctx.doc.set_inner_html(map, &pins);

        if view.markers.is_empty() {
            return ctx.set_html(
                "markerList",
                r#"<p class="text-muted">Click on the map or drop a pin to add markers</p>"#,
            );
        }
        let items: String = view
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let save = if m.pending {
                    String::new()
                } else {
                    format!(r#" <button class="btn btn-secondary btn-sm" data-action="save-place" data-id="{i}">Save Place</button>"#)
                };
                format!(
                    r#"<div class="marker-item"><span>{}</span> <small>{:.4}, {:.4}</small>{save}</div>"#,
                    escape(&m.name),
                    m.lat,
                    m.lng
                )
            })
            .collect();
        ctx.set_html("markerList", &items)
    }
}

impl Controller for MapExplorer {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        ctx.element(MAP_ELEMENT_ID)?;
        self.saved = self.store.load(STORAGE_KEY).unwrap_or_default();
        self.view = Some(MapView::default());
        self.sync(ctx)?;
        self.render_saved(ctx)
    }

    fn cleanup(&mut self) {
        self.view = None;
        self.results.clear();
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match event {
            PageEvent::Task(output) => match output.downcast::<MapTask>() {
                Ok(task) => match *task {
                    MapTask::Search(result) => self.on_search(result, ctx),
                    MapTask::Reverse { lat, lng, details } => {
                        self.on_reverse(lat, lng, details, ctx)
                    }
                },
                Err(_) => Ok(()),
            },
            PageEvent::Submit { form, data } => match form.as_str() {
                "mapSearchForm" => {
                    self.search(&data, ctx);
                    Ok(())
                }
                "pinForm" => {
                    let coords = valid_coordinates_from(&data);
                    match coords {
                        Some((lat, lng)) => {
                            ctx.reset_form("pinForm")?;
                            self.drop_pin(lat, lng, ctx)
                        }
                        None => {
                            ctx.toast("Enter a valid latitude and longitude", ToastKind::Warning);
                            Ok(())
                        }
                    }
                }
                _ => Ok(()),
            },
            PageEvent::Action { name, value } => {
                let value = value.unwrap_or_default();
                match name.as_str() {
                    "drop-pin" => match parse_coordinates(&value) {
                        Some((lat, lng)) => self.drop_pin(lat, lng, ctx),
                        None => Ok(()),
                    },
                    "goto-result" => {
                        let Some(result) = value
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| self.results.get(i))
                            .cloned()
                        else {
                            return Ok(());
                        };
                        let name = result.details.name.clone();
                        self.go_to(result.lat, result.lng, name, Some(result.details), ctx)
                    }
                    "clear-markers" => self.clear_markers(ctx),
                    "save-place" => match value.parse::<usize>() {
                        Ok(index) => self.save_marker(index, ctx),
                        Err(_) => Ok(()),
                    },
                    "goto-place" => self.goto_place(&value, ctx),
                    "delete-place" => self.delete_place(&value, ctx),
                    _ => Ok(()),
                }
            }
        }
    }
}

fn valid_coordinates_from(data: &FormData) -> Option<(f64, f64)> {
    valid_coordinates(data.number("lat")?, data.number("lng")?)
}
