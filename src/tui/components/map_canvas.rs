//! # MapCanvas Component
//!
//! World map drawn from the `#map` element the maps page keeps in sync:
//! `data-lat`, `data-lng` and `data-zoom` give the view, and each
//! `span.marker` child is a pin. Clicking inside the canvas converts the
//! cell back to coordinates so the host can drop a pin there.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use ratatui::widgets::Block;
use ratatui::widgets::canvas::{Canvas, Map, MapResolution};

use crate::core::markup::{Document, NodeId};
use crate::features::maps::{DEFAULT_CENTER, DEFAULT_ZOOM};

/// Center and zoom of the visible map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub center: (f64, f64),
    pub zoom: u8,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapViewport {
    pub fn from_element(doc: &Document, map: NodeId) -> Self {
        let read = |name: &str| doc.attr(map, name).and_then(|v| v.parse::<f64>().ok());
        let defaults = Self::default();
        Self {
            center: (
                read("data-lat").unwrap_or(defaults.center.0),
                read("data-lng").unwrap_or(defaults.center.1),
            ),
            zoom: doc
                .attr(map, "data-zoom")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.zoom),
        }
    }

    /// `(x_bounds, y_bounds)` as `(longitude, latitude)` ranges for a
    /// canvas of `width` x `height` cells. Cells are about twice as tall as
    /// they are wide, so latitude spans are scaled to keep the map square.
    pub fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let zoom = i32::from(self.zoom.max(1));
        let lng_span = 360.0 / 2f64.powi(zoom - 1);
        let width = f64::from(width.max(1));
        let height = f64::from(height.max(1));
        let lat_span = lng_span * (height * 2.0) / width;
        let (lat, lng) = self.center;
        (
            [lng - lng_span / 2.0, lng + lng_span / 2.0],
            [lat - lat_span / 2.0, lat + lat_span / 2.0],
        )
    }

    /// Coordinates under the cell at `(col, row)` of `inner`.
    pub fn unproject(&self, inner: Rect, col: u16, row: u16) -> (f64, f64) {
        let ([x0, x1], [y0, y1]) = self.bounds(inner.width, inner.height);
        let fx = (f64::from(col.saturating_sub(inner.x)) + 0.5) / f64::from(inner.width.max(1));
        let fy = (f64::from(row.saturating_sub(inner.y)) + 0.5) / f64::from(inner.height.max(1));
        let lng = x0 + fx * (x1 - x0);
        let lat = y1 - fy * (y1 - y0);
        (lat.clamp(-90.0, 90.0), wrap_longitude(lng))
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 { 180.0 } else { wrapped }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

/// Markers listed under the `#map` element.
pub fn pins(doc: &Document, map: NodeId) -> Vec<Pin> {
    doc.elements_with_attr(map, "data-lat")
        .into_iter()
        .filter(|node| *node != map && doc.has_class(*node, "marker"))
        .filter_map(|node| {
            Some(Pin {
                lat: doc.attr(node, "data-lat")?.parse().ok()?,
                lng: doc.attr(node, "data-lng")?.parse().ok()?,
                name: doc.text_content(node),
            })
        })
        .collect()
}

pub struct MapCanvas {
    pub viewport: MapViewport,
    pub pins: Vec<Pin>,
    pub dimmed: bool,
}

impl MapCanvas {
    pub fn from_document(doc: &Document, map: NodeId, dimmed: bool) -> Self {
        Self {
            viewport: MapViewport::from_element(doc, map),
            pins: pins(doc, map),
            dimmed,
        }
    }

    /// The drawable area inside the border.
    pub fn inner(area: Rect) -> Rect {
        Block::bordered().inner(area)
    }
}

impl Widget for MapCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = Self::inner(area);
        let (x_bounds, y_bounds) = self.viewport.bounds(inner.width, inner.height);
        let land = if self.dimmed { Color::Black } else { Color::DarkGray };
        let title = format!(
            " Map {:.2}, {:.2} · zoom {} · click to drop a pin ",
            self.viewport.center.0, self.viewport.center.1, self.viewport.zoom
        );
        let pins = self.pins;
        Canvas::default()
            .block(
                Block::bordered()
                    .title(title)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .marker(symbols::Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map {
                    resolution: MapResolution::High,
                    color: land,
                });
                ctx.layer();
                for pin in &pins {
                    ctx.print(
                        pin.lng,
                        pin.lat,
                        Span::styled(
                            format!("● {}", pin.name),
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn map_doc() -> Document {
        Document::parse(
            r#"<div id="map" data-lat="48.85" data-lng="2.29" data-zoom="13"><span class="marker" data-lat="48.8584" data-lng="2.2945">Eiffel Tower</span></div>"#,
        )
    }

    #[test]
    fn test_viewport_reads_element_attributes() {
        let doc = map_doc();
        let map = doc.get_element_by_id("map").unwrap();
        let viewport = MapViewport::from_element(&doc, map);
        assert_eq!(viewport.center, (48.85, 2.29));
        assert_eq!(viewport.zoom, 13);
    }

    #[test]
    fn test_viewport_defaults_without_attributes() {
        let doc = Document::parse(r#"<div id="map"></div>"#);
        let map = doc.get_element_by_id("map").unwrap();
        assert_eq!(MapViewport::from_element(&doc, map), MapViewport::default());
    }

    #[test]
    fn test_pins_parse_markers() {
        let doc = map_doc();
        let map = doc.get_element_by_id("map").unwrap();
        let pins = pins(&doc, map);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].name, "Eiffel Tower");
        assert_eq!(pins[0].lat, 48.8584);
    }

    #[test]
    fn test_unproject_center_cell_is_center() {
        let viewport = MapViewport {
            center: (10.0, 20.0),
            zoom: 3,
        };
        let inner = Rect::new(0, 0, 41, 21);
        let (lat, lng) = viewport.unproject(inner, 20, 10);
        assert!((lat - 10.0).abs() < 1.0, "lat {lat}");
        assert!((lng - 20.0).abs() < 1.0, "lng {lng}");
    }

    #[test]
    fn test_unproject_stays_in_range() {
        let viewport = MapViewport {
            center: (80.0, 170.0),
            zoom: 1,
        };
        let inner = Rect::new(0, 0, 40, 20);
        let (lat, lng) = viewport.unproject(inner, 39, 0);
        assert!((-90.0..=90.0).contains(&lat));
        assert!((-180.0..=180.0).contains(&lng));
    }

    #[test]
    fn test_canvas_renders_title_and_pin() {
        let doc = map_doc();
        let map = doc.get_element_by_id("map").unwrap();
        let backend = TestBackend::new(60, 14);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                f.render_widget(MapCanvas::from_document(&doc, map, false), f.area());
            })
            .unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("zoom 13"));
        assert!(text.contains("Eiffel"));
    }
}
