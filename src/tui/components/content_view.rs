//! # ContentView Component
//!
//! Scrollable view of the content region.
//!
//! ## Architecture
//!
//! `ContentView` is a transient component (created each frame) that wraps
//! `&'a mut ContentViewState` (persistent state) and the document (props).
//! Each render lays the region out with [`render`](crate::tui::render),
//! keeps the resulting page in the state for hit testing and focus, and
//! paints the map canvas into its reserved slot inside the scroll view.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::markup::{Document, NodeId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::map_canvas::{MapCanvas, MapViewport};
use crate::tui::event::TuiEvent;
use crate::tui::render::{self, RenderOptions, RenderedPage};

/// What a click inside the content area landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentHit {
    Node(NodeId),
    Map { lat: f64, lng: f64 },
}

/// Scroll, focus and layout state for the content view.
/// Must be persisted in the parent TuiState.
#[derive(Default)]
pub struct ContentViewState {
    pub scroll_state: ScrollViewState,
    /// Last laid-out page
    pub page: RenderedPage,
    /// Index into `page.focusables`
    pub focus: Option<usize>,
    /// Screen area of the last render
    pub area: Rect,
    /// Map view of the last render, for turning clicks into coordinates
    pub map_viewport: Option<MapViewport>,
}

impl ContentViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget scroll and focus, for a freshly loaded page.
    pub fn reset(&mut self) {
        self.scroll_state = ScrollViewState::default();
        self.focus = None;
    }

    pub fn focused_node(&self) -> Option<NodeId> {
        self.focus.and_then(|i| self.page.focusables.get(i).copied())
    }

    pub fn focus_next(&mut self) {
        let count = self.page.focusables.len();
        if count == 0 {
            self.focus = None;
            return;
        }
        self.focus = Some(self.focus.map_or(0, |i| (i + 1) % count));
        self.scroll_to_focus();
    }

    pub fn focus_prev(&mut self) {
        let count = self.page.focusables.len();
        if count == 0 {
            self.focus = None;
            return;
        }
        self.focus = Some(self.focus.map_or(count - 1, |i| (i + count - 1) % count));
        self.scroll_to_focus();
    }

    pub fn focus_node(&mut self, node: NodeId) {
        self.focus = self.page.focusables.iter().position(|n| *n == node);
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    fn viewport_height(&self) -> u16 {
        self.area.height
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.page.height().saturating_sub(self.viewport_height());
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: 0, y: max_y });
        }
    }

    /// Scroll so the focused element's first line is visible.
    pub fn scroll_to_focus(&mut self) {
        let Some(line) = self.focused_node().and_then(|node| self.page.line_of(node)) else {
            return;
        };
        let offset_y = self.scroll_state.offset().y;
        let height = self.viewport_height().max(1);
        if line < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: line });
        } else if line >= offset_y + height {
            self.scroll_state
                .set_offset(Position { x: 0, y: line + 1 - height });
        }
    }

    /// Map a screen position to what was drawn there.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<ContentHit> {
        if !self.area.contains(Position { x: col, y: row }) {
            return None;
        }
        let line = row - self.area.y + self.scroll_state.offset().y;
        let x = col - self.area.x;

        if let Some(slot) = self.page.map
            && (slot.line..slot.line + slot.height).contains(&line)
        {
            let viewport = self.map_viewport?;
            let slot_rect = Rect::new(0, slot.line, self.content_width(), slot.height);
            let inner = MapCanvas::inner(slot_rect);
            if !inner.contains(Position { x, y: line }) {
                return None;
            }
            let (lat, lng) = viewport.unproject(inner, x, line);
            return Some(ContentHit::Map { lat, lng });
        }

        self.page.hit(line, x).map(ContentHit::Node)
    }

    fn content_width(&self) -> u16 {
        self.area.width.saturating_sub(1)
    }
}

impl EventHandler for ContentViewState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => self.scroll_state.scroll_up(),
            TuiEvent::ScrollDown => self.scroll_state.scroll_down(),
            TuiEvent::ScrollPageUp => self.scroll_state.scroll_page_up(),
            TuiEvent::ScrollPageDown => self.scroll_state.scroll_page_down(),
            TuiEvent::ScrollToTop => self.scroll_state.scroll_to_top(),
            _ => return None,
        }
        self.clamp_scroll();
        Some(())
    }
}

pub struct ContentView<'a> {
    pub doc: &'a Document,
    pub region: NodeId,
    pub state: &'a mut ContentViewState,
    /// Field being edited and its uncommitted text
    pub editing: Option<(NodeId, String)>,
    pub dimmed: bool,
}

impl Component for ContentView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.area = area;
        let content_width = area.width.saturating_sub(1);

        // Focus refers to the previous layout; keep it in range.
        let options = RenderOptions {
            width: content_width,
            focused: self.state.focused_node(),
            editing: self.editing.clone(),
            dimmed: self.dimmed,
        };
        let page = render::render(self.doc, self.region, &options);
        if let Some(i) = self.state.focus
            && i >= page.focusables.len()
        {
            self.state.focus = None;
        }

        let height = page.height().max(1);
        let mut scroll_view = ScrollView::new(Size::new(content_width, height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(
            Paragraph::new(page.lines.clone()),
            Rect::new(0, 0, content_width, height),
        );

        self.state.map_viewport = None;
        if let Some(slot) = page.map {
            let canvas = MapCanvas::from_document(self.doc, slot.node, self.dimmed);
            self.state.map_viewport = Some(canvas.viewport);
            scroll_view.render_widget(canvas, Rect::new(0, slot.line, content_width, slot.height));
        }

        self.state.page = page;
        self.state.clamp_scroll();
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    const PAGE: &str = r#"<div id="content-container">
        <h2>Trips</h2>
        <form id="tripForm"><input id="dest" name="destination" placeholder="Where to?">
        <button type="submit">Save Trip</button></form>
        <div id="map"></div>
        <button data-action="clear-markers" id="clear">Clear markers</button>
    </div>"#;

    fn draw(doc: &Document, state: &mut ContentViewState, width: u16, height: u16) -> String {
        let region = doc.get_element_by_id("content-container").unwrap();
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let mut view = ContentView {
                    doc,
                    region,
                    state: &mut *state,
                    editing: None,
                    dimmed: false,
                };
                view.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_renders_region_content() {
        let doc = Document::parse(PAGE);
        let mut state = ContentViewState::new();
        let text = draw(&doc, &mut state, 60, 40);
        assert!(text.contains("Trips"));
        assert!(text.contains("Where to?"));
        assert!(text.contains("Save Trip"));
        assert_eq!(state.page.focusables.len(), 3);
    }

    #[test]
    fn test_focus_cycles_through_focusables() {
        let doc = Document::parse(PAGE);
        let mut state = ContentViewState::new();
        draw(&doc, &mut state, 60, 40);

        let dest = doc.get_element_by_id("dest").unwrap();
        let clear = doc.get_element_by_id("clear").unwrap();
        let save = state.page.focusables[1];
        state.focus_next();
        assert_eq!(state.focused_node(), Some(dest));
        // Wraps backwards from the first focusable to the last
        state.focus_prev();
        assert_eq!(state.focused_node(), Some(clear));
        state.focus_prev();
        assert_eq!(state.focused_node(), Some(save));
        state.focus_next();
        state.focus_next();
        assert_eq!(state.focused_node(), Some(dest));
    }

    #[test]
    fn test_click_maps_to_button() {
        let doc = Document::parse(PAGE);
        let mut state = ContentViewState::new();
        draw(&doc, &mut state, 60, 40);

        let clear = doc.get_element_by_id("clear").unwrap();
        let line = state.page.line_of(clear).unwrap();
        assert_eq!(state.hit_test(1, line), Some(ContentHit::Node(clear)));
    }

    #[test]
    fn test_click_inside_map_yields_coordinates() {
        let doc = Document::parse(PAGE);
        let mut state = ContentViewState::new();
        draw(&doc, &mut state, 60, 40);

        let slot = state.page.map.unwrap();
        match state.hit_test(30, slot.line + slot.height / 2) {
            Some(ContentHit::Map { lat, lng }) => {
                assert!((-90.0..=90.0).contains(&lat));
                assert!((-180.0..=180.0).contains(&lng));
            }
            other => panic!("expected map hit, got {other:?}"),
        }
        // Border row is not part of the map
        assert_eq!(state.hit_test(30, slot.line), None);
    }

    #[test]
    fn test_scroll_is_clamped_to_content() {
        let doc = Document::parse(PAGE);
        let mut state = ContentViewState::new();
        draw(&doc, &mut state, 60, 10);
        for _ in 0..100 {
            state.handle_event(&TuiEvent::ScrollDown);
        }
        let max = state.page.height().saturating_sub(10);
        assert_eq!(state.scroll_state.offset().y, max);
    }

    #[test]
    fn test_focus_scrolls_into_view() {
        let doc = Document::parse(PAGE);
        let mut state = ContentViewState::new();
        draw(&doc, &mut state, 60, 6);
        state.focus_prev();
        let clear = doc.get_element_by_id("clear").unwrap();
        let line = state.page.line_of(clear).unwrap();
        let offset = state.scroll_state.offset().y;
        assert!(line >= offset && line < offset + 6);
    }
}
