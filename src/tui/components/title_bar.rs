//! # TitleBar Component
//!
//! Top status bar: application name, current page, and a transient status
//! (loading, editing hints).
//!
//! ## Props-in-Struct Pattern
//!
//! TitleBar is purely presentational. It receives all data as struct
//! fields and has no internal state, which keeps the `Component::render`
//! signature fixed:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new("Trip Planner".into(), "Loading Maps…".into());
//! title_bar.render(frame, area);
//! ```
//!
//! ## Conditional Formatting
//!
//! 1. **Status**: `"GlobeMate | Trip Planner | Loading Maps…"`
//! 2. **Page only**: `"GlobeMate | Trip Planner"`
//! 3. **Nothing loaded**: `"GlobeMate"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

pub struct TitleBar {
    /// Title of the current page, empty before the first load
    pub page_title: String,
    /// Status message (e.g. "Loading Maps…")
    pub status_message: String,
}

impl TitleBar {
    pub fn new(page_title: String, status_message: String) -> Self {
        Self {
            page_title,
            status_message,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            "GlobeMate",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if !self.page_title.is_empty() {
            spans.push(Span::raw(format!(" | {}", self.page_title)));
        }
        if !self.status_message.is_empty() {
            spans.push(Span::styled(
                format!(" | {}", self.status_message),
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
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
    fn test_title_bar_with_status_message() {
        let mut title_bar =
            TitleBar::new("Trip Planner".to_string(), "Loading Maps…".to_string());
        let text = draw(&mut title_bar);
        assert!(text.contains("GlobeMate"));
        assert!(text.contains("Trip Planner"));
        assert!(text.contains("Loading Maps…"));
    }

    #[test]
    fn test_title_bar_page_only() {
        let mut title_bar = TitleBar::new("Safety".to_string(), String::new());
        let text = draw(&mut title_bar);
        assert!(text.contains("GlobeMate | Safety"));
        assert_eq!(text.matches('|').count(), 1);
    }

    #[test]
    fn test_title_bar_default_no_status() {
        let mut title_bar = TitleBar::new(String::new(), String::new());
        let text = draw(&mut title_bar);
        assert!(text.contains("GlobeMate"));
        assert!(!text.contains('|'));
    }

    #[test]
    fn test_title_bar_props_are_mutable() {
        let mut title_bar = TitleBar::new(String::new(), String::new());
        title_bar.page_title = "Maps".to_string();
        title_bar.status_message = "Editing".to_string();
        let text = draw(&mut title_bar);
        assert!(text.contains("Maps"));
        assert!(text.contains("Editing"));
    }
}
