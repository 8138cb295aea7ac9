//! # Landing Component
//!
//! Splash shown until the first page arrives: a small globe, the app name
//! and a spinner naming the page being loaded.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

const GLOBE: &[&str] = &[
    "   .-''''-.   ",
    "  /  .--.  \\  ",
    " |  (    )  | ",
    " |   '--'   | ",
    "  \\        /  ",
    "   '-....-'   ",
];

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct LandingPage {
    frame_index: usize,
    /// Title of the page in flight, if any
    loading: Option<String>,
}

impl LandingPage {
    pub fn new(frame_index: usize, loading: Option<String>) -> Self {
        Self {
            frame_index,
            loading,
        }
    }
}

impl Component for LandingPage {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = GLOBE
            .iter()
            .map(|row| Line::from(Span::styled(*row, Style::default().fg(Color::Cyan))))
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "GlobeMate",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        )));
        if let Some(page) = &self.loading {
            let spinner = SPINNER[self.frame_index % SPINNER.len()];
            lines.push(Line::from(Span::styled(
                format!("{spinner} Loading {page}…"),
                Style::default().fg(Color::DarkGray),
            )));
        }

        let height = lines.len() as u16;
        let [centered] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_landing_shows_name_and_loading_page() {
        let backend = TestBackend::new(40, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut landing = LandingPage::new(3, Some("Home".to_string()));
        terminal.draw(|f| landing.render(f, f.area())).unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("GlobeMate"));
        assert!(text.contains("Loading Home…"));
        assert!(text.contains(SPINNER[3]));
    }
}
