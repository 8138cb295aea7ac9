//! # NavBar Component
//!
//! One-line tab strip built from the shell's `.nav-links`. The active tab
//! follows the `active-tab` class the router maintains, so the strip
//! highlights the destination as soon as a navigation begins.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::core::markup::NodeId;
use crate::core::navigation::NavLink;
use crate::tui::component::Component;

const SEPARATOR: &str = " │ ";

pub struct NavBar<'a> {
    pub links: &'a [NavLink],
}

impl<'a> NavBar<'a> {
    pub fn new(links: &'a [NavLink]) -> Self {
        Self { links }
    }
}

fn tab_label(index: usize, link: &NavLink) -> String {
    if index < 9 {
        format!(" {} {} ", index + 1, link.label)
    } else {
        format!(" {} ", link.label)
    }
}

/// Column span of each tab, relative to the bar's left edge.
fn tab_ranges(links: &[NavLink]) -> Vec<(u16, u16)> {
    let mut col = 0u16;
    links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            if i > 0 {
                col = col.saturating_add(SEPARATOR.width() as u16);
            }
            let width = tab_label(i, link).width() as u16;
            let range = (col, col.saturating_add(width));
            col = range.1;
            range
        })
        .collect()
}

/// The nav link under column `col` of a bar drawn at `area`.
pub fn hit_test(links: &[NavLink], area: Rect, col: u16, row: u16) -> Option<NodeId> {
    if row != area.y || col < area.x {
        return None;
    }
    let x = col - area.x;
    tab_ranges(links)
        .into_iter()
        .zip(links)
        .find(|((start, end), _)| (*start..*end).contains(&x))
        .map(|(_, link)| link.node)
}

impl Component for NavBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (i, link) in self.links.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(SEPARATOR, Style::default().fg(Color::DarkGray)));
            }
            let style = if link.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(tab_label(i, link), style));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
