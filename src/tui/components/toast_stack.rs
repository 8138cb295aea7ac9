//! # ToastStack Component
//!
//! Overlay in the top-right corner of the content area listing the
//! visible toasts, newest at the bottom. Toasts in their removal phase are
//! dimmed before they disappear.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::core::toast::{ToastKind, ToastPhase};
use crate::tui::component::Component;

const MAX_WIDTH: u16 = 44;

#[derive(Debug, Clone, PartialEq)]
pub struct ToastLine {
    pub message: String,
    pub kind: ToastKind,
    pub phase: ToastPhase,
}

pub struct ToastStack {
    pub toasts: Vec<ToastLine>,
}

fn kind_color(kind: ToastKind) -> Color {
    match kind {
        ToastKind::Success => Color::Green,
        ToastKind::Error => Color::Red,
        ToastKind::Warning => Color::Yellow,
        ToastKind::Info => Color::Blue,
    }
}

impl ToastStack {
    pub fn new(toasts: Vec<ToastLine>) -> Self {
        Self { toasts }
    }

    fn wrapped(message: &str, width: u16) -> Vec<String> {
        textwrap::wrap(message, usize::from(width.max(1)))
            .into_iter()
            .map(|line| line.into_owned())
            .collect()
    }
}

impl Component for ToastStack {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = MAX_WIDTH.min(area.width);
        if width < 8 {
            return;
        }
        // Border (2) + icon and space (2)
        let text_width = width - 4;
        let mut y = area.y;
        for toast in &self.toasts {
            let lines = Self::wrapped(&toast.message, text_width);
            let height = lines.len() as u16 + 2;
            if y + height > area.y + area.height {
                break;
            }
            let rect = Rect::new(area.x + area.width - width, y, width, height);

            let color = kind_color(toast.kind);
            let mut style = Style::default().fg(color);
            if toast.phase == ToastPhase::Removing {
                style = style.add_modifier(Modifier::DIM);
            }
            let text: Vec<Line> = lines
                .into_iter()
                .enumerate()
                .map(|(i, line)| {
                    let icon = if i == 0 { toast.kind.icon() } else { " " };
                    Line::from(vec![
                        Span::styled(format!("{icon} "), style.add_modifier(Modifier::BOLD)),
                        Span::styled(line, style),
                    ])
                })
                .collect();

            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(text).block(Block::bordered().border_style(style)),
                rect,
            );
            y += height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn toast(message: &str, kind: ToastKind, phase: ToastPhase) -> ToastLine {
        ToastLine {
            message: message.to_string(),
            kind,
            phase,
        }
    }

    #[test]
    fn test_renders_toasts_top_right() {
        let backend = TestBackend::new(80, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut stack = ToastStack::new(vec![
            toast("Trip to Lisbon saved!", ToastKind::Success, ToastPhase::Showing),
            toast("Place removed", ToastKind::Info, ToastPhase::Removing),
        ]);
        terminal.draw(|f| stack.render(f, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let text = buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("Trip to Lisbon saved!"));
        assert!(text.contains("Place removed"));
        // Left half untouched
        assert_eq!(buffer[(0, 0)].symbol(), " ");
        assert_eq!(buffer[(80 - MAX_WIDTH, 0)].symbol(), "┌");
    }

    #[test]
    fn test_long_message_wraps() {
        let lines = ToastStack::wrapped("Exchange rate for XYZ is not available right now", 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 20));
    }

    #[test]
    fn test_stops_when_out_of_room() {
        let backend = TestBackend::new(60, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut stack = ToastStack::new(vec![
            toast("first", ToastKind::Info, ToastPhase::Showing),
            toast("second", ToastKind::Info, ToastPhase::Showing),
        ]);
        terminal.draw(|f| stack.render(f, f.area())).unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("first"));
        assert!(!text.contains("second"));
    }
}
