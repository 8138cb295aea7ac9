//! Markup → ratatui `Line` renderer.
//!
//! Lays out the content region of a [`Document`] as styled lines and keeps
//! track of where every interactive element landed, so mouse clicks and
//! keyboard focus can be mapped back to document nodes.
//!
//! Layout is deliberately simple: block elements start a new line, inline
//! text word-wraps at the viewport width, form controls render as fixed
//! width boxes, and `#map` reserves a slot the map canvas draws into.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::markup::{Document, Element, NodeId, NodeKind};
use crate::features::maps::MAP_ELEMENT_ID;

pub const MAP_HEIGHT: u16 = 14;
const FIELD_WIDTH: usize = 24;
const BAR_WIDTH: usize = 20;

/// Screen cells (in content coordinates) occupied by an interactive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub node: NodeId,
    pub line: u16,
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSlot {
    pub node: NodeId,
    pub line: u16,
    pub height: u16,
}

#[derive(Debug, Default)]
pub struct RenderedPage {
    pub lines: Vec<Line<'static>>,
    pub hits: Vec<Hit>,
    /// Interactive nodes in document order.
    pub focusables: Vec<NodeId>,
    pub map: Option<MapSlot>,
}

impl RenderedPage {
    pub fn height(&self) -> u16 {
        u16::try_from(self.lines.len()).unwrap_or(u16::MAX)
    }

    pub fn hit(&self, line: u16, col: u16) -> Option<NodeId> {
        self.hits
            .iter()
            .find(|h| h.line == line && (h.start..h.end).contains(&col))
            .map(|h| h.node)
    }

    /// First line `node` was drawn on.
    pub fn line_of(&self, node: NodeId) -> Option<u16> {
        self.hits.iter().find(|h| h.node == node).map(|h| h.line)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub width: u16,
    pub focused: Option<NodeId>,
    /// Field being edited and its uncommitted text.
    pub editing: Option<(NodeId, String)>,
    pub dimmed: bool,
}

/// How a form control behaves when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Text,
    Select,
    Checkbox,
    Button,
}

pub fn control_kind(doc: &Document, node: NodeId) -> Option<Control> {
    match doc.tag(node)? {
        "button" => Some(Control::Button),
        "select" => Some(Control::Select),
        "textarea" => Some(Control::Text),
        "input" => match doc.attr(node, "type").unwrap_or("text") {
            "submit" | "button" => Some(Control::Button),
            "checkbox" => Some(Control::Checkbox),
            "hidden" | "file" => None,
            _ => Some(Control::Text),
        },
        _ => None,
    }
}

/// A named control the user edits directly. Controls inside a
/// `data-action` element belong to that action instead.
pub fn is_field(doc: &Document, node: NodeId) -> bool {
    matches!(
        control_kind(doc, node),
        Some(Control::Text | Control::Select | Control::Checkbox)
    ) && doc.attr(node, "name").is_some()
        && doc.closest(node, "data-action").is_none()
}

fn is_target(doc: &Document, node: NodeId, el: &Element) -> bool {
    el.attr("data-tab").is_some()
        || el.attr("data-action").is_some()
        || control_kind(doc, node) == Some(Control::Button)
        || is_field(doc, node)
}

/// Lay out the children of `scope`.
pub fn render(doc: &Document, scope: NodeId, options: &RenderOptions) -> RenderedPage {
    let mut w = Writer::new(doc, options);
    for child in doc.children(scope) {
        w.walk(*child);
    }
    w.page
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer<'a> {
    doc: &'a Document,
    options: &'a RenderOptions,
    width: usize,
    page: RenderedPage,
    styles: Vec<Style>,
    /// Innermost interactive ancestor receives the hits.
    targets: Vec<NodeId>,
    indent: usize,
    col: usize,
    pending_space: bool,
}

impl<'a> Writer<'a> {
    fn new(doc: &'a Document, options: &'a RenderOptions) -> Self {
        Self {
            doc,
            options,
            width: usize::from(options.width.max(1)),
            page: RenderedPage::default(),
            styles: vec![],
            targets: vec![],
            indent: 0,
            col: 0,
            pending_space: false,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_else(|| {
            if self.options.dimmed {
                Style::default().add_modifier(Modifier::DIM)
            } else {
                Style::default()
            }
        })
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    // ── Line helpers ────────────────────────────────────────────────────

    fn at_line_start(&self) -> bool {
        self.page.lines.is_empty() || self.col <= self.indent
    }

    fn new_line(&mut self) {
        let mut line = Line::default();
        if self.indent > 0 {
            line.push_span(Span::raw(" ".repeat(self.indent)));
        }
        self.page.lines.push(line);
        self.col = self.indent;
        self.pending_space = false;
    }

    /// Start a fresh line unless already at the start of one.
    fn block(&mut self) {
        if !self.at_line_start() {
            self.new_line();
        }
        if self.page.lines.is_empty() {
            self.new_line();
        }
        self.pending_space = false;
    }

    /// `block`, plus one blank line after previous content.
    fn gap(&mut self) {
        self.block();
        let len = self.page.lines.len();
        if len >= 2 && has_text(&self.page.lines[len - 2]) {
            self.new_line();
        }
    }

    fn line_index(&self) -> u16 {
        u16::try_from(self.page.lines.len().saturating_sub(1)).unwrap_or(u16::MAX)
    }

    /// Append to the current line, recording a hit for the innermost target.
    fn push_raw(&mut self, text: String, style: Style) {
        if self.page.lines.is_empty() {
            self.new_line();
        }
        let width = text.width();
        if let Some(&node) = self.targets.last() {
            let line = self.line_index();
            let start = u16::try_from(self.col).unwrap_or(u16::MAX);
            let end = u16::try_from(self.col + width).unwrap_or(u16::MAX);
            match self.page.hits.last_mut() {
                Some(last) if last.node == node && last.line == line && last.end == start => {
                    last.end = end;
                }
                _ => self.page.hits.push(Hit { node, line, start, end }),
            }
        }
        if let Some(line) = self.page.lines.last_mut() {
            line.push_span(Span::styled(text, style));
        }
        self.col += width;
    }

    fn leading_space(&mut self, width: usize) {
        let space = self.pending_space && !self.at_line_start();
        let needed = width + usize::from(space);
        if !self.at_line_start() && self.col + needed > self.width {
            self.new_line();
        } else if space {
            self.push_raw(" ".to_string(), self.style());
        }
        self.pending_space = false;
    }

    /// Word-wrapped inline text.
    fn write_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        let style = self.style();
        let mut wrote = false;
        for word in text.split_whitespace() {
            self.leading_space(word.width());
            self.push_raw(word.to_string(), style);
            self.pending_space = true;
            wrote = true;
        }
        if wrote {
            self.pending_space = text.ends_with(char::is_whitespace);
        }
    }

    /// Unbreakable inline run.
    fn write_atom(&mut self, text: String, overlay: Style) {
        self.leading_space(text.width());
        let style = self.style().patch(overlay);
        self.push_raw(text, style);
    }

    // ── Tree walk ───────────────────────────────────────────────────────

    fn walk(&mut self, node: NodeId) {
        let doc = self.doc;
        match doc.kind(node) {
            Some(NodeKind::Text(text)) => self.write_text(text),
            Some(NodeKind::Element(el)) => self.element(node, el),
            None => {}
        }
    }

    fn children(&mut self, node: NodeId) {
        let doc = self.doc;
        for child in doc.children(node) {
            self.walk(*child);
        }
    }

    fn element(&mut self, node: NodeId, el: &Element) {
        if el.has_class("hidden") {
            return;
        }
        if el.attr("id") == Some(MAP_ELEMENT_ID) {
            self.map_slot(node);
            return;
        }

        let target = is_target(self.doc, node, el);
        if target {
            self.targets.push(node);
            self.page.focusables.push(node);
        }
        let mut pushed = 0;
        if target && self.options.focused == Some(node) {
            self.push_style(Style::default().add_modifier(Modifier::REVERSED));
            pushed += 1;
        }
        if let Some(style) = class_style(el) {
            self.push_style(style);
            pushed += 1;
        }

        match el.tag.as_str() {
            "script" | "style" | "head" | "title" | "template" | "option" => {}
            "br" => self.new_line(),
            "hr" => {
                self.block();
                let rule = "─".repeat(self.width.min(60));
                self.push_raw(rule, Style::default().fg(Color::DarkGray));
                self.block();
            }
            "h1" | "h2" => self.heading(node, Style::default().fg(Color::Cyan)),
            "h3" => self.heading(node, Style::default().fg(Color::Yellow)),
            "h4" | "h5" | "h6" => self.heading(node, Style::default()),
            "input" | "select" | "textarea" => self.control(node),
            "button" => {
                let style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
                self.write_atom("[".to_string(), style);
                self.push_style(style);
                self.children(node);
                self.pop_style();
                self.pending_space = false;
                self.push_raw("]".to_string(), self.style().patch(style));
            }
            "progress" => self.progress(node),
            "li" => {
                self.block();
                self.write_atom("• ".to_string(), Style::default().fg(Color::DarkGray));
                self.pending_space = false;
                self.indent += 2;
                self.children(node);
                self.indent -= 2;
                self.block();
            }
            "strong" | "b" => self.styled(node, Style::default().add_modifier(Modifier::BOLD)),
            "em" | "i" => self.styled(node, Style::default().add_modifier(Modifier::ITALIC)),
            "small" => self.styled(node, Style::default().add_modifier(Modifier::DIM)),
            "a" if target => {
                self.styled(node, Style::default().add_modifier(Modifier::UNDERLINED))
            }
            "section" | "article" | "header" | "footer" | "main" | "nav" | "form" | "ul" | "ol"
            | "table" => {
                self.gap();
                self.children(node);
                self.block();
            }
            "p" | "div" | "tr" | "dl" | "dt" | "dd" => {
                if el.has_class("card") {
                    self.gap();
                } else {
                    self.block();
                }
                self.children(node);
                self.block();
            }
            _ => self.children(node),
        }

        for _ in 0..pushed {
            self.pop_style();
        }
        if target {
            self.targets.pop();
        }
    }

    fn styled(&mut self, node: NodeId, overlay: Style) {
        self.push_style(overlay);
        self.children(node);
        self.pop_style();
    }

    fn heading(&mut self, node: NodeId, overlay: Style) {
        self.gap();
        self.styled(node, overlay.add_modifier(Modifier::BOLD));
        self.block();
    }

    fn control(&mut self, node: NodeId) {
        let doc = self.doc;
        let Some(kind) = control_kind(doc, node) else {
            return;
        };
        match kind {
            Control::Button => {
                let label = doc.attr(node, "value").unwrap_or("Submit");
                self.write_atom(
                    format!("[{label}]"),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                );
            }
            Control::Checkbox => {
                let mark = if doc.attr(node, "checked").is_some() { "[x]" } else { "[ ]" };
                self.write_atom(mark.to_string(), Style::default().fg(Color::Cyan));
            }
            Control::Select => {
                let label = selected_label(doc, node);
                self.write_atom(
                    format!("[{} ▾]", fit(&label, FIELD_WIDTH - 2, false)),
                    Style::default().fg(Color::Cyan),
                );
            }
            Control::Text => {
                let editing = self
                    .options
                    .editing
                    .as_ref()
                    .filter(|(id, _)| *id == node)
                    .map(|(_, buffer)| buffer.as_str());
                let (text, overlay) = match editing {
                    Some(buffer) => (
                        format!("[{}]", fit(&format!("{buffer}▏"), FIELD_WIDTH, true)),
                        Style::default().fg(Color::Yellow),
                    ),
                    None => {
                        let value = doc.value(node);
                        if value.is_empty() {
                            let placeholder = doc.attr(node, "placeholder").unwrap_or("");
                            (
                                format!("[{}]", fit(placeholder, FIELD_WIDTH, false)),
                                Style::default().fg(Color::DarkGray),
                            )
                        } else {
                            (
                                format!("[{}]", fit(&value, FIELD_WIDTH, false)),
                                Style::default().fg(Color::Cyan),
                            )
                        }
                    }
                };
                self.write_atom(text, overlay);
            }
        }
    }

    fn progress(&mut self, node: NodeId) {
        let value: f64 = self
            .doc
            .attr(node, "value")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let max: f64 = self
            .doc
            .attr(node, "max")
            .and_then(|v| v.parse().ok())
            .filter(|m: &f64| *m > 0.0)
            .unwrap_or(100.0);
        let ratio = (value / max).clamp(0.0, 1.0);
        let filled = (ratio * BAR_WIDTH as f64).round() as usize;
        self.write_atom(
            format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled)),
            Style::default().fg(Color::Green),
        );
        self.write_atom(format!(" {:.0}%", ratio * 100.0), Style::default());
    }

    fn map_slot(&mut self, node: NodeId) {
        self.gap();
        self.page.map = Some(MapSlot {
            node,
            line: self.line_index(),
            height: MAP_HEIGHT,
        });
        for _ in 0..MAP_HEIGHT {
            self.new_line();
        }
    }
}

fn has_text(line: &Line<'_>) -> bool {
    line.spans.iter().any(|span| !span.content.trim().is_empty())
}

fn class_style(el: &Element) -> Option<Style> {
    let style = if el.has_class("text-muted") || el.has_class("section-subtitle") {
        Style::default().add_modifier(Modifier::DIM)
    } else if el.has_class("empty-state") {
        Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC)
    } else if el.has_class("checked") {
        Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
    } else if el.has_class("level-very-safe")
        || el.has_class("level-safe")
        || el.has_class("free")
    {
        Style::default().fg(Color::Green)
    } else if el.has_class("level-moderate") || el.has_class("today") {
        Style::default().fg(Color::Yellow)
    } else if el.has_class("level-caution") || el.has_class("required") || el.has_class("overdue")
    {
        Style::default().fg(Color::Red)
    } else if el.has_class("reminder-badge") || el.has_class("badge") {
        Style::default().fg(Color::Magenta)
    } else if el.has_class("category-title") {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        return None;
    };
    Some(style)
}

fn selected_label(doc: &Document, select: NodeId) -> String {
    let options = doc.elements_by_tag(select, "option");
    options
        .iter()
        .find(|opt| doc.attr(**opt, "selected").is_some())
        .or_else(|| options.first())
        .map(|opt| doc.text_content(*opt))
        .unwrap_or_default()
}

/// Pad or truncate `text` to exactly `width` columns. `tail` keeps the end
/// of overlong text (the edit cursor) instead of the start.
fn fit(text: &str, width: usize, tail: bool) -> String {
    let mut out: String = if text.width() <= width {
        text.to_string()
    } else if tail {
        let mut kept = Vec::new();
        let mut used = 0;
        for ch in text.chars().rev() {
            let w = ch.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            used += w;
            kept.push(ch);
        }
        kept.into_iter().rev().collect()
    } else {
        let mut kept = String::new();
        let mut used = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width.saturating_sub(1) {
                break;
            }
            used += w;
            kept.push(ch);
        }
        kept.push('…');
        kept
    };
    let pad = width.saturating_sub(out.width());
    out.push_str(&" ".repeat(pad));
    out
}
