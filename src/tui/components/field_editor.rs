//! # FieldEditor Component
//!
//! Holds the uncommitted text of the form field being edited. The document
//! is only touched on commit, so a task result that rewrites the page
//! mid-edit can't clobber the buffer. Fields are tracked by their `id`
//! attribute because node ids don't survive document compaction.

use crate::core::markup::{Document, NodeId};
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Id(String),
    Node(NodeId),
}

impl FieldRef {
    pub fn resolve(&self, doc: &Document) -> Option<NodeId> {
        match self {
            FieldRef::Id(id) => doc.get_element_by_id(id),
            FieldRef::Node(node) => doc.is_attached(*node).then_some(*node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// Write the value and submit the enclosing form.
    Commit,
    /// Write the value without submitting.
    Blur,
    Cancel,
    Changed,
}

#[derive(Debug, Clone)]
pub struct FieldEditor {
    pub field: FieldRef,
    pub buffer: String,
    multiline: bool,
}

impl FieldEditor {
    /// Start editing `node` with its current value.
    pub fn open(doc: &Document, node: NodeId) -> Self {
        let field = match doc.attr(node, "id") {
            Some(id) if !id.is_empty() => FieldRef::Id(id.to_string()),
            _ => FieldRef::Node(node),
        };
        Self {
            field,
            buffer: doc.value(node),
            multiline: doc.tag(node) == Some("textarea"),
        }
    }
}

impl EventHandler for FieldEditor {
    type Event = EditEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<EditEvent> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                Some(EditEvent::Changed)
            }
            TuiEvent::Paste(text) => {
                if self.multiline {
                    self.buffer.push_str(text);
                } else {
                    self.buffer.extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
                }
                Some(EditEvent::Changed)
            }
            TuiEvent::Backspace => {
                self.buffer.pop();
                Some(EditEvent::Changed)
            }
            // Enter in a textarea just leaves the field
            TuiEvent::Activate if self.multiline => Some(EditEvent::Blur),
            TuiEvent::Activate => Some(EditEvent::Commit),
            TuiEvent::FocusNext | TuiEvent::FocusPrev => Some(EditEvent::Blur),
            TuiEvent::Escape => Some(EditEvent::Cancel),
            _ => None,
        }
    }
}
