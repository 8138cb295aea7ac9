//! # Markup Documents
//!
//! A small HTML-fragment parser and arena tree. This is the "DOM" the router
//! swaps page fragments into and the controllers render into.
//!
//! ```text
//! Document
//! ├── nodes: Vec<Node>        // arena, indexed by NodeId
//! └── root: NodeId            // synthetic #root element
//!
//! Node
//! ├── kind: Element { tag, attrs } | Text(String)
//! ├── parent: Option<NodeId>  // None once detached
//! └── children: Vec<NodeId>
//! ```
//!
//! The parser is forgiving the way browsers are: unknown tags are kept,
//! void elements never take children, stray close tags are ignored, and an
//! unclosed element is closed by the end of the fragment.
//!
//! `set_inner_html` detaches the old children but leaves them in the arena.
//! Call `compact()` at points where no `NodeId` is held (the router does so
//! after each page swap).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*(/?)>"#,
    )
    .expect("tag pattern is valid")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is kept verbatim instead of whitespace-collapsed.
const RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "pre"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document containing only the root.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Element(Element {
                tag: "#root".to_string(),
                attrs: Vec::new(),
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.parse_into(root, markup);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ── Node access ─────────────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// True when `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// True when `ancestor` is `id` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// All descendants of `id` in document order (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // ── Attributes ──────────────────────────────────────────────────────

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn set_class(&mut self, id: NodeId, class: &str, on: bool) {
        let Some(current) = self.element(id).map(|el| el.attr("class").unwrap_or("").to_string())
        else {
            return;
        };
        let mut classes: Vec<&str> = current
            .split_whitespace()
            .filter(|existing| *existing != class)
            .collect();
        if on {
            classes.push(class);
        }
        self.set_attr(id, "class", &classes.join(" "));
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get_element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id_attr))
    }

    /// `id` itself or its nearest ancestor carrying `attr`.
    pub fn closest(&self, id: NodeId, attr: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.attr(current, attr).is_some() {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// `id` itself or its nearest ancestor with the given tag name.
    pub fn closest_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.tag(current) == Some(tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Descendants of `scope` that carry `attr`, in document order.
    pub fn elements_with_attr(&self, scope: NodeId, attr: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.attr(*node, attr).is_some())
            .collect()
    }

    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.tag(*node) == Some(tag))
            .collect()
    }

    // ── Content ─────────────────────────────────────────────────────────

    /// Concatenated text of `id` and its descendants, whitespace-normalized.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(NodeKind::Text(text)) = self.kind(id) {
            parts.push(text.as_str());
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(text)) = self.kind(node) {
                parts.push(text.as_str());
            }
        }
        parts
            .iter()
            .flat_map(|part| part.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace the children of `id` with the parsed `markup`.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        if self.element(id).is_none() {
            return;
        }
        self.detach_children(id);
        self.parse_into(id, markup);
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if self.element(id).is_none() {
            return;
        }
        self.detach_children(id);
        if !text.is_empty() {
            self.append(id, NodeKind::Text(text.to_string()));
        }
    }

    fn detach_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Rebuild the arena keeping only nodes reachable from the root.
    /// Invalidates every `NodeId` handed out before the call.
    pub fn compact(&mut self) {
        let mut fresh = Document::new();
        let mut stack: Vec<(NodeId, NodeId)> = self
            .children(self.root)
            .iter()
            .map(|child| (*child, fresh.root))
            .collect();
        stack.reverse();
        while let Some((old, new_parent)) = stack.pop() {
            let kind = self.nodes[old.0].kind.clone();
            let new_id = fresh.append(new_parent, kind);
            for child in self.children(old).iter().rev() {
                stack.push((*child, new_id));
            }
        }
        *self = fresh;
    }

    /// Number of nodes in the arena, attached or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    // ── Forms ───────────────────────────────────────────────────────────

    /// Current value of a form control.
    pub fn value(&self, id: NodeId) -> String {
        match self.tag(id) {
            Some("select") => {
                let options = self.elements_by_tag(id, "option");
                options
                    .iter()
                    .find(|opt| self.attr(**opt, "selected").is_some())
                    .or_else(|| options.first())
                    .map(|opt| self.option_value(*opt))
                    .unwrap_or_default()
            }
            Some("textarea") => self.text_content(id),
            Some("input") if self.attr(id, "type") == Some("checkbox") => {
                if self.attr(id, "checked").is_some() { "on" } else { "" }.to_string()
            }
            _ => self.attr(id, "value").unwrap_or("").to_string(),
        }
    }

    /// Set the value of a form control (selects pick the matching option;
    /// checkboxes treat any non-empty value as checked).
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        match self.tag(id) {
            Some("select") => {
                for opt in self.elements_by_tag(id, "option") {
                    if self.option_value(opt) == value {
                        self.set_attr(opt, "selected", "");
                    } else {
                        self.remove_attr(opt, "selected");
                    }
                }
            }
            Some("textarea") => self.set_text_content(id, value),
            Some("input") if self.attr(id, "type") == Some("checkbox") => {
                if value.is_empty() {
                    self.remove_attr(id, "checked");
                } else {
                    self.set_attr(id, "checked", "");
                }
            }
            Some(_) => self.set_attr(id, "value", value),
            None => {}
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option))
    }

    /// Named controls of a form, in document order.
    pub fn form_fields(&self, form: NodeId) -> Vec<FormField> {
        self.descendants(form)
            .into_iter()
            .filter(|node| matches!(self.tag(*node), Some("input" | "select" | "textarea")))
            .filter_map(|node| {
                let name = self.attr(node, "name")?.to_string();
                let kind = self.field_kind(node)?;
                Some(FormField {
                    node,
                    label: self.field_label(node, &name),
                    value: self.value(node),
                    required: self.attr(node, "required").is_some(),
                    name,
                    kind,
                })
            })
            .collect()
    }

    fn field_kind(&self, node: NodeId) -> Option<FieldKind> {
        match self.tag(node)? {
            "select" => Some(FieldKind::Select(
                self.elements_by_tag(node, "option")
                    .into_iter()
                    .map(|opt| (self.option_value(opt), self.text_content(opt)))
                    .collect(),
            )),
            "textarea" => Some(FieldKind::TextArea),
            _ => match self.attr(node, "type").unwrap_or("text") {
                "checkbox" => Some(FieldKind::Checkbox),
                "number" => Some(FieldKind::Number),
                "date" => Some(FieldKind::Date),
                "time" => Some(FieldKind::Time),
                "submit" | "button" | "hidden" | "file" => None,
                _ => Some(FieldKind::Text),
            },
        }
    }

    /// `<label for=…>` text, else the placeholder, else the field name.
    fn field_label(&self, node: NodeId, name: &str) -> String {
        if let Some(id) = self.attr(node, "id") {
            let label = self
                .elements_by_tag(self.root, "label")
                .into_iter()
                .find(|label| self.attr(*label, "for") == Some(id))
                .map(|label| self.text_content(label))
                .filter(|text| !text.is_empty());
            if let Some(label) = label {
                return label;
            }
        }
        self.attr(node, "placeholder")
            .filter(|p| !p.is_empty())
            .unwrap_or(name)
            .to_string()
    }

    /// Snapshot of a form's values keyed by control name.
    pub fn form_data(&self, form: NodeId) -> FormData {
        let mut data = FormData::default();
        for field in self.form_fields(form) {
            data.insert(field.name, field.value);
        }
        data
    }

    /// Restore every control of a form to empty / its first option.
    pub fn reset_form(&mut self, form: NodeId) {
        for field in self.form_fields(form) {
            match field.kind {
                FieldKind::Select(options) => {
                    let first = options.first().map(|(value, _)| value.clone()).unwrap_or_default();
                    self.set_value(field.node, &first);
                }
                _ => self.set_value(field.node, ""),
            }
        }
    }

    // ── Parsing ─────────────────────────────────────────────────────────

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_text(&mut self, parent: NodeId, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let verbatim = self
            .tag(parent)
            .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
        let decoded = decode_entities(raw);
        let text = if verbatim {
            decoded
        } else {
            collapse_whitespace(&decoded)
        };
        if text.trim().is_empty() {
            return;
        }
        self.append(parent, NodeKind::Text(text));
    }

    fn parse_into(&mut self, parent: NodeId, markup: &str) {
        let mut stack = vec![parent];
        let mut last = 0;

        for caps in TAG_RE.captures_iter(markup) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let top = stack.last().copied().unwrap_or(parent);
            self.push_text(top, &markup[last..whole.start()]);
            last = whole.end();

            if whole.as_str().starts_with("<!--") {
                continue;
            }

            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let tag = caps
                .get(2)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();

            if closing {
                // Pop back to the matching open element; never past `parent`.
                let matching = stack
                    .iter()
                    .rposition(|id| self.tag(*id) == Some(tag.as_str()));
                if let Some(pos) = matching.filter(|pos| *pos > 0) {
                    stack.truncate(pos);
                }
                continue;
            }

            let attrs = parse_attrs(caps.get(3).map_or("", |m| m.as_str()));
            let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty())
                || VOID_ELEMENTS.contains(&tag.as_str());
            let id = self.append(top, NodeKind::Element(Element { tag, attrs }));
            if !self_closing {
                stack.push(id);
            }
        }

        let top = stack.last().copied().unwrap_or(parent);
        self.push_text(top, &markup[last..]);
    }
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&copy;", "©")
        .replace("&amp;", "&")
}

/// Escape user data before interpolating it into markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Time,
    TextArea,
    Checkbox,
    /// Options as `(value, label)` pairs.
    Select(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub node: NodeId,
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
}

/// Submitted form values keyed by control name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    values: HashMap<String, String>,
}

impl FormData {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Trimmed value, or "" when the control is absent.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(|v| v.trim()).unwrap_or("")
    }

    pub fn checked(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    pub fn number<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).parse().ok()
    }

    /// Names of `required` controls that were left blank.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.get(name).is_empty())
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = FormData::default();
        for (name, value) in iter {
            data.insert(name, value);
        }
        data
    }
}
