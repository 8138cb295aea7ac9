//! # Tab Navigation
//!
//! Resolves activations on markup elements into what they mean, and keeps
//! the shell's nav bar in sync with the current page.
//!
//! Any element carrying `data-tab` navigates, whether it sits in the nav bar
//! or inside a page ("Plan a trip" buttons on the home page). Elements with
//! `data-action` are routed to the active controller, and anything inside a
//! `<form id=…>` opens that form.

use crate::core::markup::{Document, NodeId};
use crate::core::page::PageId;

pub const NAV_CONTAINER_CLASS: &str = "nav-links";
pub const ACTIVE_TAB_CLASS: &str = "active-tab";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Navigate(PageId),
    Action { name: String, value: Option<String> },
    Form(String),
}

/// What activating `target` does, walking its ancestry. `None` for
/// unrelated elements.
pub fn resolve_trigger(doc: &Document, target: NodeId) -> Option<Trigger> {
    if let Some(tab) = doc.closest(target, "data-tab") {
        let page = doc.attr(tab, "data-tab")?.trim();
        if !page.is_empty() {
            return Some(Trigger::Navigate(PageId::from(page)));
        }
    }
    if let Some(action) = doc.closest(target, "data-action") {
        let name = doc.attr(action, "data-action")?.to_string();
        let value = doc.attr(action, "data-id").map(str::to_string);
        return Some(Trigger::Action { name, value });
    }
    let form = doc.closest_tag(target, "form")?;
    doc.attr(form, "id").map(|id| Trigger::Form(id.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub node: NodeId,
    pub page: PageId,
    pub label: String,
    pub active: bool,
}

/// `data-tab` links inside the nav container(s), in document order.
pub fn nav_links(doc: &Document) -> Vec<NavLink> {
    nav_link_nodes(doc)
        .into_iter()
        .filter_map(|node| {
            let page = PageId::from(doc.attr(node, "data-tab")?);
            let label = doc.text_content(node);
            Some(NavLink {
                node,
                label: if label.is_empty() { page.title() } else { label },
                active: doc.has_class(node, ACTIVE_TAB_CLASS),
                page,
            })
        })
        .collect()
}

fn nav_link_nodes(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|node| doc.has_class(*node, NAV_CONTAINER_CLASS))
        .flat_map(|container| doc.elements_with_attr(container, "data-tab"))
        .collect()
}

/// Move the active-tab marker to the nav link for `page`. Returns false
/// when no nav link targets that page (every marker is still cleared).
pub fn mark_active_tab(doc: &mut Document, page: &PageId) -> bool {
    let mut found = false;
    for node in nav_link_nodes(doc) {
        let is_target = doc.attr(node, "data-tab") == Some(page.as_str());
        doc.set_class(node, ACTIVE_TAB_CLASS, is_target);
        found |= is_target;
    }
    found
}
