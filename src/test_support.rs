//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::core::content::{ContentError, ContentSource, EmbeddedContentSource};
use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent, TaskOutput};
use crate::core::markup::{Document, FormData};
use crate::core::toast::Toasts;

/// An in-memory content source.
#[derive(Default)]
pub struct StaticContent {
    pages: HashMap<String, String>,
}

impl StaticContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, markup: &str) -> Self {
        self.pages.insert(path.to_string(), markup.to_string());
        self
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(path.to_string()))
    }
}

/// A minimal shell: a nav bar and the content region.
pub fn shell() -> Document {
    Document::parse(
        r#"<nav><ul class="nav-links">
             <li><a data-tab="home">Home</a></li>
             <li><a data-tab="about">About</a></li>
           </ul></nav>
           <main id="content-container"></main>"#,
    )
}

/// Controller that appends lifecycle calls to a shared log.
pub struct RecordingController {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingController {
    pub fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { name, log }
    }
}

impl Controller for RecordingController {
    fn init(&mut self, _ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.log.lock().unwrap().push(format!("init:{}", self.name));
        Ok(())
    }

    fn cleanup(&mut self) {
        self.log.lock().unwrap().push(format!("cleanup:{}", self.name));
    }

    fn handle(
        &mut self,
        event: PageEvent,
        _ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let entry = match event {
            PageEvent::Submit { form, .. } => format!("submit:{}:{form}", self.name),
            PageEvent::Action { name, value } => format!(
                "action:{}:{name}:{}",
                self.name,
                value.unwrap_or_default()
            ),
            PageEvent::Task(_) => format!("task:{}", self.name),
        };
        self.log.lock().unwrap().push(entry);
        Ok(())
    }
}

/// A page fragment detached from any router, for driving one controller
/// directly.
pub struct TestPage {
    pub doc: Document,
    pub toasts: Toasts,
    pub tasks: Vec<BoxFuture<'static, TaskOutput>>,
}

impl TestPage {
    /// Parse the embedded fragment for `page`.
    pub fn load(page: &str) -> Self {
        let markup = EmbeddedContentSource::get(&format!("{page}.html"))
            .unwrap_or_else(|| panic!("no embedded page {page}"));
        Self {
            doc: Document::parse(markup),
            toasts: Toasts::default(),
            tasks: Vec::new(),
        }
    }

    pub fn ctx(&mut self) -> PageContext<'_> {
        PageContext::new(&mut self.doc, &mut self.toasts, &mut self.tasks)
    }

    pub fn init(&mut self, controller: &mut dyn Controller) {
        let mut ctx = self.ctx();
        controller.init(&mut ctx).unwrap();
    }

    pub fn submit(&mut self, controller: &mut dyn Controller, form: &str, values: &[(&str, &str)]) {
        let data: FormData = values.iter().copied().collect();
        let mut ctx = self.ctx();
        controller
            .handle(
                PageEvent::Submit {
                    form: form.to_string(),
                    data,
                },
                &mut ctx,
            )
            .unwrap();
    }

    pub fn action(&mut self, controller: &mut dyn Controller, name: &str, value: Option<&str>) {
        let mut ctx = self.ctx();
        controller
            .handle(
                PageEvent::Action {
                    name: name.to_string(),
                    value: value.map(str::to_string),
                },
                &mut ctx,
            )
            .unwrap();
    }

    /// Await queued tasks and feed their output back until none remain.
    pub async fn run_tasks(&mut self, controller: &mut dyn Controller) {
        while !self.tasks.is_empty() {
            let batch: Vec<_> = self.tasks.drain(..).collect();
            for task in batch {
                let output = task.await;
                let mut ctx = self.ctx();
                controller.handle(PageEvent::Task(output), &mut ctx).unwrap();
            }
        }
    }

    /// Whitespace-normalized text of the element with `id`.
    pub fn text(&self, id: &str) -> String {
        let node = self
            .doc
            .get_element_by_id(id)
            .unwrap_or_else(|| panic!("no element #{id}"));
        self.doc.text_content(node)
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.doc
            .get_element_by_id(id)
            .is_some_and(|node| self.doc.has_class(node, "hidden"))
    }

    pub fn last_toast(&self) -> Option<&str> {
        self.toasts.last_message()
    }
}
