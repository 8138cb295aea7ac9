//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use globemate::core::content::{ContentError, ContentSource};
use globemate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use globemate::core::markup::Document;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// In-memory pages keyed by fragment path. Records every requested path.
#[derive(Default)]
pub struct MemoryPages {
    pages: HashMap<String, String>,
    fetches: Log,
}

impl MemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: &str, markup: &str) -> Self {
        self.pages.insert(format!("{page}.html"), markup.to_string());
        self
    }

    pub fn fetch_log(&self) -> Log {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl ContentSource for MemoryPages {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        self.fetches.lock().unwrap().push(path.to_string());
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(path.to_string()))
    }
}

pub fn shell() -> Document {
    Document::parse(
        r#"<nav><ul class="nav-links">
             <li><a data-tab="home">Home</a></li>
             <li><a data-tab="about">About</a></li>
             <li><a data-tab="broken">Broken</a></li>
           </ul></nav>
           <main id="content-container"></main>
           <footer><span id="footer-note">Safe travels</span></footer>"#,
    )
}

/// Records lifecycle calls and events. Can be told to fail `init` or to
/// queue a task from it.
pub struct Probe {
    name: &'static str,
    log: Log,
    fail_init: bool,
    spawn_on_init: bool,
}

impl Probe {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            fail_init: false,
            spawn_on_init: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn spawning(mut self) -> Self {
        self.spawn_on_init = true;
        self
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl Controller for Probe {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.push(format!("init:{}", self.name));
        if self.spawn_on_init {
            let name = self.name;
            ctx.spawn(async move { format!("{name} loaded") });
        }
        if self.fail_init {
            return Err(ControllerError::MissingElement("probe-list".to_string()));
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        self.push(format!("cleanup:{}", self.name));
    }

    fn handle(
        &mut self,
        event: PageEvent,
        _ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        let entry = match event {
            PageEvent::Submit { form, data } => {
                format!("submit:{}:{form}:{}", self.name, data.get("title"))
            }
            PageEvent::Action { name, .. } => format!("action:{}:{name}", self.name),
            PageEvent::Task(output) => match output.downcast::<String>() {
                Ok(message) => format!("task:{}:{message}", self.name),
                Err(_) => format!("task:{}:?", self.name),
            },
        };
        self.push(entry);
        Ok(())
    }
}
