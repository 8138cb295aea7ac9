//! # Page Controllers
//!
//! A controller owns the behavior of one page: it renders its collection
//! into slots of the attached markup and reacts to form submissions and
//! element actions. The router drives the lifecycle:
//!
//! ```text
//!   markup attached ──► init(ctx) ──► handle(event, ctx)* ──► cleanup()
//! ```
//!
//! `init` runs exactly once per activation, after the page markup is in the
//! document; `cleanup` runs exactly once before the controller is
//! deactivated. Async side work is queued through [`PageContext::spawn`] and
//! comes back as [`PageEvent::Task`] while the same activation is current.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::core::markup::{Document, FormData, NodeId};
use crate::core::storage::StorageError;
use crate::core::toast::{ToastKind, Toasts};

/// Output of a controller task, downcast by the controller that queued it.
pub type TaskOutput = Box<dyn Any + Send>;

/// Something that happened on the controller's page.
pub enum PageEvent {
    Submit { form: String, data: FormData },
    Action { name: String, value: Option<String> },
    Task(TaskOutput),
}

impl fmt::Debug for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEvent::Submit { form, data } => f
                .debug_struct("Submit")
                .field("form", form)
                .field("data", data)
                .finish(),
            PageEvent::Action { name, value } => f
                .debug_struct("Action")
                .field("name", name)
                .field("value", value)
                .finish(),
            PageEvent::Task(_) => f.write_str("Task(..)"),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ControllerError {
    /// An element the controller renders into is absent from the page.
    MissingElement(String),
    Storage(StorageError),
    Invalid(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::MissingElement(id) => write!(f, "missing element #{id}"),
            ControllerError::Storage(e) => write!(f, "{e}"),
            ControllerError::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<StorageError> for ControllerError {
    fn from(e: StorageError) -> Self {
        ControllerError::Storage(e)
    }
}

// ============================================================================
// Trait
// ============================================================================

pub trait Controller: Send {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError>;

    fn cleanup(&mut self) {}

    fn handle(
        &mut self,
        _event: PageEvent,
        _ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        Ok(())
    }
}

// ============================================================================
// PageContext
// ============================================================================

/// What a controller may touch while it runs: the document, the toast
/// queue, and the task queue.
pub struct PageContext<'a> {
    pub doc: &'a mut Document,
    pub toasts: &'a mut Toasts,
    tasks: &'a mut Vec<BoxFuture<'static, TaskOutput>>,
}

impl<'a> PageContext<'a> {
    pub fn new(
        doc: &'a mut Document,
        toasts: &'a mut Toasts,
        tasks: &'a mut Vec<BoxFuture<'static, TaskOutput>>,
    ) -> Self {
        Self { doc, toasts, tasks }
    }

    /// Queue async work. Its output is delivered back as
    /// [`PageEvent::Task`] if this activation is still current.
    pub fn spawn<F, T>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
        T: Any + Send,
    {
        self.tasks
            .push(future.map(|output| Box::new(output) as TaskOutput).boxed());
    }

    pub fn toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toasts.show(message, kind);
    }

    pub fn toast_after(&mut self, message: impl Into<String>, kind: ToastKind, delay: Duration) {
        self.toasts.show_after(message, kind, delay);
    }

    pub fn element(&self, id: &str) -> Result<NodeId, ControllerError> {
        self.doc
            .get_element_by_id(id)
            .ok_or_else(|| ControllerError::MissingElement(id.to_string()))
    }

    pub fn has_element(&self, id: &str) -> bool {
        self.doc.get_element_by_id(id).is_some()
    }

    pub fn set_html(&mut self, id: &str, markup: &str) -> Result<(), ControllerError> {
        let node = self.element(id)?;
        self.doc.set_inner_html(node, markup);
        Ok(())
    }

    pub fn set_text(&mut self, id: &str, text: &str) -> Result<(), ControllerError> {
        let node = self.element(id)?;
        self.doc.set_text_content(node, text);
        Ok(())
    }

    /// Toggle the `hidden` class.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> Result<(), ControllerError> {
        let node = self.element(id)?;
        self.doc.set_class(node, "hidden", hidden);
        Ok(())
    }

    pub fn value(&self, id: &str) -> Result<String, ControllerError> {
        Ok(self.doc.value(self.element(id)?))
    }

    pub fn set_value(&mut self, id: &str, value: &str) -> Result<(), ControllerError> {
        let node = self.element(id)?;
        self.doc.set_value(node, value);
        Ok(())
    }

    pub fn reset_form(&mut self, id: &str) -> Result<(), ControllerError> {
        let node = self.element(id)?;
        self.doc.reset_form(node);
        Ok(())
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }
}
