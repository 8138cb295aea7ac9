//! # Travel Documents
//!
//! Document records and dated reminders, stored under the `documents` and
//! `reminders` keys. Opening the page nags about reminders that are due
//! today or overdue.

use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent};
use crate::core::format::format_date;
use crate::core::markup::{FormData, escape};
use crate::core::storage::LocalStore;
use crate::core::toast::ToastKind;

pub const DOCUMENTS_KEY: &str = "documents";
pub const REMINDERS_KEY: &str = "reminders";

const TODAY_NOTICE_DELAY: Duration = Duration::from_millis(1500);
const OVERDUE_NOTICE_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelDocument {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub file_name: String,
    pub created_at: String,
}

impl TravelDocument {
    fn type_label(&self) -> &str {
        match self.doc_type.as_str() {
            "passport" => "Passport",
            "visa" => "Visa",
            "ticket" => "Ticket",
            "hotel" => "Hotel",
            "insurance" => "Insurance",
            "id" => "ID Card",
            "other" => "Other",
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default = "medium")]
    pub priority: String,
    #[serde(default)]
    pub completed: bool,
}

fn medium() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    Today,
    Overdue,
    Upcoming,
}

impl ReminderStatus {
    /// Dates compare as `YYYY-MM-DD` strings.
    pub fn of(date: &str, today: &str) -> Self {
        if date == today {
            ReminderStatus::Today
        } else if date < today {
            ReminderStatus::Overdue
        } else {
            ReminderStatus::Upcoming
        }
    }

    fn badge(self) -> (&'static str, &'static str) {
        match self {
            ReminderStatus::Today => ("today", "Today"),
            ReminderStatus::Overdue => ("overdue", "Overdue"),
            ReminderStatus::Upcoming => ("upcoming", "Upcoming"),
        }
    }
}

pub struct DocumentStore {
    store: LocalStore,
    documents: Vec<TravelDocument>,
    reminders: Vec<Reminder>,
    today: Option<NaiveDate>,
}

impl DocumentStore {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            documents: Vec::new(),
            reminders: Vec::new(),
            today: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn documents(&self) -> &[TravelDocument] {
        &self.documents
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    fn today(&self) -> String {
        self.today
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string()
    }

    fn check_reminders(&self, ctx: &mut PageContext<'_>) {
        let today = self.today();
        let (mut due, mut overdue) = (0, 0);
        for reminder in &self.reminders {
            match ReminderStatus::of(&reminder.date, &today) {
                ReminderStatus::Today => due += 1,
                ReminderStatus::Overdue => overdue += 1,
                ReminderStatus::Upcoming => {}
            }
        }
        if due > 0 {
            ctx.toast_after(
                format!("You have {due} reminder(s) for today!"),
                ToastKind::Warning,
                TODAY_NOTICE_DELAY,
            );
        }
        if overdue > 0 {
            ctx.toast_after(
                format!("You have {overdue} overdue reminder(s)!"),
                ToastKind::Error,
                OVERDUE_NOTICE_DELAY,
            );
        }
    }

    // ── Documents ──────────────────────────────────────────────────────

    fn save_document(
        &mut self,
        data: &FormData,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        if !data.missing(&["name"]).is_empty() {
            ctx.toast("Please enter a document name", ToastKind::Warning);
            return Ok(());
        }
        let doc_type = match data.get("type") {
            "" => "other",
            t => t,
        };
        self.documents.push(TravelDocument {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.get("name").to_string(),
            doc_type: doc_type.to_string(),
            expiry: data.get("expiry").to_string(),
            notes: data.get("notes").to_string(),
            file_name: data.get("fileName").to_string(),
            created_at: Utc::now().to_rfc3339(),
        });
        self.store.save(DOCUMENTS_KEY, &self.documents)?;
        ctx.reset_form("docForm")?;
        self.render_documents(ctx)?;
        ctx.toast("Document saved securely!", ToastKind::Success);
        Ok(())
    }

    fn delete_document(
        &mut self,
        id: &str,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        self.documents.retain(|d| d.id != id);
        self.store.save(DOCUMENTS_KEY, &self.documents)?;
        self.render_documents(ctx)?;
        ctx.toast("Document removed", ToastKind::Warning);
        Ok(())
    }

    fn render_documents(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.documents.is_empty() {
            return ctx.set_html(
                "documentsList",
                r#"<div class="empty-state"><p>No documents stored yet</p></div>"#,
            );
        }
        let items: String = self
            .documents
            .iter()
            .map(|doc| {
                let detail = if !doc.expiry.is_empty() {
                    format!("Expires: {}", format_date(&doc.expiry))
                } else if !doc.notes.is_empty() {
                    escape(&doc.notes)
                } else {
                    escape(doc.type_label())
                };
                let file = if doc.file_name.is_empty() {
                    String::new()
                } else {
                    format!(r#"<p class="doc-file">File: {}</p>"#, escape(&doc.file_name))
                };
                format!(
                    r#"<div class="doc-item"><span class="doc-icon {class}">[{label}]</span> <div class="doc-info"><h4>{name}</h4><p>{detail}</p>{file}</div><button class="btn-delete" data-action="delete-document" data-id="{id}">Delete</button></div>"#,
                    class = escape(&doc.doc_type),
                    label = escape(doc.type_label()),
                    name = escape(&doc.name),
                    id = doc.id,
                )
            })
            .collect();
        ctx.set_html("documentsList", &items)
    }

    // ── Reminders ──────────────────────────────────────────────────────

    fn save_reminder(
        &mut self,
        data: &FormData,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        if !data.missing(&["title", "date"]).is_empty() {
            ctx.toast("Please enter a reminder and a date", ToastKind::Warning);
            return Ok(());
        }
        let priority = match data.get("priority") {
            "" => "medium",
            p => p,
        };
        self.reminders.push(Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            title: data.get("title").to_string(),
            date: data.get("date").to_string(),
            priority: priority.to_string(),
            completed: false,
        });
        self.store.save(REMINDERS_KEY, &self.reminders)?;
        ctx.reset_form("reminderForm")?;
        self.render_reminders(ctx)?;
        ctx.toast("Reminder set!", ToastKind::Success);
        Ok(())
    }

    fn delete_reminder(
        &mut self,
        id: &str,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        self.reminders.retain(|r| r.id != id);
        self.store.save(REMINDERS_KEY, &self.reminders)?;
        self.render_reminders(ctx)
    }

    fn render_reminders(&self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        if self.reminders.is_empty() {
            return ctx.set_html(
                "remindersList",
                r#"<div class="empty-state"><p>No reminders set yet</p></div>"#,
            );
        }
        let today = self.today();
        let mut sorted: Vec<&Reminder> = self.reminders.iter().collect();
        sorted.sort_by(|a, b| a.date.cmp(&b.date));

        let items: String = sorted
            .into_iter()
            .map(|r| {
                let (badge, badge_text) = ReminderStatus::of(&r.date, &today).badge();
                format!(
                    r#"<div class="reminder-item"><span class="reminder-priority {priority}">*</span> <div class="reminder-info"><h4>{title}</h4><p>{date}</p></div><span class="reminder-badge {badge}">{badge_text}</span> <button class="btn-delete" data-action="delete-reminder" data-id="{id}">Delete</button></div>"#,
                    priority = escape(&r.priority),
                    title = escape(&r.title),
                    date = format_date(&r.date),
                    id = r.id,
                )
            })
            .collect();
        ctx.set_html("remindersList", &items)
    }
}

impl Controller for DocumentStore {
    fn init(&mut self, ctx: &mut PageContext<'_>) -> Result<(), ControllerError> {
        self.documents = self.store.load(DOCUMENTS_KEY).unwrap_or_default();
        self.reminders = self.store.load(REMINDERS_KEY).unwrap_or_default();
        self.render_documents(ctx)?;
        self.render_reminders(ctx)?;
        self.check_reminders(ctx);
        Ok(())
    }

    fn handle(
        &mut self,
        event: PageEvent,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), ControllerError> {
        match event {
            PageEvent::Submit { form, data } => match form.as_str() {
                "docForm" => self.save_document(&data, ctx),
                "reminderForm" => self.save_reminder(&data, ctx),
                _ => Ok(()),
            },
            PageEvent::Action { name, value } => {
                let id = value.unwrap_or_default();
                match name.as_str() {
                    "delete-document" => self.delete_document(&id, ctx),
                    "delete-reminder" => self.delete_reminder(&id, ctx),
                    _ => Ok(()),
                }
            }
            PageEvent::Task(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestPage;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn reminder(date: &str) -> Reminder {
        Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            title: format!("Due {date}"),
            date: date.to_string(),
            priority: "high".to_string(),
            completed: false,
        }
    }

    #[test]
    fn test_status_compares_iso_dates() {
        assert_eq!(ReminderStatus::of("2026-06-15", "2026-06-15"), ReminderStatus::Today);
        assert_eq!(ReminderStatus::of("2026-06-14", "2026-06-15"), ReminderStatus::Overdue);
        assert_eq!(ReminderStatus::of("2026-07-01", "2026-06-15"), ReminderStatus::Upcoming);
    }

    #[test]
    fn test_save_document_with_file_name() {
        let store = LocalStore::in_memory();
        let mut page = TestPage::load("documents");
        let mut docs = DocumentStore::new(store.clone()).with_today(today());
        page.init(&mut docs);
        assert!(page.text("documentsList").contains("No documents stored yet"));

        page.submit(
            &mut docs,
            "docForm",
            &[
                ("name", "My passport"),
                ("type", "passport"),
                ("expiry", "2030-01-31"),
                ("fileName", "scan.pdf"),
            ],
        );
        let list = page.text("documentsList");
        assert!(list.contains("My passport"));
        assert!(list.contains("Expires: Jan 31, 2030"));
        assert!(list.contains("File: scan.pdf"));
        assert_eq!(page.last_toast(), Some("Document saved securely!"));

        let saved: Vec<TravelDocument> = store.load(DOCUMENTS_KEY).unwrap();
        assert_eq!(saved[0].doc_type, "passport");
    }

    #[test]
    fn test_document_without_expiry_shows_notes_or_type() {
        let mut page = TestPage::load("documents");
        let mut docs = DocumentStore::new(LocalStore::in_memory()).with_today(today());
        page.init(&mut docs);
        page.submit(&mut docs, "docForm", &[("name", "Policy"), ("type", "insurance")]);
        assert!(page.text("documentsList").contains("Policy Insurance"));
    }

    #[test]
    fn test_delete_document() {
        let mut page = TestPage::load("documents");
        let mut docs = DocumentStore::new(LocalStore::in_memory()).with_today(today());
        page.init(&mut docs);
        page.submit(&mut docs, "docForm", &[("name", "Ticket"), ("type", "ticket")]);
        let id = docs.documents()[0].id.clone();
        page.action(&mut docs, "delete-document", Some(&id));
        assert!(docs.documents().is_empty());
        assert_eq!(page.last_toast(), Some("Document removed"));
    }

    #[test]
    fn test_reminders_sorted_with_badges() {
        let store = LocalStore::in_memory();
        store
            .save(
                REMINDERS_KEY,
                &vec![
                    reminder("2026-07-01"),
                    reminder("2026-06-10"),
                    reminder("2026-06-15"),
                ],
            )
            .unwrap();
        let mut page = TestPage::load("documents");
        let mut docs = DocumentStore::new(store).with_today(today());
        page.init(&mut docs);

        assert_eq!(
            page.text("remindersList"),
            "* Due 2026-06-10 Jun 10, 2026 Overdue Delete \
             * Due 2026-06-15 Jun 15, 2026 Today Delete \
             * Due 2026-07-01 Jul 1, 2026 Upcoming Delete"
        );
    }

    #[test]
    fn test_due_and_overdue_notices_are_delayed() {
        let store = LocalStore::in_memory();
        store
            .save(
                REMINDERS_KEY,
                &vec![reminder("2026-06-15"), reminder("2026-06-01"), reminder("2026-05-01")],
            )
            .unwrap();
        let mut page = TestPage::load("documents");
        let mut docs = DocumentStore::new(store).with_today(today());
        page.init(&mut docs);

        let messages: Vec<&str> = page.toasts.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(
            messages,
            ["You have 1 reminder(s) for today!", "You have 2 overdue reminder(s)!"]
        );
        let now = std::time::Instant::now();
        assert!(page.toasts.visible(now).is_empty());
        assert_eq!(page.toasts.visible(now + Duration::from_millis(1600)).len(), 1);
        assert_eq!(page.toasts.visible(now + Duration::from_millis(3100)).len(), 2);
    }

    #[test]
    fn test_reminder_requires_title_and_date() {
        let mut page = TestPage::load("documents");
        let mut docs = DocumentStore::new(LocalStore::in_memory()).with_today(today());
        page.init(&mut docs);
        page.submit(&mut docs, "reminderForm", &[("title", "Renew visa")]);
        assert!(docs.reminders().is_empty());

        page.submit(&mut docs, "reminderForm", &[("title", "Renew visa"), ("date", "2026-06-20")]);
        assert_eq!(docs.reminders()[0].priority, "medium");
        let id = docs.reminders()[0].id.clone();
        page.action(&mut docs, "delete-reminder", Some(&id));
        assert!(page.text("remindersList").contains("No reminders set yet"));
    }
}
