//! # Toasts
//!
//! Transient notifications. A toast becomes visible at `shown_at` (which may
//! be in the future for delayed reminders), stays for the display duration,
//! then spends [`REMOVAL_DURATION`] in the removing phase before `prune`
//! drops it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_millis(3500);
pub const REMOVAL_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "✔",
            ToastKind::Error => "✖",
            ToastKind::Warning => "⚠",
            ToastKind::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Showing,
    Removing,
}

#[derive(Debug)]
pub struct Toasts {
    queue: VecDeque<Toast>,
    display: Duration,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_DURATION)
    }
}

impl Toasts {
    pub fn new(display: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            display,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.show_at(message, kind, Instant::now());
    }

    /// Queue a toast that appears once `delay` has elapsed.
    pub fn show_after(&mut self, message: impl Into<String>, kind: ToastKind, delay: Duration) {
        self.show_at(message, kind, Instant::now() + delay);
    }

    pub fn show_at(&mut self, message: impl Into<String>, kind: ToastKind, at: Instant) {
        self.queue.push_back(Toast {
            message: message.into(),
            kind,
            shown_at: at,
        });
    }

    /// Toasts on screen at `now`, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<(&Toast, ToastPhase)> {
        self.queue
            .iter()
            .filter_map(|toast| self.phase(toast, now).map(|phase| (toast, phase)))
            .collect()
    }

    fn phase(&self, toast: &Toast, now: Instant) -> Option<ToastPhase> {
        let elapsed = now.checked_duration_since(toast.shown_at)?;
        if elapsed < self.display {
            Some(ToastPhase::Showing)
        } else if elapsed < self.display + REMOVAL_DURATION {
            Some(ToastPhase::Removing)
        } else {
            None
        }
    }

    /// Drop toasts whose removal phase has ended.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.display + REMOVAL_DURATION;
        self.queue.retain(|toast| {
            now.checked_duration_since(toast.shown_at)
                .is_none_or(|elapsed| elapsed < lifetime)
        });
    }

    /// Every queued toast, including ones not yet due.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Most recent toast message; handy for assertions.
    pub fn last_message(&self) -> Option<&str> {
        self.queue.back().map(|toast| toast.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_over_lifetime() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.show_at("Trip saved", ToastKind::Success, start);

        assert_eq!(toasts.visible(start)[0].1, ToastPhase::Showing);
        let removing = start + Duration::from_millis(3600);
        assert_eq!(toasts.visible(removing)[0].1, ToastPhase::Removing);
        let gone = start + Duration::from_millis(3900);
        assert!(toasts.visible(gone).is_empty());

        toasts.prune(gone);
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_delayed_toast_is_hidden_until_due() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.show_at("Reminder", ToastKind::Warning, start + Duration::from_millis(1500));

        assert!(toasts.visible(start).is_empty());
        toasts.prune(start);
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.visible(start + Duration::from_secs(2)).len(), 1);
    }

    #[test]
    fn test_custom_display_duration() {
        let mut toasts = Toasts::new(Duration::from_millis(100));
        let start = Instant::now();
        toasts.show_at("quick", ToastKind::Info, start);
        assert_eq!(
            toasts.visible(start + Duration::from_millis(150))[0].1,
            ToastPhase::Removing
        );
    }

    #[test]
    fn test_last_message() {
        let mut toasts = Toasts::default();
        toasts.show("first", ToastKind::Success);
        toasts.show("second", ToastKind::Error);
        assert_eq!(toasts.last_message(), Some("second"));
        assert_eq!(ToastKind::Error.icon(), "✖");
    }
}
