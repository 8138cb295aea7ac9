//! # Core Application Logic
//!
//! The page loader and everything it stands on. Nothing here knows about
//! terminals; a host feeds it clicks, submissions and finished futures and
//! draws whatever document results.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │                         │
//!                    │  • Router (navigation)  │
//!                    │  • Document (markup)    │
//!                    │  • Controller (pages)   │
//!                    │  • Toasts, storage      │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  Features  │      │  Content   │
//!     │   host     │      │ (page ctl) │      │  sources   │
//!     │ (ratatui)  │      │            │      │ (fs/http)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`router`]: registration, navigation, activation and task delivery
//! - [`controller`]: the `Controller` trait and its `PageContext`
//! - [`markup`]: the arena document, parsing and form helpers
//! - [`navigation`]: nav links, active-tab marking, trigger resolution
//! - [`content`]: where page fragments come from
//! - [`config`]: `~/.globemate/config.toml` and its resolution
//! - [`storage`]: JSON key/value persistence
//! - [`toast`]: timed notifications
//! - [`format`]: dates, numbers and amounts for display

pub mod config;
pub mod content;
pub mod controller;
pub mod format;
pub mod markup;
pub mod navigation;
pub mod page;
pub mod router;
pub mod storage;
pub mod toast;
