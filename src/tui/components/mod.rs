//! # TUI Components
//!
//! All UI components for the terminal host.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as struct fields:
//! - `TitleBar`: app name, current page, status
//! - `NavBar`: the shell's tab strip
//! - `ToastStack`: notification overlay
//! - `LandingPage`: splash until the first page arrives
//! - `MapCanvas`: world map for the `#map` element
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `ContentView`: scrollable content region with focus and hit testing
//!   (state in `ContentViewState`)
//! - `FieldEditor`: uncommitted text of the field being edited
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (top status bar)
//! ├── nav_bar.rs       (tab strip + tab hit testing)
//! ├── content_view.rs  (scrollable page, focus, clicks)
//! ├── field_editor.rs  (text entry for form fields)
//! ├── map_canvas.rs    (world map and pins)
//! ├── toast_stack.rs   (notifications)
//! └── landing.rs       (splash)
//! ```

pub mod content_view;
pub mod field_editor;
pub mod landing;
pub mod map_canvas;
pub mod nav_bar;
pub mod title_bar;
pub mod toast_stack;

pub use content_view::{ContentHit, ContentView, ContentViewState};
pub use field_editor::{EditEvent, FieldEditor};
pub use landing::LandingPage;
pub use nav_bar::NavBar;
pub use title_bar::TitleBar;
pub use toast_stack::{ToastLine, ToastStack};
