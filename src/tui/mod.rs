//! # TUI Host
//!
//! The ratatui-specific layer. Owns the terminal, draws the router's
//! document, and turns keys and clicks into router calls. Page fetches and
//! controller tasks run on tokio and report back over a channel, so the
//! loop itself never blocks on the network.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (navigation in flight, fade running, toasts on screen or
//!   pending): draws every ~80ms.
//! - **Idle**: sleeps up to 500ms and only redraws on events, resizes or
//!   finished background work.
//!
//! ## Keys
//!
//! | Key               | Action                                         |
//! |-------------------|------------------------------------------------|
//! | Tab / Shift+Tab   | Move focus between links, buttons and fields   |
//! | Enter / Space     | Activate the focused element                   |
//! | ←/→               | Previous/next tab (cycle options on a select)  |
//! | 1-9               | Jump to a tab                                  |
//! | ↑/↓ PgUp/PgDn     | Scroll                                         |
//! | Esc               | Cancel editing, clear focus                    |
//! | q, Ctrl+C         | Quit                                           |

mod component;
mod components;
mod event;
mod render;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;

use crate::core::content::ContentError;
use crate::core::controller::PageEvent;
use crate::core::markup::{Document, NodeId};
use crate::core::navigation::nav_links;
use crate::core::router::{
    Activation, NavigationOutcome, NavigationTicket, Router, RouterError, TaskResult,
};
use crate::tui::component::EventHandler;
use crate::tui::components::{ContentHit, ContentViewState, EditEvent, FieldEditor};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::render::{Control, control_kind, is_field};

const ANIMATING_TICK: Duration = Duration::from_millis(80);
const IDLE_TICK: Duration = Duration::from_millis(500);

/// Results of background work, delivered to the event loop.
#[derive(Debug)]
pub enum AppMessage {
    PageFetched(NavigationTicket, Result<String, ContentError>),
    TaskDone(TaskResult),
}

/// TUI-specific presentation state (not part of the router)
pub struct TuiState {
    pub content: ContentViewState,
    /// Field being edited (None = browsing)
    pub editor: Option<FieldEditor>,
    pub spinner_frame: usize,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            content: ContentViewState::new(),
            editor: None,
            spinner_frame: 0,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        info!("Terminal modes enabled (mouse, bracketed paste)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Attach `shell` to the router and run the terminal UI until the user quits.
///
/// Without a content region the router stays inert and only the shell is
/// shown. With the `propagate` init policy a controller failure ends the
/// loop with that error.
pub fn run(mut router: Router, shell: Document) -> std::io::Result<()> {
    let (tx, rx) = mpsc::channel();
    attach_shell(&mut router, shell, &tx);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut tui = TuiState::new();

    let result = event_loop(&mut terminal, &mut router, &mut tui, &tx, &rx);

    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    router: &mut Router,
    tui: &mut TuiState,
    tx: &mpsc::Sender<AppMessage>,
    rx: &mpsc::Receiver<AppMessage>,
) -> std::io::Result<()> {
    let start_time = Instant::now();
    let mut needs_redraw = true;

    loop {
        let now = Instant::now();
        router.toasts_mut().prune(now);

        let fading = router
            .region()
            .is_some_and(|region| region.is_fading(now, router.options().fade));
        let animating =
            fading || router.pending_page().is_some() || !router.toasts().is_empty();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            tui.spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, router, tui, now))?;
            needs_redraw = false;
        }

        let timeout = if animating { ANIMATING_TICK } else { IDLE_TICK };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain all pending events before next draw
        let frame_area = terminal.get_frame().area();
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(router, tui, event, tx, frame_area) == Flow::Quit {
                info!("Quit requested");
                return Ok(());
            }
        }

        while let Ok(message) = rx.try_recv() {
            needs_redraw = true;
            apply_message(router, tui, message, tx).map_err(std::io::Error::other)?;
        }
    }
}

/// Start the router on `shell` and fetch the default page.
fn attach_shell(router: &mut Router, shell: Document, tx: &mpsc::Sender<AppMessage>) {
    match router.start(shell) {
        Ok(Some(ticket)) => spawn_fetch(router, ticket, tx),
        Ok(None) => {}
        Err(e) => warn!("Running with the shell only: {e}"),
    }
}

// ── Background work ────────────────────────────────────────────────────────

fn spawn_fetch(router: &Router, ticket: NavigationTicket, tx: &mpsc::Sender<AppMessage>) {
    debug!("Spawning fetch for '{}'", ticket.page());
    let fetch = router.fetch(&ticket);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = fetch.await;
        if tx.send(AppMessage::PageFetched(ticket, result)).is_err() {
            warn!("Failed to deliver fetched page: receiver dropped");
        }
    });
}

/// Spawn whatever the active controller queued.
fn spawn_tasks(router: &mut Router, tx: &mpsc::Sender<AppMessage>) {
    for task in router.take_tasks() {
        debug!("Spawning task for '{}' (token {})", task.page, task.token);
        let run = task.run();
        let tx = tx.clone();
        tokio::spawn(async move {
            if tx.send(AppMessage::TaskDone(run.await)).is_err() {
                warn!("Failed to deliver task result: receiver dropped");
            }
        });
    }
}

fn apply_message(
    router: &mut Router,
    tui: &mut TuiState,
    message: AppMessage,
    tx: &mpsc::Sender<AppMessage>,
) -> Result<(), RouterError> {
    match message {
        AppMessage::PageFetched(ticket, result) => {
            let outcome = router.complete_navigation(ticket, result)?;
            debug!("Navigation outcome: {outcome:?}");
            if matches!(
                outcome,
                NavigationOutcome::Attached { .. } | NavigationOutcome::NotFound { .. }
            ) {
                tui.content.reset();
                tui.editor = None;
            }
        }
        AppMessage::TaskDone(result) => {
            router.deliver(result);
        }
    }
    spawn_tasks(router, tx);
    Ok(())
}

// ── Input ──────────────────────────────────────────────────────────────────

fn handle_event(
    router: &mut Router,
    tui: &mut TuiState,
    event: TuiEvent,
    tx: &mpsc::Sender<AppMessage>,
    frame_area: ratatui::layout::Rect,
) -> Flow {
    match event {
        TuiEvent::ForceQuit => return Flow::Quit,
        TuiEvent::Resize => return Flow::Continue,
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToTop => {
            tui.content.handle_event(&event);
            return Flow::Continue;
        }
        TuiEvent::MouseClick(col, row) => {
            // Clicking elsewhere keeps what was typed
            commit_editor(router, tui, false, tx);
            click(router, tui, col, row, frame_area, tx);
            return Flow::Continue;
        }
        _ => {}
    }

    // Editing swallows everything else
    if let Some(editor) = tui.editor.as_mut() {
        match editor.handle_event(&event) {
            Some(EditEvent::Commit) => commit_editor(router, tui, true, tx),
            Some(EditEvent::Blur) => {
                commit_editor(router, tui, false, tx);
                match event {
                    TuiEvent::FocusNext => tui.content.focus_next(),
                    TuiEvent::FocusPrev => tui.content.focus_prev(),
                    _ => {}
                }
            }
            Some(EditEvent::Cancel) => tui.editor = None,
            Some(EditEvent::Changed) | None => {}
        }
        return Flow::Continue;
    }

    match event {
        TuiEvent::InputChar('q') => return Flow::Quit,
        TuiEvent::FocusNext => tui.content.focus_next(),
        TuiEvent::FocusPrev => tui.content.focus_prev(),
        TuiEvent::Activate | TuiEvent::InputChar(' ') => {
            if let Some(node) = tui.content.focused_node() {
                activate(router, tui, node, tx);
            }
        }
        TuiEvent::Escape => tui.content.clear_focus(),
        TuiEvent::InputChar(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some(link) = nav_links(router.document()).get(index)
                && let Some(ticket) = router.handle_click(link.node)
            {
                spawn_fetch(router, ticket, tx);
            }
        }
        TuiEvent::Left | TuiEvent::Right => {
            let step = if event == TuiEvent::Left { -1 } else { 1 };
            match tui.content.focused_node() {
                Some(node) if control_kind(router.document(), node) == Some(Control::Select) => {
                    cycle_select(router, node, step);
                }
                _ => switch_tab(router, step, tx),
            }
        }
        _ => {}
    }
    Flow::Continue
}

fn click(
    router: &mut Router,
    tui: &mut TuiState,
    col: u16,
    row: u16,
    frame_area: ratatui::layout::Rect,
    tx: &mpsc::Sender<AppMessage>,
) {
    match ui::hit_test(frame_area, router, tui, col, row) {
        Some(ui::HitTarget::Tab(node)) => {
            if let Some(ticket) = router.handle_click(node) {
                spawn_fetch(router, ticket, tx);
            }
        }
        Some(ui::HitTarget::Content(ContentHit::Node(node))) => {
            tui.content.focus_node(node);
            activate(router, tui, node, tx);
        }
        Some(ui::HitTarget::Content(ContentHit::Map { lat, lng })) => {
            router.dispatch(PageEvent::Action {
                name: "drop-pin".to_string(),
                value: Some(format!("{lat:.6},{lng:.6}")),
            });
            spawn_tasks(router, tx);
        }
        None => {}
    }
}

/// Activate `node`: edit or toggle a field, otherwise hand it to the router
/// (navigation, controller action, or a form's submit button).
fn activate(
    router: &mut Router,
    tui: &mut TuiState,
    node: NodeId,
    tx: &mpsc::Sender<AppMessage>,
) {
    let doc = router.document();
    if is_field(doc, node) {
        match control_kind(doc, node) {
            Some(Control::Checkbox) => {
                let next = if doc.value(node).is_empty() { "on" } else { "" };
                router.document_mut().set_value(node, next);
            }
            Some(Control::Select) => cycle_select(router, node, 1),
            Some(Control::Text) => tui.editor = Some(FieldEditor::open(doc, node)),
            Some(Control::Button) | None => {}
        }
        return;
    }

    let is_button = control_kind(doc, node) == Some(Control::Button);
    match router.handle_activation(node) {
        Activation::Navigating(ticket) => spawn_fetch(router, ticket, tx),
        Activation::Dispatched => spawn_tasks(router, tx),
        Activation::Form(form) if is_button => {
            router.submit_form(&form);
            spawn_tasks(router, tx);
        }
        Activation::Form(_) | Activation::Ignored => {}
    }
}

/// Write the editor's buffer into its field; with `submit`, also submit the
/// enclosing form.
fn commit_editor(
    router: &mut Router,
    tui: &mut TuiState,
    submit: bool,
    tx: &mpsc::Sender<AppMessage>,
) {
    let Some(editor) = tui.editor.take() else {
        return;
    };
    let Some(node) = editor.field.resolve(router.document()) else {
        warn!("Edited field {:?} is gone", editor.field);
        return;
    };
    router.document_mut().set_value(node, &editor.buffer);
    if !submit {
        return;
    }
    let doc = router.document();
    let form_id = doc
        .closest_tag(node, "form")
        .and_then(|form| doc.attr(form, "id"))
        .map(str::to_string);
    if let Some(form_id) = form_id {
        router.submit_form(&form_id);
        spawn_tasks(router, tx);
    }
}

fn cycle_select(router: &mut Router, select: NodeId, step: isize) {
    let doc = router.document();
    let values: Vec<String> = doc
        .form_fields(doc.closest_tag(select, "form").unwrap_or(doc.root()))
        .into_iter()
        .find(|field| field.node == select)
        .and_then(|field| match field.kind {
            crate::core::markup::FieldKind::Select(options) => {
                Some(options.into_iter().map(|(value, _)| value).collect())
            }
            _ => None,
        })
        .unwrap_or_default();
    if values.is_empty() {
        return;
    }
    let current = doc.value(select);
    let index = values.iter().position(|v| *v == current).unwrap_or(0) as isize;
    let len = values.len() as isize;
    let next = (index + step).rem_euclid(len) as usize;
    router.document_mut().set_value(select, &values[next]);
}

fn switch_tab(router: &mut Router, step: isize, tx: &mpsc::Sender<AppMessage>) {
    let links = nav_links(router.document());
    if links.is_empty() {
        return;
    }
    let len = links.len() as isize;
    let current = links.iter().position(|link| link.active).unwrap_or(0) as isize;
    let next = (current + step).rem_euclid(len) as usize;
    if let Some(ticket) = router.handle_click(links[next].node) {
        spawn_fetch(router, ticket, tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::EmbeddedContentSource;
    use crate::core::router::RouterOptions;
    use crate::test_support::{RecordingController, shell};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 40,
    };

    fn attached(page: &'static str, markup: &str) -> (Router, TuiState, Log) {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        let log: Log = Arc::default();
        router.register_module(page, Box::new(RecordingController::new(page, Arc::clone(&log))));
        let ticket = router.start(shell()).unwrap().unwrap();
        router
            .complete_navigation(ticket, Ok(String::new()))
            .unwrap();
        let ticket = router.begin_navigation(page).unwrap();
        router
            .complete_navigation(ticket, Ok(markup.to_string()))
            .unwrap();
        let mut tui = TuiState::new();
        layout(&router, &mut tui);
        (router, tui, log)
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with("submit") || e.starts_with("action"))
            .cloned()
            .collect()
    }

    fn layout(router: &Router, tui: &mut TuiState) {
        let backend = TestBackend::new(AREA.width, AREA.height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| ui::draw_ui(f, router, tui, Instant::now()))
            .unwrap();
    }

    fn focus(router: &Router, tui: &mut TuiState, id: &str) -> NodeId {
        let node = router.document().get_element_by_id(id).unwrap();
        tui.content.focus_node(node);
        node
    }

    #[tokio::test]
    async fn test_missing_region_keeps_host_running() {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        let (tx, rx) = mpsc::channel();
        let shell = Document::parse(r#"<nav><ul class="nav-links">
            <li><a data-tab="home">Home</a></li>
            <li><a data-tab="maps">Maps</a></li></ul></nav>"#);
        attach_shell(&mut router, shell, &tx);
        assert!(!router.is_listening());

        let mut tui = TuiState::new();
        layout(&router, &mut tui);
        for event in [
            TuiEvent::InputChar('2'),
            TuiEvent::Right,
            TuiEvent::FocusNext,
            TuiEvent::Activate,
            TuiEvent::MouseClick(1, 1),
            TuiEvent::ScrollDown,
        ] {
            assert_eq!(
                handle_event(&mut router, &mut tui, event, &tx, AREA),
                Flow::Continue
            );
        }
        assert_eq!(router.pending_page(), None);
        assert_eq!(router.current_page(), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(
            handle_event(&mut router, &mut tui, TuiEvent::InputChar('q'), &tx, AREA),
            Flow::Quit
        );
    }

    #[tokio::test]
    async fn test_typing_then_enter_submits_form() {
        let (mut router, mut tui, log) = attached(
            "trip-planner",
            r#"<form id="tripForm"><input id="dest" name="destination"><button type="submit">Save</button></form>"#,
        );
        let (tx, _rx) = mpsc::channel();

        focus(&router, &mut tui, "dest");
        handle_event(&mut router, &mut tui, TuiEvent::Activate, &tx, AREA);
        assert!(tui.editor.is_some());
        for c in "Kyoto".chars() {
            handle_event(&mut router, &mut tui, TuiEvent::InputChar(c), &tx, AREA);
        }
        // 'q' while editing is text, not quit
        assert_eq!(
            handle_event(&mut router, &mut tui, TuiEvent::InputChar('q'), &tx, AREA),
            Flow::Continue
        );
        handle_event(&mut router, &mut tui, TuiEvent::Backspace, &tx, AREA);
        handle_event(&mut router, &mut tui, TuiEvent::Activate, &tx, AREA);

        assert!(tui.editor.is_none());
        let dest = router.document().get_element_by_id("dest").unwrap();
        assert_eq!(router.document().value(dest), "Kyoto");
        assert_eq!(events(&log), vec!["submit:trip-planner:tripForm"]);
    }

    #[tokio::test]
    async fn test_escape_discards_edit() {
        let (mut router, mut tui, log) = attached(
            "trip-planner",
            r#"<form id="tripForm"><input id="dest" name="destination" value="Rome"></form>"#,
        );
        let (tx, _rx) = mpsc::channel();
        focus(&router, &mut tui, "dest");
        handle_event(&mut router, &mut tui, TuiEvent::Activate, &tx, AREA);
        handle_event(&mut router, &mut tui, TuiEvent::InputChar('x'), &tx, AREA);
        handle_event(&mut router, &mut tui, TuiEvent::Escape, &tx, AREA);

        let dest = router.document().get_element_by_id("dest").unwrap();
        assert_eq!(router.document().value(dest), "Rome");
        assert!(events(&log).is_empty());
    }

    #[tokio::test]
    async fn test_action_button_dispatches() {
        let (mut router, mut tui, log) = attached(
            "trip-planner",
            r#"<button id="del" data-action="delete-trip" data-id="t1">Delete</button>"#,
        );
        let (tx, _rx) = mpsc::channel();
        focus(&router, &mut tui, "del");
        handle_event(&mut router, &mut tui, TuiEvent::Activate, &tx, AREA);
        assert_eq!(events(&log), vec!["action:trip-planner:delete-trip:t1"]);
    }

    #[tokio::test]
    async fn test_checkbox_and_select_change_values_without_submitting() {
        let (mut router, mut tui, log) = attached(
            "packing",
            r#"<form id="packingForm">
                 <input type="checkbox" id="laptop" name="laptop">
                 <select id="dest" name="destination"><option value="beach">Beach</option><option value="city">City</option></select>
               </form>"#,
        );
        let (tx, _rx) = mpsc::channel();

        let laptop = focus(&router, &mut tui, "laptop");
        handle_event(&mut router, &mut tui, TuiEvent::Activate, &tx, AREA);
        assert_eq!(router.document().value(laptop), "on");

        let dest = focus(&router, &mut tui, "dest");
        handle_event(&mut router, &mut tui, TuiEvent::Right, &tx, AREA);
        assert_eq!(router.document().value(dest), "city");
        handle_event(&mut router, &mut tui, TuiEvent::Right, &tx, AREA);
        assert_eq!(router.document().value(dest), "beach");
        assert!(events(&log).is_empty());
        // Still on the same page
        assert_eq!(router.current_page().map(|p| p.as_str()), Some("packing"));
    }

    #[tokio::test]
    async fn test_digit_and_arrows_navigate_tabs() {
        let (mut router, mut tui, _log) = attached("trip-planner", "<p>Trips</p>");
        let (tx, _rx) = mpsc::channel();

        handle_event(&mut router, &mut tui, TuiEvent::InputChar('1'), &tx, AREA);
        assert_eq!(router.pending_page().map(|p| p.as_str()), Some("home"));

        let (mut router, mut tui, _log) = attached("trip-planner", "<p>Trips</p>");
        handle_event(&mut router, &mut tui, TuiEvent::Right, &tx, AREA);
        let pending = router.pending_page().map(|p| p.to_string());
        assert!(pending.is_some());
        assert_ne!(pending.as_deref(), Some("trip-planner"));
    }

    #[tokio::test]
    async fn test_fetched_page_is_applied_and_tasks_spawned() {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        let ticket = router.start(shell()).unwrap().unwrap();
        let mut tui = TuiState::new();
        tui.content.focus = Some(3);
        let (tx, _rx) = mpsc::channel();

        apply_message(
            &mut router,
            &mut tui,
            AppMessage::PageFetched(ticket, Ok("<h2>Hi</h2>".to_string())),
            &tx,
        )
        .unwrap();
        assert_eq!(router.current_page().map(|p| p.as_str()), Some("home"));
        assert_eq!(tui.content.focus, None);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut router, mut tui, _log) = attached("trip-planner", "<p>Trips</p>");
        let (tx, _rx) = mpsc::channel();
        assert_eq!(
            handle_event(&mut router, &mut tui, TuiEvent::InputChar('q'), &tx, AREA),
            Flow::Quit
        );
        assert_eq!(
            handle_event(&mut router, &mut tui, TuiEvent::ForceQuit, &tx, AREA),
            Flow::Quit
        );
    }
}
