use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::core::markup::NodeId;
use crate::core::navigation::nav_links;
use crate::core::router::Router;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::nav_bar;
use crate::tui::components::{
    ContentHit, ContentView, LandingPage, NavBar, TitleBar, ToastLine, ToastStack,
};

/// Below this opacity the content is drawn dimmed.
const DIM_BELOW: f32 = 0.6;

const HELP: &str =
    "Tab/Shift+Tab focus · Enter activate · ←/→ or 1-9 pages · ↑/↓ scroll · q quit";
const EDIT_HELP: &str = "Editing · Enter submit · Tab next field · Esc cancel";

pub struct AppLayout {
    pub title: Rect,
    pub nav: Rect,
    pub content: Rect,
    pub help: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        use Constraint::{Length, Min};
        let [title, nav, content, help] =
            Layout::vertical([Length(1), Length(1), Min(0), Length(1)]).areas(area);
        Self {
            title,
            nav,
            content,
            help,
        }
    }
}

pub fn draw_ui(frame: &mut Frame, router: &Router, tui: &mut TuiState, now: Instant) {
    let layout = AppLayout::new(frame.area());
    let doc = router.document();

    // Title bar
    let page_title = router.current_page().map(|p| p.title()).unwrap_or_default();
    let status = if !router.is_listening() {
        "Page content unavailable".to_string()
    } else if let Some(pending) = router.pending_page() {
        format!("Loading {}…", pending.title())
    } else if tui.editor.is_some() {
        "Editing".to_string()
    } else {
        String::new()
    };
    TitleBar::new(page_title, status).render(frame, layout.title);

    // Nav bar
    let links = nav_links(doc);
    NavBar::new(&links).render(frame, layout.nav);

    // Content, or the splash until the first page lands
    match router.region() {
        Some(region) if router.current_page().is_some() || router.pending_page().is_none() => {
            let editing = tui.editor.as_ref().and_then(|editor| {
                editor
                    .field
                    .resolve(doc)
                    .map(|node| (node, editor.buffer.clone()))
            });
            ContentView {
                doc,
                region: region.node,
                state: &mut tui.content,
                editing,
                dimmed: router.opacity(now) < DIM_BELOW,
            }
            .render(frame, layout.content);
        }
        _ => {
            let loading = router.pending_page().map(|p| p.title());
            LandingPage::new(tui.spinner_frame, loading).render(frame, layout.content);
        }
    }

    // Toast overlay
    let toasts = router
        .toasts()
        .visible(now)
        .into_iter()
        .map(|(toast, phase)| ToastLine {
            message: toast.message.clone(),
            kind: toast.kind,
            phase,
        })
        .collect();
    ToastStack::new(toasts).render(frame, layout.content);

    // Key help
    let help = if tui.editor.is_some() { EDIT_HELP } else { HELP };
    frame.render_widget(
        Span::styled(help, Style::default().fg(Color::DarkGray)),
        layout.help,
    );
}

/// What a click at `(col, row)` landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    Tab(NodeId),
    Content(ContentHit),
}

pub fn hit_test(
    frame_area: Rect,
    router: &Router,
    tui: &TuiState,
    col: u16,
    row: u16,
) -> Option<HitTarget> {
    let layout = AppLayout::new(frame_area);
    if layout.nav.contains(Position { x: col, y: row }) {
        let links = nav_links(router.document());
        return nav_bar::hit_test(&links, layout.nav, col, row).map(HitTarget::Tab);
    }
    tui.content.hit_test(col, row).map(HitTarget::Content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::EmbeddedContentSource;
    use crate::core::markup::Document;
    use crate::core::router::RouterOptions;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    const SHELL: &str = r#"<nav><ul class="nav-links">
        <li><a data-tab="home">Home</a></li><li><a data-tab="maps">Maps</a></li>
        </ul></nav><main id="content-container"></main>"#;

    fn draw(router: &Router, tui: &mut TuiState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| draw_ui(f, router, tui, Instant::now()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_splash_while_first_page_loads() {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        router.start(Document::parse(SHELL)).unwrap();
        let mut tui = TuiState::new();
        let text = draw(&router, &mut tui);
        assert!(text.contains("Loading Home…"));
        assert!(text.contains("1 Home"));
    }

    #[test]
    fn test_inert_router_draws_shell_only() {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        let shell = Document::parse(r#"<nav><ul class="nav-links">
            <li><a data-tab="home">Home</a></li></ul></nav>"#);
        assert!(router.start(shell).is_err());
        let mut tui = TuiState::new();
        let text = draw(&router, &mut tui);
        assert!(text.contains("Page content unavailable"));
        assert!(text.contains("1 Home"));
    }

    #[test]
    fn test_draws_page_after_navigation() {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        let ticket = router.start(Document::parse(SHELL)).unwrap().unwrap();
        router
            .complete_navigation(ticket, Ok("<h2>Welcome aboard</h2>".to_string()))
            .unwrap();
        router.toasts_mut().show("Hello there", crate::core::toast::ToastKind::Info);

        let mut tui = TuiState::new();
        let text = draw(&router, &mut tui);
        assert!(text.contains("GlobeMate | Home"));
        assert!(text.contains("Welcome aboard"));
        assert!(text.contains("Hello there"));
        assert!(text.contains("q quit"));
    }

    #[test]
    fn test_hit_test_nav_and_content() {
        let mut router = Router::new(Arc::new(EmbeddedContentSource), RouterOptions::default());
        let ticket = router.start(Document::parse(SHELL)).unwrap().unwrap();
        router
            .complete_navigation(
                ticket,
                Ok(r#"<button data-tab="maps" id="cta">Open map</button>"#.to_string()),
            )
            .unwrap();
        let mut tui = TuiState::new();
        draw(&router, &mut tui);

        let area = Rect::new(0, 0, 100, 30);
        let layout = AppLayout::new(area);
        let maps_tab = nav_links(router.document())[1].node;
        let hit = hit_test(area, &router, &tui, 12, layout.nav.y);
        assert_eq!(hit, Some(HitTarget::Tab(maps_tab)));

        let cta = router.document().get_element_by_id("cta").unwrap();
        let line = tui.content.page.line_of(cta).unwrap();
        let hit = hit_test(area, &router, &tui, 1, layout.content.y + line);
        assert_eq!(hit, Some(HitTarget::Content(ContentHit::Node(cta))));
    }
}
