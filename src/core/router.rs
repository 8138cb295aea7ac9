//! # Router
//!
//! Page loading and controller registration. The router owns the shell
//! document, the registry of page controllers, and the loader state, and it
//! sequences every navigation:
//!
//! ```text
//! begin_navigation(q)          fetch(ticket)              complete_navigation
//! ───────────────────          ─────────────              ───────────────────
//! q == current? → None         GET <q>.html               stale token? → Superseded
//! cleanup() outgoing           ('static future,           Err → "Page Not Found",
//! fresh token, fade out         spawn it anywhere)              state unchanged
//! mark nav tab                                            Ok  → swap markup, fade in,
//!                                                               current_page = q,
//!                                                               init() incoming
//! ```
//!
//! Splitting a navigation in three lets a host run the fetch on its runtime
//! while the router itself stays on the UI thread. `load_page` chains the
//! three for callers that can simply await.
//!
//! Fades are cosmetic: they are timestamps on the content region that a
//! renderer turns into opacity. Nothing waits on them.
//!
//! `NodeId`s handed out by `document()` are valid until the next call that
//! mutates the router (navigation, dispatch, delivery), which compacts the
//! document.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::content::{ContentError, ContentSource};
use crate::core::controller::{Controller, ControllerError, PageContext, PageEvent, TaskOutput};
use crate::core::markup::{Document, NodeId};
use crate::core::navigation::{self, Trigger};
use crate::core::page::PageId;
use crate::core::toast::{DEFAULT_DISPLAY_DURATION, ToastKind, Toasts};

pub const CONTENT_REGION_ID: &str = "content-container";
pub const DEFAULT_PAGE: &str = "home";

const NOT_FOUND_MARKUP: &str = r#"
<section class="section">
  <div class="container">
    <div class="empty-state">
      <i class="fas fa-exclamation-triangle"></i>
      <h3>Page Not Found</h3>
      <p>Sorry, we couldn't load the requested page.</p>
    </div>
  </div>
</section>"#;

// ============================================================================
// Options
// ============================================================================

/// What happens when a controller's `init` fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitFailurePolicy {
    /// Log, toast an error, and leave the page as static content.
    #[default]
    Isolate,
    /// Return `RouterError::ControllerInit` to the caller.
    Propagate,
}

impl FromStr for InitFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(InitFailurePolicy::Isolate),
            "propagate" => Ok(InitFailurePolicy::Propagate),
            other => Err(format!(
                "unknown init failure policy '{other}' (expected 'isolate' or 'propagate')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTimings {
    pub fade_out: Duration,
    pub fade_in: Duration,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            fade_out: Duration::from_millis(300),
            fade_in: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub default_page: PageId,
    pub init_policy: InitFailurePolicy,
    pub fade: FadeTimings,
    pub toast_duration: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            default_page: PageId::from(DEFAULT_PAGE),
            init_policy: InitFailurePolicy::default(),
            fade: FadeTimings::default(),
            toast_duration: DEFAULT_DISPLAY_DURATION,
        }
    }
}

// ============================================================================
// State & Outcomes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderState {
    pub current_page: Option<PageId>,
    /// Registry key of the controller attached to `current_page`.
    pub current_module: Option<PageId>,
}

/// A begun navigation. Only the most recent ticket can complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTicket {
    token: u64,
    page: PageId,
}

impl NavigationTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    /// No controller registered; the page is static content.
    Static,
    Active,
    /// `init` failed and the failure was isolated.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Already on (or already headed to) the page, or the router is inert.
    Unchanged,
    Attached {
        page: PageId,
        controller: ControllerStatus,
    },
    /// The fetch failed; the placeholder is shown and state is unchanged.
    NotFound { page: PageId },
    /// A newer navigation began while this one was in flight.
    Superseded,
}

/// What activating an element led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Navigating(NavigationTicket),
    Dispatched,
    /// The element belongs to the form with this id.
    Form(String),
    Ignored,
}

#[derive(Debug)]
pub enum RouterError {
    RegionMissing,
    ControllerInit {
        page: PageId,
        source: ControllerError,
    },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::RegionMissing => {
                write!(f, "content region #{CONTENT_REGION_ID} not found")
            }
            RouterError::ControllerInit { page, source } => {
                write!(f, "failed to initialize '{page}': {source}")
            }
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouterError::RegionMissing => None,
            RouterError::ControllerInit { source, .. } => Some(source),
        }
    }
}

// ── Controller tasks ───────────────────────────────────────────────────────

/// A queued controller future, tagged with the activation that queued it.
pub struct PageTask {
    pub page: PageId,
    pub token: u64,
    pub future: BoxFuture<'static, TaskOutput>,
}

impl PageTask {
    pub fn run(self) -> BoxFuture<'static, TaskResult> {
        let PageTask { page, token, future } = self;
        future
            .map(move |output| TaskResult {
                page,
                token,
                output,
            })
            .boxed()
    }
}

pub struct TaskResult {
    pub page: PageId,
    pub token: u64,
    pub output: TaskOutput,
}

impl fmt::Debug for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskResult")
            .field("page", &self.page)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

// ── Content region ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    Steady,
    Out { since: Instant },
    In { since: Instant },
}

#[derive(Debug, Clone, Copy)]
pub struct ContentRegion {
    pub node: NodeId,
    pub phase: FadePhase,
}

impl ContentRegion {
    /// 0.0 (invisible) to 1.0 (opaque).
    pub fn opacity(&self, now: Instant, fade: FadeTimings) -> f32 {
        fn progress(since: Instant, now: Instant, over: Duration) -> f32 {
            if over.is_zero() {
                return 1.0;
            }
            let elapsed = now.saturating_duration_since(since).as_secs_f32();
            (elapsed / over.as_secs_f32()).clamp(0.0, 1.0)
        }
        match self.phase {
            FadePhase::Steady => 1.0,
            FadePhase::Out { since } => 1.0 - progress(since, now, fade.fade_out),
            FadePhase::In { since } => progress(since, now, fade.fade_in),
        }
    }

    pub fn is_fading(&self, now: Instant, fade: FadeTimings) -> bool {
        self.opacity(now, fade) < 1.0
    }
}

// ============================================================================
// Router
// ============================================================================

pub struct Router {
    source: Arc<dyn ContentSource>,
    options: RouterOptions,
    modules: HashMap<PageId, Box<dyn Controller>>,
    state: LoaderState,
    document: Document,
    region: Option<ContentRegion>,
    toasts: Toasts,
    /// Token of the navigation that activated the current controller.
    /// `Some` exactly while a controller is initialized and not cleaned up.
    activation: Option<u64>,
    pending: Option<NavigationTicket>,
    next_token: u64,
    tasks: Vec<BoxFuture<'static, TaskOutput>>,
}

impl Router {
    pub fn new(source: Arc<dyn ContentSource>, options: RouterOptions) -> Self {
        let toasts = Toasts::new(options.toast_duration);
        Self {
            source,
            options,
            modules: HashMap::new(),
            state: LoaderState::default(),
            document: Document::new(),
            region: None,
            toasts,
            activation: None,
            pending: None,
            next_token: 1,
            tasks: Vec::new(),
        }
    }

    /// Register the controller for `page`. A later registration for the
    /// same page replaces the earlier one.
    pub fn register_module(&mut self, page: impl Into<PageId>, controller: Box<dyn Controller>) {
        let page = page.into();
        if self.modules.insert(page.clone(), controller).is_some() {
            debug!("Replaced controller for '{page}'");
        }
    }

    pub fn is_registered(&self, page: &str) -> bool {
        self.modules.contains_key(page)
    }

    // ── Startup ────────────────────────────────────────────────────────

    /// Attach the shell document and begin navigating to the default page.
    ///
    /// Without a `#content-container` element the router stays inert:
    /// every later navigation or activation is a no-op.
    pub fn start(&mut self, shell: Document) -> Result<Option<NavigationTicket>, RouterError> {
        if self.is_listening() {
            warn!("Router already started, ignoring");
            return Ok(None);
        }
        self.document = shell;
        let Some(node) = self.document.get_element_by_id(CONTENT_REGION_ID) else {
            error!("Content container #{CONTENT_REGION_ID} not found");
            return Err(RouterError::RegionMissing);
        };
        self.region = Some(ContentRegion {
            node,
            phase: FadePhase::Steady,
        });
        info!("Router listening, {} module(s) registered", self.modules.len());

        let default_page = self.options.default_page.clone();
        Ok(self.begin_navigation(default_page))
    }

    /// `start`, then await the default page.
    pub async fn init(&mut self, shell: Document) -> Result<NavigationOutcome, RouterError> {
        match self.start(shell)? {
            Some(ticket) => self.run(ticket).await,
            None => Ok(NavigationOutcome::Unchanged),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.region.is_some()
    }

    // ── Navigation ─────────────────────────────────────────────────────

    /// Navigate to `page` and await the result.
    pub async fn load_page(
        &mut self,
        page: impl Into<PageId>,
    ) -> Result<NavigationOutcome, RouterError> {
        match self.begin_navigation(page) {
            Some(ticket) => self.run(ticket).await,
            None => Ok(NavigationOutcome::Unchanged),
        }
    }

    async fn run(&mut self, ticket: NavigationTicket) -> Result<NavigationOutcome, RouterError> {
        let result = self.fetch(&ticket).await;
        self.complete_navigation(ticket, result)
    }

    /// First half of a navigation. `None` when nothing should happen: the
    /// router is inert, `page` is already current, or a navigation to
    /// `page` is already in flight.
    pub fn begin_navigation(&mut self, page: impl Into<PageId>) -> Option<NavigationTicket> {
        let page = page.into();
        if !self.is_listening() {
            warn!("Ignoring navigation to '{page}': router is not listening");
            return None;
        }
        match &self.pending {
            Some(pending) if pending.page == page => {
                debug!("Navigation to '{page}' already in flight");
                return None;
            }
            None if self.state.current_page.as_ref() == Some(&page) => {
                debug!("Already on '{page}'");
                return None;
            }
            _ => {}
        }

        self.deactivate_current();

        let ticket = NavigationTicket {
            token: self.next_token,
            page,
        };
        self.next_token += 1;
        info!("Navigating to '{}' (token {})", ticket.page, ticket.token);

        if let Some(region) = self.region.as_mut() {
            region.phase = FadePhase::Out {
                since: Instant::now(),
            };
        }
        navigation::mark_active_tab(&mut self.document, &ticket.page);
        self.pending = Some(ticket.clone());
        Some(ticket)
    }

    /// The fragment request for `ticket`. Owns everything it needs, so it
    /// can be spawned.
    pub fn fetch(
        &self,
        ticket: &NavigationTicket,
    ) -> BoxFuture<'static, Result<String, ContentError>> {
        let source = Arc::clone(&self.source);
        let path = ticket.page.fragment_path();
        async move { source.fetch(&path).await }.boxed()
    }

    /// Second half of a navigation: apply the fetch result for `ticket`.
    pub fn complete_navigation(
        &mut self,
        ticket: NavigationTicket,
        result: Result<String, ContentError>,
    ) -> Result<NavigationOutcome, RouterError> {
        if self.pending.as_ref().map(|p| p.token) != Some(ticket.token) {
            debug!(
                "Discarding superseded navigation to '{}' (token {})",
                ticket.page, ticket.token
            );
            return Ok(NavigationOutcome::Superseded);
        }
        self.pending = None;

        let Some(region) = self.region.map(|r| r.node) else {
            return Err(RouterError::RegionMissing);
        };

        let markup = match result {
            Ok(markup) => markup,
            Err(e) => {
                error!("Error loading page '{}': {e}", ticket.page);
                self.swap_region(region, NOT_FOUND_MARKUP);
                return Ok(NavigationOutcome::NotFound { page: ticket.page });
            }
        };

        self.swap_region(region, &markup);
        self.state.current_page = Some(ticket.page.clone());
        self.state.current_module = None;

        let outcome = self.activate(&ticket);
        self.document.compact();
        self.refresh_region();
        outcome
    }

    fn swap_region(&mut self, region: NodeId, markup: &str) {
        self.document.set_inner_html(region, markup);
        self.document.compact();
        self.refresh_region();
        if let Some(region) = self.region.as_mut() {
            region.phase = FadePhase::In {
                since: Instant::now(),
            };
        }
    }

    /// Re-locate the region after compaction renumbered the arena.
    fn refresh_region(&mut self) {
        if let Some(node) = self.document.get_element_by_id(CONTENT_REGION_ID)
            && let Some(region) = self.region.as_mut()
        {
            region.node = node;
        }
    }

    fn activate(&mut self, ticket: &NavigationTicket) -> Result<NavigationOutcome, RouterError> {
        let page = ticket.page.clone();
        let Some(controller) = self.modules.get_mut(&page) else {
            debug!("No controller for '{page}', static page");
            return Ok(NavigationOutcome::Attached {
                page,
                controller: ControllerStatus::Static,
            });
        };

        info!("Initializing module: {page}");
        let mut ctx = PageContext::new(&mut self.document, &mut self.toasts, &mut self.tasks);
        match controller.init(&mut ctx) {
            Ok(()) => {
                self.state.current_module = Some(page.clone());
                self.activation = Some(ticket.token);
                Ok(NavigationOutcome::Attached {
                    page,
                    controller: ControllerStatus::Active,
                })
            }
            Err(e) => {
                self.tasks.clear();
                match self.options.init_policy {
                    InitFailurePolicy::Isolate => {
                        error!("Controller for '{page}' failed to initialize: {e}");
                        self.toasts.show(
                            format!("Couldn't start {}: {e}", page.title()),
                            ToastKind::Error,
                        );
                        Ok(NavigationOutcome::Attached {
                            page,
                            controller: ControllerStatus::Failed,
                        })
                    }
                    InitFailurePolicy::Propagate => {
                        Err(RouterError::ControllerInit { page, source: e })
                    }
                }
            }
        }
    }

    /// Call `cleanup` on the active controller, if any, and drop its
    /// queued tasks.
    fn deactivate_current(&mut self) {
        if self.activation.take().is_none() {
            return;
        }
        self.tasks.clear();
        if let Some(key) = self.state.current_module.as_ref()
            && let Some(controller) = self.modules.get_mut(key)
        {
            debug!("Cleaning up module: {key}");
            controller.cleanup();
        }
    }

    // ── Events ─────────────────────────────────────────────────────────

    /// The delegated click listener: clicks on (or inside) a `data-tab`
    /// element navigate, everything else is ignored.
    pub fn handle_click(&mut self, target: NodeId) -> Option<NavigationTicket> {
        if !self.is_listening() {
            return None;
        }
        let tab = self.document.closest(target, "data-tab")?;
        let page = self.document.attr(tab, "data-tab")?.trim().to_string();
        if page.is_empty() {
            return None;
        }
        self.begin_navigation(page)
    }

    /// Activate an element: navigate, dispatch its action, or report the
    /// form it belongs to.
    pub fn handle_activation(&mut self, target: NodeId) -> Activation {
        if !self.is_listening() {
            return Activation::Ignored;
        }
        match navigation::resolve_trigger(&self.document, target) {
            Some(Trigger::Navigate(page)) => self
                .begin_navigation(page)
                .map_or(Activation::Ignored, Activation::Navigating),
            Some(Trigger::Action { name, value }) => {
                if self.dispatch(PageEvent::Action { name, value }) {
                    Activation::Dispatched
                } else {
                    Activation::Ignored
                }
            }
            Some(Trigger::Form(id)) => Activation::Form(id),
            None => Activation::Ignored,
        }
    }

    /// Submit the form with element id `form_id` to the active controller.
    pub fn submit_form(&mut self, form_id: &str) -> bool {
        let Some(form) = self.document.get_element_by_id(form_id) else {
            warn!("Submit for unknown form #{form_id}");
            return false;
        };
        let data = self.document.form_data(form);
        self.dispatch(PageEvent::Submit {
            form: form_id.to_string(),
            data,
        })
    }

    /// Forward an event to the active controller. Returns false when no
    /// controller is active. Controller errors are logged and toasted.
    pub fn dispatch(&mut self, event: PageEvent) -> bool {
        if self.activation.is_none() {
            debug!("No active controller for {event:?}");
            return false;
        }
        let Some(page) = self.state.current_module.clone() else {
            return false;
        };
        let Some(controller) = self.modules.get_mut(&page) else {
            return false;
        };

        let mut ctx = PageContext::new(&mut self.document, &mut self.toasts, &mut self.tasks);
        if let Err(e) = controller.handle(event, &mut ctx) {
            error!("Controller for '{page}' failed: {e}");
            self.toasts.show(e.to_string(), ToastKind::Error);
        }
        self.document.compact();
        self.refresh_region();
        true
    }

    /// Route a finished task back to the controller that queued it. Results
    /// for a deactivated controller are dropped.
    pub fn deliver(&mut self, result: TaskResult) -> bool {
        let current = self.activation == Some(result.token)
            && self.state.current_module.as_ref() == Some(&result.page);
        if !current {
            debug!("Dropping stale task result for '{}'", result.page);
            return false;
        }
        self.dispatch(PageEvent::Task(result.output))
    }

    /// Hand queued controller tasks to the host for spawning.
    pub fn take_tasks(&mut self) -> Vec<PageTask> {
        let (Some(token), Some(page)) = (self.activation, self.state.current_module.clone())
        else {
            self.tasks.clear();
            return Vec::new();
        };
        self.tasks
            .drain(..)
            .map(|future| PageTask {
                page: page.clone(),
                token,
                future,
            })
            .collect()
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn state(&self) -> &LoaderState {
        &self.state
    }

    pub fn current_page(&self) -> Option<&PageId> {
        self.state.current_page.as_ref()
    }

    pub fn pending_page(&self) -> Option<&PageId> {
        self.pending.as_ref().map(|p| &p.page)
    }

    /// True while a controller is initialized and not yet cleaned up.
    pub fn has_active_controller(&self) -> bool {
        self.activation.is_some()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for hosts editing form values before `submit_form`.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn region(&self) -> Option<&ContentRegion> {
        self.region.as_ref()
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        self.region
            .map_or(1.0, |region| region.opacity(now, self.options.fade))
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut Toasts {
        &mut self.toasts
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StaticContent, shell};

    fn router() -> Router {
        let source = StaticContent::new()
            .with("home.html", "<h1>Home</h1>")
            .with("about.html", "<h1>About</h1>");
        Router::new(Arc::new(source), RouterOptions::default())
    }

    #[test]
    fn test_opacity_over_fade() {
        let fade = FadeTimings::default();
        let start = Instant::now();
        let mut region = ContentRegion {
            node: Document::new().root(),
            phase: FadePhase::Out { since: start },
        };
        assert_eq!(region.opacity(start, fade), 1.0);
        assert_eq!(region.opacity(start + Duration::from_millis(300), fade), 0.0);
        region.phase = FadePhase::In { since: start };
        assert!((region.opacity(start + Duration::from_millis(150), fade) - 0.5).abs() < 0.01);
        assert!(!region.is_fading(start + Duration::from_millis(400), fade));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Isolate".parse::<InitFailurePolicy>(), Ok(InitFailurePolicy::Isolate));
        assert_eq!("propagate".parse::<InitFailurePolicy>(), Ok(InitFailurePolicy::Propagate));
        assert!("retry".parse::<InitFailurePolicy>().is_err());
    }

    #[test]
    fn test_start_begins_default_navigation() {
        let mut router = router();
        let ticket = router.start(shell()).unwrap().unwrap();
        assert_eq!(ticket.page(), "home");
        assert_eq!(router.pending_page().map(PageId::as_str), Some("home"));
        assert!(router.current_page().is_none());
    }

    #[test]
    fn test_second_start_is_ignored() {
        let mut router = router();
        router.start(shell()).unwrap();
        assert!(router.start(shell()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_split_navigation_matches_load_page() {
        let mut router = router();
        router.init(shell()).await.unwrap();

        let ticket = router.begin_navigation("about").unwrap();
        let result = router.fetch(&ticket).await;
        let outcome = router.complete_navigation(ticket, result).unwrap();
        assert_eq!(
            outcome,
            NavigationOutcome::Attached {
                page: PageId::from("about"),
                controller: ControllerStatus::Static,
            }
        );
        let region = router.region().unwrap().node;
        assert_eq!(router.document().text_content(region), "About");
    }

    #[tokio::test]
    async fn test_fade_in_starts_after_swap() {
        let mut router = router();
        router.init(shell()).await.unwrap();
        assert!(matches!(
            router.region().unwrap().phase,
            FadePhase::In { .. }
        ));
        router.begin_navigation("about").unwrap();
        assert!(matches!(
            router.region().unwrap().phase,
            FadePhase::Out { .. }
        ));
    }
}
