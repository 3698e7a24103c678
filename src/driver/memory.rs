//! In-process automation endpoint.
//!
//! [`MemoryDriver`] simulates a single-focus remote endpoint entirely in
//! memory: surfaces with titles, URLs and history, nested frames, elements,
//! mobile pages and activities. The test side scripts it ("a popup opens",
//! "the user closes a window") while the session under test drives it
//! through [`DriverBackend`].
//!
//! Every focus switch and every focused command is recorded in a call log,
//! and an artificial latency can be injected, which makes ordering
//! properties of the session observable.
//!
//! # Example
//!
//! ```ignore
//! use surface_keeper::driver::memory::{MemoryConnector, MemoryDriver};
//!
//! let driver = MemoryDriver::new();
//! driver.open_surface("w-1", "Home", "https://example.com/");
//!
//! let launcher = Launcher::new(MemoryConnector::new(driver.clone()));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SurfaceId};
use crate::surface::{FramePath, FrameStep, Locator};

use super::backend::{ConnectRequest, Connector, DriverBackend, PageInfo, WindowRect};
use super::config::Timeouts;

// ============================================================================
// Call Log
// ============================================================================

/// One recorded interaction with the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Surface listing.
    List,
    /// Focus switch.
    Switch(SurfaceId),
    /// Focused command, with the surface that had focus when it ran.
    Act {
        /// Focused surface, if any.
        surface: Option<SurfaceId>,
        /// Command name.
        op: &'static str,
    },
    /// Session quit.
    Quit,
}

// ============================================================================
// Simulated State
// ============================================================================

#[derive(Debug, Clone)]
struct ElementState {
    id: ElementId,
    locator: Locator,
    text: String,
    value: String,
    clicks: u32,
}

#[derive(Debug, Clone, Default)]
struct Document {
    frames: Vec<FrameState>,
    elements: Vec<ElementState>,
}

#[derive(Debug, Clone)]
struct FrameState {
    name: String,
    locator: Option<Locator>,
    document: Document,
}

#[derive(Debug, Clone)]
struct SurfaceState {
    id: SurfaceId,
    title: String,
    history: Vec<String>,
    position: usize,
    rect: WindowRect,
    ready: bool,
    activity: Option<String>,
    pages: Vec<PageInfo>,
    current_page: Option<String>,
    document: Document,
}

impl SurfaceState {
    fn url(&self) -> &str {
        self.history.get(self.position).map_or("", String::as_str)
    }
}

#[derive(Default)]
struct State {
    alive: bool,
    surfaces: Vec<SurfaceState>,
    focus: Option<SurfaceId>,
    frame_path: Vec<usize>,
    routes: FxHashMap<String, String>,
    calls: Vec<Call>,
    close_counts: FxHashMap<SurfaceId, u32>,
    connects: u32,
    quits: u32,
    quit_failure: Option<Error>,
    element_failures: u32,
    timeouts: Option<Timeouts>,
    latency: Duration,
    listing_delay: Duration,
}

impl State {
    fn surface(&self, id: &SurfaceId) -> Option<&SurfaceState> {
        self.surfaces.iter().find(|s| &s.id == id)
    }

    fn surface_mut(&mut self, id: &SurfaceId) -> Option<&mut SurfaceState> {
        self.surfaces.iter_mut().find(|s| &s.id == id)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.alive {
            Ok(())
        } else {
            Err(Error::NoSuchSession)
        }
    }

    fn focused_id(&self) -> Result<SurfaceId> {
        self.ensure_alive()?;
        let id = self
            .focus
            .clone()
            .ok_or_else(|| Error::no_such_surface(SurfaceId::new("<none>")))?;
        if self.surface(&id).is_none() {
            return Err(Error::no_such_surface(id));
        }
        Ok(id)
    }

    fn focused(&mut self) -> Result<&mut SurfaceState> {
        let id = self.focused_id()?;
        self.surface_mut(&id)
            .ok_or_else(|| Error::no_such_surface(id))
    }

    /// Document of the current frame of the focused surface.
    fn current_document(&mut self) -> Result<&mut Document> {
        let path = self.frame_path.clone();
        let surface = self.focused()?;
        let mut doc = &mut surface.document;
        for index in path {
            doc = &mut doc
                .frames
                .get_mut(index)
                .ok_or_else(|| Error::frame_not_found(format!("index {index}")))?
                .document;
        }
        Ok(doc)
    }

    fn element_mut(&mut self, element: &ElementId) -> Result<&mut ElementState> {
        if self.element_failures > 0 {
            self.element_failures -= 1;
            return Err(Error::stale_element(element.as_str()));
        }
        self.current_document()?
            .elements
            .iter_mut()
            .find(|e| &e.id == element)
            .ok_or_else(|| Error::stale_element(element.as_str()))
    }

    fn record_act(&mut self, op: &'static str) {
        let surface = self.focus.clone();
        trace!(?surface, op, "Memory endpoint command");
        self.calls.push(Call::Act { surface, op });
    }
}

fn document_at<'a>(root: &'a mut Document, path: &FramePath) -> Result<&'a mut Document> {
    let mut doc = root;
    for step in path.steps() {
        let index = frame_index(doc, step)?;
        doc = &mut doc.frames[index].document;
    }
    Ok(doc)
}

fn frame_index(doc: &Document, step: &FrameStep) -> Result<usize> {
    let found = match step {
        FrameStep::Index(i) => (*i < doc.frames.len()).then_some(*i),
        FrameStep::Name(name) => doc.frames.iter().position(|f| &f.name == name),
        FrameStep::Element(locator) => doc
            .frames
            .iter()
            .position(|f| f.locator.as_ref() == Some(locator)),
    };
    found.ok_or_else(|| Error::frame_not_found(step.to_string()))
}

static NEXT_ELEMENT: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// MemoryDriver
// ============================================================================

/// Scriptable in-memory endpoint.
///
/// Clones share state, so the test keeps one clone for scripting while the
/// session owns another as its backend.
#[derive(Clone)]
pub struct MemoryDriver {
    state: Arc<Mutex<State>>,
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryDriver")
            .field("alive", &state.alive)
            .field("surfaces", &state.surfaces.len())
            .field("focus", &state.focus)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryDriver - Scripting
// ============================================================================

impl MemoryDriver {
    /// Creates an endpoint with no surfaces.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                alive: true,
                ..State::default()
            })),
        }
    }

    /// Delays every endpoint call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Delays listing responses by `delay` after the surfaces were read.
    pub fn set_listing_delay(&self, delay: Duration) {
        self.state.lock().listing_delay = delay;
    }

    /// Opens a surface. The first surface receives focus.
    pub fn open_surface(&self, id: &str, title: &str, url: &str) {
        let mut state = self.state.lock();
        let id = SurfaceId::new(id);
        state.surfaces.push(SurfaceState {
            id: id.clone(),
            title: title.to_string(),
            history: vec![url.to_string()],
            position: 0,
            rect: WindowRect::new(0, 0, 1280, 720),
            ready: true,
            activity: None,
            pages: Vec::new(),
            current_page: None,
            document: Document::default(),
        });
        if state.focus.is_none() {
            state.focus = Some(id);
        }
    }

    /// Opens a native mobile screen with a foreground activity.
    pub fn open_screen(&self, context: &str, activity: &str) {
        self.open_surface(context, "", "");
        if let Some(s) = self.state.lock().surface_mut(&SurfaceId::new(context)) {
            s.activity = Some(activity.to_string());
        }
    }

    /// Closes a surface from the remote side, as a user would.
    pub fn close_surface_remotely(&self, id: &str) {
        let mut state = self.state.lock();
        let id = SurfaceId::new(id);
        state.surfaces.retain(|s| s.id != id);
        if state.focus.as_ref() == Some(&id) {
            state.focus = None;
        }
    }

    /// Title shown after navigating to `url`.
    pub fn route(&self, url: &str, title: &str) {
        self.state
            .lock()
            .routes
            .insert(url.to_string(), title.to_string());
    }

    /// Sets the document readiness of a surface.
    pub fn set_ready(&self, id: &str, ready: bool) {
        if let Some(s) = self.state.lock().surface_mut(&SurfaceId::new(id)) {
            s.ready = ready;
        }
    }

    /// Sets the pages hosted by a web-view surface.
    pub fn set_pages(&self, id: &str, pages: Vec<PageInfo>) {
        if let Some(s) = self.state.lock().surface_mut(&SurfaceId::new(id)) {
            s.pages = pages;
        }
    }

    /// Adds a frame named `name` inside the document at `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the surface or parent path does not exist.
    pub fn add_frame(&self, id: &str, parent: &FramePath, name: &str, locator: Option<Locator>) {
        let mut state = self.state.lock();
        let surface = state
            .surface_mut(&SurfaceId::new(id))
            .expect("surface exists");
        let doc = document_at(&mut surface.document, parent).expect("parent frame exists");
        doc.frames.push(FrameState {
            name: name.to_string(),
            locator,
            document: Document::default(),
        });
    }

    /// Adds an element inside the document at `frames`.
    ///
    /// # Panics
    ///
    /// Panics if the surface or frame path does not exist.
    pub fn add_element(&self, id: &str, frames: &FramePath, locator: Locator, text: &str) -> ElementId {
        let element = ElementId::new(format!(
            "el-{}",
            NEXT_ELEMENT.fetch_add(1, Ordering::Relaxed)
        ));
        let mut state = self.state.lock();
        let surface = state
            .surface_mut(&SurfaceId::new(id))
            .expect("surface exists");
        let doc = document_at(&mut surface.document, frames).expect("frame exists");
        doc.elements.push(ElementState {
            id: element.clone(),
            locator,
            text: text.to_string(),
            value: String::new(),
            clicks: 0,
        });
        element
    }

    /// Makes the next `count` element commands fail with a stale reference.
    pub fn fail_element_ops(&self, count: u32) {
        self.state.lock().element_failures = count;
    }

    /// Makes the next quit fail with `error`.
    pub fn fail_quit_with(&self, error: Error) {
        self.state.lock().quit_failure = Some(error);
    }
}

// ============================================================================
// MemoryDriver - Inspection
// ============================================================================

impl MemoryDriver {
    /// Recorded calls since creation or the last [`clear_calls`](Self::clear_calls).
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Current URL of a surface.
    #[must_use]
    pub fn surface_url(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .surface(&SurfaceId::new(id))
            .map(|s| s.url().to_string())
    }

    /// Window geometry of a surface.
    #[must_use]
    pub fn surface_rect(&self, id: &str) -> Option<WindowRect> {
        self.state.lock().surface(&SurfaceId::new(id)).map(|s| s.rect)
    }

    /// Number of open surfaces.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.state.lock().surfaces.len()
    }

    /// How many times `id` was closed through the backend.
    #[must_use]
    pub fn close_count(&self, id: &str) -> u32 {
        self.state
            .lock()
            .close_counts
            .get(&SurfaceId::new(id))
            .copied()
            .unwrap_or(0)
    }

    /// Text typed into the element, if it still exists.
    #[must_use]
    pub fn element_value(&self, element: &ElementId) -> Option<String> {
        let state = self.state.lock();
        let mut stack: Vec<&Document> = state.surfaces.iter().map(|s| &s.document).collect();
        while let Some(doc) = stack.pop() {
            if let Some(e) = doc.elements.iter().find(|e| &e.id == element) {
                return Some(e.value.clone());
            }
            stack.extend(doc.frames.iter().map(|f| &f.document));
        }
        None
    }

    /// How many times the element was clicked.
    #[must_use]
    pub fn click_count(&self, element: &ElementId) -> u32 {
        let state = self.state.lock();
        let mut stack: Vec<&Document> = state.surfaces.iter().map(|s| &s.document).collect();
        while let Some(doc) = stack.pop() {
            if let Some(e) = doc.elements.iter().find(|e| &e.id == element) {
                return e.clicks;
            }
            stack.extend(doc.frames.iter().map(|f| &f.document));
        }
        0
    }

    /// Number of connections opened to this endpoint.
    #[must_use]
    pub fn connect_count(&self) -> u32 {
        self.state.lock().connects
    }

    /// Number of quit calls received.
    #[must_use]
    pub fn quit_count(&self) -> u32 {
        self.state.lock().quits
    }

    /// Timeouts pushed by the session, if any.
    #[must_use]
    pub fn timeouts(&self) -> Option<Timeouts> {
        self.state.lock().timeouts
    }

    /// Currently addressed page of a web-view surface.
    #[must_use]
    pub fn current_page(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .surface(&SurfaceId::new(id))
            .and_then(|s| s.current_page.clone())
    }

    async fn pause(&self) {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// Runs a focused command against the locked state.
    async fn act<R, F>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut State) -> Result<R> + Send,
        R: Send,
    {
        self.pause().await;
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.record_act(op);
        f(&mut state)
    }
}

// ============================================================================
// MemoryDriver - DriverBackend
// ============================================================================

#[async_trait]
impl DriverBackend for MemoryDriver {
    async fn surfaces(&self) -> Result<Vec<SurfaceId>> {
        self.pause().await;
        let (ids, delay): (Vec<SurfaceId>, Duration) = {
            let mut state = self.state.lock();
            state.ensure_alive()?;
            state.calls.push(Call::List);
            let ids = state.surfaces.iter().map(|s| s.id.clone()).collect();
            (ids, state.listing_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(ids)
    }

    async fn switch_to_surface(&self, surface: &SurfaceId) -> Result<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.calls.push(Call::Switch(surface.clone()));
        if state.surface(surface).is_none() {
            return Err(Error::no_such_surface(surface.clone()));
        }
        state.focus = Some(surface.clone());
        state.frame_path.clear();
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        self.act("title", |s| Ok(s.focused()?.title.clone())).await
    }

    async fn current_url(&self) -> Result<String> {
        self.act("current_url", |s| Ok(s.focused()?.url().to_string()))
            .await
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.act("navigate", |s| {
            let title = s.routes.get(url).cloned();
            let surface = s.focused()?;
            surface.history.truncate(surface.position + 1);
            surface.history.push(url.to_string());
            surface.position = surface.history.len() - 1;
            if let Some(title) = title {
                surface.title = title;
            }
            Ok(())
        })
        .await
    }

    async fn back(&self) -> Result<()> {
        self.act("back", |s| {
            let surface = s.focused()?;
            surface.position = surface.position.saturating_sub(1);
            Ok(())
        })
        .await
    }

    async fn forward(&self) -> Result<()> {
        self.act("forward", |s| {
            let surface = s.focused()?;
            if surface.position + 1 < surface.history.len() {
                surface.position += 1;
            }
            Ok(())
        })
        .await
    }

    async fn refresh(&self) -> Result<()> {
        self.act("refresh", |s| s.focused().map(|_| ())).await
    }

    async fn window_rect(&self) -> Result<WindowRect> {
        self.act("window_rect", |s| Ok(s.focused()?.rect)).await
    }

    async fn set_window_rect(&self, rect: WindowRect) -> Result<WindowRect> {
        self.act("set_window_rect", |s| {
            let surface = s.focused()?;
            surface.rect = rect;
            Ok(rect)
        })
        .await
    }

    async fn maximize(&self) -> Result<WindowRect> {
        self.act("maximize", |s| {
            let surface = s.focused()?;
            surface.rect = WindowRect::new(0, 0, 1920, 1080);
            Ok(surface.rect)
        })
        .await
    }

    async fn close_surface(&self) -> Result<()> {
        self.act("close_surface", |s| {
            let id = s.focused_id()?;
            s.surfaces.retain(|surface| surface.id != id);
            *s.close_counts.entry(id).or_insert(0) += 1;
            s.focus = None;
            s.frame_path.clear();
            Ok(())
        })
        .await
    }

    async fn switch_to_default_content(&self) -> Result<()> {
        self.act("default_content", |s| {
            s.focused_id()?;
            s.frame_path.clear();
            Ok(())
        })
        .await
    }

    async fn switch_to_frame(&self, step: &FrameStep) -> Result<()> {
        self.act("switch_frame", |s| {
            let index = frame_index(s.current_document()?, step)?;
            s.frame_path.push(index);
            Ok(())
        })
        .await
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        self.act("find_elements", |s| {
            Ok(s.current_document()?
                .elements
                .iter()
                .filter(|e| &e.locator == locator)
                .map(|e| e.id.clone())
                .collect())
        })
        .await
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.act("click", |s| {
            s.element_mut(element)?.clicks += 1;
            Ok(())
        })
        .await
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.act("send_keys", |s| {
            s.element_mut(element)?.value.push_str(text);
            Ok(())
        })
        .await
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.act("text", |s| Ok(s.element_mut(element)?.text.clone()))
            .await
    }

    async fn quit(&self) -> Result<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.calls.push(Call::Quit);
        state.quits += 1;
        if let Some(err) = state.quit_failure.take() {
            state.alive = false;
            return Err(err);
        }
        state.ensure_alive()?;
        state.alive = false;
        Ok(())
    }

    async fn activity(&self) -> Result<Option<String>> {
        self.act("activity", |s| Ok(s.focused()?.activity.clone()))
            .await
    }

    async fn pages(&self) -> Result<Vec<PageInfo>> {
        self.act("pages", |s| Ok(s.focused()?.pages.clone())).await
    }

    async fn switch_to_page(&self, page: &str) -> Result<()> {
        self.act("switch_page", |s| {
            let surface = s.focused()?;
            if !surface.pages.iter().any(|p| p.id == page) {
                return Err(Error::page_not_found(surface.id.clone(), page));
            }
            surface.current_page = Some(page.to_string());
            Ok(())
        })
        .await
    }

    async fn is_ready(&self) -> Result<bool> {
        self.act("is_ready", |s| Ok(s.focused()?.ready)).await
    }

    async fn set_timeouts(&self, timeouts: &Timeouts) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.timeouts = Some(*timeouts);
        Ok(())
    }
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// [`Connector`] handing out one shared [`MemoryDriver`].
pub struct MemoryConnector {
    driver: MemoryDriver,
    failure: Mutex<Option<Error>>,
    last_request: Mutex<Option<ConnectRequest>>,
}

impl fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnector")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl MemoryConnector {
    /// Creates a connector for `driver`.
    #[must_use]
    pub fn new(driver: MemoryDriver) -> Self {
        Self {
            driver,
            failure: Mutex::new(None),
            last_request: Mutex::new(None),
        }
    }

    /// Makes the next connect fail with `error`.
    pub fn fail_next_with(&self, error: Error) {
        *self.failure.lock() = Some(error);
    }

    /// The last request received.
    #[must_use]
    pub fn last_request(&self) -> Option<ConnectRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, request: &ConnectRequest) -> Result<Box<dyn DriverBackend>> {
        *self.last_request.lock() = Some(request.clone());
        if let Some(err) = self.failure.lock().take() {
            return Err(err);
        }
        self.driver.state.lock().connects += 1;
        Ok(Box::new(self.driver.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_surface_gets_focus() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.open_surface("w-2", "Two", "https://two/");
        assert_eq!(driver.title().await.unwrap(), "One");
    }

    #[tokio::test]
    async fn test_navigation_history() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.route("https://two/", "Two");

        driver.navigate("https://two/").await.unwrap();
        assert_eq!(driver.title().await.unwrap(), "Two");

        driver.back().await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://one/");
        driver.forward().await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://two/");
    }

    #[tokio::test]
    async fn test_frames_and_elements() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.add_frame("w-1", &FramePath::new(), "editor", None);
        let el = driver.add_element(
            "w-1",
            &FramePath::new().name("editor"),
            Locator::id("body"),
            "hello",
        );

        assert!(driver.find_elements(&Locator::id("body")).await.unwrap().is_empty());
        driver
            .switch_to_frame(&FrameStep::Name("editor".into()))
            .await
            .unwrap();
        assert_eq!(driver.find_elements(&Locator::id("body")).await.unwrap(), vec![el.clone()]);
        assert_eq!(driver.text(&el).await.unwrap(), "hello");

        let err = driver
            .switch_to_frame(&FrameStep::Index(3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FrameNotFound { .. }));
    }

    #[tokio::test]
    async fn test_close_clears_focus() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.close_surface().await.unwrap();

        assert_eq!(driver.close_count("w-1"), 1);
        assert!(matches!(
            driver.title().await,
            Err(Error::NoSuchSurface { .. })
        ));
    }

    #[tokio::test]
    async fn test_quit_twice_reports_gone() {
        let driver = MemoryDriver::new();
        driver.quit().await.unwrap();
        assert!(matches!(driver.quit().await, Err(Error::NoSuchSession)));
        assert!(matches!(driver.surfaces().await, Err(Error::NoSuchSession)));
    }

    #[tokio::test]
    async fn test_element_failures_are_consumed() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        let el = driver.add_element("w-1", &FramePath::new(), Locator::id("go"), "Go");
        driver.fail_element_ops(1);

        assert!(matches!(driver.click(&el).await, Err(Error::StaleElement { .. })));
        driver.click(&el).await.unwrap();
        assert_eq!(driver.click_count(&el), 1);
    }
}
