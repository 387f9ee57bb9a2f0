//! Search component controller: debounced input, query persistence, and the
//! fetch → rank → render pipeline.
//!
//! One [`SearchController`] owns all mutable state of one search component: the pending
//! debounce timer, the render generation counter, the input field, and the results
//! container. Several controllers on one page never share any of it.

use crate::config::SearchConfig;
use crate::dom::{Element, HeadingLevel, next_heading_level};
use crate::fetch::{Fetcher, SearchIndexClient};
use crate::render::{
    Breakpoint, PictureProvider, RenderGeneration, RenderOutcome, ResultRenderer,
    ResultsContainer, SharedResults,
};
use crate::search::{Query, rank};
use reqwest::Url;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Address bar parameter mirroring the search text.
pub const QUERY_PARAM: &str = "q";

/// Class marking the navigation variant of the component.
pub const NAV_SEARCH_CLASS: &str = "nav-search";

/// Class added to the top navigation when the search is pinned into it.
pub const TOP_NAV_MARKER_CLASS: &str = "has-blog-nav-search";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Access to the browser address bar, replacing history state in place.
pub trait AddressBar: Send + Sync {
    fn location(&self) -> Url;
    fn replace(&self, url: Url);
}

/// An address bar held in memory.
#[derive(Debug)]
pub struct MemoryAddressBar(Mutex<Url>);

impl MemoryAddressBar {
    pub const fn new(url: Url) -> Self {
        Self(Mutex::new(url))
    }
}

impl AddressBar for MemoryAddressBar {
    fn location(&self) -> Url {
        lock(&self.0).clone()
    }

    fn replace(&self, url: Url) {
        *lock(&self.0) = url;
    }
}

/// Return `url` with `key` set to `value` (in place if present), or removed when `value`
/// is `None`. Other parameters keep their order.
pub fn with_query_param(url: &Url, key: &str, value: Option<&str>) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (k, v) in url.query_pairs() {
        if k == key {
            if let (Some(value), false) = (value, replaced) {
                pairs.push((k.into_owned(), value.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    if let (Some(value), false) = (value, replaced) {
        pairs.push((key.to_string(), value.to_string()));
    }

    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(&pairs);
    }
    next
}

/// The search text currently stored in the address bar, if any.
pub fn query_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == QUERY_PARAM)
        .map(|(_, v)| v.into_owned())
}

/// What the hosting page looks like where the component is activated.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// The page has a `header` element.
    pub has_header: bool,
    /// The page has a top navigation bar to pin into.
    pub has_top_nav: bool,
    /// Classes already on the component element.
    pub component_classes: Vec<String>,
    /// The component's `data-source` attribute.
    pub data_source: Option<String>,
    /// Headings preceding the component, in document order.
    pub preceding_headings: Vec<HeadingLevel>,
}

impl PageContext {
    pub fn has_class(&self, class: &str) -> bool {
        self.component_classes.iter().any(|c| c == class)
    }
}

/// Where the component renders itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Search box and results inline in the page.
    Inline,
    /// Navigation variant; `pinned` when placed inside the top navigation bar.
    Nav { pinned: bool },
}

impl Placement {
    pub fn detect(page: &PageContext) -> Self {
        if page.has_header || page.has_class(NAV_SEARCH_CLASS) {
            Self::Nav {
                pinned: page.has_top_nav,
            }
        } else {
            Self::Inline
        }
    }

    pub const fn is_nav(self) -> bool {
        matches!(self, Self::Nav { .. })
    }
}

/// Coarse state of the search pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    /// A debounce timer is armed.
    Debouncing,
    /// A fetch/render pipeline for the latest query is in flight.
    Querying,
    /// Results and the address bar query were cleared.
    Cleared,
}

/// Keys the component reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    Other,
}

/// Whether a key event may reach page-level handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Propagate,
    StopPropagation,
}

/// The search input field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub value: String,
    pub focused: bool,
}

/// Collaborators supplied by the hosting page.
#[derive(Clone)]
pub struct SearchServices {
    pub fetcher: Arc<dyn Fetcher>,
    pub address_bar: Arc<dyn AddressBar>,
    pub pictures: Option<Arc<dyn PictureProvider>>,
}

impl SearchServices {
    pub fn new(fetcher: Arc<dyn Fetcher>, address_bar: Arc<dyn AddressBar>) -> Self {
        Self {
            fetcher,
            address_bar,
            pictures: None,
        }
    }

    pub fn with_pictures(mut self, pictures: Arc<dyn PictureProvider>) -> Self {
        self.pictures = Some(pictures);
        self
    }
}

/// State shared with spawned timer and pipeline tasks.
struct Shared {
    config: SearchConfig,
    client: SearchIndexClient,
    renderer: ResultRenderer,
    results: SharedResults,
    generation: RenderGeneration,
    address_bar: Arc<dyn AddressBar>,
    phase: Mutex<SearchPhase>,
    input: Mutex<InputState>,
}

impl Shared {
    fn set_phase(&self, phase: SearchPhase) {
        *lock(&self.phase) = phase;
    }

    fn set_query_param(&self, value: Option<&str>) {
        let url = with_query_param(&self.address_bar.location(), QUERY_PARAM, value);
        self.address_bar.replace(url);
    }

    /// Clear results and the address bar query, invalidating in-flight renders.
    async fn clear(&self) {
        self.generation.advance();
        self.results.write().await.clear();
        self.set_query_param(None);
        self.set_phase(SearchPhase::Cleared);
    }

    async fn run_query(self: Arc<Self>, raw: String) {
        self.set_query_param(Some(&raw));

        let query = Query::parse_with_min_length(&raw, self.config.min_term_length);
        if query.is_empty() {
            tracing::debug!("Query {:?} has no usable terms, clearing", raw);
            self.clear().await;
            return;
        }

        self.set_phase(SearchPhase::Querying);
        let generation = self.generation.advance();
        tracing::debug!("Searching {:?} as {:?}", query.terms(), generation);

        let entries = self.client.fetch().await.unwrap_or_default();
        if !self.generation.is_current(generation) {
            tracing::debug!("{:?} superseded before ranking", generation);
            return;
        }

        let ranked = rank(query.terms(), &entries);
        let outcome = self.renderer.render(generation, &ranked, query.terms()).await;
        tracing::debug!("{:?} for {:?}: {:?}", generation, query.raw(), outcome);

        if outcome != RenderOutcome::Stale && self.generation.is_current(generation) {
            // A newer keystroke may have re-armed the timer in the meantime.
            let mut phase = lock(&self.phase);
            if *phase == SearchPhase::Querying {
                *phase = SearchPhase::Idle;
            }
        }
    }
}

/// Controller for one search component instance.
pub struct SearchController {
    shared: Arc<Shared>,
    placement: Placement,
    heading: HeadingLevel,
    placeholder: String,
    debounce: Mutex<Option<JoinHandle<()>>>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("placement", &self.placement)
            .field("phase", &self.phase())
            .field("generation", &self.shared.generation.current())
            .field("source", &self.shared.client.source())
            .finish_non_exhaustive()
    }
}

impl SearchController {
    /// Activate a search component on `page`.
    ///
    /// Any `q` parameter already in the address bar is removed; a previous search is
    /// never replayed.
    pub fn activate(config: SearchConfig, page: &PageContext, services: SearchServices) -> Self {
        let location = services.address_bar.location();
        if query_param(&location).is_some() {
            services
                .address_bar
                .replace(with_query_param(&location, QUERY_PARAM, None));
        }

        let placement = Placement::detect(page);
        let heading = next_heading_level(page.preceding_headings.iter().copied());
        let source = page
            .data_source
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| config.source.clone());

        let results = ResultsContainer::shared(heading);
        let generation = RenderGeneration::new();
        let mut renderer = ResultRenderer::new(
            results.clone(),
            generation.clone(),
            config.placeholders.no_results(),
        )
        .with_breakpoints(vec![Breakpoint::width(config.image_width.clone())]);
        if let Some(pictures) = services.pictures.filter(|_| config.optimize_images) {
            renderer = renderer.with_pictures(pictures);
        }

        tracing::debug!(
            "Activated search ({:?}, titles as {}) over {}",
            placement,
            heading,
            source
        );

        let placeholder = config.placeholders.search_placeholder().to_string();
        let shared = Arc::new(Shared {
            client: SearchIndexClient::new(services.fetcher, source),
            config,
            renderer,
            results,
            generation,
            address_bar: services.address_bar,
            phase: Mutex::new(SearchPhase::Idle),
            input: Mutex::new(InputState::default()),
        });

        Self {
            shared,
            placement,
            heading,
            placeholder,
            debounce: Mutex::new(None),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub const fn placement(&self) -> Placement {
        self.placement
    }

    pub fn phase(&self) -> SearchPhase {
        *lock(&self.shared.phase)
    }

    pub fn input(&self) -> InputState {
        lock(&self.shared.input).clone()
    }

    pub fn results(&self) -> &SharedResults {
        &self.shared.results
    }

    /// Heading level used for result titles.
    pub const fn heading(&self) -> HeadingLevel {
        self.heading
    }

    /// Handle an input event carrying the field's new value.
    ///
    /// Re-arms the trailing debounce timer; only the last value within the debounce
    /// window is searched.
    pub fn on_input(&self, value: impl Into<String>) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let value = value.into();
        lock(&self.shared.input).value.clone_from(&value);
        self.shared.set_phase(SearchPhase::Debouncing);

        let mut pending = lock(&self.debounce);
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let shared = self.shared.clone();
        let delay = self.shared.config.debounce();
        let shutdown = self.shutdown.clone();
        let tasks = self.tasks.clone();
        *pending = Some(self.tasks.spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    // The pipeline outlives the timer so re-arming never cancels it.
                    tasks.spawn(shared.run_query(value));
                }
            }
        }));
    }

    pub fn focus(&self) {
        lock(&self.shared.input).focused = true;
    }

    /// Handle a key press in the search input.
    ///
    /// Escape clears the query and results (and blurs the nav variant). Space never
    /// reaches page-level shortcut handlers.
    pub async fn on_key(&self, key: Key) -> KeyDisposition {
        match key {
            Key::Space => KeyDisposition::StopPropagation,
            Key::Escape => {
                self.cancel_pending();
                self.shared.clear().await;
                let mut input = lock(&self.shared.input);
                input.value.clear();
                if self.placement.is_nav() {
                    input.focused = false;
                }
                KeyDisposition::Propagate
            }
            Key::Other => KeyDisposition::Propagate,
        }
    }

    /// Clear results and the address bar query.
    pub async fn clear(&self) {
        self.cancel_pending();
        self.shared.clear().await;
    }

    /// Drop the pending debounce timer, if any.
    pub fn cancel_pending(&self) {
        if let Some(timer) = lock(&self.debounce).take() {
            timer.abort();
        }
    }

    /// Wait until every armed timer and in-flight pipeline has finished.
    pub async fn settled(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        if !self.shutdown.is_cancelled() {
            self.tasks.reopen();
        }
    }

    /// Tear the component down: pending timers stop and in-flight renders are discarded.
    pub fn dispose(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.cancel_pending();
        self.shared.generation.advance();
        self.tasks.close();
        tracing::debug!("Search component disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Serialize the component: its host element with an isolated (shadow) scope
    /// holding the search box and results list.
    pub async fn snapshot(&self) -> Element {
        // Icon markup is filled in by the page's icon decoration.
        let icon = Element::new("span").with_class("icon").with_class("icon-search");
        let input = {
            let state = lock(&self.shared.input);
            Element::new("input")
                .with_attr("type", "search")
                .with_class("search-input")
                .with_attr("placeholder", self.placeholder.clone())
                .with_attr("aria-label", self.placeholder.clone())
                .with_attr("value", state.value.clone())
        };
        let results = self.shared.results.read().await.element().clone();

        let mut scope = Element::new("template").with_attr("shadowrootmode", "open");
        match self.placement {
            Placement::Nav { pinned: true } => {
                scope.append(
                    Element::new("div")
                        .with_class("nav-search-container")
                        .with_child(icon)
                        .with_child(input)
                        .with_child(results),
                );
            }
            Placement::Inline | Placement::Nav { pinned: false } => {
                scope.append(
                    Element::new("div")
                        .with_class("search-box")
                        .with_child(icon)
                        .with_child(input),
                );
                scope.append(results);
            }
        }

        let mut host = Element::new("blog-search");
        if self.placement.is_nav() {
            host.add_class(NAV_SEARCH_CLASS);
        }
        host.with_child(scope)
    }

    /// Class the hosting page should add to its top navigation, if pinned there.
    pub const fn top_nav_class(&self) -> Option<&'static str> {
        match self.placement {
            Placement::Nav { pinned: true } => Some(TOP_NAV_MARKER_CLASS),
            _ => None,
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.dispose();
        tracing::trace!("SearchController dropped");
    }
}
