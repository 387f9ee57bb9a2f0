//! Turning ranked entries into result list items.
//!
//! Rendering for one search composes every item concurrently, then applies the whole
//! batch to the [`ResultsContainer`] in ranked order, and only if the batch's
//! [`Generation`] is still the current one. A stale batch is dropped without touching
//! the container.

use crate::dom::{Element, HeadingLevel, Node};
use crate::search::{IndexEntry, Segment, highlight};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Identifies one search invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic counter of search invocations; only the latest may write results.
///
/// Cloning shares the counter.
#[derive(Debug, Clone, Default)]
pub struct RenderGeneration(Arc<AtomicU64>);

impl RenderGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating every earlier one.
    pub fn advance(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

/// One responsive image breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub media: Option<String>,
    pub width: String,
}

impl Breakpoint {
    pub fn width(width: impl Into<String>) -> Self {
        Self {
            media: None,
            width: width.into(),
        }
    }
}

/// Builds optimized `picture` elements for result images.
#[async_trait]
pub trait PictureProvider: Send + Sync {
    async fn picture(&self, src: &str, alt: &str, eager: bool, breakpoints: &[Breakpoint])
    -> Element;
}

/// Picture helper for media served with on-the-fly resizing: a webp `source` per
/// breakpoint, then original-format `source`s and a final `img`.
#[derive(Debug, Clone, Default)]
pub struct OptimizedPictures {
    base_url: Option<Url>,
}

impl OptimizedPictures {
    pub const fn new(base_url: Option<Url>) -> Self {
        Self { base_url }
    }

    /// The path component of `src`, resolved against the base URL when relative.
    fn pathname(&self, src: &str) -> String {
        let resolved = Url::parse(src)
            .ok()
            .or_else(|| self.base_url.as_ref().and_then(|base| base.join(src).ok()));
        match resolved {
            Some(url) => url.path().to_string(),
            None => src.split(['?', '#']).next().unwrap_or_default().to_string(),
        }
    }
}

#[async_trait]
impl PictureProvider for OptimizedPictures {
    async fn picture(
        &self,
        src: &str,
        alt: &str,
        eager: bool,
        breakpoints: &[Breakpoint],
    ) -> Element {
        let pathname = self.pathname(src);
        let ext = pathname.rsplit_once('.').map_or("", |(_, ext)| ext);
        let mut picture = Element::new("picture");

        for br in breakpoints {
            let mut source = Element::new("source");
            if let Some(media) = &br.media {
                source.set_attr("media", media.clone());
            }
            source.set_attr("type", "image/webp");
            source.set_attr(
                "srcset",
                format!("{}?width={}&format=webply&optimize=medium", pathname, br.width),
            );
            picture.append(source);
        }

        for (i, br) in breakpoints.iter().enumerate() {
            let url = format!("{}?width={}&format={}&optimize=medium", pathname, br.width, ext);
            if i + 1 < breakpoints.len() {
                let mut source = Element::new("source");
                if let Some(media) = &br.media {
                    source.set_attr("media", media.clone());
                }
                source.set_attr("srcset", url);
                picture.append(source);
            } else {
                picture.append(
                    Element::new("img")
                        .with_attr("src", url)
                        .with_attr("loading", if eager { "eager" } else { "lazy" })
                        .with_attr("alt", alt),
                );
            }
        }

        picture
    }
}

/// The visible result list (`ul.search-results`).
#[derive(Debug, Clone)]
pub struct ResultsContainer {
    element: Element,
    heading: HeadingLevel,
}

/// A results container shared between the controller and in-flight renders.
pub type SharedResults = Arc<RwLock<ResultsContainer>>;

impl ResultsContainer {
    pub fn new(heading: HeadingLevel) -> Self {
        let element = Element::new("ul")
            .with_class("search-results")
            .with_attr("data-h", heading.to_string());
        Self { element, heading }
    }

    pub fn shared(heading: HeadingLevel) -> SharedResults {
        Arc::new(RwLock::new(Self::new(heading)))
    }

    /// Heading level for result titles.
    pub const fn heading(&self) -> HeadingLevel {
        self.heading
    }

    pub const fn element(&self) -> &Element {
        &self.element
    }

    pub fn items(&self) -> &[Node] {
        self.element.children()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn is_no_results(&self) -> bool {
        self.element.has_class("no-results")
    }

    pub fn clear(&mut self) {
        self.element.replace_children(Vec::new());
    }

    fn show_results(&mut self, items: Vec<Node>) {
        self.element.remove_class("no-results");
        self.element.replace_children(items);
    }

    fn show_no_results(&mut self, message: &str) {
        self.element.add_class("no-results");
        self.element
            .replace_children(vec![Element::new("li").with_child(Node::text(message)).into()]);
    }
}

/// Result of one render attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The batch was written to the container.
    Applied { results: usize },
    /// There were no results; the placeholder item was written.
    NoResults,
    /// A newer search started first; nothing was written.
    Stale,
}

/// Wrap term matches in `mark` elements.
pub fn highlighted_nodes<S: AsRef<str>>(terms: &[S], text: &str) -> Vec<Node> {
    highlight(terms, text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => Node::text(text),
            Segment::Mark(text) => Element::new("mark").with_child(Node::text(text)).into(),
        })
        .collect()
}

/// Renders ranked entries into the shared results container.
#[derive(Clone)]
pub struct ResultRenderer {
    container: SharedResults,
    generation: RenderGeneration,
    pictures: Option<Arc<dyn PictureProvider>>,
    breakpoints: Vec<Breakpoint>,
    no_results_message: String,
}

impl std::fmt::Debug for ResultRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultRenderer")
            .field("generation", &self.generation.current())
            .field("has_pictures", &self.pictures.is_some())
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

impl ResultRenderer {
    pub fn new(
        container: SharedResults,
        generation: RenderGeneration,
        no_results_message: impl Into<String>,
    ) -> Self {
        Self {
            container,
            generation,
            pictures: None,
            breakpoints: vec![Breakpoint::width("375")],
            no_results_message: no_results_message.into(),
        }
    }

    /// Use `pictures` for result images. Without a provider, images fall back to a
    /// plain lazy-loading `img`.
    pub fn with_pictures(mut self, pictures: Arc<dyn PictureProvider>) -> Self {
        self.pictures = Some(pictures);
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: Vec<Breakpoint>) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub const fn container(&self) -> &SharedResults {
        &self.container
    }

    /// Build the list item for one entry.
    pub async fn render_result<S: AsRef<str> + Sync>(
        &self,
        entry: &IndexEntry,
        terms: &[S],
        heading: HeadingLevel,
    ) -> Element {
        let mut card = Element::new("a").with_attr("href", entry.path.clone());

        if let Some(image) = &entry.image {
            let content = match &self.pictures {
                Some(pictures) => pictures.picture(image, "", false, &self.breakpoints).await,
                None => Element::new("img")
                    .with_attr("src", image.clone())
                    .with_attr("alt", entry.title.clone())
                    .with_attr("loading", "lazy"),
            };
            card.append(
                Element::new("div")
                    .with_class("search-result-image")
                    .with_child(content),
            );
        }

        if let Some(label) = entry.tags.as_ref().and_then(|tags| tags.label()) {
            card.append(
                Element::new("span")
                    .with_class("search-result-tags")
                    .with_child(Node::text(label)),
            );
        }

        if !entry.title.is_empty() {
            let mut link = Element::new("a").with_attr("href", entry.path.clone());
            for node in highlighted_nodes(terms, &entry.title) {
                link.append(node);
            }
            card.append(
                Element::new(heading.tag())
                    .with_class("search-result-title")
                    .with_child(link),
            );
        }

        if !entry.description.is_empty() {
            let mut description = Element::new("p");
            for node in highlighted_nodes(terms, &entry.description) {
                description.append(node);
            }
            card.append(description);
        }

        Element::new("li").with_child(card)
    }

    /// Render `ranked` for `generation`, replacing the container's items if and only if
    /// `generation` is still current once every item is built.
    pub async fn render<S: AsRef<str> + Sync>(
        &self,
        generation: Generation,
        ranked: &[&IndexEntry],
        terms: &[S],
    ) -> RenderOutcome {
        let heading = self.container.read().await.heading();

        if ranked.is_empty() {
            let mut container = self.container.write().await;
            if !self.generation.is_current(generation) {
                tracing::debug!("Discarding stale empty render {:?}", generation);
                return RenderOutcome::Stale;
            }
            container.show_no_results(&self.no_results_message);
            return RenderOutcome::NoResults;
        }

        let items = join_all(
            ranked
                .iter()
                .map(|entry| self.render_result(entry, terms, heading)),
        )
        .await;

        let mut container = self.container.write().await;
        if !self.generation.is_current(generation) {
            tracing::debug!(
                "Discarding stale render {:?} ({} results), current is {:?}",
                generation,
                items.len(),
                self.generation.current()
            );
            return RenderOutcome::Stale;
        }
        let results = items.len();
        container.show_results(items.into_iter().map(Node::from).collect());
        RenderOutcome::Applied { results }
    }
}
