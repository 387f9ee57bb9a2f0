//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_index`: a small index document covering every ranking tier
//! - `stub_fetcher`: a [`StubFetcher`] that always answers with `sample_index`
//!
//! Stub fetchers implement [`Fetcher`] directly and can script a delay per call, which
//! together with `#[tokio::test(start_paused = true)]` makes render races deterministic.

use async_trait::async_trait;
use blog_search::dom::Element;
use blog_search::fetch::{FetchResponse, Fetcher};
use blog_search::render::{Breakpoint, PictureProvider};
use blog_search::{
    FetchError, MemoryAddressBar, PageContext, SearchConfig, SearchController, SearchServices,
};
use reqwest::Url;
use rstest::fixture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PAGE_URL: &str = "https://blog.example.com/en/topics/design";

/// One scripted answer: wait `delay`, then respond.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub delay: Duration,
    pub response: FetchResponse,
}

#[allow(dead_code)] // Constructors used across different integration test crates
impl Scripted {
    pub fn ok(body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            response: FetchResponse::ok(body),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            response: FetchResponse::with_status(status),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A fetcher answering from a script, then from a fallback, counting every call.
#[derive(Debug)]
pub struct StubFetcher {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    calls: AtomicUsize,
    sources: Mutex<Vec<String>>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl StubFetcher {
    pub fn new(fallback: Scripted) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Queue answers consumed one per call, before the fallback applies.
    pub fn with_script(self, script: impl IntoIterator<Item = Scripted>) -> Self {
        self.script.lock().unwrap().extend(script);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn get(&self, source: &str) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(source.to_string());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if !next.delay.is_zero() {
            tokio::time::sleep(next.delay).await;
        }
        Ok(next.response)
    }
}

/// A picture helper that waits a per-image delay, recording the order images finish in.
#[derive(Debug, Default)]
pub struct DelayedPictures {
    delays: Vec<(String, Duration)>,
    finished: Mutex<Vec<String>>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl DelayedPictures {
    pub fn new(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(src, millis)| ((*src).to_string(), Duration::from_millis(*millis)))
                .collect(),
            finished: Mutex::new(Vec::new()),
        }
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl PictureProvider for DelayedPictures {
    async fn picture(&self, src: &str, alt: &str, _eager: bool, _: &[Breakpoint]) -> Element {
        let delay = self
            .delays
            .iter()
            .find(|(s, _)| s == src)
            .map_or(Duration::ZERO, |(_, d)| *d);
        tokio::time::sleep(delay).await;
        self.finished.lock().unwrap().push(src.to_string());
        Element::new("picture").with_child(Element::new("img").with_attr("src", src).with_attr("alt", alt))
    }
}

/// Index document with entries for every ranking tier, a duplicate title, and both tag
/// encodings.
#[fixture]
pub fn sample_index() -> String {
    serde_json::json!({
        "total": 7,
        "offset": 0,
        "limit": 7,
        "data": [
            {
                "title": "Mode selection and dark themes",
                "description": "Choosing a colour mode for your workspace.",
                "path": "/en/topics/design/mode-selection",
                "image": "/media/mode.png",
                "tags": "[\"design-systems\", \"color\"]"
            },
            {
                "title": "Dark Mode Guide",
                "description": "Everything about dark mode.",
                "path": "/en/topics/design/dark-mode-guide",
                "image": "/media/dark.jpg",
                "tags": "how-to"
            },
            {
                "title": "Release Notes",
                "description": "What changed in the dark theme this month.",
                "path": "/en/news/release-notes-june",
                "image": "",
                "tags": ""
            },
            {
                "title": "Release Notes",
                "description": "Older notes.",
                "path": "/en/news/release-notes-may"
            },
            {
                "title": "Creative Cloud updates",
                "description": "New features across the suite.",
                "path": "/en/news/creative-cloud-updates"
            },
            {
                "title": "Foobar basics",
                "description": "Getting started.",
                "path": "/en/topics/foobar-basics"
            },
            {
                "title": "Foo fighters fan page",
                "description": "A different band entirely.",
                "path": "/en/topics/foo"
            }
        ]
    })
    .to_string()
}

#[allow(dead_code)] // Used across different integration test crates
#[fixture]
pub fn stub_fetcher(sample_index: String) -> Arc<StubFetcher> {
    Arc::new(StubFetcher::new(Scripted::ok(&sample_index)))
}

#[allow(dead_code)] // Used across different integration test crates
pub fn page_url() -> Url {
    Url::parse(PAGE_URL).unwrap()
}

/// A controller over `fetcher` with an in-memory address bar at [`PAGE_URL`].
#[allow(dead_code)] // Used across different integration test crates
pub fn activate(
    page: &PageContext,
    fetcher: Arc<StubFetcher>,
) -> (SearchController, Arc<MemoryAddressBar>) {
    activate_at(page, fetcher, page_url())
}

#[allow(dead_code)] // Used across different integration test crates
pub fn activate_at(
    page: &PageContext,
    fetcher: Arc<StubFetcher>,
    location: Url,
) -> (SearchController, Arc<MemoryAddressBar>) {
    let address_bar = Arc::new(MemoryAddressBar::new(location));
    let services = SearchServices::new(fetcher, address_bar.clone());
    let controller = SearchController::activate(SearchConfig::default(), page, services);
    (controller, address_bar)
}
