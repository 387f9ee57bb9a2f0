//! Index retrieval through a pluggable fetch capability.
//!
//! [`SearchIndexClient`] never fails loudly: every failure is logged and comes back as
//! `None`, which callers render as an empty result set.

use crate::error::FetchError;
use crate::search::{IndexDocument, IndexEntry};
use async_trait::async_trait;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A raw response from a [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET-style access to a named resource.
///
/// Implementations decide how `source` is resolved (URL, file path, fixture table).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, source: &str) -> Result<FetchResponse, FetchError>;
}

/// Fetches over HTTP, resolving site-relative sources against an optional base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpFetcher {
    pub fn new(base_url: Option<Url>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Resolve `source` to an absolute URL.
    pub fn resolve(&self, source: &str) -> Result<Url, FetchError> {
        let invalid = |message: String| FetchError::InvalidUrl {
            source_url: source.to_string(),
            message,
        };
        if let Ok(url) = Url::parse(source) {
            return Ok(url);
        }
        match &self.base_url {
            Some(base) => base.join(source).map_err(|e| invalid(e.to_string())),
            None => Err(invalid("relative source without a base URL".to_string())),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, source: &str) -> Result<FetchResponse, FetchError> {
        let url = self.resolve(source)?;
        let network = |e: reqwest::Error| FetchError::Network {
            source_url: source.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network)?;
        Ok(FetchResponse { status, body })
    }
}

/// Reads sources from a directory on disk; `/en/query-index.json` maps to
/// `<root>/en/query-index.json`. Missing files answer 404.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, source: &str) -> PathBuf {
        self.root.join(source.trim_start_matches('/'))
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn get(&self, source: &str) -> Result<FetchResponse, FetchError> {
        let path = self.resolve(source);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(FetchResponse::with_status(404))
            }
            Err(error) => Err(FetchError::Io {
                source_url: path.display().to_string(),
                error,
            }),
        }
    }
}

/// Decode an index document body into its entries.
pub fn parse_index(source: &str, body: &str) -> Result<Vec<IndexEntry>, FetchError> {
    let missing = || FetchError::MissingData {
        source_url: source.to_string(),
    };
    if body.trim().is_empty() {
        return Err(missing());
    }

    let document: Option<IndexDocument> =
        serde_json::from_str(body).map_err(|error| FetchError::Malformed {
            source_url: source.to_string(),
            error,
        })?;
    document.and_then(|doc| doc.data).ok_or_else(missing)
}

/// Fetches and decodes the search index. No caching: every call hits the fetcher.
#[derive(Clone)]
pub struct SearchIndexClient {
    fetcher: Arc<dyn Fetcher>,
    source: String,
}

impl std::fmt::Debug for SearchIndexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndexClient")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl SearchIndexClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, source: impl Into<String>) -> Self {
        Self {
            fetcher,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fetch the index, returning `None` on any failure after logging it.
    pub async fn fetch(&self) -> Option<Vec<IndexEntry>> {
        match self.try_fetch().await {
            Ok(entries) => {
                tracing::debug!("Loaded {} index entries from {}", entries.len(), self.source);
                Some(entries)
            }
            Err(e @ FetchError::Status { .. }) => {
                tracing::error!("error loading API response: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Search index unavailable: {}", e);
                None
            }
        }
    }

    /// Fetch the index, keeping the failure reason.
    pub async fn try_fetch(&self) -> Result<Vec<IndexEntry>, FetchError> {
        let response = self.fetcher.get(&self.source).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                source_url: self.source.clone(),
                status: response.status,
            });
        }
        parse_index(&self.source, &response.body)
    }
}
