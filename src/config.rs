//! Search component configuration and placeholder text.

use crate::error::Result;
use crate::fetch::Fetcher;
use anyhow::Context as _;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Default index location, relative to the site root.
pub const DEFAULT_SOURCE: &str = "/en/query-index.json";

const NO_RESULTS_KEY: &str = "searchNoResults";
const PLACEHOLDER_KEY: &str = "searchPlaceholder";
const NO_RESULTS_FALLBACK: &str = "No results found.";
const PLACEHOLDER_FALLBACK: &str = "Search...";

/// Settings for one search component instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Index URL or site-relative path.
    pub source: String,
    /// Site origin for resolving site-relative sources and image paths.
    pub base_url: Option<String>,
    /// Trailing debounce applied to input events.
    pub debounce_ms: u64,
    /// Shortest token kept as a search term.
    pub min_term_length: usize,
    /// Breakpoint width requested from the optimized picture helper.
    pub image_width: String,
    /// Render result images through the optimized picture helper; plain `img` otherwise.
    pub optimize_images: bool,
    pub placeholders: Placeholders,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            base_url: None,
            debounce_ms: 300,
            min_term_length: crate::search::MIN_TERM_LENGTH,
            image_width: "375".to_string(),
            optimize_images: true,
            placeholders: Placeholders::default(),
        }
    }
}

impl SearchConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid search configuration")
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The parsed base URL, if one is configured.
    pub fn base_url(&self) -> Result<Option<Url>> {
        self.base_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("Invalid base_url '{}'", raw)))
            .transpose()
    }
}

/// Localized UI strings keyed by camelCase names, with English fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Placeholders(HashMap<String, String>);

#[derive(Deserialize)]
struct PlaceholderDocument {
    #[serde(default)]
    data: Vec<PlaceholderRow>,
}

#[derive(Deserialize)]
struct PlaceholderRow {
    key: String,
    #[serde(default)]
    value: String,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// A non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Message shown when a search has no results.
    pub fn no_results(&self) -> &str {
        self.get(NO_RESULTS_KEY).unwrap_or(NO_RESULTS_FALLBACK)
    }

    /// Input placeholder and accessible label.
    pub fn search_placeholder(&self) -> &str {
        self.get(PLACEHOLDER_KEY).unwrap_or(PLACEHOLDER_FALLBACK)
    }

    /// Parse a placeholders sheet (`{"data":[{"key":"search-no-results","value":..}]}`).
    /// Keys are converted from kebab-case to camelCase.
    pub fn from_json(body: &str) -> Result<Self> {
        let document: PlaceholderDocument =
            serde_json::from_str(body).context("Invalid placeholders document")?;
        Ok(Self(
            document
                .data
                .into_iter()
                .map(|row| (camel_case(&row.key), row.value))
                .collect(),
        ))
    }

    /// Fetch a placeholders sheet, falling back to an empty map on any failure.
    pub async fn fetch(fetcher: &dyn Fetcher, source: &str) -> Self {
        let response = match fetcher.get(source).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!("Placeholders at {} returned HTTP {}", source, response.status);
                return Self::default();
            }
            Err(e) => {
                tracing::warn!("Failed to fetch placeholders: {}", e);
                return Self::default();
            }
        };
        Self::from_json(&response.body).unwrap_or_else(|e| {
            tracing::warn!("Ignoring placeholders from {}: {:#}", source, e);
            Self::default()
        })
    }
}

/// `search-no-results` → `searchNoResults`.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.trim().chars() {
        if ch == '-' || ch == '_' || ch == ' ' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
