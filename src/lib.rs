pub mod cli;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod render;
pub mod search;
pub mod tracing;

pub use config::{Placeholders, SearchConfig};
pub use controller::{
    AddressBar, InputState, Key, KeyDisposition, MemoryAddressBar, PageContext, Placement,
    SearchController, SearchPhase, SearchServices,
};
pub use dom::{Element, HeadingLevel, Node};
pub use error::{FetchError, Result};
pub use fetch::{FetchResponse, Fetcher, FileFetcher, HttpFetcher, SearchIndexClient};
pub use render::{OptimizedPictures, PictureProvider, RenderGeneration, RenderOutcome, ResultRenderer};
pub use search::{IndexEntry, MatchTier, Query, TagField, rank};
