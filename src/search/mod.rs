//! Client-side search over a pre-built content index.
//!
//! This module provides query parsing, tiered relevance ranking with title
//! deduplication, and case-insensitive term highlighting.

// Module declarations
pub mod entry;
pub mod highlight;
pub mod query;
pub mod ranking;

// Public re-exports (used via lib.rs)
pub use entry::{IndexDocument, IndexEntry, TagField};
pub use highlight::{Match, Segment, highlight, locate_matches, plain_text, render_highlighted};
pub use query::{MIN_TERM_LENGTH, Query};
pub use ranking::{BucketedMatch, MatchTier, bucket_matches, dedup_by_title, rank};
