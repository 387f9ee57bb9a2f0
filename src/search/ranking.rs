//! Tiered relevance ranking and title deduplication.
//!
//! Every entry lands in at most one [`MatchTier`], checked in tier order. Tiers are then
//! concatenated best first and sorted within themselves, and finally entries whose
//! lowercased titles repeat are dropped in favor of their best-ranked occurrence.

use super::entry::IndexEntry;
use ahash::AHashSet;
use std::cmp::Reverse;

/// Match strength classes, best first. The derived ordering is the output ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    /// The full phrase occurs in the (header or) title.
    ExactTitlePhrase,
    /// The full phrase occurs in the title, description, or path slug.
    ExactMetaPhrase,
    /// At least one term occurs in the (header or) title.
    HeaderTermHits,
    /// At least one term occurs in the title, description, or path slug.
    MetaTermHits,
}

impl MatchTier {
    const fn is_phrase(self) -> bool {
        matches!(self, Self::ExactTitlePhrase | Self::ExactMetaPhrase)
    }
}

/// An entry placed in a tier, with its sort keys.
#[derive(Debug, Clone, Copy)]
pub struct BucketedMatch<'a> {
    pub entry: &'a IndexEntry,
    pub tier: MatchTier,
    /// Character offset of the phrase, or of the earliest term hit.
    pub first_match_offset: usize,
    /// Number of query terms found; for phrase tiers, the number of terms in the phrase.
    pub term_hit_count: usize,
}

/// Text an entry is matched against, lowercased once.
struct MatchFields {
    title: String,
    meta: String,
}

impl MatchFields {
    fn new(entry: &IndexEntry) -> Self {
        let title = entry.display_title().to_lowercase();
        let meta = format!(
            "{} {} {}",
            entry.title,
            entry.description,
            entry.last_path_segment()
        )
        .to_lowercase();
        Self { title, meta }
    }
}

/// Character offset of `needle` in `haystack`.
fn char_offset(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

/// Scan `terms` against `text`, returning (hit count, earliest offset) if any term hits.
fn term_hits<S: AsRef<str>>(terms: &[S], text: &str) -> Option<(usize, usize)> {
    let mut hits = 0;
    let mut min_offset: Option<usize> = None;

    for term in terms {
        if let Some(offset) = char_offset(text, term.as_ref()) {
            hits += 1;
            min_offset = Some(min_offset.map_or(offset, |min| min.min(offset)));
        }
    }

    min_offset.map(|offset| (hits, offset))
}

/// Place one entry into its tier, or `None` if nothing matches.
pub fn classify<'a, S: AsRef<str>>(
    terms: &[S],
    phrase: &str,
    entry: &'a IndexEntry,
) -> Option<BucketedMatch<'a>> {
    let fields = MatchFields::new(entry);
    let bucket = |tier, first_match_offset, term_hit_count| BucketedMatch {
        entry,
        tier,
        first_match_offset,
        term_hit_count,
    };

    if let Some(offset) = char_offset(&fields.title, phrase) {
        return Some(bucket(MatchTier::ExactTitlePhrase, offset, terms.len()));
    }
    if let Some(offset) = char_offset(&fields.meta, phrase) {
        return Some(bucket(MatchTier::ExactMetaPhrase, offset, terms.len()));
    }
    if let Some((hits, offset)) = term_hits(terms, &fields.title) {
        return Some(bucket(MatchTier::HeaderTermHits, offset, hits));
    }
    term_hits(terms, &fields.meta).map(|(hits, offset)| bucket(MatchTier::MetaTermHits, offset, hits))
}

/// Classify and order all matching entries, without deduplication.
///
/// Phrase tiers sort by offset; term tiers sort by hit count descending, then offset.
/// The sort is stable, so equal keys keep index order.
pub fn bucket_matches<'a, S: AsRef<str>>(
    terms: &[S],
    entries: &'a [IndexEntry],
) -> Vec<BucketedMatch<'a>> {
    if terms.is_empty() {
        return Vec::new();
    }
    let phrase = terms
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ");

    let mut matches: Vec<BucketedMatch<'a>> = entries
        .iter()
        .filter_map(|entry| classify(terms, &phrase, entry))
        .collect();

    matches.sort_by_key(|m| {
        let hits = if m.tier.is_phrase() { 0 } else { m.term_hit_count };
        (m.tier, Reverse(hits), m.first_match_offset)
    });
    matches
}

/// Drop entries whose lowercased title was already seen, keeping the first.
pub fn dedup_by_title<'a, I>(ranked: I) -> Vec<&'a IndexEntry>
where
    I: IntoIterator<Item = &'a IndexEntry>,
{
    let mut seen = AHashSet::new();
    ranked
        .into_iter()
        .filter(|entry| seen.insert(entry.title.to_lowercase()))
        .collect()
}

/// Rank `entries` against `terms`: tiered ordering followed by title deduplication.
///
/// No terms means no results, not every entry.
pub fn rank<'a, S: AsRef<str>>(terms: &[S], entries: &'a [IndexEntry]) -> Vec<&'a IndexEntry> {
    let matches = bucket_matches(terms, entries);
    tracing::trace!(
        "Ranked {} of {} entries for {} terms",
        matches.len(),
        entries.len(),
        terms.len()
    );
    dedup_by_title(matches.into_iter().map(|m| m.entry))
}
