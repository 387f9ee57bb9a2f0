//! Term location and highlight fragment building.
//!
//! Matching is case-insensitive and substring based. Offsets are byte offsets into the
//! original (not lowercased) text, so every span can be sliced directly even when
//! lowercasing changes the encoded length of some characters.

/// A located term occurrence in the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
}

impl Match {
    /// Byte offset one past the end of the match.
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// A piece of highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Mark(&'a str),
}

impl<'a> Segment<'a> {
    /// The underlying text, marked or not.
    pub const fn as_str(&self) -> &'a str {
        match self {
            Self::Text(text) | Self::Mark(text) => text,
        }
    }

    pub const fn is_mark(&self) -> bool {
        matches!(self, Self::Mark(_))
    }
}

/// Lowercased copy of a string that remembers where each lowercased byte came from.
struct LoweredText {
    lowered: String,
    /// For every byte of `lowered`, the byte offset of the originating char in the source.
    origin: Vec<usize>,
    source_len: usize,
}

impl LoweredText {
    fn new(text: &str) -> Self {
        let mut lowered = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (offset, ch) in text.char_indices() {
            for lower in ch.to_lowercase() {
                lowered.push(lower);
                origin.extend(std::iter::repeat_n(offset, lower.len_utf8()));
            }
        }
        Self {
            lowered,
            origin,
            source_len: text.len(),
        }
    }

    /// Map a lowercased start offset back to the source.
    fn source_start(&self, lowered_offset: usize) -> usize {
        self.origin
            .get(lowered_offset)
            .copied()
            .unwrap_or(self.source_len)
    }

    /// Map a lowercased end offset back to the source, rounding up to a char boundary when
    /// the end falls inside the lowercase expansion of a single source char.
    fn source_end(&self, text: &str, lowered_end: usize) -> usize {
        let Some(&start) = self.origin.get(lowered_end) else {
            return self.source_len;
        };
        if lowered_end > 0 && self.origin[lowered_end - 1] == start {
            let width = text[start..].chars().next().map_or(0, char::len_utf8);
            start + width
        } else {
            start
        }
    }
}

/// Find every occurrence of every term in `text`.
///
/// Each term is scanned left to right, resuming just past its previous occurrence, so a
/// term's own matches never overlap each other. Matches of different terms may overlap.
/// The result is sorted by offset; ties keep term order.
pub fn locate_matches<S: AsRef<str>>(terms: &[S], text: &str) -> Vec<Match> {
    let haystack = LoweredText::new(text);
    let mut matches = Vec::new();

    for term in terms {
        let needle = term.as_ref().to_lowercase();
        if needle.is_empty() {
            continue;
        }

        let mut start = 0;
        while let Some(found) = haystack.lowered[start..].find(&needle) {
            let lowered_offset = start + found;
            let lowered_end = lowered_offset + needle.len();
            let offset = haystack.source_start(lowered_offset);
            let end = haystack.source_end(text, lowered_end);
            matches.push(Match {
                offset,
                length: end.saturating_sub(offset),
            });
            start = lowered_end;
        }
    }

    matches.sort_by_key(|m| m.offset);
    matches
}

/// Split `text` into alternating plain and marked segments.
///
/// `matches` must be sorted by offset. A match starting before the end of the previously
/// emitted mark is skipped, so the earliest match wins and marks never overlap. With no
/// matches the whole text comes back as a single plain segment.
pub fn render_highlighted<'a>(text: &'a str, matches: &[Match]) -> Vec<Segment<'a>> {
    let mut segments = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;

    for m in matches {
        if m.offset < cursor || m.end() > text.len() {
            continue;
        }
        if m.offset > cursor {
            segments.push(Segment::Text(&text[cursor..m.offset]));
        }
        segments.push(Segment::Mark(&text[m.offset..m.end()]));
        cursor = m.end();
    }

    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    segments
}

/// Convenience wrapper: locate `terms` in `text` and build its segments.
pub fn highlight<'a, S: AsRef<str>>(terms: &[S], text: &'a str) -> Vec<Segment<'a>> {
    render_highlighted(text, &locate_matches(terms, text))
}

/// Concatenate segment text, dropping marks. Inverse of [`render_highlighted`].
pub fn plain_text(segments: &[Segment<'_>]) -> String {
    segments.iter().map(Segment::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn marked<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments
            .iter()
            .filter(|s| s.is_mark())
            .map(Segment::as_str)
            .collect()
    }

    #[test]
    fn test_locate_case_insensitive() {
        let matches = locate_matches(&["cloud"], "Creative Cloud updates");
        check!(matches == [Match { offset: 9, length: 5 }]);
    }

    #[test]
    fn test_locate_repeated_term() {
        let matches = locate_matches(&["aaa"], "aaaaaaa");
        // Non-overlapping within a term: 0..3, 3..6, then only one 'a' left.
        check!(matches == [Match { offset: 0, length: 3 }, Match { offset: 3, length: 3 }]);
    }

    #[test]
    fn test_locate_sorts_across_terms() {
        let matches = locate_matches(&["mode", "dark"], "dark mode, dark theme");
        let offsets: Vec<usize> = matches.iter().map(|m| m.offset).collect();
        check!(offsets == [0, 5, 11]);
    }

    #[test]
    fn test_highlight_basic() {
        let segments = highlight(&["cloud"], "Creative Cloud updates");
        check!(
            segments
                == [
                    Segment::Text("Creative "),
                    Segment::Mark("Cloud"),
                    Segment::Text(" updates"),
                ]
        );
    }

    #[test]
    fn test_overlapping_marks_first_wins() {
        // "photo" at 0 and "otos" at 2 overlap; the earlier one is kept.
        let segments = highlight(&["photo", "otos"], "photos and more");
        check!(marked(&segments) == ["photo"]);
        check!(plain_text(&segments) == "photos and more");
    }

    #[test]
    fn test_no_matches_returns_text_unchanged() {
        let segments = highlight(&["zzz"], "Nothing here");
        check!(segments == [Segment::Text("Nothing here")]);
    }

    #[test]
    fn test_empty_text() {
        check!(highlight(&["abc"], "").is_empty());
    }

    #[test]
    fn test_non_ascii_offsets_are_char_boundaries() {
        let text = "Über STRASSE straße";
        let segments = highlight(&["über", "straße"], text);
        check!(marked(&segments) == ["Über", "straße"]);
        check!(plain_text(&segments) == text);
    }

    #[test]
    fn test_lowercase_expansion_does_not_split_chars() {
        // 'İ' lowercases to two chars; a match ending inside that expansion rounds up.
        let text = "İstanbul guide";
        let segments = highlight(&["i"], text);
        check!(plain_text(&segments) == text);
        check!(marked(&segments) == ["İ", "i"]);
    }

    #[rstest]
    #[case(&["cloud"], "Creative Cloud updates")]
    #[case(&["dark", "mode"], "Dark Mode Guide: mode switching in the dark")]
    #[case(&["ado", "dobe"], "Adobe adobe ADOBE")]
    #[case(&["xyz"], "no hits at all")]
    #[case(&["ré"], "Résumé réviseur")]
    fn test_round_trip_preserves_text(#[case] terms: &[&str], #[case] text: &str) {
        let segments = highlight(terms, text);
        check!(plain_text(&segments) == text);
        let marks = marked(&segments);
        for mark in marks {
            check!(terms.iter().any(|t| mark.to_lowercase() == t.to_lowercase()));
        }
    }
}
