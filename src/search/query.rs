//! Query parsing: raw input text to lowercased search terms.

/// Terms shorter than this are dropped from a query.
pub const MIN_TERM_LENGTH: usize = 3;

/// A parsed search query.
///
/// Built fresh from the input value on every search; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    terms: Vec<String>,
}

impl Query {
    /// Parse `raw` using the default minimum term length.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with_min_length(raw, MIN_TERM_LENGTH)
    }

    /// Parse `raw`, keeping whitespace-separated tokens of at least `min_length` characters.
    ///
    /// Terms are lowercased and keep their input order, duplicates included.
    pub fn parse_with_min_length(raw: &str, min_length: usize) -> Self {
        let terms = raw
            .to_lowercase()
            .split_whitespace()
            .filter(|term| term.chars().count() >= min_length)
            .map(str::to_string)
            .collect();

        Self {
            raw: raw.to_string(),
            terms,
        }
    }

    /// The input text exactly as typed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The search terms, in input order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// True when no term survived filtering; such a query matches nothing.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The terms rejoined by single spaces, used for exact phrase matching.
    pub fn phrase(&self) -> String {
        self.terms.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("Dark Mode", &["dark", "mode"])]
    #[case("  creative   CLOUD\tupdates ", &["creative", "cloud", "updates"])]
    #[case("ab cd ef", &[])]
    #[case("ab", &[])]
    #[case("", &[])]
    #[case("an api for the web", &["api", "for", "the", "web"])]
    #[case("foo foo", &["foo", "foo"])]
    fn test_parse_terms(#[case] input: &str, #[case] expected: &[&str]) {
        let query = Query::parse(input);
        check!(query.terms() == expected);
        check!(query.raw() == input);
    }

    #[test]
    fn test_phrase_collapses_whitespace() {
        let query = Query::parse("Dark    Mode  Guide");
        check!(query.phrase() == "dark mode guide");
    }

    #[test]
    fn test_short_tokens_dropped_from_phrase() {
        let query = Query::parse("how to use lightroom");
        check!(query.phrase() == "how use lightroom");
    }

    #[test]
    fn test_custom_min_length() {
        let query = Query::parse_with_min_length("ai in ps", 2);
        check!(query.terms() == ["ai", "in", "ps"]);
    }

    #[test]
    fn test_empty_query() {
        check!(Query::parse("a b").is_empty());
        check!(!Query::parse("abc").is_empty());
    }
}
