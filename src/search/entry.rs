//! Index entries as ingested from the externally built query index.

use serde::{Deserialize, Deserializer};

/// The `tags` field of an entry, classified once at ingestion.
///
/// The index stores tags as a string that is usually a JSON-encoded array
/// (`"[\"photoshop\",\"how-to\"]"`) but is sometimes a bare tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagField {
    JsonArray(Vec<String>),
    PlainString(String),
}

impl TagField {
    /// Classify a raw tags value. Empty values carry no tags.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(tags) => Some(Self::JsonArray(tags)),
            Err(_) => Some(Self::PlainString(raw.to_string())),
        }
    }

    /// The tag shown on a result card, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::JsonArray(tags) => tags.first().map(String::as_str),
            Self::PlainString(tag) => Some(tag),
        }
    }

    /// The display label: first tag uppercased with hyphens turned into spaces.
    pub fn label(&self) -> Option<String> {
        self.first()
            .filter(|tag| !tag.is_empty())
            .map(|tag| tag.to_uppercase().replace('-', " "))
    }
}

/// One searchable record of the query index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub header: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "tag_field")]
    pub tags: Option<TagField>,
}

impl IndexEntry {
    /// An entry with only a title and path set.
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            header: None,
            description: String::new(),
            path: path.into(),
            image: None,
            tags: None,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into()).filter(|h: &String| !h.is_empty());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into()).filter(|i: &String| !i.is_empty());
        self
    }

    pub fn with_tags(mut self, raw: &str) -> Self {
        self.tags = TagField::parse(raw);
        self
    }

    /// The header if present, otherwise the title.
    pub fn display_title(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.title)
    }

    /// The final `/`-separated segment of the path (empty for a trailing slash).
    pub fn last_path_segment(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

/// The index document: entries live under `data`.
#[derive(Debug, Deserialize)]
pub struct IndexDocument {
    #[serde(default)]
    pub data: Option<Vec<IndexEntry>>,
}

/// Treat absent, `null`, and `""` alike.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn tag_field<'de, D>(deserializer: D) -> Result<Option<TagField>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<RawTags>::deserialize(deserializer)? {
        Some(RawTags::Text(raw)) => TagField::parse(&raw),
        Some(RawTags::List(tags)) => Some(TagField::JsonArray(tags)),
        None => None,
    })
}
