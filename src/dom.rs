//! Minimal owned document tree used for rendered search output.
//!
//! Nodes are plain data; they serialize to HTML through [`std::fmt::Display`].

use std::fmt::{self, Display, Formatter, Write as _};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["img", "input", "source", "br", "hr", "meta", "link"];

/// A document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set an attribute, replacing any previous value.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    pub fn remove_class(&mut self, class: &str) {
        if let Some(existing) = self.attr("class") {
            let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
            let remaining = remaining.join(" ");
            if remaining.is_empty() {
                self.attributes.retain(|(n, _)| n != "class");
            } else {
                self.set_attr("class", remaining);
            }
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Swap out all children at once.
    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    /// Depth-first search over descendants (not including `self`).
    pub fn find(&self, predicate: &dyn Fn(&Self) -> bool) -> Option<&Self> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| {
                if predicate(child) {
                    Some(child)
                } else {
                    child.find(predicate)
                }
            })
    }

    pub fn find_by_class(&self, class: &str) -> Option<&Self> {
        self.find(&|e: &Self| e.has_class(class))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&Self> {
        self.find(&|e: &Self| e.tag == tag)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write_escaped(f, text, false),
            Self::Element(element) => Display::fmt(element, f),
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"", name)?;
            write_escaped(f, value, true)?;
            f.write_char('"')?;
        }
        f.write_char('>')?;

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return Ok(());
        }
        for child in &self.children {
            Display::fmt(child, f)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

fn write_escaped(f: &mut Formatter<'_>, text: &str, attribute: bool) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '"' if attribute => f.write_str("&quot;")?,
            _ => f.write_char(ch)?,
        }
    }
    Ok(())
}

/// An HTML heading level, `h1` through `h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H2: Self = Self(2);
    pub const DEEPEST: Self = Self(6);

    pub const fn new(level: u8) -> Option<Self> {
        if level >= 1 && level <= 6 {
            Some(Self(level))
        } else {
            None
        }
    }

    /// Parse a tag name such as `"H3"` or `"h3"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let digit = tag.strip_prefix(['h', 'H'])?;
        digit.parse().ok().and_then(Self::new)
    }

    pub const fn level(self) -> u8 {
        self.0
    }

    /// One level deeper, capped at `h6`.
    pub const fn deeper(self) -> Self {
        if self.0 < 6 { Self(self.0 + 1) } else { Self::DEEPEST }
    }

    pub fn tag(self) -> String {
        format!("h{}", self.0)
    }
}

impl Default for HeadingLevel {
    fn default() -> Self {
        Self::H2
    }
}

impl Display for HeadingLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

/// Pick the heading level for result titles: one deeper than the last heading that
/// precedes the component in document order, or `h2` when there is none.
pub fn next_heading_level<I>(preceding: I) -> HeadingLevel
where
    I: IntoIterator<Item = HeadingLevel>,
{
    preceding
        .into_iter()
        .last()
        .map_or(HeadingLevel::H2, HeadingLevel::deeper)
}
