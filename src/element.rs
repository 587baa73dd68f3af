//! The document tree node.
//!
//! An [`Element`] is a tagged node with optional text content, an ordered
//! attribute map and owned children. Ownership is a strict tree: children
//! belong exclusively to their parent and there are no back references.
//! Lookups like [`Element::element_by_id`] walk the tree fresh on each call.
//!
//! ## Examples
//!
//! ```rust
//! use lostthing::Element;
//!
//! let mut div = Element::new("div");
//! div.set_attribute("class", Some("card"));
//! div.add_child(Element::with_content("p", "hello"));
//!
//! assert_eq!(div.to_html(), "<div class=\"card\"><p>hello</p></div>");
//! ```
//!
//! Void elements (`br`, `img`, ...) never render content, children or a
//! closing tag:
//!
//! ```rust
//! use lostthing::Element;
//!
//! let mut br = Element::new("BR");
//! br.set_content("ignored");
//! assert_eq!(br.to_html(), "<br>");
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Attribute used by [`Element::element_by_id`].
pub const ATTRIBUTE_NAME_ID: &str = "id";

/// Tags that cannot contain content or children and have no closing tag.
/// `!doctype` is synthetic: the reader represents the doctype declaration
/// as a void element.
pub const VOID_TAGS: [&str; 15] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr", "!doctype",
];

/// A node in the document tree.
///
/// The tag name is folded to lowercase on construction and immutable
/// afterwards. Attribute names are folded the same way; an attribute with a
/// `None` value is a boolean-style attribute and serializes without `="..."`.
///
/// Equality ignores attribute insertion order (map semantics) but respects
/// child order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    tag_name: String,
    content: Option<String>,
    attributes: IndexMap<String, Option<String>>,
    children: Vec<Element>,
}

impl Element {
    /// Creates an element with the given tag, folded to lowercase.
    ///
    /// # Panics
    ///
    /// Panics if the tag name is empty after trimming — an empty tag is a
    /// logic error, not recoverable input.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        let folded = tag_name.trim().to_lowercase();
        assert!(!folded.is_empty(), "element tag name must not be empty");

        Element {
            tag_name: folded,
            content: None,
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates an element with text content.
    #[must_use]
    pub fn with_content(tag_name: &str, content: &str) -> Self {
        let mut element = Element::new(tag_name);
        element.content = Some(content.to_string());
        element
    }

    /// Creates an element with text content and an `id` attribute.
    #[must_use]
    pub fn with_id(tag_name: &str, content: &str, id: &str) -> Self {
        let mut element = Element::with_content(tag_name, content);
        element.set_attribute(ATTRIBUTE_NAME_ID, Some(id));
        element
    }

    /// Whether a tag name belongs to the void set, case-insensitively.
    #[must_use]
    pub fn is_void_tag(tag_name: &str) -> bool {
        let folded = tag_name.to_lowercase();
        VOID_TAGS.contains(&folded.as_str())
    }

    /// Whether this element is void. Void elements never render content,
    /// children or a closing tag.
    #[must_use]
    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag_name.as_str())
    }

    /// The lowercase tag name.
    #[inline]
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// The text content, if any.
    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Replaces the text content.
    pub fn set_content(&mut self, content: &str) -> &mut Self {
        self.content = Some(content.to_string());
        self
    }

    /// Removes the text content.
    pub fn clear_content(&mut self) -> &mut Self {
        self.content = None;
        self
    }

    /// Sets an attribute, folding the name to lowercase. `None` makes a
    /// boolean-style attribute. Replaces any previous value.
    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let folded = name.trim().to_lowercase();
        assert!(!folded.is_empty(), "attribute name must not be empty");

        self.attributes.insert(folded, value.map(str::to_string));
        self
    }

    /// Looks up an attribute by name (case-insensitive).
    ///
    /// Returns `None` when the attribute is absent, `Some(None)` for a
    /// boolean-style attribute, and `Some(Some(value))` otherwise.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Option<&str>> {
        self.attributes
            .get(&name.to_lowercase())
            .map(|value| value.as_deref())
    }

    /// Whether the attribute is present, with or without a value.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_lowercase())
    }

    /// Removes an attribute if present.
    pub fn remove_attribute(&mut self, name: &str) -> &mut Self {
        self.attributes.shift_remove(&name.to_lowercase());
        self
    }

    /// Removes all attributes.
    pub fn clear_attributes(&mut self) -> &mut Self {
        self.attributes.clear();
        self
    }

    /// The attribute map in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, Option<String>> {
        &self.attributes
    }

    /// Appends a child and returns a mutable reference to it, so freshly
    /// built subtrees can be filled in place.
    pub fn add_child(&mut self, child: Element) -> &mut Element {
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Appends a new empty child with the given tag.
    pub fn add_new_child(&mut self, tag_name: &str) -> &mut Element {
        self.add_child(Element::new(tag_name))
    }

    /// Removes and returns the child at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_child(&mut self, index: usize) -> Element {
        self.children.remove(index)
    }

    /// Removes all children.
    pub fn clear_children(&mut self) -> &mut Self {
        self.children.clear();
        self
    }

    /// The children in document order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Mutable access to the children.
    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    /// The first direct child with the given tag (case-insensitive).
    #[must_use]
    pub fn first_child_of_tag(&self, tag_name: &str) -> Option<&Element> {
        let folded = tag_name.to_lowercase();
        self.children.iter().find(|child| child.tag_name == folded)
    }

    /// Depth-first search for an element whose `id` attribute equals `id`,
    /// starting from (and including) this element. Walks owned children
    /// only; there are no parent pointers to chase.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        if self.attribute(ATTRIBUTE_NAME_ID) == Some(Some(id)) {
            return Some(self);
        }

        self.children
            .iter()
            .find_map(|child| child.element_by_id(id))
    }

    /// Serializes this element and its subtree to HTML text.
    ///
    /// Deterministic pre-order traversal: the open tag with attributes in
    /// insertion order, then (for non-void tags) the content verbatim, each
    /// child in order, and the closing tag.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(64);
        self.write_html(&mut out);
        out
    }

    pub(crate) fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag_name);

        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
        }
        out.push('>');

        if self.is_void() {
            return;
        }

        if let Some(content) = &self.content {
            out.push_str(content);
        }
        for child in &self.children {
            child.write_html(out);
        }

        out.push_str("</");
        out.push_str(&self.tag_name);
        out.push('>');
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
