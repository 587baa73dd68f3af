//! The document wrapper around an `html` root element.

use serde::Serialize;
use std::fmt;

use crate::element::Element;
use crate::error::{DocError, DocErrorKind, DocResult};
use crate::reader::DocumentReader;

/// Root tag every document must carry.
pub const ROOT_TAG: &str = "html";
/// Declaration prepended to every serialized document.
pub const DOCTYPE_DECLARATION: &str = "<!DOCTYPE html>";

/// A complete document: a `<!DOCTYPE html>` declaration plus a single
/// `html` root element.
///
/// `head()` and `body()` are resolved fresh from the tree on each call, so
/// they always reflect the current children of the root.
///
/// # Examples
///
/// ```rust
/// use lostthing::Document;
///
/// let doc = Document::new();
/// assert!(doc.head().is_some());
/// assert!(doc.body().is_some());
/// assert!(doc.to_html().starts_with("<!DOCTYPE html>"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Creates a document with the default skeleton: an `html` root holding
    /// a `head` (with `<meta charset="utf-8">`) and an empty `body`.
    #[must_use]
    pub fn new() -> Self {
        let mut root = Element::new(ROOT_TAG);

        let head = root.add_new_child("head");
        head.add_new_child("meta")
            .set_attribute("charset", Some("utf-8"));
        root.add_new_child("body");

        Document { root }
    }

    /// Wraps an existing element as the document root.
    ///
    /// Fails with [`DocErrorKind::UnexpectedRoot`] unless the element's tag
    /// is `html`.
    pub fn from_root(root: Element) -> DocResult<Self> {
        if root.tag_name() != ROOT_TAG {
            return Err(DocError::new(
                DocErrorKind::UnexpectedRoot {
                    found: root.tag_name().to_string(),
                },
                0,
                crate::error::NO_PATH,
            ));
        }
        Ok(Document { root })
    }

    /// Parses document text. Shorthand for building a [`DocumentReader`].
    pub fn parse(text: &str) -> DocResult<Self> {
        DocumentReader::new(text).parse()
    }

    /// The `html` root element.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable access to the root element.
    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// The first `head` child directly under the root, if present.
    #[must_use]
    pub fn head(&self) -> Option<&Element> {
        self.root.first_child_of_tag("head")
    }

    /// The first `body` child directly under the root, if present.
    #[must_use]
    pub fn body(&self) -> Option<&Element> {
        self.root.first_child_of_tag("body")
    }

    /// Depth-first search for an element with the given `id` attribute.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.root.element_by_id(id)
    }

    /// Serializes the document: the doctype declaration followed by the
    /// root element's HTML text.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(128);
        out.push_str(DOCTYPE_DECLARATION);
        self.root.write_html(&mut out);
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
