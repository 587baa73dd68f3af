//! Recursive-descent document parser.
//!
//! [`DocumentReader`] walks the input with a single forward-only character
//! cursor and builds the [`Document`] tree in one pass. A reader is consumed
//! by [`DocumentReader::parse`] and never reused; independent parses on
//! separate readers are safe to run concurrently.
//!
//! Errors carry the byte offset where parsing stopped and the diagnostic
//! path given at construction.
//!
//! # Examples
//!
//! ```rust
//! use lostthing::DocumentReader;
//!
//! let doc = DocumentReader::new("<!DOCTYPE html><html><body>hi</body></html>")
//!     .parse()
//!     .unwrap();
//! assert_eq!(doc.body().unwrap().content(), Some("hi"));
//! ```

use crate::document::{Document, ROOT_TAG};
use crate::element::Element;
use crate::error::{DocError, DocErrorKind, DocResult, NO_PATH};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const DOCTYPE_TAG: &str = "!doctype";

/// One-shot parser over borrowed document text.
pub struct DocumentReader<'a> {
    text: &'a str,
    pos: usize,
    path: String,
}

impl<'a> DocumentReader<'a> {
    /// Creates a reader over in-memory text.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        DocumentReader {
            text,
            pos: 0,
            path: NO_PATH.to_string(),
        }
    }

    /// Creates a reader with a source path used only in error messages.
    #[must_use]
    pub fn with_path(text: &'a str, path: &str) -> Self {
        DocumentReader {
            text,
            pos: 0,
            path: path.to_string(),
        }
    }

    /// Parses the whole input into a document.
    ///
    /// The input must consist of a doctype declaration carrying the `html`
    /// token, a single `<html>` root element, and nothing but whitespace and
    /// comments around them.
    pub fn parse(mut self) -> DocResult<Document> {
        self.skip_trivia()?;

        let doctype_offset = self.pos;
        let doctype = self.read_element()?;
        if doctype.tag_name() != DOCTYPE_TAG || !doctype.has_attribute("html") {
            return Err(self.err_at(DocErrorKind::MissingDoctype, doctype_offset));
        }

        self.skip_trivia()?;

        let root_offset = self.pos;
        let root = self.read_element()?;
        if root.tag_name() != ROOT_TAG {
            return Err(self.err_at(
                DocErrorKind::UnexpectedRoot {
                    found: root.tag_name().to_string(),
                },
                root_offset,
            ));
        }

        self.skip_trivia()?;
        if self.pos < self.text.len() {
            return Err(self.err(DocErrorKind::TrailingContent));
        }

        Document::from_root(root)
    }

    // --- cursor primitives ---

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char, label: &'static str) -> DocResult<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(self.err(DocErrorKind::UnexpectedChar {
                expected: label,
                found,
            })),
            None => Err(self.err(DocErrorKind::UnexpectedEof { expected: label })),
        }
    }

    fn err(&self, kind: DocErrorKind) -> DocError {
        self.err_at(kind, self.pos)
    }

    fn err_at(&self, kind: DocErrorKind, offset: usize) -> DocError {
        DocError::new(kind, offset, &self.path)
    }

    // --- trivia ---

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    /// Skips whitespace and comments before a structural read.
    fn skip_trivia(&mut self) -> DocResult<()> {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with(COMMENT_OPEN) {
                self.skip_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_comment(&mut self) -> DocResult<()> {
        let start = self.pos;
        self.pos += COMMENT_OPEN.len();
        match self.rest().find(COMMENT_CLOSE) {
            Some(end) => {
                self.pos += end + COMMENT_CLOSE.len();
                Ok(())
            }
            None => Err(self.err_at(DocErrorKind::UnterminatedComment, start)),
        }
    }

    // --- names ---

    /// Reads an ASCII-letter run without case folding. The caller decides
    /// whether to fold; closing-tag comparison is exact.
    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            name.push(c);
            self.bump();
        }
        name
    }

    // --- elements ---

    fn read_element(&mut self) -> DocResult<Element> {
        self.eat('<', "'<'")?;

        let mut tag = String::new();
        if self.peek() == Some('!') {
            tag.push('!');
            self.bump();
        }
        tag.push_str(&self.read_name());
        if tag.is_empty() || tag == "!" {
            return Err(self.err(DocErrorKind::MissingTagName));
        }

        let mut element = Element::new(&tag);
        self.read_attributes(&mut element)?;

        if element.is_void() {
            return Ok(element);
        }
        self.read_body(&mut element)?;
        Ok(element)
    }

    /// Reads attributes up to and including the closing `>`.
    fn read_attributes(&mut self, element: &mut Element) -> DocResult<()> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    let name = self.read_name();
                    if name.is_empty() {
                        return Err(self.err(DocErrorKind::MissingAttributeName));
                    }
                    if self.peek() == Some('=') {
                        self.bump();
                        let value = self.read_quoted_value()?;
                        element.set_attribute(&name, Some(&value));
                    } else {
                        element.set_attribute(&name, None);
                    }
                }
                None => {
                    return Err(self.err(DocErrorKind::UnexpectedEof {
                        expected: "'>' or an attribute",
                    }));
                }
            }
        }
    }

    /// Reads a quoted attribute value. The opening quote, single or double,
    /// determines the terminator.
    fn read_quoted_value(&mut self) -> DocResult<String> {
        let quote = match self.peek() {
            Some(c @ ('"' | '\'')) => {
                self.bump();
                c
            }
            Some(found) => {
                return Err(self.err(DocErrorKind::UnexpectedChar {
                    expected: "a quoted attribute value",
                    found,
                }));
            }
            None => {
                return Err(self.err(DocErrorKind::UnexpectedEof {
                    expected: "a quoted attribute value",
                }));
            }
        };

        let start = self.pos;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.err_at(DocErrorKind::UnterminatedValue, start)),
            }
        }
    }

    /// Reads mixed content (text, comments, children) up to the matching
    /// closing tag. The closing name must equal the stored tag name exactly;
    /// the opening side was folded, the closing side is not.
    fn read_body(&mut self, element: &mut Element) -> DocResult<()> {
        let mut text = String::new();

        loop {
            if self.rest().starts_with(COMMENT_OPEN) {
                self.skip_comment()?;
            } else if self.rest().starts_with("</") {
                self.pos += 2;
                let close_offset = self.pos;
                let name = self.read_name();
                self.skip_whitespace();
                self.eat('>', "'>'")?;
                if name != element.tag_name() {
                    return Err(self.err_at(
                        DocErrorKind::TagMismatch {
                            expected: element.tag_name().to_string(),
                            found: name,
                        },
                        close_offset,
                    ));
                }
                break;
            } else if self.peek() == Some('<') {
                let child = self.read_element()?;
                element.add_child(child);
            } else {
                match self.bump() {
                    Some(c) => text.push(c),
                    None => {
                        return Err(self.err(DocErrorKind::UnexpectedEof {
                            expected: "a closing tag",
                        }));
                    }
                }
            }
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            element.set_content(trimmed);
        }
        Ok(())
    }
}
