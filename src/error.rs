//! Error types for the document parser and the record codec.
//!
//! The two subsystems fail in different ways and are used by different
//! callers, so each gets its own error enum:
//!
//! - [`DocError`]: structural document errors. Always fatal to the single
//!   parse that produced them; the reader never recovers or retries.
//! - [`RecordError`]: codec errors. Field-access failures ([`RecordError::MissingField`],
//!   [`RecordError::TypeMismatch`]) are recoverable through the `_or`
//!   accessors on [`Compound`](crate::Compound); everything else propagates.
//! - [`ProfileDecodeError`]: why one profile could not be rebuilt from its
//!   compound. The batch loader logs and skips these without aborting the
//!   rest of the batch.
//!
//! Field validators (names, emails, passwords) return `bool` and never
//! produce an error value.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::compound::FieldKind;

/// In-memory input with no file behind it.
pub const NO_PATH: &str = "<input>";

/// A structural error in a document: where it happened and what went wrong.
///
/// `offset` is a byte offset into the parsed text; `path` is the diagnostic
/// source path handed to the reader (or [`NO_PATH`] for in-memory input).
/// The reader never resolves paths itself — the string is carried verbatim
/// for error messages.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {kind} at byte offset {offset}")]
pub struct DocError {
    pub kind: DocErrorKind,
    pub offset: usize,
    pub path: String,
}

/// What specifically was malformed about the document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocErrorKind {
    /// The text does not begin with a doctype declaration containing "html".
    #[error("missing or invalid <!DOCTYPE html> declaration")]
    MissingDoctype,

    /// The first real element is not `<html>`.
    #[error("first tag must be <html>, found <{found}>")]
    UnexpectedRoot { found: String },

    /// A closing tag's name does not match its opening tag.
    #[error("closing tag </{found}> does not match opening tag <{expected}>")]
    TagMismatch { expected: String, found: String },

    /// Expected a specific character, found something else.
    #[error("expected {expected}, found '{found}'")]
    UnexpectedChar { expected: &'static str, found: char },

    /// Input ended in the middle of a token.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    /// `<` not followed by a parsable tag name.
    #[error("missing tag name")]
    MissingTagName,

    /// An attribute without a parsable name.
    #[error("missing attribute name")]
    MissingAttributeName,

    /// A quoted attribute value with no terminating quote.
    #[error("unterminated attribute value")]
    UnterminatedValue,

    /// A `<!--` with no matching `-->`.
    #[error("unterminated comment")]
    UnterminatedComment,

    /// Non-whitespace content after the root element closed.
    #[error("unexpected content after the root element")]
    TrailingContent,
}

impl DocError {
    pub(crate) fn new(kind: DocErrorKind, offset: usize, path: &str) -> Self {
        DocError {
            kind,
            offset,
            path: path.to_string(),
        }
    }
}

/// Errors produced by the record codec and compound field access.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The compound has no field with this ID.
    #[error("missing field {id}")]
    MissingField { id: u16 },

    /// The field exists but holds a different type than requested.
    #[error("type mismatch for field {id}: expected {expected}, found {found}")]
    TypeMismatch {
        id: u16,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Field ID 0 is reserved and may not be encoded or decoded.
    #[error("field ID 0 is not allowed")]
    ZeroFieldId,

    /// The same field ID appeared twice while decoding one compound.
    #[error("duplicate field {id} at byte offset {offset}")]
    DuplicateField { id: u16, offset: usize },

    /// The buffer ended before the value it promised.
    #[error("unexpected end of data at byte offset {offset} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    /// An unknown type tag in the byte stream.
    #[error("invalid type tag {tag:#04x} at byte offset {offset}")]
    InvalidTag { offset: usize, tag: u8 },

    /// A string payload that is not valid UTF-8.
    #[error("string at byte offset {offset} is not valid UTF-8")]
    InvalidString {
        offset: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Bytes left over after the top-level compound was fully decoded.
    #[error("{remaining} trailing bytes after the top-level compound (byte offset {offset})")]
    TrailingBytes { offset: usize, remaining: usize },

    /// A string or list too long for its u32 length prefix. The writer
    /// rejects these instead of truncating.
    #[error("value of length {len} exceeds the encodable maximum")]
    LengthOverflow { len: usize },

    /// A file-system failure, with the path and operation that hit it.
    #[error("failed to {op} record file {path:?}")]
    Io {
        path: PathBuf,
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl RecordError {
    pub(crate) fn io(path: impl Into<PathBuf>, op: &'static str, source: io::Error) -> Self {
        RecordError::Io {
            path: path.into(),
            op,
            source,
        }
    }
}

/// Why a single profile could not be rebuilt from its compound.
#[derive(Debug, Error)]
pub enum ProfileDecodeError {
    /// A required field was missing or had the wrong type.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The decoded data failed re-validation.
    #[error("invalid {field}")]
    InvalidField { field: &'static str },
}

/// Result alias for document parsing.
pub type DocResult<T> = std::result::Result<T, DocError>;

/// Result alias for the record codec.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
