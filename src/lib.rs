//! Document model and binary record storage for a small message board.
//!
//! Two independent subsystems share this crate:
//!
//! - An HTML-like document tree ([`Element`], [`Document`]) with a
//!   hand-rolled recursive-descent reader ([`DocumentReader`]) and a
//!   deterministic writer. For trees the writer can produce, the reader is
//!   its inverse.
//! - A binary record format: a [`Compound`] maps positive integer field IDs
//!   to typed [`Value`]s, encoded through [`codec`] into a length-prefixed,
//!   type-tagged little-endian byte layout.
//!
//! On top of the record format sit user [`Profile`]s (validated fields and
//! an opaque password digest) and the [`ProfileStore`] (pending-verification
//! flow, ID counters and file persistence).
//!
//! # Parsing and writing documents
//!
//! ```rust
//! use lostthing::Document;
//!
//! let doc = Document::parse("<!DOCTYPE html><html><body id=\"main\">hi</body></html>")?;
//! assert_eq!(doc.element_by_id("main").unwrap().content(), Some("hi"));
//! assert_eq!(
//!     doc.to_html(),
//!     "<!DOCTYPE html><html><body id=\"main\">hi</body></html>",
//! );
//! # Ok::<(), lostthing::DocError>(())
//! ```
//!
//! # Records
//!
//! ```rust
//! use lostthing::{codec, compound};
//!
//! let record = compound! {
//!     1 => 42u64,
//!     2 => "zīmīte",
//! };
//! let bytes = codec::encode(&record)?;
//! assert_eq!(codec::decode(&bytes)?, record);
//! # Ok::<(), lostthing::RecordError>(())
//! ```

pub mod codec;
mod compound;
mod document;
mod element;
mod error;
mod macros;
mod profile;
mod reader;
mod store;

pub use compound::{Compound, FieldKind, Value};
pub use document::{Document, DOCTYPE_DECLARATION, ROOT_TAG};
pub use element::{Element, ATTRIBUTE_NAME_ID, VOID_TAGS};
pub use error::{
    DocError, DocErrorKind, DocResult, ProfileDecodeError, RecordError, RecordResult, NO_PATH,
};
pub use profile::{
    email_has_allowed_suffix, is_email_char, is_name_char, is_valid_email, is_valid_name,
    is_valid_password, PasswordDigest, Profile, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH,
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, UNVERIFIED_ID,
};
pub use reader::DocumentReader;
pub use store::{
    ProfileStore, StoreOptions, DEFAULT_CODE_LENGTH, DEFAULT_VERIFICATION_TTL_MINUTES,
};
