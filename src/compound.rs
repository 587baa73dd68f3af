//! The record compound: an ordered map of field IDs to typed values.
//!
//! A [`Compound`] maps small positive integer field IDs (`u16`, zero is
//! reserved) to [`Value`]s. It is the in-memory form of the binary record
//! format in [`codec`](crate::codec).
//!
//! Lists are homogeneous by construction: each list kind is its own variant
//! and a list of lists cannot be expressed at all.
//!
//! # Examples
//!
//! ```rust
//! use lostthing::{Compound, Value};
//!
//! let mut record = Compound::new();
//! record.insert(1, 42u64);
//! record.insert(2, "hello");
//!
//! assert_eq!(record.get_u64(1).unwrap(), 42);
//! assert_eq!(record.get_str(2).unwrap(), "hello");
//! assert_eq!(record.get_u64_or(9, 7).unwrap(), 7);
//! ```

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

use crate::error::{RecordError, RecordResult};

/// The type of a stored or requested field, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    UInt,
    Int,
    Str,
    Compound,
    UIntList,
    IntList,
    StrList,
    CompoundList,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::UInt => "unsigned integer",
            FieldKind::Int => "signed integer",
            FieldKind::Str => "string",
            FieldKind::Compound => "compound",
            FieldKind::UIntList => "unsigned integer list",
            FieldKind::IntList => "signed integer list",
            FieldKind::StrList => "string list",
            FieldKind::CompoundList => "compound list",
        };
        f.write_str(name)
    }
}

/// A single field value. The set is closed; every variant has a binary
/// encoding and nothing else does.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt(u64),
    Int(i64),
    Str(String),
    Compound(Compound),
    UIntList(Vec<u64>),
    IntList(Vec<i64>),
    StrList(Vec<String>),
    CompoundList(Vec<Compound>),
}

impl Value {
    /// The kind tag of this value.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::UInt(_) => FieldKind::UInt,
            Value::Int(_) => FieldKind::Int,
            Value::Str(_) => FieldKind::Str,
            Value::Compound(_) => FieldKind::Compound,
            Value::UIntList(_) => FieldKind::UIntList,
            Value::IntList(_) => FieldKind::IntList,
            Value::StrList(_) => FieldKind::StrList,
            Value::CompoundList(_) => FieldKind::CompoundList,
        }
    }

    /// Returns the unsigned integer if this is a `UInt`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the signed integer if this is an `Int`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested compound if this is a `Compound`.
    #[must_use]
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Value::Compound(c) => Some(c),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Compound> for Value {
    fn from(c: Compound) -> Self {
        Value::Compound(c)
    }
}

impl From<Vec<u64>> for Value {
    fn from(list: Vec<u64>) -> Self {
        Value::UIntList(list)
    }
}

impl From<Vec<i64>> for Value {
    fn from(list: Vec<i64>) -> Self {
        Value::IntList(list)
    }
}

impl From<Vec<String>> for Value {
    fn from(list: Vec<String>) -> Self {
        Value::StrList(list)
    }
}

impl From<Vec<Compound>> for Value {
    fn from(list: Vec<Compound>) -> Self {
        Value::CompoundList(list)
    }
}

/// An ordered map of field IDs to values.
///
/// Insertion order is preserved and used by the encoder, so encoding is
/// deterministic for a given construction sequence. Equality follows map
/// semantics and ignores order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    fields: IndexMap<u16, Value>,
}

impl Compound {
    /// Creates an empty compound.
    #[must_use]
    pub fn new() -> Self {
        Compound {
            fields: IndexMap::new(),
        }
    }

    /// Creates an empty compound with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Compound {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the compound has no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Inserts a field, replacing any previous value under the same ID.
    ///
    /// ID `0` is reserved; the encoder rejects it, so inserting it here only
    /// defers the failure to encode time.
    pub fn insert(&mut self, id: u16, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(id, value.into())
    }

    /// The raw value under `id`, if present.
    #[must_use]
    pub fn get(&self, id: u16) -> Option<&Value> {
        self.fields.get(&id)
    }

    /// Removes and returns the value under `id`.
    pub fn remove(&mut self, id: u16) -> Option<Value> {
        self.fields.shift_remove(&id)
    }

    /// Whether a field with this ID exists.
    #[must_use]
    pub fn contains(&self, id: u16) -> bool {
        self.fields.contains_key(&id)
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Value)> {
        self.fields.iter().map(|(id, value)| (*id, value))
    }

    fn require(&self, id: u16) -> RecordResult<&Value> {
        self.fields.get(&id).ok_or(RecordError::MissingField { id })
    }

    fn mismatch(id: u16, expected: FieldKind, found: &Value) -> RecordError {
        RecordError::TypeMismatch {
            id,
            expected,
            found: found.kind(),
        }
    }

    /// A required unsigned integer field.
    pub fn get_u64(&self, id: u16) -> RecordResult<u64> {
        match self.require(id)? {
            Value::UInt(n) => Ok(*n),
            other => Err(Self::mismatch(id, FieldKind::UInt, other)),
        }
    }

    /// A required signed integer field.
    pub fn get_i64(&self, id: u16) -> RecordResult<i64> {
        match self.require(id)? {
            Value::Int(n) => Ok(*n),
            other => Err(Self::mismatch(id, FieldKind::Int, other)),
        }
    }

    /// A required string field.
    pub fn get_str(&self, id: u16) -> RecordResult<&str> {
        match self.require(id)? {
            Value::Str(s) => Ok(s),
            other => Err(Self::mismatch(id, FieldKind::Str, other)),
        }
    }

    /// A required nested compound field.
    pub fn get_compound(&self, id: u16) -> RecordResult<&Compound> {
        match self.require(id)? {
            Value::Compound(c) => Ok(c),
            other => Err(Self::mismatch(id, FieldKind::Compound, other)),
        }
    }

    /// A required unsigned integer list field.
    pub fn get_u64_list(&self, id: u16) -> RecordResult<&[u64]> {
        match self.require(id)? {
            Value::UIntList(list) => Ok(list),
            other => Err(Self::mismatch(id, FieldKind::UIntList, other)),
        }
    }

    /// A required signed integer list field.
    pub fn get_i64_list(&self, id: u16) -> RecordResult<&[i64]> {
        match self.require(id)? {
            Value::IntList(list) => Ok(list),
            other => Err(Self::mismatch(id, FieldKind::IntList, other)),
        }
    }

    /// A required string list field.
    pub fn get_str_list(&self, id: u16) -> RecordResult<&[String]> {
        match self.require(id)? {
            Value::StrList(list) => Ok(list),
            other => Err(Self::mismatch(id, FieldKind::StrList, other)),
        }
    }

    /// A required compound list field.
    pub fn get_compound_list(&self, id: u16) -> RecordResult<&[Compound]> {
        match self.require(id)? {
            Value::CompoundList(list) => Ok(list),
            other => Err(Self::mismatch(id, FieldKind::CompoundList, other)),
        }
    }

    /// An unsigned integer field, or `default` if the field is absent. A
    /// present field of the wrong type is still an error.
    pub fn get_u64_or(&self, id: u16, default: u64) -> RecordResult<u64> {
        if !self.contains(id) {
            return Ok(default);
        }
        self.get_u64(id)
    }

    /// A signed integer field, or `default` if absent.
    pub fn get_i64_or(&self, id: u16, default: i64) -> RecordResult<i64> {
        if !self.contains(id) {
            return Ok(default);
        }
        self.get_i64(id)
    }

    /// A string field, or `default` if absent.
    pub fn get_str_or<'a>(&'a self, id: u16, default: &'a str) -> RecordResult<&'a str> {
        if !self.contains(id) {
            return Ok(default);
        }
        self.get_str(id)
    }

    /// An unsigned integer list field, or an empty slice if absent.
    pub fn get_u64_list_or_empty(&self, id: u16) -> RecordResult<&[u64]> {
        if !self.contains(id) {
            return Ok(&[]);
        }
        self.get_u64_list(id)
    }

    /// A compound list field, or an empty slice if absent.
    pub fn get_compound_list_or_empty(&self, id: u16) -> RecordResult<&[Compound]> {
        if !self.contains(id) {
            return Ok(&[]);
        }
        self.get_compound_list(id)
    }
}

impl FromIterator<(u16, Value)> for Compound {
    fn from_iter<I: IntoIterator<Item = (u16, Value)>>(iter: I) -> Self {
        Compound {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Compound(c) => c.serialize(serializer),
            Value::UIntList(list) => list.serialize(serializer),
            Value::IntList(list) => list.serialize(serializer),
            Value::StrList(list) => list.serialize(serializer),
            Value::CompoundList(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for compound in list {
                    seq.serialize_element(compound)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Compound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Field IDs become string keys so the output is valid JSON.
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (id, value) in &self.fields {
            map.serialize_entry(&id.to_string(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_id() {
        let mut compound = Compound::new();
        compound.insert(1, 1u64);
        let previous = compound.insert(1, 2u64);

        assert_eq!(previous, Some(Value::UInt(1)));
        assert_eq!(compound.len(), 1);
        assert_eq!(compound.get_u64(1).unwrap(), 2);
    }

    #[test]
    fn missing_field_is_an_error() {
        let compound = Compound::new();
        assert!(matches!(
            compound.get_u64(5),
            Err(RecordError::MissingField { id: 5 })
        ));
    }

    #[test]
    fn type_mismatch_names_both_kinds() {
        let mut compound = Compound::new();
        compound.insert(1, "text");

        let err = compound.get_u64(1).unwrap_err();
        assert!(matches!(
            err,
            RecordError::TypeMismatch {
                id: 1,
                expected: FieldKind::UInt,
                found: FieldKind::Str,
            }
        ));
    }

    #[test]
    fn defaults_cover_absence_but_not_mismatch() {
        let mut compound = Compound::new();
        compound.insert(1, "text");

        assert_eq!(compound.get_u64_or(2, 99).unwrap(), 99);
        assert!(compound.get_u64_or(1, 99).is_err());
        assert_eq!(compound.get_str_or(2, "d").unwrap(), "d");
        assert!(compound.get_u64_list_or_empty(2).unwrap().is_empty());
    }

    #[test]
    fn nested_compounds_and_lists() {
        let mut inner = Compound::new();
        inner.insert(1, -5i64);

        let mut outer = Compound::new();
        outer.insert(1, inner.clone());
        outer.insert(2, vec![inner.clone(), inner.clone()]);
        outer.insert(3, vec![1u64, 2, 3]);

        assert_eq!(outer.get_compound(1).unwrap().get_i64(1).unwrap(), -5);
        assert_eq!(outer.get_compound_list(2).unwrap().len(), 2);
        assert_eq!(outer.get_u64_list(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn equality_ignores_field_order() {
        let mut a = Compound::new();
        a.insert(1, 1u64);
        a.insert(2, 2u64);

        let mut b = Compound::new();
        b.insert(2, 2u64);
        b.insert(1, 1u64);

        assert_eq!(a, b);
    }

    #[test]
    fn serializes_to_json_with_string_keys() {
        let mut compound = Compound::new();
        compound.insert(1, 42u64);
        compound.insert(2, "hi");
        compound.insert(3, vec!["a".to_string(), "b".to_string()]);

        let json = serde_json::to_string(&compound).unwrap();
        assert_eq!(json, r#"{"1":42,"2":"hi","3":["a","b"]}"#);
    }
}
