//! Binary encoding of compounds.
//!
//! All multi-byte integers are little-endian and fixed width. The layout:
//!
//! ```text
//! compound  := u32 field-count, field*
//! field     := u16 field-id (non-zero), u8 type-tag, payload
//! type-tag  := 1 UInt | 2 Int | 3 Str | 4 Compound; lists set bit 0x80
//! payload   := UInt: u64 | Int: i64 | Str: u32 len + UTF-8 bytes
//!            | Compound: compound | list: u32 count + element payloads
//! ```
//!
//! [`encode`] and [`decode`] are bit-for-bit inverses for every
//! representable compound. The decoder rejects anything the encoder cannot
//! produce: unknown tags, zero or duplicate field IDs, short buffers,
//! invalid UTF-8 and trailing bytes. The encoder rejects zero field IDs and
//! lengths that do not fit the `u32` prefix rather than truncating them.
//!
//! # Examples
//!
//! ```rust
//! use lostthing::{codec, Compound};
//!
//! let mut record = Compound::new();
//! record.insert(1, 42u64);
//! record.insert(2, "hello");
//!
//! let bytes = codec::encode(&record).unwrap();
//! assert_eq!(codec::decode(&bytes).unwrap(), record);
//! ```

use std::fs;
use std::path::Path;

use crate::compound::{Compound, Value};
use crate::error::{RecordError, RecordResult};

/// Extension used for record files on disk.
pub const DATA_FILE_EXTENSION: &str = "dat";

const TAG_UINT: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_STR: u8 = 3;
const TAG_COMPOUND: u8 = 4;
const LIST_BIT: u8 = 0x80;

// --- encoding ---

/// Encodes a compound into a fresh byte buffer.
pub fn encode(compound: &Compound) -> RecordResult<Vec<u8>> {
    let mut out = Vec::with_capacity(64);
    write_compound(&mut out, compound)?;
    Ok(out)
}

fn checked_u32(len: usize) -> RecordResult<u32> {
    u32::try_from(len).map_err(|_| RecordError::LengthOverflow { len })
}

fn write_compound(out: &mut Vec<u8>, compound: &Compound) -> RecordResult<()> {
    out.extend_from_slice(&checked_u32(compound.len())?.to_le_bytes());
    for (id, value) in compound.iter() {
        if id == 0 {
            return Err(RecordError::ZeroFieldId);
        }
        out.extend_from_slice(&id.to_le_bytes());
        out.push(tag_of(value));
        write_payload(out, value)?;
    }
    Ok(())
}

fn tag_of(value: &Value) -> u8 {
    match value {
        Value::UInt(_) => TAG_UINT,
        Value::Int(_) => TAG_INT,
        Value::Str(_) => TAG_STR,
        Value::Compound(_) => TAG_COMPOUND,
        Value::UIntList(_) => TAG_UINT | LIST_BIT,
        Value::IntList(_) => TAG_INT | LIST_BIT,
        Value::StrList(_) => TAG_STR | LIST_BIT,
        Value::CompoundList(_) => TAG_COMPOUND | LIST_BIT,
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) -> RecordResult<()> {
    out.extend_from_slice(&checked_u32(s.len())?.to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_payload(out: &mut Vec<u8>, value: &Value) -> RecordResult<()> {
    match value {
        Value::UInt(n) => out.extend_from_slice(&n.to_le_bytes()),
        Value::Int(n) => out.extend_from_slice(&n.to_le_bytes()),
        Value::Str(s) => write_str(out, s)?,
        Value::Compound(c) => write_compound(out, c)?,
        Value::UIntList(list) => {
            out.extend_from_slice(&checked_u32(list.len())?.to_le_bytes());
            for n in list {
                out.extend_from_slice(&n.to_le_bytes());
            }
        }
        Value::IntList(list) => {
            out.extend_from_slice(&checked_u32(list.len())?.to_le_bytes());
            for n in list {
                out.extend_from_slice(&n.to_le_bytes());
            }
        }
        Value::StrList(list) => {
            out.extend_from_slice(&checked_u32(list.len())?.to_le_bytes());
            for s in list {
                write_str(out, s)?;
            }
        }
        Value::CompoundList(list) => {
            out.extend_from_slice(&checked_u32(list.len())?.to_le_bytes());
            for c in list {
                write_compound(out, c)?;
            }
        }
    }
    Ok(())
}

// --- decoding ---

/// Decodes a compound from a byte buffer, rejecting trailing bytes.
pub fn decode(bytes: &[u8]) -> RecordResult<Compound> {
    let mut cursor = Cursor::new(bytes);
    let compound = cursor.read_compound()?;
    if cursor.pos < bytes.len() {
        return Err(RecordError::TrailingBytes {
            offset: cursor.pos,
            remaining: bytes.len() - cursor.pos,
        });
    }
    Ok(compound)
}

/// Forward-only byte reader with bounds checking.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn ensure(&self, need: usize) -> RecordResult<()> {
        let have = self.bytes.len() - self.pos;
        if have < need {
            return Err(RecordError::UnexpectedEof {
                offset: self.pos,
                need,
                have,
            });
        }
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> RecordResult<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> RecordResult<[u8; N]> {
        self.ensure(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        Ok(buf)
    }

    fn read_u8(&mut self) -> RecordResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> RecordResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> RecordResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> RecordResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> RecordResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    fn read_str(&mut self) -> RecordResult<String> {
        let len = self.read_u32()? as usize;
        let offset = self.pos;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|source| RecordError::InvalidString { offset, source })
    }

    fn read_compound(&mut self) -> RecordResult<Compound> {
        let count = self.read_u32()? as usize;
        let mut compound = Compound::with_capacity(count.min(64));
        for _ in 0..count {
            let id_offset = self.pos;
            let id = self.read_u16()?;
            if id == 0 {
                return Err(RecordError::ZeroFieldId);
            }
            if compound.contains(id) {
                return Err(RecordError::DuplicateField {
                    id,
                    offset: id_offset,
                });
            }
            let tag_offset = self.pos;
            let tag = self.read_u8()?;
            let value = self.read_payload(tag, tag_offset)?;
            compound.insert(id, value);
        }
        Ok(compound)
    }

    fn read_payload(&mut self, tag: u8, tag_offset: usize) -> RecordResult<Value> {
        let value = match tag {
            TAG_UINT => Value::UInt(self.read_u64()?),
            TAG_INT => Value::Int(self.read_i64()?),
            TAG_STR => Value::Str(self.read_str()?),
            TAG_COMPOUND => Value::Compound(self.read_compound()?),
            _ if tag & LIST_BIT != 0 => self.read_list(tag & !LIST_BIT, tag_offset)?,
            _ => {
                return Err(RecordError::InvalidTag {
                    offset: tag_offset,
                    tag,
                });
            }
        };
        Ok(value)
    }

    fn read_list(&mut self, element_tag: u8, tag_offset: usize) -> RecordResult<Value> {
        let count = self.read_u32()? as usize;
        let capacity = count.min(1024);
        let value = match element_tag {
            TAG_UINT => {
                let mut list = Vec::with_capacity(capacity);
                for _ in 0..count {
                    list.push(self.read_u64()?);
                }
                Value::UIntList(list)
            }
            TAG_INT => {
                let mut list = Vec::with_capacity(capacity);
                for _ in 0..count {
                    list.push(self.read_i64()?);
                }
                Value::IntList(list)
            }
            TAG_STR => {
                let mut list = Vec::with_capacity(capacity);
                for _ in 0..count {
                    list.push(self.read_str()?);
                }
                Value::StrList(list)
            }
            TAG_COMPOUND => {
                let mut list = Vec::with_capacity(capacity);
                for _ in 0..count {
                    list.push(self.read_compound()?);
                }
                Value::CompoundList(list)
            }
            _ => {
                return Err(RecordError::InvalidTag {
                    offset: tag_offset,
                    tag: element_tag | LIST_BIT,
                });
            }
        };
        Ok(value)
    }
}

// --- files ---

/// Reads and decodes a record file.
pub fn read_compound_file(path: &Path) -> RecordResult<Compound> {
    let bytes = fs::read(path).map_err(|source| RecordError::io(path, "read", source))?;
    decode(&bytes)
}

/// Encodes a compound and writes it to a file, replacing any existing one.
pub fn write_compound_file(path: &Path, compound: &Compound) -> RecordResult<()> {
    let bytes = encode(compound)?;
    fs::write(path, bytes).map_err(|source| RecordError::io(path, "write", source))
}
