//! Self-describing field-list serializer for structured cookie payloads.
//!
//! A [`Record`] is an ordered list of named scalar fields. Its encoding
//! carries every field's name and type, so a reader needs no schema to parse
//! it; typed structs map onto it through [`CookieRecord`].
//!
//! # Encoding (version 1, big-endian)
//!
//! ```text
//! version u8 = 0x01
//! count   u16
//! count × {
//!     name_len u8 (1..=255) ‖ name UTF-8
//!     tag u8 ‖ value
//! }
//!
//! tag   type    value
//! 0x01  Text    u32 length ‖ UTF-8
//! 0x02  Int     i64
//! 0x03  UInt    u64
//! 0x04  Bool    u8, 0 or 1
//! 0x05  Bytes   u32 length ‖ bytes
//! ```

use bytes::{Buf, BufMut};
use common::CookieError;
use thiserror::Error;
use tracing::debug;

/// Current record encoding version.
pub const RECORD_VERSION: u8 = 0x01;

const TAG_TEXT: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_UINT: u8 = 0x03;
const TAG_BOOL: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;

/// Errors produced while encoding, decoding or mapping a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record ends before the announced content")]
    Truncated,

    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown field type tag {0:#04x}")]
    UnknownTag(u8),

    #[error("field name or text is not valid UTF-8")]
    InvalidUtf8,

    #[error("boolean byte must be 0 or 1, got {0}")]
    InvalidBool(u8),

    #[error("{0} unexpected bytes after the last field")]
    TrailingBytes(usize),

    #[error("field name must not be empty")]
    EmptyName,

    #[error("field name is {0} bytes, limit is 255")]
    NameTooLong(usize),

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("record has more than 65535 fields")]
    TooManyFields,

    #[error("field `{0}` is larger than 4 GiB")]
    ValueTooLarge(String),

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` holds {found}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl From<RecordError> for CookieError {
    /// A record that fails to parse or map came from an untrusted cookie.
    fn from(err: RecordError) -> Self {
        debug!(reason = %err, "cookie record rejected");
        CookieError::InvalidValue
    }
}

/// A single scalar field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Int(_) => "int",
            FieldValue::UInt(_) => "uint",
            FieldValue::Bool(_) => "bool",
            FieldValue::Bytes(_) => "bytes",
        }
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

/// An ordered list of named scalar fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, builder style. Field order is preserved on the wire.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a field. Names are validated by [`Record::encode`].
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, name: &str) -> Result<&str, RecordError> {
        match self.require(name)? {
            FieldValue::Text(s) => Ok(s),
            other => Err(wrong_type(name, "text", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, RecordError> {
        match self.require(name)? {
            FieldValue::Int(v) => Ok(*v),
            other => Err(wrong_type(name, "int", other)),
        }
    }

    pub fn uint(&self, name: &str) -> Result<u64, RecordError> {
        match self.require(name)? {
            FieldValue::UInt(v) => Ok(*v),
            other => Err(wrong_type(name, "uint", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, RecordError> {
        match self.require(name)? {
            FieldValue::Bool(v) => Ok(*v),
            other => Err(wrong_type(name, "bool", other)),
        }
    }

    pub fn bytes(&self, name: &str) -> Result<&[u8], RecordError> {
        match self.require(name)? {
            FieldValue::Bytes(v) => Ok(v),
            other => Err(wrong_type(name, "bytes", other)),
        }
    }

    fn require(&self, name: &str) -> Result<&FieldValue, RecordError> {
        self.get(name)
            .ok_or_else(|| RecordError::MissingField(name.to_owned()))
    }

    /// Serialize to the version-1 encoding.
    ///
    /// # Errors
    ///
    /// Rejects empty, over-long or duplicate names, more than 65535 fields
    /// and values longer than `u32::MAX` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        let count = u16::try_from(self.fields.len()).map_err(|_| RecordError::TooManyFields)?;
        let mut out = Vec::with_capacity(3 + self.fields.len() * 16);
        out.put_u8(RECORD_VERSION);
        out.put_u16(count);

        for (i, (name, value)) in self.fields.iter().enumerate() {
            check_name(name)?;
            if self.fields[..i].iter().any(|(n, _)| n == name) {
                return Err(RecordError::DuplicateField(name.clone()));
            }
            // check_name bounds the length to 255.
            out.put_u8(name.len() as u8);
            out.put_slice(name.as_bytes());

            match value {
                FieldValue::Text(s) => {
                    out.put_u8(TAG_TEXT);
                    put_len_prefixed(&mut out, name, s.as_bytes())?;
                }
                FieldValue::Int(v) => {
                    out.put_u8(TAG_INT);
                    out.put_i64(*v);
                }
                FieldValue::UInt(v) => {
                    out.put_u8(TAG_UINT);
                    out.put_u64(*v);
                }
                FieldValue::Bool(v) => {
                    out.put_u8(TAG_BOOL);
                    out.put_u8(u8::from(*v));
                }
                FieldValue::Bytes(b) => {
                    out.put_u8(TAG_BYTES);
                    put_len_prefixed(&mut out, name, b)?;
                }
            }
        }
        Ok(out)
    }

    /// Parse the version-1 encoding.
    ///
    /// # Errors
    ///
    /// Any structural defect, including trailing bytes, is an error.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut buf = bytes;
        let version = read_u8(&mut buf)?;
        if version != RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion(version));
        }
        let count = read_u16(&mut buf)?;

        // Each field needs at least 3 bytes, so a hostile count cannot force
        // a large allocation.
        let mut record = Record {
            fields: Vec::with_capacity(usize::from(count).min(buf.len() / 3)),
        };
        for _ in 0..count {
            let name_len = usize::from(read_u8(&mut buf)?);
            let name = utf8(take(&mut buf, name_len)?)?;
            check_name(&name)?;
            if record.get(&name).is_some() {
                return Err(RecordError::DuplicateField(name));
            }

            let value = match read_u8(&mut buf)? {
                TAG_TEXT => {
                    let len = read_u32(&mut buf)? as usize;
                    FieldValue::Text(utf8(take(&mut buf, len)?)?)
                }
                TAG_INT => FieldValue::Int(read_u64(&mut buf)? as i64),
                TAG_UINT => FieldValue::UInt(read_u64(&mut buf)?),
                TAG_BOOL => match read_u8(&mut buf)? {
                    0 => FieldValue::Bool(false),
                    1 => FieldValue::Bool(true),
                    other => return Err(RecordError::InvalidBool(other)),
                },
                TAG_BYTES => {
                    let len = read_u32(&mut buf)? as usize;
                    FieldValue::Bytes(take(&mut buf, len)?.to_vec())
                }
                tag => return Err(RecordError::UnknownTag(tag)),
            };
            record.fields.push((name, value));
        }

        if !buf.is_empty() {
            return Err(RecordError::TrailingBytes(buf.len()));
        }
        Ok(record)
    }
}

/// A typed value with a fixed field layout that can travel as a [`Record`].
pub trait CookieRecord: Sized {
    fn to_record(&self) -> Record;

    /// # Errors
    ///
    /// Returns a [`RecordError`] if a required field is missing or mistyped.
    fn from_record(record: &Record) -> Result<Self, RecordError>;
}

fn wrong_type(field: &str, expected: &'static str, found: &FieldValue) -> RecordError {
    RecordError::WrongType {
        field: field.to_owned(),
        expected,
        found: found.type_name(),
    }
}

fn check_name(name: &str) -> Result<(), RecordError> {
    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }
    if name.len() > usize::from(u8::MAX) {
        return Err(RecordError::NameTooLong(name.len()));
    }
    Ok(())
}

fn put_len_prefixed(out: &mut Vec<u8>, field: &str, data: &[u8]) -> Result<(), RecordError> {
    let len = u32::try_from(data.len()).map_err(|_| RecordError::ValueTooLarge(field.to_owned()))?;
    out.put_u32(len);
    out.put_slice(data);
    Ok(())
}

fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8], RecordError> {
    if buf.len() < n {
        return Err(RecordError::Truncated);
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

fn read_u8(buf: &mut &[u8]) -> Result<u8, RecordError> {
    if buf.remaining() < 1 {
        return Err(RecordError::Truncated);
    }
    Ok(buf.get_u8())
}

fn read_u16(buf: &mut &[u8]) -> Result<u16, RecordError> {
    if buf.remaining() < 2 {
        return Err(RecordError::Truncated);
    }
    Ok(buf.get_u16())
}

fn read_u32(buf: &mut &[u8]) -> Result<u32, RecordError> {
    if buf.remaining() < 4 {
        return Err(RecordError::Truncated);
    }
    Ok(buf.get_u32())
}

fn read_u64(buf: &mut &[u8]) -> Result<u64, RecordError> {
    if buf.remaining() < 8 {
        return Err(RecordError::Truncated);
    }
    Ok(buf.get_u64())
}

fn utf8(bytes: &[u8]) -> Result<String, RecordError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RecordError::InvalidUtf8)
}
