//! Schema-shaped payload encoding for attestation data.
//!
//! The payload layout is deliberately simple and position-dependent: fields
//! are packed back to back in signature order with no tags. Both sides of the
//! wire must therefore agree on the signature string, and every divergence
//! between the signature and the supplied fields fails closed before a byte
//! is produced. Silently writing a payload that decodes differently than
//! intended would poison the on-chain record permanently.

use alloy::primitives::{Address, FixedBytes};

use crate::error::AttestError;

/// The published dataset schema. Field order is part of the wire format.
pub const DATASET_SCHEMA: &str = "address owner,bytes32 hash,string category";

/// Field types the payload codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 20 raw bytes.
    Address,
    /// 32 raw bytes.
    Bytes32,
    /// Big-endian `u32` byte length, then that many bytes of UTF-8.
    String,
}

impl FieldType {
    fn parse(token: &str) -> Option<FieldType> {
        match token {
            "address" => Some(FieldType::Address),
            "bytes32" => Some(FieldType::Bytes32),
            "string" => Some(FieldType::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Address => "address",
            FieldType::Bytes32 => "bytes32",
            FieldType::String => "string",
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Address(Address),
    Bytes32(FixedBytes<32>),
    Text(String),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Address(_) => FieldType::Address,
            FieldValue::Bytes32(_) => FieldType::Bytes32,
            FieldValue::Text(_) => FieldType::String,
        }
    }
}

/// A named field ready for encoding, or recovered by decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationField {
    pub name: String,
    pub value: FieldValue,
}

impl AttestationField {
    pub fn address(name: impl Into<String>, value: Address) -> Self {
        AttestationField {
            name: name.into(),
            value: FieldValue::Address(value),
        }
    }

    pub fn bytes32(name: impl Into<String>, value: FixedBytes<32>) -> Self {
        AttestationField {
            name: name.into(),
            value: FieldValue::Bytes32(value),
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        AttestationField {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }
}

/// Encode fields into the packed payload declared by `signature`.
///
/// The fields must match the signature exactly: same count, same order, same
/// names, same types. Any divergence is a [`AttestError::SchemaMismatch`]
/// and no payload is produced.
pub fn encode(signature: &str, fields: &[AttestationField]) -> Result<Vec<u8>, AttestError> {
    let declared = parse_signature(signature)?;
    if declared.len() != fields.len() {
        return Err(AttestError::SchemaMismatch(format!(
            "signature declares {} fields, got {}",
            declared.len(),
            fields.len()
        )));
    }

    let mut payload = Vec::new();
    for ((name, ty), field) in declared.iter().zip(fields) {
        if &field.name != name {
            return Err(AttestError::SchemaMismatch(format!(
                "expected field '{}', got '{}'",
                name, field.name
            )));
        }
        if field.value.field_type() != *ty {
            return Err(AttestError::SchemaMismatch(format!(
                "field '{}' declared {}, got {}",
                name,
                ty.as_str(),
                field.value.field_type().as_str()
            )));
        }
        match &field.value {
            FieldValue::Address(addr) => payload.extend_from_slice(addr.as_slice()),
            FieldValue::Bytes32(bytes) => payload.extend_from_slice(bytes.as_slice()),
            FieldValue::Text(text) => {
                let len = u32::try_from(text.len()).map_err(|_| {
                    AttestError::SchemaMismatch(format!("string field '{name}' too long"))
                })?;
                payload.extend_from_slice(&len.to_be_bytes());
                payload.extend_from_slice(text.as_bytes());
            }
        }
    }
    Ok(payload)
}

/// Decode a packed payload back into named fields using `signature` as the
/// layout. Truncated payloads, trailing bytes, and non-UTF-8 string fields
/// are all schema mismatches.
pub fn decode(signature: &str, payload: &[u8]) -> Result<Vec<AttestationField>, AttestError> {
    let declared = parse_signature(signature)?;
    let mut cursor = Cursor::new(payload);
    let mut fields = Vec::with_capacity(declared.len());

    for (name, ty) in declared {
        let value = match ty {
            FieldType::Address => FieldValue::Address(Address::from(cursor.take_array::<20>(&name)?)),
            FieldType::Bytes32 => {
                FieldValue::Bytes32(FixedBytes::from(cursor.take_array::<32>(&name)?))
            }
            FieldType::String => {
                let len = u32::from_be_bytes(cursor.take_array::<4>(&name)?) as usize;
                let bytes = cursor.take(len, &name)?;
                let text = std::str::from_utf8(bytes).map_err(|_| {
                    AttestError::SchemaMismatch(format!(
                        "string field '{name}' is not valid UTF-8"
                    ))
                })?;
                FieldValue::Text(text.to_string())
            }
        };
        fields.push(AttestationField { name, value });
    }

    if !cursor.finished() {
        return Err(AttestError::SchemaMismatch(format!(
            "{} trailing bytes after the last field",
            cursor.remaining()
        )));
    }
    Ok(fields)
}

fn parse_signature(signature: &str) -> Result<Vec<(String, FieldType)>, AttestError> {
    let mut fields: Vec<(String, FieldType)> = Vec::new();
    for entry in signature.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(AttestError::SchemaMismatch(
                "empty field declaration in signature".to_string(),
            ));
        }
        let mut parts = entry.split_whitespace();
        let (ty, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(ty), Some(name), None) => (ty, name),
            _ => {
                return Err(AttestError::SchemaMismatch(format!(
                    "malformed field declaration '{entry}'"
                )))
            }
        };
        let ty = FieldType::parse(ty).ok_or_else(|| {
            AttestError::SchemaMismatch(format!("unsupported field type '{ty}'"))
        })?;
        if fields.iter().any(|(existing, _)| existing == name) {
            return Err(AttestError::SchemaMismatch(format!(
                "duplicate field name '{name}'"
            )));
        }
        fields.push((name.to_string(), ty));
    }
    Ok(fields)
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8], AttestError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                AttestError::SchemaMismatch(format!("payload truncated reading '{field}'"))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], AttestError> {
        let slice = self.take(N, field)?;
        slice.try_into().map_err(|_| {
            AttestError::SchemaMismatch(format!("payload truncated reading '{field}'"))
        })
    }

    fn finished(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
