use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::document::Document;

/// The maximum number of elements in a repeated property. Writes beyond this
/// limit are rejected.
pub const MAX_REPEATED_PROPERTY_LENGTH: usize = 100;

/// The maximum length of a single string value, in characters. Writes of
/// longer strings are rejected.
pub const MAX_STRING_LENGTH: usize = 20_000;

/// The maximum number of indexed properties a document's schema may declare.
/// The schema layer enforces this; it is exposed here for callers assembling
/// schemas.
pub const MAX_INDEXED_PROPERTIES: usize = 16;

/// The fixed type tag of a property's stored sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Long,
    Double,
    Boolean,
    Bytes,
    Document,
}

impl PropertyKind {
    /// Returns the kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Long => "long",
            PropertyKind::Double => "double",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Bytes => "bytes",
            PropertyKind::Document => "document",
        }
    }
}

/// A single byte-blob element.
///
/// The wire record wraps each blob in a one-field record, so the byte field
/// stays optional on decode: a structurally hollow wrapper is tolerated and
/// skipped at read time instead of failing the whole property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blob {
    #[serde(rename = "byteArray", default)]
    bytes: Option<Vec<u8>>,
}

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

/// The typed repeated value stored under one property name.
///
/// Exactly one kind per key; re-setting a key replaces the whole sequence.
/// Blob and nested-document slots are optional because records decoded from an
/// external store may be missing individual entries; the builder never
/// produces empty slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    #[serde(rename = "stringValues")]
    String(Vec<String>),
    #[serde(rename = "longValues")]
    Long(Vec<i64>),
    #[serde(rename = "doubleValues")]
    Double(Vec<f64>),
    #[serde(rename = "booleanValues")]
    Boolean(Vec<bool>),
    #[serde(rename = "blobValues")]
    Bytes(Vec<Option<Blob>>),
    #[serde(rename = "documentValues")]
    Document(Vec<Option<Document>>),
}

impl PropertyValue {
    /// Returns the fixed kind tag of this value.
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Long(_) => PropertyKind::Long,
            PropertyValue::Double(_) => PropertyKind::Double,
            PropertyValue::Boolean(_) => PropertyKind::Boolean,
            PropertyValue::Bytes(_) => PropertyKind::Bytes,
            PropertyValue::Document(_) => PropertyKind::Document,
        }
    }

    /// Number of stored elements, including empty slots.
    pub fn len(&self) -> usize {
        match self {
            PropertyValue::String(values) => values.len(),
            PropertyValue::Long(values) => values.len(),
            PropertyValue::Double(values) => values.len(),
            PropertyValue::Boolean(values) => values.len(),
            PropertyValue::Bytes(values) => values.len(),
            PropertyValue::Document(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Doubles compare bitwise so that equality stays reflexive and consistent
// with hashing.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Long(a), PropertyValue::Long(b)) => a == b,
            (PropertyValue::Double(a), PropertyValue::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a == b,
            (PropertyValue::Bytes(a), PropertyValue::Bytes(b)) => a == b,
            (PropertyValue::Document(a), PropertyValue::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PropertyValue::String(values) => values.hash(state),
            PropertyValue::Long(values) => values.hash(state),
            PropertyValue::Double(values) => {
                for value in values {
                    value.to_bits().hash(state);
                }
            }
            PropertyValue::Boolean(values) => values.hash(state),
            PropertyValue::Bytes(values) => values.hash(state),
            PropertyValue::Document(values) => values.hash(state),
        }
    }
}

// Renders as an ordered bracketed list; empty slots render as a `<null>`
// marker so the output stays total for partially decoded records.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        match self {
            PropertyValue::String(values) => {
                for value in values {
                    write!(f, "'{value}' ")?;
                }
            }
            PropertyValue::Long(values) => {
                for value in values {
                    write!(f, "'{value}' ")?;
                }
            }
            PropertyValue::Double(values) => {
                for value in values {
                    write!(f, "'{value}' ")?;
                }
            }
            PropertyValue::Boolean(values) => {
                for value in values {
                    write!(f, "'{value}' ")?;
                }
            }
            PropertyValue::Bytes(slots) => {
                for slot in slots {
                    match slot.as_ref().and_then(Blob::bytes) {
                        Some(bytes) => write!(f, "'{}' ", hex::encode(bytes))?,
                        None => write!(f, "<null> ")?,
                    }
                }
            }
            PropertyValue::Document(slots) => {
                for slot in slots {
                    match slot {
                        Some(document) => write!(f, "'{document}' ")?,
                        None => write!(f, "<null> ")?,
                    }
                }
            }
        }
        write!(f, "]")
    }
}
