use std::collections::BTreeMap;
use std::mem;

use thiserror::Error;

use super::document::{wall_clock_millis, Document, DEFAULT_NAMESPACE};
use super::property::{Blob, PropertyValue, MAX_REPEATED_PROPERTY_LENGTH, MAX_STRING_LENGTH};

/// A constraint was violated while assembling a document.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("document uri must not be empty")]
    EmptyUri,
    #[error("document schema type must not be empty")]
    EmptySchemaType,
    #[error("document score cannot be negative, got {0}")]
    NegativeScore(i32),
    #[error("document ttl cannot be negative, got {0}")]
    NegativeTtl(i64),
    #[error("repeated property \"{key}\" is empty")]
    EmptyProperty { key: String },
    #[error(
        "repeated property \"{key}\" has length {length}, which exceeds the limit of {limit}"
    )]
    RepeatedPropertyTooLong {
        key: String,
        length: usize,
        limit: usize,
    },
    #[error(
        "the string at {index} of \"{key}\" has length {length}, which exceeds the limit of {limit}"
    )]
    StringTooLong {
        key: String,
        index: usize,
        length: usize,
        limit: usize,
    },
}

/// The builder was touched again after `build()`.
#[derive(Debug, Clone, Copy, Error)]
#[error("builder has already been used")]
pub struct UsageError;

/// Errors surfaced by [`DocumentBuilder`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Single-use builder assembling an immutable [`Document`].
///
/// Setters validate eagerly and chain through `?`. `build()` freezes the
/// builder: any further call fails with [`UsageError`]. The builder takes
/// `&mut self` throughout, so exclusive use by one thread is enforced by the
/// borrow checker.
///
/// ```
/// use docstore_core::document::DocumentBuilder;
///
/// # fn main() -> Result<(), docstore_core::document::BuildError> {
/// let mut builder = DocumentBuilder::new("note/42", "Note")?;
/// builder
///     .set_namespace("personal")?
///     .set_score(10)?
///     .set_property_string("title", ["Groceries"])?;
/// let document = builder.build()?;
/// assert_eq!(document.property_string("title"), Some("Groceries"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DocumentBuilder {
    uri: String,
    namespace: String,
    schema_type: String,
    creation_timestamp_millis: i64,
    ttl_millis: i64,
    score: i32,
    properties: BTreeMap<String, PropertyValue>,
    built: bool,
}

impl DocumentBuilder {
    /// Creates a builder for a document identified by `uri` and shaped by
    /// `schema_type`. Both must be non-empty. The namespace defaults to the
    /// empty namespace, score and TTL to 0, and the creation timestamp to the
    /// current wall-clock time.
    pub fn new(uri: impl Into<String>, schema_type: impl Into<String>) -> Result<Self, BuildError> {
        let uri = uri.into();
        let schema_type = schema_type.into();
        if uri.is_empty() {
            return Err(ValidationError::EmptyUri.into());
        }
        if schema_type.is_empty() {
            return Err(ValidationError::EmptySchemaType.into());
        }
        Ok(Self {
            uri,
            namespace: DEFAULT_NAMESPACE.to_string(),
            schema_type,
            creation_timestamp_millis: wall_clock_millis(),
            ttl_millis: 0,
            score: 0,
            properties: BTreeMap::new(),
            built: false,
        })
    }

    fn guard(&self) -> Result<(), BuildError> {
        if self.built {
            Err(UsageError.into())
        } else {
            Ok(())
        }
    }

    /// Sets the namespace this document resides in. Uris are unique within a
    /// namespace; no value is reserved or interpreted here.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> Result<&mut Self, BuildError> {
        self.guard()?;
        self.namespace = namespace.into();
        Ok(self)
    }

    /// Sets the score used by external ranking. Any non-negative value is
    /// accepted.
    pub fn set_score(&mut self, score: i32) -> Result<&mut Self, BuildError> {
        self.guard()?;
        if score < 0 {
            return Err(ValidationError::NegativeScore(score).into());
        }
        self.score = score;
        Ok(self)
    }

    /// Sets the creation timestamp, in milliseconds since the epoch.
    pub fn set_creation_timestamp_millis(
        &mut self,
        creation_timestamp_millis: i64,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        self.creation_timestamp_millis = creation_timestamp_millis;
        Ok(self)
    }

    /// Sets the TTL in milliseconds, measured against the creation timestamp.
    /// 0 means the document never expires.
    pub fn set_ttl_millis(&mut self, ttl_millis: i64) -> Result<&mut Self, BuildError> {
        self.guard()?;
        if ttl_millis < 0 {
            return Err(ValidationError::NegativeTtl(ttl_millis).into());
        }
        self.ttl_millis = ttl_millis;
        Ok(self)
    }

    /// Sets one or more string values for a property, replacing any previous
    /// value under `key`. Each element is limited to
    /// [`MAX_STRING_LENGTH`] characters.
    pub fn set_property_string(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        validate_repeated_property_length(&key, values.len())?;
        for (index, value) in values.iter().enumerate() {
            let length = value.chars().count();
            if length > MAX_STRING_LENGTH {
                return Err(ValidationError::StringTooLong {
                    key,
                    index,
                    length,
                    limit: MAX_STRING_LENGTH,
                }
                .into());
            }
        }
        self.properties.insert(key, PropertyValue::String(values));
        Ok(self)
    }

    /// Sets one or more int64 values for a property, replacing any previous
    /// value under `key`.
    pub fn set_property_long(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = i64>,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        let key = key.into();
        let values: Vec<i64> = values.into_iter().collect();
        validate_repeated_property_length(&key, values.len())?;
        self.properties.insert(key, PropertyValue::Long(values));
        Ok(self)
    }

    /// Sets one or more double values for a property, replacing any previous
    /// value under `key`.
    pub fn set_property_double(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        let key = key.into();
        let values: Vec<f64> = values.into_iter().collect();
        validate_repeated_property_length(&key, values.len())?;
        self.properties.insert(key, PropertyValue::Double(values));
        Ok(self)
    }

    /// Sets one or more boolean values for a property, replacing any previous
    /// value under `key`.
    pub fn set_property_boolean(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = bool>,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        let key = key.into();
        let values: Vec<bool> = values.into_iter().collect();
        validate_repeated_property_length(&key, values.len())?;
        self.properties.insert(key, PropertyValue::Boolean(values));
        Ok(self)
    }

    /// Sets one or more byte blobs for a property, replacing any previous
    /// value under `key`.
    pub fn set_property_bytes(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = Vec<u8>>,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        let key = key.into();
        let values: Vec<Option<Blob>> = values
            .into_iter()
            .map(|bytes| Some(Blob::new(bytes)))
            .collect();
        validate_repeated_property_length(&key, values.len())?;
        self.properties.insert(key, PropertyValue::Bytes(values));
        Ok(self)
    }

    /// Sets one or more nested documents for a property, replacing any
    /// previous value under `key`. The documents are owned by this property;
    /// nesting always forms a tree.
    pub fn set_property_document(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = Document>,
    ) -> Result<&mut Self, BuildError> {
        self.guard()?;
        let key = key.into();
        let values: Vec<Option<Document>> = values.into_iter().map(Some).collect();
        validate_repeated_property_length(&key, values.len())?;
        self.properties.insert(key, PropertyValue::Document(values));
        Ok(self)
    }

    /// Freezes the builder and returns the document. The builder is single
    /// use: a second `build()`, like any later setter call, fails with
    /// [`UsageError`].
    pub fn build(&mut self) -> Result<Document, BuildError> {
        self.guard()?;
        self.built = true;
        Ok(Document::from_parts(
            mem::take(&mut self.uri),
            mem::take(&mut self.namespace),
            mem::take(&mut self.schema_type),
            self.creation_timestamp_millis,
            self.ttl_millis,
            self.score,
            mem::take(&mut self.properties),
        ))
    }
}

fn validate_repeated_property_length(key: &str, length: usize) -> Result<(), ValidationError> {
    if length == 0 {
        return Err(ValidationError::EmptyProperty {
            key: key.to_string(),
        });
    }
    if length > MAX_REPEATED_PROPERTY_LENGTH {
        return Err(ValidationError::RepeatedPropertyTooLong {
            key: key.to_string(),
            length,
            limit: MAX_REPEATED_PROPERTY_LENGTH,
        });
    }
    Ok(())
}
