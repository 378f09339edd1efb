pub mod builder;
pub mod document;
pub mod property;

pub use builder::{BuildError, DocumentBuilder, UsageError, ValidationError};
pub use document::{Document, DEFAULT_NAMESPACE};
pub use property::{
    Blob, PropertyKind, PropertyValue, MAX_INDEXED_PROPERTIES, MAX_REPEATED_PROPERTY_LENGTH,
    MAX_STRING_LENGTH,
};
