//! Typed document model for an embedded, on-device search index.
//!
//! `docstore-core` provides the document unit an index stores and returns: a
//! schema-tagged bag of named, repeated, strongly-typed properties plus fixed
//! metadata (uri, namespace, schema type, creation timestamp, TTL, score).
//! Constraints are validated on write through a single-use builder; reads are
//! total and degrade to type-specific defaults instead of failing. Equality,
//! hashing, and string rendering are deep, structural, and deterministic.
//!
//! Schema registration, uri uniqueness within a namespace, and TTL-driven
//! deletion belong to the surrounding index and are out of scope here.

pub mod document;
