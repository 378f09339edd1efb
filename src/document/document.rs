use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::property::{PropertyKind, PropertyValue};

/// The default empty namespace.
pub const DEFAULT_NAMESPACE: &str = "";

pub(crate) fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The document unit stored and returned by the index.
///
/// Documents are constructed via [`DocumentBuilder`](super::DocumentBuilder)
/// and are immutable afterwards, so a built document is safe to read from any
/// number of threads. Reads are total: an absent key or a kind mismatch
/// degrades to a type-specific default, never an error, so documents written
/// under an older schema stay readable.
///
/// The serde form is the keyed wire record the external index consumes. A
/// document rebuilt from that record compares equal to the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    uri: String,
    #[serde(default)]
    namespace: String,
    schema_type: String,
    #[serde(default = "wall_clock_millis")]
    creation_timestamp_millis: i64,
    #[serde(default)]
    ttl_millis: i64,
    #[serde(default)]
    score: i32,
    properties: BTreeMap<String, PropertyValue>,
    // Memoized structural hash; immutability keeps it from going stale.
    #[serde(skip)]
    cached_hash: OnceLock<u64>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        uri: String,
        namespace: String,
        schema_type: String,
        creation_timestamp_millis: i64,
        ttl_millis: i64,
        score: i32,
        properties: BTreeMap<String, PropertyValue>,
    ) -> Self {
        Self {
            uri,
            namespace,
            schema_type,
            creation_timestamp_millis,
            ttl_millis,
            score,
            properties,
            cached_hash: OnceLock::new(),
        }
    }

    /// Returns the uri, unique within a namespace.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the namespace this document resides in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the name of the schema describing this document's shape.
    pub fn schema_type(&self) -> &str {
        &self.schema_type
    }

    /// Returns the creation timestamp, in milliseconds since the epoch.
    pub fn creation_timestamp_millis(&self) -> i64 {
        self.creation_timestamp_millis
    }

    /// Returns the TTL in milliseconds, measured against the creation
    /// timestamp. 0 means the document never expires.
    pub fn ttl_millis(&self) -> i64 {
        self.ttl_millis
    }

    /// Timestamp at which the document becomes eligible for deletion by the
    /// external index, or `None` when the TTL is 0.
    pub fn expiry_timestamp_millis(&self) -> Option<i64> {
        if self.ttl_millis == 0 {
            None
        } else {
            Some(self.creation_timestamp_millis.saturating_add(self.ttl_millis))
        }
    }

    /// Returns the score used by external ranking. Higher is better.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Names of all properties set on this document, in lexicographic order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Returns the stored kind of `key`, or `None` if the property is absent.
    pub fn property_kind(&self, key: &str) -> Option<PropertyKind> {
        self.properties.get(key).map(PropertyValue::kind)
    }

    fn property_of_kind(&self, key: &str, requested: PropertyKind) -> Option<&PropertyValue> {
        let value = self.properties.get(key)?;
        if value.kind() != requested {
            tracing::warn!(
                key,
                stored = value.kind().type_name(),
                requested = requested.type_name(),
                "property read with a mismatched kind, treating as absent"
            );
            return None;
        }
        Some(value)
    }

    /// Returns the full string sequence for `key`, or `None` if the property
    /// is absent or stored under a different kind.
    pub fn property_string_array(&self, key: &str) -> Option<&[String]> {
        match self.property_of_kind(key, PropertyKind::String)? {
            PropertyValue::String(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the full int64 sequence for `key`, or `None` if the property
    /// is absent or stored under a different kind.
    pub fn property_long_array(&self, key: &str) -> Option<&[i64]> {
        match self.property_of_kind(key, PropertyKind::Long)? {
            PropertyValue::Long(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the full double sequence for `key`, or `None` if the property
    /// is absent or stored under a different kind.
    pub fn property_double_array(&self, key: &str) -> Option<&[f64]> {
        match self.property_of_kind(key, PropertyKind::Double)? {
            PropertyValue::Double(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the full boolean sequence for `key`, or `None` if the property
    /// is absent or stored under a different kind.
    pub fn property_boolean_array(&self, key: &str) -> Option<&[bool]> {
        match self.property_of_kind(key, PropertyKind::Boolean)? {
            PropertyValue::Boolean(values) => Some(values),
            _ => None,
        }
    }

    /// Returns every blob stored under `key`.
    ///
    /// Decoding is per-slot tolerant: a slot missing from the underlying
    /// record, or a hollow wrapper without bytes, is skipped with a
    /// diagnostic while the surviving slots still decode.
    pub fn property_bytes_array(&self, key: &str) -> Option<Vec<&[u8]>> {
        let PropertyValue::Bytes(slots) = self.property_of_kind(key, PropertyKind::Bytes)? else {
            return None;
        };
        let mut bytes = Vec::with_capacity(slots.len());
        for (index, slot) in slots.iter().enumerate() {
            match slot {
                None => tracing::error!(key, index, "blob slot is missing, skipping"),
                Some(blob) => match blob.bytes() {
                    None => tracing::error!(key, index, "blob wrapper holds no bytes, skipping"),
                    Some(value) => bytes.push(value),
                },
            }
        }
        Some(bytes)
    }

    /// Returns every nested document stored under `key`.
    ///
    /// Decoding is per-slot tolerant, like [`property_bytes_array`]: a
    /// missing slot is skipped with a diagnostic and never aborts the read.
    ///
    /// [`property_bytes_array`]: Self::property_bytes_array
    pub fn property_document_array(&self, key: &str) -> Option<Vec<&Document>> {
        let PropertyValue::Document(slots) = self.property_of_kind(key, PropertyKind::Document)?
        else {
            return None;
        };
        let mut documents = Vec::with_capacity(slots.len());
        for (index, slot) in slots.iter().enumerate() {
            match slot {
                None => tracing::error!(key, index, "nested document slot is missing, skipping"),
                Some(document) => documents.push(document),
            }
        }
        Some(documents)
    }

    /// Returns the first string value for `key`, or `None` if the property is
    /// absent, empty, or stored under a different kind.
    pub fn property_string(&self, key: &str) -> Option<&str> {
        let values = self.property_string_array(key)?;
        warn_if_single_property_too_long(PropertyKind::String, key, values.len());
        values.first().map(String::as_str)
    }

    /// Returns the first int64 value for `key`, or 0 if the property is
    /// absent, empty, or stored under a different kind.
    pub fn property_long(&self, key: &str) -> i64 {
        match self.property_long_array(key) {
            Some(values) => {
                warn_if_single_property_too_long(PropertyKind::Long, key, values.len());
                values.first().copied().unwrap_or(0)
            }
            None => 0,
        }
    }

    /// Returns the first double value for `key`, or 0.0 if the property is
    /// absent, empty, or stored under a different kind.
    pub fn property_double(&self, key: &str) -> f64 {
        match self.property_double_array(key) {
            Some(values) => {
                warn_if_single_property_too_long(PropertyKind::Double, key, values.len());
                values.first().copied().unwrap_or(0.0)
            }
            None => 0.0,
        }
    }

    /// Returns the first boolean value for `key`, or `false` if the property
    /// is absent, empty, or stored under a different kind.
    pub fn property_boolean(&self, key: &str) -> bool {
        match self.property_boolean_array(key) {
            Some(values) => {
                warn_if_single_property_too_long(PropertyKind::Boolean, key, values.len());
                values.first().copied().unwrap_or(false)
            }
            None => false,
        }
    }

    /// Returns the first blob for `key`, or `None` if the property is absent,
    /// empty, or stored under a different kind.
    pub fn property_bytes(&self, key: &str) -> Option<&[u8]> {
        let values = self.property_bytes_array(key)?;
        warn_if_single_property_too_long(PropertyKind::Bytes, key, values.len());
        values.first().copied()
    }

    /// Returns the first nested document for `key`, or `None` if the property
    /// is absent, empty, or stored under a different kind.
    pub fn property_document(&self, key: &str) -> Option<&Document> {
        let values = self.property_document_array(key)?;
        warn_if_single_property_too_long(PropertyKind::Document, key, values.len());
        values.first().copied()
    }

    /// Serializes this document into the wire record consumed by the index.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuilds a document from its wire record.
    ///
    /// Missing optional metadata falls back to the construction defaults;
    /// `uri`, `schemaType`, and `properties` are required.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Stable content fingerprint over the deterministic rendering, for
    /// change detection by an external index. Equal documents have equal
    /// fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    fn structural_hash(&self) -> u64 {
        *self.cached_hash.get_or_init(|| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            self.hash_structure(&mut hasher);
            hasher.finish()
        })
    }

    fn hash_structure<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.namespace.hash(state);
        self.schema_type.hash(state);
        self.creation_timestamp_millis.hash(state);
        self.ttl_millis.hash(state);
        self.score.hash(state);
        for (key, value) in &self.properties {
            key.hash(state);
            value.hash(state);
        }
    }
}

fn warn_if_single_property_too_long(kind: PropertyKind, key: &str, elements: usize) {
    if elements > 1 {
        tracing::warn!(
            key,
            elements,
            kind = kind.type_name(),
            "property holds multiple elements, only the first is returned; use the array accessor"
        );
    }
}

// Structural equality over metadata and properties, recursively through
// nested documents. The hash cache is excluded.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
            && self.namespace == other.namespace
            && self.schema_type == other.schema_type
            && self.creation_timestamp_millis == other.creation_timestamp_millis
            && self.ttl_millis == other.ttl_millis
            && self.score == other.score
            && self.properties == other.properties
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

// Deterministic rendering: metadata fields and property keys in lexicographic
// order, nested structures recursively. Total by construction.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ key: 'creationTimestampMillis' value: {} }} ",
            self.creation_timestamp_millis
        )?;
        write!(f, "{{ key: 'namespace' value: {} }} ", self.namespace)?;
        write!(f, "{{ key: 'properties' value: ")?;
        for (key, value) in &self.properties {
            write!(f, "{{ key: '{key}' value: {value} }} ")?;
        }
        write!(f, "}} ")?;
        write!(f, "{{ key: 'schemaType' value: {} }} ", self.schema_type)?;
        write!(f, "{{ key: 'score' value: {} }} ", self.score)?;
        write!(f, "{{ key: 'ttlMillis' value: {} }} ", self.ttl_millis)?;
        write!(f, "{{ key: 'uri' value: {} }}", self.uri)
    }
}
