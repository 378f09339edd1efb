use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use docstore_core::document::{Document, DocumentBuilder};

fn hash_of(document: &Document) -> u64 {
    let mut hasher = DefaultHasher::new();
    document.hash(&mut hasher);
    hasher.finish()
}

fn base_builder() -> DocumentBuilder {
    let mut builder = DocumentBuilder::new("note/1", "Note").unwrap();
    builder
        .set_namespace("personal")
        .unwrap()
        .set_score(9)
        .unwrap()
        .set_ttl_millis(60_000)
        .unwrap()
        .set_creation_timestamp_millis(1_700_000_000_000)
        .unwrap()
        .set_property_string("title", ["Groceries"])
        .unwrap()
        .set_property_long("revision", [3])
        .unwrap();
    builder
}

#[test]
fn identical_builds_are_equal_and_hash_equal() {
    let a = base_builder().build().unwrap();
    let b = base_builder().build().unwrap();

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn any_single_difference_breaks_equality() {
    let base = base_builder().build().unwrap();

    let mut other = DocumentBuilder::new("note/2", "Note").unwrap();
    other
        .set_namespace("personal")
        .unwrap()
        .set_score(9)
        .unwrap()
        .set_ttl_millis(60_000)
        .unwrap()
        .set_creation_timestamp_millis(1_700_000_000_000)
        .unwrap()
        .set_property_string("title", ["Groceries"])
        .unwrap()
        .set_property_long("revision", [3])
        .unwrap();
    assert_ne!(base, other.build().unwrap(), "uri must participate");

    let mut other = base_builder();
    other.set_namespace("work").unwrap();
    assert_ne!(base, other.build().unwrap(), "namespace must participate");

    let mut other = base_builder();
    other.set_score(10).unwrap();
    assert_ne!(base, other.build().unwrap(), "score must participate");

    let mut other = base_builder();
    other.set_ttl_millis(1).unwrap();
    assert_ne!(base, other.build().unwrap(), "ttl must participate");

    let mut other = base_builder();
    other.set_creation_timestamp_millis(1).unwrap();
    assert_ne!(base, other.build().unwrap(), "timestamp must participate");

    let mut other = base_builder();
    other.set_property_string("title", ["Chores"]).unwrap();
    let other = other.build().unwrap();
    assert_ne!(base, other, "property values must participate");
    assert_ne!(hash_of(&base), hash_of(&other));

    let mut other = base_builder();
    other.set_property_long("revision", [3, 4]).unwrap();
    assert_ne!(base, other.build().unwrap(), "sequence length must participate");

    let mut other = base_builder();
    other.set_property_string("revision", ["3"]).unwrap();
    assert_ne!(base, other.build().unwrap(), "stored kind must participate");
}

#[test]
fn doubles_compare_bitwise() {
    let build = |value: f64| {
        let mut builder = DocumentBuilder::new("note/1", "Note").unwrap();
        builder.set_creation_timestamp_millis(5).unwrap();
        builder.set_property_double("confidence", [value]).unwrap();
        builder.build().unwrap()
    };

    // NaN equals itself under the bitwise rule, so equality stays reflexive.
    assert_eq!(build(f64::NAN), build(f64::NAN));
    assert_eq!(hash_of(&build(f64::NAN)), hash_of(&build(f64::NAN)));
    // 0.0 and -0.0 carry different bits.
    assert_ne!(build(0.0), build(-0.0));
}

#[test]
fn rendering_is_deterministic_and_sorted() {
    let a = base_builder().build().unwrap();
    let b = base_builder().build().unwrap();
    assert_eq!(a.to_string(), b.to_string());

    let rendered = a.to_string();
    let creation = rendered.find("'creationTimestampMillis'").unwrap();
    let namespace = rendered.find("'namespace'").unwrap();
    let properties = rendered.find("'properties'").unwrap();
    let schema_type = rendered.find("'schemaType'").unwrap();
    let score = rendered.find("'score'").unwrap();
    let ttl = rendered.find("'ttlMillis'").unwrap();
    let uri = rendered.find("'uri'").unwrap();

    assert!(creation < namespace);
    assert!(namespace < properties);
    assert!(properties < schema_type);
    assert!(schema_type < score);
    assert!(score < ttl);
    assert!(ttl < uri);

    // Property keys render in lexicographic order too.
    assert!(rendered.find("'revision'").unwrap() < rendered.find("'title'").unwrap());
    assert!(rendered.contains("[ 'Groceries' ]"));
}

#[test]
fn rendering_marks_missing_slots_instead_of_failing() {
    let document = Document::from_json(
        r#"{
            "uri": "note/1",
            "schemaType": "Note",
            "creationTimestampMillis": 5,
            "properties": {
                "payload": {"blobValues": [{"byteArray": [171, 205]}, null]}
            }
        }"#,
    )
    .unwrap();

    let rendered = document.to_string();
    assert!(rendered.contains("<null>"));
    assert!(rendered.contains("'abcd'"), "bytes render as hex: {rendered}");
}

#[test]
fn fingerprint_is_prefixed_and_stable() {
    let document = base_builder().build().unwrap();
    let fingerprint = document.fingerprint();

    assert!(fingerprint.starts_with("sha256:"));
    assert_eq!(fingerprint.len(), "sha256:".len() + 64);
    assert_eq!(fingerprint, document.fingerprint());
}

#[test]
fn nested_documents_participate_in_equality() {
    let nested = |label: &str| {
        let mut builder = DocumentBuilder::new("inner/1", "Leaf").unwrap();
        builder.set_creation_timestamp_millis(5).unwrap();
        builder.set_property_string("label", [label]).unwrap();
        builder.build().unwrap()
    };

    let outer = |leaf: Document| {
        let mut builder = DocumentBuilder::new("outer/1", "Note").unwrap();
        builder.set_creation_timestamp_millis(5).unwrap();
        builder.set_property_document("sections", [leaf]).unwrap();
        builder.build().unwrap()
    };

    let a = outer(nested("same"));
    let b = outer(nested("same"));
    let c = outer(nested("different"));

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, c);
}
