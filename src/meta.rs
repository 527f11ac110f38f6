//! The draft-07 meta-schema.
//!
//! [`Schema::compile`](../schema/struct.Schema.html#method.compile) only
//! rejects documents it cannot make sense of. Checking a document against the
//! meta-schema is stricter: it also catches keywords with the wrong shape
//! that the compiler would otherwise keep as annotations, such as a
//! `"title"` which isn't a string.

use crate::schema::Schema;
use crate::validator::{ValidationResult, Validator};
use serde_json::Value;
use std::sync::OnceLock;

/// The URI the draft-07 meta-schema is published under.
pub const DRAFT7_URI: &str = "http://json-schema.org/draft-07/schema#";

const DRAFT7: &str = include_str!("draft-07.json");

/// The draft-07 meta-schema document.
///
/// Every compiler sees this document at [`DRAFT7_URI`](constant.DRAFT7_URI.html)
/// unless its registry holds another one there.
pub fn document() -> &'static Value {
    static DOCUMENT: OnceLock<Value> = OnceLock::new();

    DOCUMENT.get_or_init(|| {
        serde_json::from_str(DRAFT7).expect("unreachable: meta-schema is valid JSON")
    })
}

/// The compiled draft-07 meta-schema, built on first use.
pub fn draft7() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();

    SCHEMA.get_or_init(|| Schema::compile(document()).expect("unreachable: meta-schema compiles"))
}

/// Validate a schema document against the draft-07 meta-schema.
pub fn validate_schema(schema: &Value) -> ValidationResult {
    Validator::new().validate(draft7(), schema)
}
