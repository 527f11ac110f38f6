//! `jsv` is a Rust implementation of [JSON Schema][json-schema], draft-07: a
//! vocabulary for describing the structure of JSON data and checking that
//! some data really has that structure.
//!
//! The documentation for this crate focuses on making JSON Schema work with
//! Rust. For information on JSON Schema in general, refer to the
//! [draft-07 documents][draft-07].
//!
//! # Validating data
//!
//! The most common use-case for this crate is checking that some JSON input is
//! really valid against a schema. Here's how you'd achieve that use-case:
//!
//! ```
//! use serde_json::json;
//! use jsv::{Schema, Validator};
//! use failure::Error;
//!
//! fn main() -> Result<(), Error> {
//!     let demo_schema_data = r#"
//!         {
//!             "type": "object",
//!             "required": ["name"],
//!             "properties": {
//!                 "name": { "type": "string" },
//!                 "age": { "type": "integer", "minimum": 0 },
//!                 "phones": {
//!                     "type": "array",
//!                     "items": { "type": "string" }
//!                 }
//!             }
//!         }
//!     "#;
//!
//!     // Schemas are compiled once, up front. Compiling catches malformed
//!     // keywords, bad regular expressions, and references which don't
//!     // point anywhere.
//!     let demo_schema = Schema::compile(&serde_json::from_str(demo_schema_data)?)?;
//!
//!     // Validator can check any number of instances against a compiled
//!     // schema. With the new_with_config constructor, you can configure how
//!     // many errors to return, how deep references may nest, and whether
//!     // "format" is asserted.
//!     let validator = Validator::new();
//!     let input_ok = json!({
//!         "name": "John Doe",
//!         "age": 43,
//!         "phones": [
//!             "+44 1234567",
//!             "+44 2345678"
//!         ]
//!     });
//!
//!     assert!(validator.validate(&demo_schema, &input_ok).is_valid());
//!
//!     let input_bad = json!({
//!         "age": "43",
//!         "phones": [
//!             "+44 1234567",
//!             442345678
//!         ]
//!     });
//!
//!     // Each ValidationError holds paths to the bad part of the input, as
//!     // well as the part of the schema which rejected it. Errors come back
//!     // in a predictable order.
//!     let result = validator.validate(&demo_schema, &input_bad);
//!     let errors = result.errors();
//!     assert_eq!(errors.len(), 3);
//!
//!     // "name" is required
//!     assert_eq!(errors[0].instance_path().to_string(), "");
//!     assert_eq!(errors[0].schema_path().to_string(), "/required");
//!
//!     // "age" has the wrong type
//!     assert_eq!(errors[1].instance_path().to_string(), "/age");
//!     assert_eq!(errors[1].schema_path().to_string(), "/properties/age/type");
//!
//!     // "phones[1]" has the wrong type
//!     assert_eq!(errors[2].instance_path().to_string(), "/phones/1");
//!     assert_eq!(errors[2].schema_path().to_string(), "/properties/phones/items/type");
//!
//!     Ok(())
//! }
//! ```
//!
//! The [`ValidationResult`](validator/struct.ValidationResult.html) that
//! [`Validator::validate`](validator/struct.Validator.html#method.validate)
//! produces serializes as `{"valid": ..., "errors": [...]}`, with both paths
//! of each error written out as JSON Pointer strings.
//!
//! # References
//!
//! `$ref` may point anywhere in the same document, by JSON Pointer or by
//! plain-name `$id` anchor, and may point into other documents held in a
//! [`Registry`](registry/struct.Registry.html). Schemas may be recursive.
//! Every reference is resolved when the schema is compiled, so validation
//! itself never fails.
//!
//! # Writing tooling on top of schemas
//!
//! A compiled [`Schema`](schema/struct.Schema.html) is an arena of
//! [`SchemaNode`s](schema/struct.SchemaNode.html), one per sub-schema, with
//! every keyword already parsed. That makes it a reasonable starting point for
//! UI, documentation, or code generation.
//!
//! [json-schema]: https://json-schema.org
//!
//! [draft-07]: https://json-schema.org/specification-links.html#draft-7

mod compiler;
mod keywords;
mod vm;

pub mod errors;
pub mod format;
pub mod meta;
pub mod pointer;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod validator;
pub mod value;

pub use crate::errors::SchemaError;
pub use crate::registry::Registry;
pub use crate::schema::{NodeId, Schema, SchemaNode};
pub use crate::validator::{
    Config, InstancePath, PathSegment, ValidationError, ValidationResult, Validator,
};

use serde_json::Value;

/// Validate `instance` against `schema` with the default configuration.
pub fn validate(schema: &Schema, instance: &Value) -> ValidationResult {
    Validator::new().validate(schema, instance)
}
