//! An error type for all schema compilation failures.

use failure::Fail;

/// An enum of possible errors that can emerge while compiling a schema.
///
/// These are setup-time failures: a schema that produces one of these cannot
/// be used for validation at all. Problems found in *instances* are reported
/// as [`ValidationError`](../validator/struct.ValidationError.html)s instead.
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
pub enum SchemaError {
    /// A schema position held something other than an object or a boolean, or
    /// a keyword's value had the wrong shape.
    ///
    /// `pointer` is a JSON Pointer to the offending location within the schema
    /// document.
    #[fail(display = "malformed schema at {:?}: {}", pointer, reason)]
    MalformedSchema { pointer: String, reason: String },

    /// A `pattern` or `patternProperties` key was not a valid regular
    /// expression.
    #[fail(display = "invalid pattern {:?} at {:?}: {}", pattern, pointer, reason)]
    InvalidPattern {
        pointer: String,
        pattern: String,
        reason: String,
    },

    /// An `$id`, `$ref`, or registry key could not be parsed as a URI
    /// reference.
    #[fail(display = "invalid uri {:?}: {}", uri, reason)]
    InvalidUri { uri: String, reason: String },

    /// A `$ref` did not point at anything in the schema or its registry.
    ///
    /// References are resolved only after the whole schema has been walked,
    /// so forward references are fine; this error means the target genuinely
    /// does not exist.
    #[fail(display = "unresolvable reference {:?} at {:?}", reference, pointer)]
    UnresolvableRef { pointer: String, reference: String },

    /// Two different sub-schemas declared the same `$id`.
    #[fail(display = "duplicate schema id: {}", uri)]
    DuplicateId { uri: String },
}
