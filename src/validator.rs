//! Validate input data against schemas.
//!
//! This module contains logic related to *validation*, the process of taking a
//! piece of input data (called an "instance") and checking if it's valid
//! according to a schema.
//!
//! See the docs for [`Validator`](struct.Validator.html) for more.

use crate::schema::{Schema, SchemaNode};
use crate::vm;
use json_pointer::JsonPointer;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Validates instances against schemas.
#[derive(Debug, Default, Eq, PartialEq, Clone, Hash)]
pub struct Validator {
    config: Config,
}

impl Validator {
    /// Constructs a new validator using the default configuration.
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    /// Constructs a new validator using a configuration.
    pub fn new_with_config(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this validator runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate an instance against a schema.
    ///
    /// Every violation is reported, in the order it was found, unless
    /// [`Config::max_errors`](struct.Config.html#method.max_errors) says
    /// otherwise. Validation never fails: a malformed schema is caught when
    /// the schema is compiled.
    pub fn validate(&self, schema: &Schema, instance: &Value) -> ValidationResult {
        vm::validate(&self.config, schema, instance).into()
    }

    /// Check an instance without collecting more than the first violation.
    pub fn is_valid(&self, schema: &Schema, instance: &Value) -> bool {
        let mut config = self.config.clone();
        config.max_errors(1);
        vm::validate(&config, schema, instance).is_empty()
    }
}

/// Configuration for how validation should proceed.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Config {
    max_errors: usize,
    max_depth: usize,
    validate_formats: bool,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of errors to produce before stopping validation.
    /// 0, the default value, indicates that all errors should be produced.
    ///
    /// If your use-case doesn't care about errors, and you just want to abort
    /// on the first error, you should set this value to 1.
    pub fn max_errors(&mut self, max_errors: usize) -> &mut Self {
        self.max_errors = max_errors;
        self
    }

    /// Sets how many times a `$ref` may re-enter a schema that is already
    /// being applied further up. The default is 256.
    ///
    /// Only recursion counts: a chain of references through distinct schemas
    /// is followed to its end whatever its length. A recursive reference past
    /// the limit is not followed; a `$ref` error is reported at that instance
    /// location instead. Self-referential schemas that revisit the same
    /// instance never reach this limit, since a reference to a schema already
    /// being applied to the same instance is treated as satisfied.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets whether the `format` keyword is asserted. The default is true.
    ///
    /// When false, `format` is an annotation only and never produces errors.
    pub fn validate_formats(&mut self, validate_formats: bool) -> &mut Self {
        self.validate_formats = validate_formats;
        self
    }

    pub(crate) fn error_limit(&self) -> usize {
        self.max_errors
    }

    pub(crate) fn depth_limit(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn formats(&self) -> bool {
        self.validate_formats
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_errors: 0,
            max_depth: 256,
            validate_formats: true,
        }
    }
}

/// One step from a value to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object member.
    Key(String),

    /// An array element.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// The location of a value within an instance, from the instance root.
///
/// Displays (and serializes) as a JSON Pointer; the root is the empty string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct InstancePath(Vec<PathSegment>);

impl InstancePath {
    /// The segments from the root, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Is this the root of the instance?
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path as a JSON Pointer.
    pub fn to_pointer(&self) -> JsonPointer<String, Vec<String>> {
        JsonPointer::new(self.0.iter().map(ToString::to_string).collect())
    }
}

impl From<Vec<PathSegment>> for InstancePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        InstancePath(segments)
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_pointer())
    }
}

impl Serialize for InstancePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Contains a single problem with an instance when evaluated against a schema.
///
/// Note that, despite its name, `ValidationError` is not an error in the usual
/// Rust sense. It is an ordinary struct, which happens to contain information
/// about why some data was unsatisfactory against a given schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    #[serde(rename = "path")]
    instance_path: InstancePath,
    #[serde(serialize_with = "serialize_pointer")]
    schema_path: Vec<String>,
    keyword: &'static str,
    message: String,
}

impl ValidationError {
    pub fn new(
        instance_path: InstancePath,
        schema_path: Vec<String>,
        keyword: &'static str,
        message: String,
    ) -> ValidationError {
        ValidationError {
            instance_path,
            schema_path,
            keyword,
            message,
        }
    }

    /// An error raised by `node` at `path`.
    ///
    /// Keyword errors point at the keyword within the node; the `false`
    /// schema points at the node itself.
    pub(crate) fn at(
        node: &SchemaNode,
        path: &[PathSegment],
        keyword: &'static str,
        message: String,
    ) -> ValidationError {
        let mut schema_path = node.schema_path().to_vec();
        if node.keywords().is_some() {
            schema_path.push(keyword.to_owned());
        }

        Self::new(path.to_vec().into(), schema_path, keyword, message)
    }

    /// A pointer into the part of the instance (input) which was rejected.
    pub fn instance_path(&self) -> &InstancePath {
        &self.instance_path
    }

    /// A pointer into the part of the schema which rejected the instance.
    ///
    /// The pointer is relative to the root of the document the rejecting
    /// sub-schema lives in.
    pub fn schema_path(&self) -> JsonPointer<&str, Vec<&str>> {
        JsonPointer::new(self.schema_path.iter().map(String::as_str).collect())
    }

    /// The keyword which was violated, such as `"type"` or `"required"`.
    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// A human-readable description of the violation.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.instance_path.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

fn serialize_pointer<S: Serializer>(tokens: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&JsonPointer::new(tokens))
}

/// The outcome of validating one instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// True iff there are no errors.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The errors, in the order they were found.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Same as [`errors`](#method.errors), but moves ownership.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl From<Vec<ValidationError>> for ValidationResult {
    fn from(errors: Vec<ValidationError>) -> Self {
        ValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }
}

impl IntoIterator for ValidationResult {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
