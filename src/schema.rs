//! Compiled schema representations.
//!
//! A [`Schema`](struct.Schema.html) owns every [`SchemaNode`](struct.SchemaNode.html)
//! of a compiled document in a flat arena. Nodes refer to their children, and
//! `$ref` nodes refer to their targets, by [`NodeId`](struct.NodeId.html), so
//! recursive schemas are representable without cyclic ownership.

use crate::compiler::Compiler;
use crate::errors::SchemaError;
use crate::registry::Registry;
use crate::resolver::ReferenceTable;
use regex::Regex;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// An index into the node arena of a [`Schema`](struct.Schema.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A compiled, immutable schema.
///
/// Compiling validates the shape of every keyword, compiles every regular
/// expression, and resolves every `$ref`. After that the schema is read-only
/// and can be shared freely between threads.
#[derive(Debug)]
pub struct Schema {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) root: NodeId,
    pub(crate) base: Url,
    pub(crate) table: ReferenceTable,
    pub(crate) raw: Value,
}

impl Schema {
    /// Compile a schema document with no external documents available.
    pub fn compile(raw: &Value) -> Result<Schema, SchemaError> {
        Self::compile_with(raw, &Registry::new())
    }

    /// Compile a schema document, resolving references to other documents
    /// through `registry`.
    pub fn compile_with(raw: &Value, registry: &Registry) -> Result<Schema, SchemaError> {
        Compiler::new(registry).compile(raw)
    }

    /// The root node of the schema.
    pub fn root(&self) -> &SchemaNode {
        self.node(self.root)
    }

    /// The id of the root node.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Look up a node by id.
    ///
    /// Ids are only meaningful for the schema that produced them.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        self.nodes
            .get(id.0)
            .expect("unreachable: node id outside the schema arena")
    }

    /// The number of compiled nodes, including on-demand compiled ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a compiled schema has at least its root node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The base URI the root document was compiled under.
    pub fn base_uri(&self) -> &Url {
        &self.base
    }

    /// The document this schema was compiled from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Resolve a reference, relative to the root's base URI, to a node.
    ///
    /// `"#"` is the root, `"#/definitions/a"` a JSON Pointer, and `"#foo"` a
    /// plain-name `$id` anchor.
    pub fn resolve(&self, reference: &str) -> Result<&SchemaNode, SchemaError> {
        self.table
            .resolve(&self.base, reference)
            .map(|id| self.node(id))
    }

    /// The reference table built at compile time.
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }
}

/// One schema or sub-schema.
#[derive(Debug)]
pub struct SchemaNode {
    pub(crate) schema_path: Vec<String>,
    pub(crate) form: Form,
}

impl SchemaNode {
    /// The reference tokens from the root of this node's document to the
    /// node.
    pub fn schema_path(&self) -> &[String] {
        &self.schema_path
    }

    /// Get the form of the node.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// The keywords of this node, or None for a boolean schema.
    pub fn keywords(&self) -> Option<&Keywords> {
        match self.form {
            Form::Boolean(_) => None,
            Form::Keywords(ref keywords) => Some(&**keywords),
        }
    }

    /// Is this the literal `false` schema?
    pub fn is_false(&self) -> bool {
        match self.form {
            Form::Boolean(b) => !b,
            Form::Keywords(_) => false,
        }
    }
}

/// The two forms a schema may take on.
#[derive(Debug)]
pub enum Form {
    /// `true` accepts every instance, `false` rejects every instance.
    Boolean(bool),

    /// An object of keywords.
    Keywords(Box<Keywords>),
}

/// The recognized keywords of an object schema.
///
/// Keywords which are absent from the schema are `None` (or empty). Keywords
/// which this crate does not evaluate, including annotations such as `title`
/// or `default`, are kept verbatim in `extra`.
#[derive(Debug, Default)]
pub struct Keywords {
    pub id: Option<String>,
    pub reference: Option<Reference>,
    pub definitions: Vec<(String, NodeId)>,

    pub types: Option<TypeSet>,
    pub enumeration: Option<Vec<Value>>,
    pub constant: Option<Value>,

    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    pub format: Option<String>,

    pub items: Option<Items>,
    pub additional_items: Option<NodeId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<NodeId>,

    pub required: Vec<String>,
    pub properties: Vec<(String, NodeId)>,
    pub pattern_properties: Vec<(Pattern, NodeId)>,
    pub additional_properties: Option<NodeId>,
    pub property_names: Option<NodeId>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependencies: Vec<(String, Dependency)>,

    pub all_of: Option<Vec<NodeId>>,
    pub any_of: Option<Vec<NodeId>>,
    pub one_of: Option<Vec<NodeId>>,
    pub not: Option<NodeId>,

    pub if_: Option<NodeId>,
    pub then: Option<NodeId>,
    pub else_: Option<NodeId>,

    pub extra: HashMap<String, Value>,
}

/// A resolved `$ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The reference exactly as written in the schema.
    pub raw: String,

    /// The node the reference resolved to.
    pub target: NodeId,
}

/// The two shapes of the `items` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items {
    /// Every element must match the schema.
    Single(NodeId),

    /// Elements are matched positionally; `additionalItems` covers the rest.
    Tuple(Vec<NodeId>),
}

/// The two shapes of a `dependencies` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// If the property is present, these properties must be too.
    Required(Vec<String>),

    /// If the property is present, the whole object must match the schema.
    Schema(NodeId),
}

/// A compiled regular expression with its source text.
///
/// Matching is an unanchored search: a match anywhere in the string
/// satisfies the pattern. As in ECMA-262, `\d` and `\w` match ASCII only.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub(crate) fn new(source: &str) -> Result<Pattern, regex::Error> {
        Ok(Pattern {
            source: source.to_owned(),
            regex: Regex::new(&translate(source))?,
        })
    }

    /// The pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does the pattern match anywhere within `s`?
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

// ECMA-262 class escapes are ASCII-only, and `[` is a literal inside a
// class. Word boundaries stay Unicode-aware.
fn translate(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_class = false;
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('d') => out.push_str(if in_class { "0-9" } else { "[0-9]" }),
                Some('D') => out.push_str("[^0-9]"),
                Some('w') => out.push_str(if in_class { "0-9A-Za-z_" } else { "[0-9A-Za-z_]" }),
                Some('W') => out.push_str("[^0-9A-Za-z_]"),
                Some('b') if in_class => out.push_str("\\x08"),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '[' if in_class => out.push_str("\\["),
            '[' => {
                in_class = true;
                out.push('[');
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            other => out.push(other),
        }
    }

    out
}

/// The values that the "type" keyword may check for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,

    /// A number with no fractional part.
    Integer,
}

impl Type {
    pub(crate) fn from_name(name: &str) -> Option<Type> {
        match name {
            "null" => Some(Type::Null),
            "boolean" => Some(Type::Boolean),
            "object" => Some(Type::Object),
            "array" => Some(Type::Array),
            "number" => Some(Type::Number),
            "string" => Some(Type::String),
            "integer" => Some(Type::Integer),
            _ => None,
        }
    }

    /// The keyword spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Boolean => "boolean",
            Type::Object => "object",
            Type::Array => "array",
            Type::Number => "number",
            Type::String => "string",
            Type::Integer => "integer",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of permitted primitive types, in the order they were written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeSet {
    bits: u8,
    order: Vec<Type>,
}

impl TypeSet {
    pub(crate) fn insert(&mut self, typ: Type) -> bool {
        if self.contains(typ) {
            return false;
        }

        self.bits |= typ.bit();
        self.order.push(typ);
        true
    }

    /// Is `typ` written in the set?
    pub fn contains(&self, typ: Type) -> bool {
        self.bits & typ.bit() != 0
    }

    /// Does `value` have one of the permitted types?
    ///
    /// Any number satisfies `number`; `integer` requires a number with no
    /// fractional part.
    pub fn matches(&self, value: &Value) -> bool {
        match value {
            Value::Null => self.contains(Type::Null),
            Value::Bool(_) => self.contains(Type::Boolean),
            Value::Object(_) => self.contains(Type::Object),
            Value::Array(_) => self.contains(Type::Array),
            Value::String(_) => self.contains(Type::String),
            Value::Number(n) => {
                self.contains(Type::Number)
                    || (self.contains(Type::Integer) && crate::value::is_integer(n))
            }
        }
    }

    /// The types in the order the schema listed them.
    pub fn iter(&self) -> impl Iterator<Item = Type> + '_ {
        self.order.iter().cloned()
    }
}
