//! Turns a raw schema document into a [`Schema`](../schema/struct.Schema.html).
//!
//! Compilation is two passes. The first walks the document, builds a node
//! for every schema position, and records each node in the reference table.
//! The second resolves every `$ref` against the now complete table, which is
//! what makes forward references legal.

use crate::errors::SchemaError;
use crate::meta;
use crate::pointer;
use crate::registry::Registry;
use crate::resolver::{self, Fragment, ReferenceTable, Target};
use crate::schema::{
    Dependency, Form, Items, Keywords, NodeId, Pattern, Reference, Schema, SchemaNode, Type,
    TypeSet,
};
use crate::value;
use json_pointer::JsonPointer;
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};
use url::Url;

/// The base URI of a root document which declares no `$id`.
pub(crate) const DEFAULT_BASE: &str = "json-schema:///root.json";

/// A resource scope: the base URI in effect, and the depth of the token path
/// at which the resource begins.
struct Scope {
    base: Url,
    depth: usize,
}

struct PendingRef {
    node: NodeId,
    raw: String,
    base: Url,
    pointer: String,
}

pub(crate) struct Compiler<'d> {
    documents: HashMap<String, &'d Value>,
    compiled: HashSet<String>,
    nodes: Vec<SchemaNode>,
    table: ReferenceTable,
    pending: Vec<PendingRef>,
}

impl<'d> Compiler<'d> {
    pub(crate) fn new(registry: &'d Registry) -> Self {
        let mut documents: HashMap<String, &'d Value> = registry
            .iter()
            .map(|(url, document)| (url.as_str().to_owned(), document))
            .collect();

        let mut draft7 = meta::DRAFT7_URI.to_owned();
        draft7.pop();
        documents.entry(draft7).or_insert_with(|| meta::document());

        Compiler {
            documents,
            compiled: HashSet::new(),
            nodes: vec![],
            table: ReferenceTable::new(),
            pending: vec![],
        }
    }

    pub(crate) fn compile(mut self, raw: &'d Value) -> Result<Schema, SchemaError> {
        let default_base = Url::parse(DEFAULT_BASE).map_err(|err| SchemaError::InvalidUri {
            uri: DEFAULT_BASE.to_owned(),
            reason: err.to_string(),
        })?;

        let mut base = default_base.clone();
        if let Value::Object(map) = raw {
            if !map.contains_key("$ref") {
                if let Some(mut id) = declared_id(&default_base, map, &[])? {
                    id.set_fragment(None);
                    base = id;
                }
            }
        }

        for document in &[&default_base, &base] {
            self.documents.insert(document.as_str().to_owned(), raw);
            self.compiled.insert(document.as_str().to_owned());
        }

        let mut scopes = vec![Scope {
            base: default_base,
            depth: 0,
        }];
        let root = self.compile_node(raw, &mut scopes, &mut vec![])?;
        self.resolve_pending()?;

        debug!(
            base = %base,
            nodes = self.nodes.len(),
            locations = self.table.len(),
            "compiled schema"
        );

        Ok(Schema {
            nodes: self.nodes,
            root,
            base,
            table: self.table,
            raw: raw.clone(),
        })
    }

    fn compile_node(
        &mut self,
        value: &'d Value,
        scopes: &mut Vec<Scope>,
        tokens: &mut Vec<String>,
    ) -> Result<NodeId, SchemaError> {
        // A location may already have been compiled on demand, either as the
        // target of an earlier reference or inside one.
        if let Some(scope) = scopes.first() {
            let key = resolver::location_key(&scope.base, &tokens[scope.depth..]);
            if let Some(existing) = self.table.get(&key) {
                return Ok(existing);
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            schema_path: tokens.clone(),
            form: Form::Boolean(true),
        });

        let map = match value {
            Value::Bool(b) => {
                self.record(id, scopes, tokens)?;
                self.nodes[id.0].form = Form::Boolean(*b);
                return Ok(id);
            }
            Value::Object(map) => map,
            other => {
                return Err(SchemaError::MalformedSchema {
                    pointer: pointer::format(tokens),
                    reason: format!(
                        "expected an object or boolean, found {}",
                        value::type_name(other)
                    ),
                });
            }
        };

        // A sibling $id of $ref does not establish a new scope.
        let mut entered = false;
        if !map.contains_key("$ref") {
            let current = current_base(scopes).clone();
            if let Some(url) = declared_id(&current, map, tokens)? {
                let mut document = url.clone();
                document.set_fragment(None);

                if let Some(anchor) = url.fragment().filter(|f| !f.is_empty()) {
                    self.table
                        .insert(resolver::anchor_key(&document, anchor), id)?;
                }

                if document != current {
                    scopes.push(Scope {
                        base: document,
                        depth: tokens.len(),
                    });
                    entered = true;
                }
            }
        }

        let keywords = self
            .record(id, scopes, tokens)
            .and_then(|()| self.compile_keywords(id, map, scopes, tokens));
        if entered {
            scopes.pop();
        }

        self.nodes[id.0].form = Form::Keywords(Box::new(keywords?));
        Ok(id)
    }

    fn record(&mut self, id: NodeId, scopes: &[Scope], tokens: &[String]) -> Result<(), SchemaError> {
        for scope in scopes {
            self.table
                .insert(resolver::location_key(&scope.base, &tokens[scope.depth..]), id)?;
        }

        Ok(())
    }

    fn compile_keywords(
        &mut self,
        id: NodeId,
        map: &'d Map<String, Value>,
        scopes: &mut Vec<Scope>,
        tokens: &mut Vec<String>,
    ) -> Result<Keywords, SchemaError> {
        let mut keywords = Keywords::default();

        for (key, value) in map {
            let key = key.as_str();
            match key {
                "$ref" => {
                    let raw = string(value, tokens, key)?;
                    self.pending.push(PendingRef {
                        node: id,
                        raw: raw.to_owned(),
                        base: current_base(scopes).clone(),
                        pointer: at(tokens, &[key]),
                    });
                }
                "$id" => keywords.id = Some(string(value, tokens, key)?.to_owned()),
                "definitions" => {
                    keywords.definitions = self.schema_map(value, scopes, tokens, key)?
                }

                "type" => keywords.types = Some(type_set(value, tokens)?),
                "enum" => {
                    let values = value.as_array().ok_or_else(|| {
                        malformed(tokens, &[key], "must be an array")
                    })?;
                    keywords.enumeration = Some(values.clone());
                }
                "const" => keywords.constant = Some(value.clone()),

                "minimum" => keywords.minimum = Some(number(value, tokens, key)?),
                "maximum" => keywords.maximum = Some(number(value, tokens, key)?),
                "exclusiveMinimum" => {
                    keywords.exclusive_minimum = Some(number(value, tokens, key)?)
                }
                "exclusiveMaximum" => {
                    keywords.exclusive_maximum = Some(number(value, tokens, key)?)
                }
                "multipleOf" => {
                    let divisor = number(value, tokens, key)?;
                    if divisor.as_f64().map_or(true, |d| d <= 0.0) {
                        return Err(malformed(tokens, &[key], "must be greater than 0"));
                    }
                    keywords.multiple_of = Some(divisor);
                }

                "minLength" => keywords.min_length = Some(count(value, tokens, key)?),
                "maxLength" => keywords.max_length = Some(count(value, tokens, key)?),
                "pattern" => {
                    let source = string(value, tokens, key)?;
                    keywords.pattern = Some(pattern(source, tokens, &[key])?);
                }
                "format" => keywords.format = Some(string(value, tokens, key)?.to_owned()),

                "items" => {
                    keywords.items = Some(match value {
                        Value::Array(items) => {
                            Items::Tuple(self.schema_list(items, scopes, tokens, key)?)
                        }
                        _ => Items::Single(self.subschema(value, scopes, tokens, &[key])?),
                    })
                }
                "additionalItems" => {
                    keywords.additional_items = Some(self.subschema(value, scopes, tokens, &[key])?)
                }
                "minItems" => keywords.min_items = Some(count(value, tokens, key)?),
                "maxItems" => keywords.max_items = Some(count(value, tokens, key)?),
                "uniqueItems" => {
                    keywords.unique_items = value
                        .as_bool()
                        .ok_or_else(|| malformed(tokens, &[key], "must be a boolean"))?
                }
                "contains" => {
                    keywords.contains = Some(self.subschema(value, scopes, tokens, &[key])?)
                }

                "required" => keywords.required = string_list(value, tokens, &[key])?,
                "properties" => {
                    keywords.properties = self.schema_map(value, scopes, tokens, key)?
                }
                "patternProperties" => {
                    let entries = object(value, tokens, key)?;
                    for (source, sub) in entries {
                        let compiled = pattern(source, tokens, &[key, source.as_str()])?;
                        let node = self.subschema(sub, scopes, tokens, &[key, source.as_str()])?;
                        keywords.pattern_properties.push((compiled, node));
                    }
                }
                "additionalProperties" => {
                    keywords.additional_properties =
                        Some(self.subschema(value, scopes, tokens, &[key])?)
                }
                "propertyNames" => {
                    keywords.property_names = Some(self.subschema(value, scopes, tokens, &[key])?)
                }
                "minProperties" => keywords.min_properties = Some(count(value, tokens, key)?),
                "maxProperties" => keywords.max_properties = Some(count(value, tokens, key)?),
                "dependencies" => {
                    let entries = object(value, tokens, key)?;
                    for (name, dependency) in entries {
                        let dependency = match dependency {
                            Value::Array(_) => Dependency::Required(string_list(
                                dependency,
                                tokens,
                                &[key, name.as_str()],
                            )?),
                            _ => Dependency::Schema(self.subschema(
                                dependency,
                                scopes,
                                tokens,
                                &[key, name.as_str()],
                            )?),
                        };
                        keywords.dependencies.push((name.clone(), dependency));
                    }
                }

                "allOf" | "anyOf" | "oneOf" => {
                    let items = match value {
                        Value::Array(items) if !items.is_empty() => items,
                        _ => return Err(malformed(tokens, &[key], "must be a non-empty array")),
                    };
                    let nodes = Some(self.schema_list(items, scopes, tokens, key)?);
                    match key {
                        "allOf" => keywords.all_of = nodes,
                        "anyOf" => keywords.any_of = nodes,
                        _ => keywords.one_of = nodes,
                    }
                }
                "not" => keywords.not = Some(self.subschema(value, scopes, tokens, &[key])?),
                "if" => keywords.if_ = Some(self.subschema(value, scopes, tokens, &[key])?),
                "then" => keywords.then = Some(self.subschema(value, scopes, tokens, &[key])?),
                "else" => keywords.else_ = Some(self.subschema(value, scopes, tokens, &[key])?),

                _ => {
                    keywords.extra.insert(key.to_owned(), value.clone());
                }
            }
        }

        Ok(keywords)
    }

    fn subschema(
        &mut self,
        value: &'d Value,
        scopes: &mut Vec<Scope>,
        tokens: &mut Vec<String>,
        segments: &[&str],
    ) -> Result<NodeId, SchemaError> {
        let len = tokens.len();
        tokens.extend(segments.iter().map(|s| (*s).to_owned()));
        let result = self.compile_node(value, scopes, tokens);
        tokens.truncate(len);
        result
    }

    fn schema_list(
        &mut self,
        items: &'d [Value],
        scopes: &mut Vec<Scope>,
        tokens: &mut Vec<String>,
        key: &str,
    ) -> Result<Vec<NodeId>, SchemaError> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.subschema(item, scopes, tokens, &[key, i.to_string().as_str()]))
            .collect()
    }

    fn schema_map(
        &mut self,
        value: &'d Value,
        scopes: &mut Vec<Scope>,
        tokens: &mut Vec<String>,
        key: &str,
    ) -> Result<Vec<(String, NodeId)>, SchemaError> {
        let entries = object(value, tokens, key)?;
        let mut out = Vec::with_capacity(entries.len());
        for (name, sub) in entries {
            let node = self.subschema(sub, scopes, tokens, &[key, name.as_str()])?;
            out.push((name.clone(), node));
        }

        Ok(out)
    }

    fn resolve_pending(&mut self) -> Result<(), SchemaError> {
        // Resolving may compile more of a document on demand, which can queue
        // more references.
        while let Some(pending) = self.pending.pop() {
            let target = Target::parse(&pending.base, &pending.raw)?;
            let resolved = self
                .lookup(&target)?
                .ok_or_else(|| SchemaError::UnresolvableRef {
                    pointer: pending.pointer.clone(),
                    reference: pending.raw.clone(),
                })?;

            if let Form::Keywords(ref mut keywords) = self.nodes[pending.node.0].form {
                keywords.reference = Some(Reference {
                    raw: pending.raw,
                    target: resolved,
                });
            }
        }

        Ok(())
    }

    fn lookup(&mut self, target: &Target) -> Result<Option<NodeId>, SchemaError> {
        let key = target.key();
        if let Some(id) = self.table.get(&key) {
            return Ok(Some(id));
        }

        let document_key = target.document.as_str().to_owned();
        let document = match self.documents.get(&document_key) {
            Some(document) => *document,
            None => return Ok(None),
        };

        if self.compiled.insert(document_key.clone()) {
            trace!(document = %document_key, "compiling referenced document");
            let mut scopes = vec![Scope {
                base: target.document.clone(),
                depth: 0,
            }];
            self.compile_node(document, &mut scopes, &mut vec![])?;

            if let Some(id) = self.table.get(&key) {
                return Ok(Some(id));
            }
        }

        // The target is not at a schema position the walk visited, for
        // example a schema nested under an unknown keyword.
        let tokens = match target.fragment {
            Fragment::Pointer(ref tokens) => tokens.clone(),
            Fragment::Anchor(_) => return Ok(None),
        };
        let value = match JsonPointer::new(tokens.clone()).get(document) {
            Ok(value) => value,
            Err(_) => return Ok(None),
        };

        trace!(location = %key, "compiling referenced location on demand");
        let mut scopes = vec![Scope {
            base: target.document.clone(),
            depth: 0,
        }];
        let mut tokens = tokens;
        self.compile_node(value, &mut scopes, &mut tokens).map(Some)
    }
}

fn current_base(scopes: &[Scope]) -> &Url {
    &scopes
        .last()
        .expect("unreachable: empty scope stack")
        .base
}

fn declared_id(
    base: &Url,
    map: &Map<String, Value>,
    tokens: &[String],
) -> Result<Option<Url>, SchemaError> {
    match map.get("$id") {
        None => Ok(None),
        Some(Value::String(id)) => base
            .join(id)
            .map(Some)
            .map_err(|err| SchemaError::InvalidUri {
                uri: id.clone(),
                reason: err.to_string(),
            }),
        Some(_) => Err(malformed(tokens, &["$id"], "must be a string")),
    }
}

fn at(tokens: &[String], segments: &[&str]) -> String {
    let mut path: Vec<&str> = tokens.iter().map(String::as_str).collect();
    path.extend_from_slice(segments);
    pointer::format(&path)
}

fn malformed(tokens: &[String], segments: &[&str], reason: &str) -> SchemaError {
    SchemaError::MalformedSchema {
        pointer: at(tokens, segments),
        reason: reason.to_owned(),
    }
}

fn string<'v>(value: &'v Value, tokens: &[String], key: &str) -> Result<&'v str, SchemaError> {
    value
        .as_str()
        .ok_or_else(|| malformed(tokens, &[key], "must be a string"))
}

fn object<'v>(
    value: &'v Value,
    tokens: &[String],
    key: &str,
) -> Result<&'v Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| malformed(tokens, &[key], "must be an object"))
}

fn number(value: &Value, tokens: &[String], key: &str) -> Result<Number, SchemaError> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        _ => Err(malformed(tokens, &[key], "must be a number")),
    }
}

fn count(value: &Value, tokens: &[String], key: &str) -> Result<u64, SchemaError> {
    let n = match value {
        Value::Number(n) => n,
        _ => return Err(malformed(tokens, &[key], "must be a non-negative integer")),
    };

    if let Some(u) = n.as_u64() {
        return Ok(u);
    }

    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(malformed(tokens, &[key], "must be a non-negative integer")),
    }
}

fn pattern(source: &str, tokens: &[String], segments: &[&str]) -> Result<Pattern, SchemaError> {
    Pattern::new(source).map_err(|err| SchemaError::InvalidPattern {
        pointer: at(tokens, segments),
        pattern: source.to_owned(),
        reason: err.to_string(),
    })
}

fn string_list(
    value: &Value,
    tokens: &[String],
    segments: &[&str],
) -> Result<Vec<String>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(tokens, segments, "must be an array of strings"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| malformed(tokens, segments, "must be an array of strings"))
        })
        .collect()
}

fn type_set(value: &Value, tokens: &[String]) -> Result<TypeSet, SchemaError> {
    let names: Vec<&Value> = match value {
        Value::String(_) => vec![value],
        Value::Array(items) if !items.is_empty() => items.iter().collect(),
        _ => {
            return Err(malformed(
                tokens,
                &["type"],
                "must be a type name or a non-empty array of type names",
            ))
        }
    };

    let mut types = TypeSet::default();
    for name in names {
        let typ = name
            .as_str()
            .and_then(Type::from_name)
            .ok_or_else(|| malformed(tokens, &["type"], &format!("unknown type {}", name)))?;

        if !types.insert(typ) {
            return Err(malformed(
                tokens,
                &["type"],
                &format!("type {} is listed twice", typ),
            ));
        }
    }

    Ok(types)
}
