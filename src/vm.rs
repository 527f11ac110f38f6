use crate::keywords;
use crate::schema::{Dependency, Form, Items, Keywords, NodeId, Reference, Schema, SchemaNode};
use crate::validator::{Config, PathSegment, ValidationError};
use crate::value::describe;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

pub fn validate(config: &Config, schema: &Schema, instance: &Value) -> Vec<ValidationError> {
    let mut vm = Vm {
        config,
        schema,
        instance_tokens: vec![],
        refs: vec![],
        recursion: 0,
        errors: vec![],
        probes: 0,
    };

    match vm.eval(schema.root_id(), instance) {
        Ok(()) | Err(Halt) => {
            debug!(errors = vm.errors.len(), "validated instance");
            vm.errors
        }
    }
}

/// Raised once `max_errors` errors have been collected.
struct Halt;

struct Vm<'a> {
    config: &'a Config,
    schema: &'a Schema,
    instance_tokens: Vec<PathSegment>,

    // (target, instance) for every $ref currently being applied.
    refs: Vec<(NodeId, &'a Value)>,

    // How many of those frames re-enter a target already on the stack.
    recursion: usize,

    errors: Vec<ValidationError>,

    // While non-zero, errors go to a scratch list and never halt.
    probes: usize,
}

impl<'a> Vm<'a> {
    fn eval(&mut self, id: NodeId, instance: &'a Value) -> Result<(), Halt> {
        let schema = self.schema;
        let node = schema.node(id);

        let keywords = match node.form() {
            Form::Boolean(true) => return Ok(()),
            Form::Boolean(false) => {
                return self.fail(
                    node,
                    "false",
                    format!("{} is not allowed by the false schema", describe(instance)),
                );
            }
            Form::Keywords(keywords) => keywords,
        };

        // In draft-07, $ref overrides every sibling keyword.
        if let Some(ref reference) = keywords.reference {
            return self.eval_ref(node, reference, instance);
        }

        let failures = keywords::evaluate(
            node,
            keywords,
            instance,
            &self.instance_tokens,
            self.config.formats(),
        );
        for failure in failures {
            self.push_err(failure)?;
        }

        match instance {
            Value::Array(items) => self.eval_array(node, keywords, items)?,
            Value::Object(map) => self.eval_object(node, keywords, instance, map)?,
            _ => {}
        }

        self.eval_combinators(node, keywords, instance)?;
        self.eval_conditional(keywords, instance)
    }

    fn eval_ref(
        &mut self,
        node: &SchemaNode,
        reference: &Reference,
        instance: &'a Value,
    ) -> Result<(), Halt> {
        let target = reference.target;
        if self
            .refs
            .iter()
            .any(|&(seen, value)| seen == target && std::ptr::eq(value, instance))
        {
            trace!(reference = %reference.raw, "reference cycle on the same instance");
            return Ok(());
        }

        let recursive = self.refs.iter().any(|&(seen, _)| seen == target);
        if recursive && self.recursion >= self.config.depth_limit() {
            warn!(reference = %reference.raw, depth = self.recursion, "reference depth exceeded");
            return self.fail(
                node,
                "$ref",
                format!(
                    "maximum reference depth of {} exceeded while following {:?}",
                    self.config.depth_limit(),
                    reference.raw
                ),
            );
        }

        self.refs.push((target, instance));
        if recursive {
            self.recursion += 1;
        }

        let result = self.eval(target, instance);

        if recursive {
            self.recursion -= 1;
        }
        self.refs.pop();
        result
    }

    fn eval_array(
        &mut self,
        node: &SchemaNode,
        keywords: &Keywords,
        items: &'a [Value],
    ) -> Result<(), Halt> {
        match keywords.items {
            Some(Items::Single(item)) => {
                for (i, elem) in items.iter().enumerate() {
                    self.descend(i.into(), item, elem)?;
                }
            }
            Some(Items::Tuple(ref tuple)) => {
                for (i, (&item, elem)) in tuple.iter().zip(items).enumerate() {
                    self.descend(i.into(), item, elem)?;
                }

                if let Some(additional) = keywords.additional_items {
                    if items.len() > tuple.len() {
                        if self.schema.node(additional).is_false() {
                            self.fail(
                                node,
                                "additionalItems",
                                format!(
                                    "additional items are not allowed ({} more than {})",
                                    items.len() - tuple.len(),
                                    tuple.len()
                                ),
                            )?;
                        } else {
                            for (i, elem) in items.iter().enumerate().skip(tuple.len()) {
                                self.descend(i.into(), additional, elem)?;
                            }
                        }
                    }
                }
            }
            None => {}
        }

        if let Some(contains) = keywords.contains {
            let mut found = false;
            for (i, elem) in items.iter().enumerate() {
                self.instance_tokens.push(i.into());
                found = self.passes(contains, elem);
                self.instance_tokens.pop();
                if found {
                    break;
                }
            }

            if !found {
                self.fail(
                    node,
                    "contains",
                    "no item matches the schema in \"contains\"".to_owned(),
                )?;
            }
        }

        Ok(())
    }

    fn eval_object(
        &mut self,
        node: &SchemaNode,
        keywords: &Keywords,
        instance: &'a Value,
        map: &'a Map<String, Value>,
    ) -> Result<(), Halt> {
        for (name, sub_schema) in &keywords.properties {
            if let Some(sub_instance) = map.get(name) {
                self.descend(name.as_str().into(), *sub_schema, sub_instance)?;
            }
        }

        for (pattern, sub_schema) in &keywords.pattern_properties {
            for (key, sub_instance) in map {
                if pattern.is_match(key) {
                    self.descend(key.as_str().into(), *sub_schema, sub_instance)?;
                }
            }
        }

        if let Some(additional) = keywords.additional_properties {
            let forbidden = self.schema.node(additional).is_false();
            for (key, sub_instance) in map {
                let declared = keywords.properties.iter().any(|(name, _)| name == key)
                    || keywords
                        .pattern_properties
                        .iter()
                        .any(|(pattern, _)| pattern.is_match(key));
                if declared {
                    continue;
                }

                if forbidden {
                    self.fail(
                        node,
                        "additionalProperties",
                        format!("additional property {:?} is not allowed", key),
                    )?;
                } else {
                    self.descend(key.as_str().into(), additional, sub_instance)?;
                }
            }
        }

        for (name, dependency) in &keywords.dependencies {
            if let Dependency::Schema(sub_schema) = *dependency {
                if map.contains_key(name) {
                    self.eval(sub_schema, instance)?;
                }
            }
        }

        // Property names are checked as string instances at the object's
        // location. The names are not part of the document, so they get
        // their own reference stack.
        if let Some(names) = keywords.property_names {
            for key in map.keys() {
                let name = Value::String(key.clone());
                let mut nested = Vm {
                    config: self.config,
                    schema: self.schema,
                    instance_tokens: self.instance_tokens.clone(),
                    refs: vec![],
                    recursion: 0,
                    errors: vec![],
                    probes: self.probes + 1,
                };

                let _ = nested.eval(names, &name);
                self.push_errs(nested.errors)?;
            }
        }

        Ok(())
    }

    fn eval_combinators(
        &mut self,
        node: &SchemaNode,
        keywords: &Keywords,
        instance: &'a Value,
    ) -> Result<(), Halt> {
        if let Some(ref all_of) = keywords.all_of {
            for &sub_schema in all_of {
                self.eval(sub_schema, instance)?;
            }
        }

        if let Some(ref any_of) = keywords.any_of {
            let mut collected = vec![];
            let mut matched = false;
            for &sub_schema in any_of {
                let errors = self.probe(sub_schema, instance);
                if errors.is_empty() {
                    matched = true;
                    break;
                }
                collected.extend(errors);
            }

            if !matched {
                self.push_errs(collected)?;
            }
        }

        if let Some(ref one_of) = keywords.one_of {
            let mut collected = vec![];
            let mut matched = vec![];
            for (i, &sub_schema) in one_of.iter().enumerate() {
                let errors = self.probe(sub_schema, instance);
                if errors.is_empty() {
                    matched.push(i);
                } else {
                    collected.extend(errors);
                }
            }

            match matched.len() {
                0 => self.push_errs(collected)?,
                1 => {}
                n => self.fail(
                    node,
                    "oneOf",
                    format!(
                        "{} matched {} schemas (indices {:?}), expected 1",
                        describe(instance),
                        n,
                        matched
                    ),
                )?,
            }
        }

        if let Some(not) = keywords.not {
            if self.passes(not, instance) {
                self.fail(
                    node,
                    "not",
                    format!("{} should not be valid under the schema in \"not\"", describe(instance)),
                )?;
            }
        }

        Ok(())
    }

    fn eval_conditional(&mut self, keywords: &Keywords, instance: &'a Value) -> Result<(), Halt> {
        let condition = match keywords.if_ {
            Some(condition) => condition,
            None => return Ok(()),
        };

        let branch = if self.passes(condition, instance) {
            keywords.then
        } else {
            keywords.else_
        };

        match branch {
            Some(branch) => self.eval(branch, instance),
            None => Ok(()),
        }
    }

    fn descend(&mut self, token: PathSegment, id: NodeId, instance: &'a Value) -> Result<(), Halt> {
        self.push_instance_token(token);
        let result = self.eval(id, instance);
        self.pop_instance_token();
        result
    }

    /// Evaluate into a scratch list and hand back what it collected.
    fn probe(&mut self, id: NodeId, instance: &'a Value) -> Vec<ValidationError> {
        let outer = std::mem::replace(&mut self.errors, vec![]);
        self.probes += 1;

        // Halt is never raised inside a probe.
        let _ = self.eval(id, instance);

        self.probes -= 1;
        std::mem::replace(&mut self.errors, outer)
    }

    fn passes(&mut self, id: NodeId, instance: &'a Value) -> bool {
        self.probe(id, instance).is_empty()
    }

    fn push_instance_token(&mut self, token: PathSegment) {
        self.instance_tokens.push(token);
    }

    fn pop_instance_token(&mut self) {
        self.instance_tokens.pop();
    }

    fn fail(
        &mut self,
        node: &SchemaNode,
        keyword: &'static str,
        message: String,
    ) -> Result<(), Halt> {
        let error = ValidationError::at(node, &self.instance_tokens, keyword, message);
        self.push_err(error)
    }

    fn push_errs(&mut self, errors: Vec<ValidationError>) -> Result<(), Halt> {
        for error in errors {
            self.push_err(error)?;
        }

        Ok(())
    }

    fn push_err(&mut self, error: ValidationError) -> Result<(), Halt> {
        self.errors.push(error);

        if self.probes == 0 && self.errors.len() == self.config.error_limit() {
            Err(Halt)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use failure::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(schema: Value, instance: Value) -> Result<Vec<(String, &'static str)>, Error> {
        let schema = Schema::compile(&schema)?;
        Ok(validate(&Config::default(), &schema, &instance)
            .into_iter()
            .map(|e| (e.instance_path().to_string(), e.keyword()))
            .collect())
    }

    fn pairs(expected: &[(&str, &'static str)]) -> Vec<(String, &'static str)> {
        expected
            .iter()
            .map(|&(path, keyword)| (path.to_owned(), keyword))
            .collect()
    }

    #[test]
    fn recursive_schema() -> Result<(), Error> {
        let schema = json!({
            "type": "object",
            "properties": { "next": { "$ref": "#" } }
        });

        assert_eq!(run(schema.clone(), json!({ "next": { "next": {} } }))?, pairs(&[]));
        assert_eq!(
            run(schema, json!({ "next": { "next": "oops" } }))?,
            pairs(&[("/next/next", "type")])
        );
        Ok(())
    }

    #[test]
    fn ref_ignores_siblings() -> Result<(), Error> {
        let schema = json!({
            "definitions": { "n": { "type": "integer" } },
            "properties": {
                "a": { "$ref": "#/definitions/n", "minimum": 100 }
            }
        });

        assert_eq!(run(schema.clone(), json!({ "a": 5 }))?, pairs(&[]));
        assert_eq!(run(schema, json!({ "a": "5" }))?, pairs(&[("/a", "type")]));
        Ok(())
    }

    #[test]
    fn self_reference_on_the_same_instance_passes() -> Result<(), Error> {
        assert_eq!(run(json!({ "$ref": "#" }), json!([1, 2]))?, pairs(&[]));

        // The root is applied once more through allOf before the cycle is cut.
        assert_eq!(
            run(json!({ "allOf": [{ "$ref": "#" }], "type": "string" }), json!(1))?,
            pairs(&[("", "type"), ("", "type")])
        );
        Ok(())
    }

    #[test]
    fn tuple_items() -> Result<(), Error> {
        let schema = json!({
            "items": [{ "type": "integer" }, { "type": "string" }],
            "additionalItems": { "type": "boolean" }
        });

        assert_eq!(run(schema.clone(), json!([1, "a", true, false]))?, pairs(&[]));
        assert_eq!(
            run(schema, json!(["a", 1, null]))?,
            pairs(&[("/0", "type"), ("/1", "type"), ("/2", "type")])
        );

        let closed = json!({ "items": [{}], "additionalItems": false });
        assert_eq!(run(closed.clone(), json!([1]))?, pairs(&[]));
        assert_eq!(run(closed, json!([1, 2, 3]))?, pairs(&[("", "additionalItems")]));

        // additionalItems does nothing without a tuple.
        assert_eq!(
            run(json!({ "items": {}, "additionalItems": false }), json!([1, 2]))?,
            pairs(&[])
        );
        Ok(())
    }

    #[test]
    fn contains() -> Result<(), Error> {
        let schema = json!({ "contains": { "minimum": 5 } });
        assert_eq!(run(schema.clone(), json!([1, 7]))?, pairs(&[]));
        assert_eq!(run(schema.clone(), json!([1, 2]))?, pairs(&[("", "contains")]));
        assert_eq!(run(schema.clone(), json!([]))?, pairs(&[("", "contains")]));
        assert_eq!(run(schema, json!("not an array"))?, pairs(&[]));
        Ok(())
    }

    #[test]
    fn object_applicators() -> Result<(), Error> {
        let schema = json!({
            "properties": { "id": { "type": "integer" } },
            "patternProperties": { "^x-": { "type": "string" } },
            "additionalProperties": false
        });

        assert_eq!(run(schema.clone(), json!({ "id": 1, "x-a": "b" }))?, pairs(&[]));
        assert_eq!(
            run(schema, json!({ "id": "1", "x-a": 2, "other": 1, "more": 2 }))?,
            pairs(&[
                ("/id", "type"),
                ("/x-a", "type"),
                ("", "additionalProperties"),
                ("", "additionalProperties"),
            ])
        );

        let typed = json!({
            "properties": { "a": {} },
            "additionalProperties": { "type": "number" }
        });
        assert_eq!(
            run(typed, json!({ "a": "x", "b": 1, "c": "y" }))?,
            pairs(&[("/c", "type")])
        );
        Ok(())
    }

    #[test]
    fn pattern_properties_search_anywhere() -> Result<(), Error> {
        let schema = json!({
            "patternProperties": { "id": { "type": "integer" } },
            "additionalProperties": false
        });

        assert_eq!(
            run(schema, json!({ "user_id_1": "a", "name": 1 }))?,
            pairs(&[("/user_id_1", "type"), ("", "additionalProperties")])
        );
        Ok(())
    }

    #[test]
    fn dependencies_and_property_names() -> Result<(), Error> {
        let schema = json!({
            "dependencies": { "card": { "required": ["billing"] } },
            "propertyNames": { "maxLength": 4 }
        });

        assert_eq!(run(schema.clone(), json!({ "name": 1 }))?, pairs(&[]));
        assert_eq!(
            run(schema, json!({ "card": 1, "address": 2 }))?,
            pairs(&[("", "required"), ("", "maxLength")])
        );
        Ok(())
    }

    #[test]
    fn property_names_through_recursive_references() -> Result<(), Error> {
        let schema = json!({
            "properties": { "child": { "$ref": "#" } },
            "propertyNames": { "$ref": "#/definitions/name" },
            "definitions": {
                "name": {
                    "anyOf": [{ "pattern": "^[a-z]+$" }, { "$ref": "#/definitions/name" }]
                }
            }
        });

        assert_eq!(run(schema.clone(), json!({ "child": { "child": {} } }))?, pairs(&[]));
        assert_eq!(
            run(schema.clone(), json!({ "child": { "child": { "Bad": 1 } } }))?,
            pairs(&[])
        );

        let strict = json!({
            "properties": { "child": { "$ref": "#" } },
            "propertyNames": { "$ref": "#/definitions/name" },
            "definitions": { "name": { "pattern": "^[a-z]+$" } }
        });
        assert_eq!(
            run(strict, json!({ "child": { "child": { "Bad": 1, "Worse": 2 } } }))?,
            pairs(&[("/child/child", "pattern"), ("/child/child", "pattern")])
        );
        Ok(())
    }

    #[test]
    fn all_of_reports_every_failure() -> Result<(), Error> {
        let schema = json!({
            "allOf": [{ "type": "string" }, { "minimum": 10 }, { "type": "number" }]
        });

        assert_eq!(
            run(schema, json!(3))?,
            pairs(&[("", "type"), ("", "minimum")])
        );
        Ok(())
    }

    #[test]
    fn any_of() -> Result<(), Error> {
        let schema = json!({ "anyOf": [{ "type": "string" }, { "minimum": 10 }] });

        assert_eq!(run(schema.clone(), json!("x"))?, pairs(&[]));
        assert_eq!(run(schema.clone(), json!(12))?, pairs(&[]));
        assert_eq!(
            run(schema, json!(3))?,
            pairs(&[("", "type"), ("", "minimum")])
        );
        Ok(())
    }

    #[test]
    fn one_of() -> Result<(), Error> {
        let schema = json!({ "oneOf": [{ "type": "integer" }, { "minimum": 2 }] });

        assert_eq!(run(schema.clone(), json!(1))?, pairs(&[]));
        assert_eq!(run(schema.clone(), json!(2.5))?, pairs(&[]));
        assert_eq!(run(schema.clone(), json!(3))?, pairs(&[("", "oneOf")]));
        assert_eq!(
            run(schema, json!(1.5))?,
            pairs(&[("", "type"), ("", "minimum")])
        );
        Ok(())
    }

    #[test]
    fn not() -> Result<(), Error> {
        let schema = json!({ "not": { "type": "string" } });
        assert_eq!(run(schema.clone(), json!(1))?, pairs(&[]));
        assert_eq!(run(schema, json!("x"))?, pairs(&[("", "not")]));
        Ok(())
    }

    #[test]
    fn conditional() -> Result<(), Error> {
        let schema = json!({
            "if": { "properties": { "kind": { "const": "circle" } }, "required": ["kind"] },
            "then": { "required": ["radius"] },
            "else": { "required": ["width"] }
        });

        assert_eq!(run(schema.clone(), json!({ "kind": "circle", "radius": 1 }))?, pairs(&[]));
        assert_eq!(run(schema.clone(), json!({ "kind": "circle" }))?, pairs(&[("", "required")]));
        assert_eq!(run(schema.clone(), json!({ "kind": "square", "width": 1 }))?, pairs(&[]));
        assert_eq!(run(schema, json!({ "kind": "square" }))?, pairs(&[("", "required")]));

        // Without a branch for the outcome, if has no effect at all.
        assert_eq!(run(json!({ "if": false, "then": false }), json!(1))?, pairs(&[]));
        Ok(())
    }

    #[test]
    fn boolean_schemas() -> Result<(), Error> {
        assert_eq!(run(json!(true), json!({ "any": "thing" }))?, pairs(&[]));
        assert_eq!(run(json!(false), json!(null))?, pairs(&[("", "false")]));
        Ok(())
    }

    #[test]
    fn assertions_come_before_nested_errors() -> Result<(), Error> {
        let schema = json!({
            "properties": { "a": { "type": "string" } },
            "required": ["b"],
            "minProperties": 3
        });

        assert_eq!(
            run(schema, json!({ "a": 1 }))?,
            pairs(&[("", "minProperties"), ("", "required"), ("/a", "type")])
        );
        Ok(())
    }
}
