use failure::Error;
use jsv::{Config, PathSegment, Registry, Schema, SchemaError, ValidationResult, Validator};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::thread;

fn summary(result: &ValidationResult) -> Vec<(String, &'static str, String)> {
    result
        .errors()
        .iter()
        .map(|e| {
            (
                e.instance_path().to_string(),
                e.keyword(),
                e.message().to_owned(),
            )
        })
        .collect()
}

fn check(schema: Value, instance: Value) -> Result<ValidationResult, Error> {
    Ok(jsv::validate(&Schema::compile(&schema)?, &instance))
}

#[test]
fn valid_iff_no_errors() -> Result<(), Error> {
    let cases = vec![
        (json!({ "type": "string" }), json!("a")),
        (json!({ "type": "string" }), json!(1)),
        (json!({ "not": {} }), json!(null)),
        (json!(false), json!({})),
        (json!({ "anyOf": [false, { "minimum": 1 }] }), json!(0)),
        (json!({ "items": { "$ref": "#" }, "maxItems": 1 }), json!([[[1, 2]]])),
    ];

    for (schema, instance) in cases {
        let result = check(schema, instance)?;
        assert_eq!(result.is_valid(), result.errors().is_empty());
    }

    Ok(())
}

#[test]
fn validation_is_deterministic() -> Result<(), Error> {
    let schema = Schema::compile(&json!({
        "properties": {
            "a": { "type": "integer" },
            "b": { "anyOf": [{ "type": "string" }, { "minimum": 3 }] }
        },
        "patternProperties": { "^x": { "maxLength": 1 } },
        "additionalProperties": false
    }))?;
    let instance = json!({ "a": 1.5, "b": 1, "xy": "long", "zz": null, "yy": null });

    let first = jsv::validate(&schema, &instance);
    let second = jsv::validate(&schema, &instance);
    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);
    assert_eq!(6, first.errors().len());
    Ok(())
}

#[test]
fn all_of_is_the_union_of_its_parts() -> Result<(), Error> {
    let a = json!({ "type": "string" });
    let b = json!({ "minimum": 10 });
    let both = json!({ "allOf": [a.clone(), b.clone()] });

    for instance in vec![json!(3), json!("x"), json!(12), json!(null)] {
        let left = check(a.clone(), instance.clone())?;
        let right = check(b.clone(), instance.clone())?;
        let combined = check(both.clone(), instance)?;

        assert_eq!(left.is_valid() && right.is_valid(), combined.is_valid());

        let mut union = summary(&left);
        union.extend(summary(&right));
        assert_eq!(union, summary(&combined));
    }

    Ok(())
}

#[test]
fn one_of_needs_exactly_one_match() -> Result<(), Error> {
    let schema = json!({ "oneOf": [{ "type": "integer" }, { "minimum": 2 }] });

    assert!(check(schema.clone(), json!(1))?.is_valid());
    assert!(check(schema.clone(), json!(2.5))?.is_valid());

    let both = check(schema, json!(3))?;
    assert_eq!(
        vec![(
            "".to_owned(),
            "oneOf",
            "3 matched 2 schemas (indices [0, 1]), expected 1".to_owned()
        )],
        summary(&both)
    );
    Ok(())
}

#[test]
fn recursive_schema() -> Result<(), Error> {
    let schema = json!({ "type": "object", "properties": { "next": { "$ref": "#" } } });

    assert!(check(schema.clone(), json!({ "next": { "next": {} } }))?.is_valid());

    let result = check(schema, json!({ "next": { "next": "oops" } }))?;
    assert_eq!(1, result.errors().len());

    let error = &result.errors()[0];
    let expected = vec![PathSegment::from("next"), PathSegment::from("next")];
    assert_eq!(&expected[..], error.instance_path().segments());
    assert_eq!("type", error.keyword());
    Ok(())
}

#[test]
fn integers_ignore_encoding() -> Result<(), Error> {
    let schema = json!({ "type": "integer" });
    assert!(check(schema.clone(), json!(4.0))?.is_valid());

    let result = check(schema, json!(4.5))?;
    assert_eq!(
        vec![("".to_owned(), "type", "4.5 is not of type \"integer\"".to_owned())],
        summary(&result)
    );
    Ok(())
}

#[test]
fn required_and_properties_are_separate() -> Result<(), Error> {
    let schema = json!({ "required": ["a"], "properties": { "a": { "type": "string" } } });

    let wrong_type = check(schema.clone(), json!({ "a": 5 }))?;
    assert_eq!(1, wrong_type.errors().len());
    assert_eq!("/a", wrong_type.errors()[0].instance_path().to_string());
    assert_eq!("type", wrong_type.errors()[0].keyword());

    let missing = check(schema, json!({}))?;
    assert_eq!(1, missing.errors().len());
    assert!(missing.errors()[0].instance_path().is_root());
    assert_eq!("required", missing.errors()[0].keyword());
    Ok(())
}

#[test]
fn patterns_search_unanchored() -> Result<(), Error> {
    assert!(!check(json!({ "pattern": "^[0-9]+$" }), json!("abc123"))?.is_valid());
    assert!(check(json!({ "pattern": "[0-9]+" }), json!("abc123"))?.is_valid());
    Ok(())
}

#[test]
fn references_into_a_registry() -> Result<(), Error> {
    let mut registry = Registry::new();
    registry.register(json!({
        "$id": "http://example.com/defs.json",
        "definitions": { "name": { "type": "string", "minLength": 1 } }
    }))?;

    let schema = Schema::compile_with(
        &json!({
            "properties": {
                "name": { "$ref": "http://example.com/defs.json#/definitions/name" }
            }
        }),
        &registry,
    )?;

    assert!(jsv::validate(&schema, &json!({ "name": "x" })).is_valid());

    let result = jsv::validate(&schema, &json!({ "name": "" }));
    assert_eq!(1, result.errors().len());
    assert_eq!("/name", result.errors()[0].instance_path().to_string());
    assert_eq!(
        "/definitions/name/minLength",
        result.errors()[0].schema_path().to_string()
    );
    Ok(())
}

#[test]
fn compile_errors_are_not_validation_errors() {
    match Schema::compile(&json!({ "$ref": "http://example.com/elsewhere.json" })) {
        Err(SchemaError::UnresolvableRef { pointer, reference }) => {
            assert_eq!("/$ref", pointer);
            assert_eq!("http://example.com/elsewhere.json", reference);
        }
        other => panic!("expected an unresolvable reference, got {:?}", other),
    }

    match Schema::compile(&json!({ "pattern": "(" })) {
        Err(SchemaError::InvalidPattern { pointer, .. }) => assert_eq!("/pattern", pointer),
        other => panic!("expected an invalid pattern, got {:?}", other),
    }

    match Schema::compile(&json!({ "items": 3 })) {
        Err(SchemaError::MalformedSchema { pointer, .. }) => assert_eq!("/items", pointer),
        other => panic!("expected a malformed schema, got {:?}", other),
    }
}

#[test]
fn unknown_keywords_are_ignored() -> Result<(), Error> {
    let schema = json!({ "x-frobnicate": 3, "title": "anything", "type": "null" });
    assert!(check(schema, json!(null))?.is_valid());
    Ok(())
}

#[test]
fn concurrent_validation() -> Result<(), Error> {
    let schema = Schema::compile(&json!({
        "type": "array",
        "items": { "type": "integer", "multipleOf": 3 }
    }))?;
    let validator = Validator::new_with_config(Config::new().max_errors(0).clone());

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let schema = &schema;
                let validator = &validator;
                scope.spawn(move || {
                    let instance = json!([3, 6, i * 3 + 1]);
                    validator.validate(schema, &instance)
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().expect("validation thread panicked");
            assert_eq!(1, result.errors().len());
            assert_eq!("/2", result.errors()[0].instance_path().to_string());
        }
    });

    Ok(())
}
