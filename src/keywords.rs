//! Assertion keywords.
//!
//! Each function here checks one keyword family of a single node against a
//! single instance value, without looking at any other node. Keywords that
//! apply sub-schemas (`items`, `properties`, `allOf`, ...) need the driver's
//! recursion and live in the vm instead.

use crate::format;
use crate::schema::{Dependency, Keywords, SchemaNode, Type};
use crate::validator::{PathSegment, ValidationError};
use crate::value::{code_points, compare, describe, equal, is_multiple_of};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

struct Sink<'n> {
    node: &'n SchemaNode,
    path: &'n [PathSegment],
    errors: Vec<ValidationError>,
}

impl<'n> Sink<'n> {
    fn fail(&mut self, keyword: &'static str, message: String) {
        self.errors
            .push(ValidationError::at(self.node, self.path, keyword, message));
    }
}

/// Evaluate every assertion keyword of `node` against `instance`, which
/// lives at `path`.
pub(crate) fn evaluate(
    node: &SchemaNode,
    keywords: &Keywords,
    instance: &Value,
    path: &[PathSegment],
    check_formats: bool,
) -> Vec<ValidationError> {
    let mut sink = Sink {
        node,
        path,
        errors: vec![],
    };

    type_(&mut sink, keywords, instance);
    enum_(&mut sink, keywords, instance);
    const_(&mut sink, keywords, instance);

    match instance {
        Value::Number(n) => numeric(&mut sink, keywords, instance, n),
        Value::String(s) => string(&mut sink, keywords, instance, s, check_formats),
        Value::Array(items) => array(&mut sink, keywords, instance, items),
        Value::Object(map) => object(&mut sink, keywords, instance, map),
        _ => {}
    }

    sink.errors
}

fn type_(sink: &mut Sink, keywords: &Keywords, instance: &Value) {
    let types = match keywords.types {
        Some(ref types) => types,
        None => return,
    };

    if !types.matches(instance) {
        let names: Vec<String> = types.iter().map(|t: Type| format!("{:?}", t.name())).collect();
        sink.fail(
            "type",
            format!("{} is not of type {}", describe(instance), names.join(", ")),
        );
    }
}

fn enum_(sink: &mut Sink, keywords: &Keywords, instance: &Value) {
    if let Some(ref values) = keywords.enumeration {
        if !values.iter().any(|v| equal(v, instance)) {
            sink.fail(
                "enum",
                format!(
                    "{} is not one of {}",
                    describe(instance),
                    describe(&Value::Array(values.clone()))
                ),
            );
        }
    }
}

fn const_(sink: &mut Sink, keywords: &Keywords, instance: &Value) {
    if let Some(ref expected) = keywords.constant {
        if !equal(expected, instance) {
            sink.fail("const", format!("{} was expected", describe(expected)));
        }
    }
}

fn numeric(sink: &mut Sink, keywords: &Keywords, instance: &Value, n: &Number) {
    let shown = describe(instance);

    if let Some(ref min) = keywords.minimum {
        if compare(n, min) == Ordering::Less {
            sink.fail(
                "minimum",
                format!("{} is less than the minimum of {}", shown, min),
            );
        }
    }

    if let Some(ref max) = keywords.maximum {
        if compare(n, max) == Ordering::Greater {
            sink.fail(
                "maximum",
                format!("{} is greater than the maximum of {}", shown, max),
            );
        }
    }

    if let Some(ref min) = keywords.exclusive_minimum {
        if compare(n, min) != Ordering::Greater {
            sink.fail(
                "exclusiveMinimum",
                format!("{} is less than or equal to the minimum of {}", shown, min),
            );
        }
    }

    if let Some(ref max) = keywords.exclusive_maximum {
        if compare(n, max) != Ordering::Less {
            sink.fail(
                "exclusiveMaximum",
                format!("{} is greater than or equal to the maximum of {}", shown, max),
            );
        }
    }

    if let Some(ref divisor) = keywords.multiple_of {
        if !is_multiple_of(n, divisor) {
            sink.fail(
                "multipleOf",
                format!("{} is not a multiple of {}", shown, divisor),
            );
        }
    }
}

fn string(sink: &mut Sink, keywords: &Keywords, instance: &Value, s: &str, check_formats: bool) {
    let length = code_points(s) as u64;

    if let Some(min) = keywords.min_length {
        if length < min {
            sink.fail(
                "minLength",
                format!("{} is shorter than {} characters", describe(instance), min),
            );
        }
    }

    if let Some(max) = keywords.max_length {
        if length > max {
            sink.fail(
                "maxLength",
                format!("{} is longer than {} characters", describe(instance), max),
            );
        }
    }

    if let Some(ref pattern) = keywords.pattern {
        if !pattern.is_match(s) {
            sink.fail(
                "pattern",
                format!("{} does not match {:?}", describe(instance), pattern.as_str()),
            );
        }
    }

    if check_formats {
        if let Some(ref name) = keywords.format {
            if !format::is_valid(name, s) {
                sink.fail(
                    "format",
                    format!("{} is not a valid {:?}", describe(instance), name),
                );
            }
        }
    }
}

fn array(sink: &mut Sink, keywords: &Keywords, instance: &Value, items: &[Value]) {
    let len = items.len() as u64;

    if let Some(min) = keywords.min_items {
        if len < min {
            sink.fail(
                "minItems",
                format!("{} has fewer than {} items", describe(instance), min),
            );
        }
    }

    if let Some(max) = keywords.max_items {
        if len > max {
            sink.fail(
                "maxItems",
                format!("{} has more than {} items", describe(instance), max),
            );
        }
    }

    if keywords.unique_items {
        if let Some((i, j)) = first_duplicate(items) {
            sink.fail(
                "uniqueItems",
                format!(
                    "{} has non-unique elements (items {} and {} are equal)",
                    describe(instance),
                    i,
                    j
                ),
            );
        }
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (i, a) in items.iter().enumerate() {
        for (j, b) in items.iter().enumerate().skip(i + 1) {
            if equal(a, b) {
                return Some((i, j));
            }
        }
    }

    None
}

fn object(sink: &mut Sink, keywords: &Keywords, instance: &Value, map: &Map<String, Value>) {
    let len = map.len() as u64;

    if let Some(min) = keywords.min_properties {
        if len < min {
            sink.fail(
                "minProperties",
                format!("{} has fewer than {} properties", describe(instance), min),
            );
        }
    }

    if let Some(max) = keywords.max_properties {
        if len > max {
            sink.fail(
                "maxProperties",
                format!("{} has more than {} properties", describe(instance), max),
            );
        }
    }

    for name in &keywords.required {
        if !map.contains_key(name) {
            sink.fail("required", format!("{:?} is a required property", name));
        }
    }

    for (name, dependency) in &keywords.dependencies {
        if let Dependency::Required(companions) = dependency {
            if !map.contains_key(name) {
                continue;
            }

            for companion in companions {
                if !map.contains_key(companion) {
                    sink.fail(
                        "dependencies",
                        format!("{:?} is a dependency of {:?}", companion, name),
                    );
                }
            }
        }
    }
}
