//! Helpers over `serde_json::Value`: type tags, numeric comparison, and the
//! structural equality shared by `const`, `enum` and `uniqueItems`.

use serde_json::{Number, Value};
use std::cmp::Ordering;

/// The name JSON Schema uses for the type of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if is_integer(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a number has no fractional part, however it was written.
pub fn is_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }

    n.as_f64().map_or(false, |f| f.is_finite() && f.fract() == 0.0)
}

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn as_f64(n: &Number) -> f64 {
    // serde_json numbers are always representable as f64 without
    // arbitrary_precision.
    n.as_f64().unwrap_or(f64::NAN)
}

// Integral floats within i128 range compare exactly against integers.
fn as_exact(n: &Number) -> Option<i128> {
    as_i128(n).or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 1e38)
            .map(|f| f as i128)
    })
}

/// Compares two numbers, exactly when both are integral.
pub fn compare(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (as_exact(a), as_exact(b)) {
        return a.cmp(&b);
    }

    as_f64(a)
        .partial_cmp(&as_f64(b))
        .unwrap_or(Ordering::Equal)
}

/// Whether `value` is an integral multiple of `divisor`.
///
/// Integer operands are checked exactly. Otherwise the floating-point
/// remainder is compared against an epsilon scaled to the operands, so that
/// `0.3` counts as a multiple of `0.1`.
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (as_i128(value), as_i128(divisor)) {
        if d != 0 {
            return v % d == 0;
        }
    }

    let v = as_f64(value);
    let d = as_f64(divisor);
    if d == 0.0 || !v.is_finite() || !d.is_finite() {
        return false;
    }

    let quotient = v / d;
    if !quotient.is_finite() {
        return false;
    }

    let remainder = (v % d).abs();
    let epsilon = 4.0 * f64::EPSILON * v.abs().max(d.abs());
    remainder <= epsilon || (d.abs() - remainder).abs() <= epsilon
}

/// Structural equality in the JSON Schema sense.
///
/// Numbers compare by value (`1` equals `1.0`), arrays compare in order, and
/// objects compare by key set regardless of key order.
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => compare(a, b) == Ordering::Equal,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, a)| b.get(key).map_or(false, |b| equal(a, b)))
        }
        _ => false,
    }
}

/// The length of a string in Unicode code points.
pub fn code_points(s: &str) -> usize {
    s.chars().count()
}

/// A compact rendering of a value for use in messages.
pub fn describe(value: &Value) -> String {
    value.to_string()
}
