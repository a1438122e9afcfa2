//! Lenient numeric parsing for persisted data.
//!
//! Character sheets edited by hand (or exported by older builds) routinely
//! carry numbers as strings, nulls, or missing fields. Every numeric field on
//! a persisted type funnels through these helpers so a bad value decodes as 0
//! instead of failing the whole import or leaking a non-number into a derived
//! total.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Clamp a value into an inclusive range.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(true) => 1,
        _ => 0,
    }
}

fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// Deserialize an `i32` from a number, numeric string, bool, or null.
pub fn int_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(coerce_i64(&value) as i32)
}

/// Deserialize a `u32`, flooring negatives to 0.
pub fn uint_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(coerce_i64(&value).max(0) as u32)
}

/// Deserialize a `u64`, flooring negatives to 0.
pub fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(coerce_i64(&value).max(0) as u64)
}

/// Deserialize an `f64` from a number, numeric string, bool, or null.
/// NaN and infinities decode as 0 so they can never reach a displayed total.
pub fn float_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(d)?;
    let f = coerce_f64(&value);
    if f.is_finite() {
        Ok(f)
    } else {
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "int_or_zero")]
        a: i32,
        #[serde(default, deserialize_with = "float_or_zero")]
        b: f64,
        #[serde(default, deserialize_with = "uint_or_zero")]
        c: u32,
    }

    #[test]
    fn test_coerces_strings_and_nulls() {
        let f: Fields = serde_json::from_str(r#"{"a": "12", "b": null, "c": "-3"}"#).unwrap();
        assert_eq!(f.a, 12);
        assert_eq!(f.b, 0.0);
        assert_eq!(f.c, 0);
    }

    #[test]
    fn test_coerces_garbage_to_zero() {
        let f: Fields = serde_json::from_str(r#"{"a": "abc", "b": "1.5", "c": 7}"#).unwrap();
        assert_eq!(f.a, 0);
        assert_eq!(f.b, 1.5);
        assert_eq!(f.c, 7);
    }

    #[test]
    fn test_missing_fields_default() {
        let f: Fields = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(f.a, 0);
        assert_eq!(f.b, 0.0);
        assert_eq!(f.c, 0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-1, 0, 10), 0);
        assert_eq!(clamp(11, 0, 10), 10);
    }
}
