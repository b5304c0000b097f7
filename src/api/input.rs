//! Lenient scalar parsing for form-driven payloads.
//!
//! The browser forms post whatever their inputs hold: numbers, numeric
//! strings, or `""` for an untouched field. Empty strings and `null` mean
//! "not specified" and become `None`.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub fn number_from_value(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| "expected a number".to_string()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a number", s)),
        _ => Err("expected a number".to_string()),
    }
}

pub fn integer_from_value(value: &Value) -> Result<Option<i64>, String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err("expected a whole number".to_string()),
            },
        },
        Value::String(s) if !s.trim().is_empty() => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("'{}' is not a whole number", s)),
        other => number_from_value(other).map(|_| None),
    }
}

pub fn small_integer_from_value(value: &Value) -> Result<Option<i32>, String> {
    match integer_from_value(value)? {
        Some(i) => i32::try_from(i)
            .map(Some)
            .map_err(|_| format!("{} is out of range", i)),
        None => Ok(None),
    }
}

pub fn bool_from_value(value: &Value) -> Result<Option<bool>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err("expected true or false".to_string()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(format!("'{}' is not true or false", s)),
        },
        _ => Err("expected true or false".to_string()),
    }
}

pub fn text_from_value(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err("expected text".to_string()),
    }
}

// serde adapters, used as `#[serde(default, deserialize_with = "...")]`

pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    number_from_value(&Value::deserialize(d)?).map_err(de::Error::custom)
}

pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    integer_from_value(&Value::deserialize(d)?).map_err(de::Error::custom)
}

pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    small_integer_from_value(&Value::deserialize(d)?).map_err(de::Error::custom)
}

pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    bool_from_value(&Value::deserialize(d)?).map_err(de::Error::custom)
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    text_from_value(&Value::deserialize(d)?).map_err(de::Error::custom)
}
