//! Lenient readers for JSON parameter objects.
//!
//! Each helper returns `default` when the key is missing or holds the wrong
//! JSON type, so partially specified parameter objects always resolve.

use serde_json::Value;

/// Reads a number (integers included) from `params[name]`.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Reads a non-negative integer from `params[name]`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads a non-negative integer that fits in `u32` from `params[name]`.
pub fn param_u32(params: &Value, name: &str, default: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads a `u64` from `params[name]`.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}
