// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use serde_json::Value;

/// Column and table ids never contain spaces on the datastore side.
pub fn normalize_column(name: &str) -> String {
    name.replace(' ', "_")
}

/// Render a scalar cell as text. Null and empty strings read as absent.
pub fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Strict numeric coercion: JSON numbers, or strings that parse as a finite float.
/// "NaN", "inf" and overflowing literals like "1e999" are rejected.
pub fn json_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Keep only ASCII digits and '.' before parsing, so "$1,234.5" reads as 1234.5.
pub fn coerce_lossy_f64(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lossy coercion over a JSON scalar via its textual form.
pub fn json_lossy_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => coerce_lossy_f64(s),
        Value::Number(n) => coerce_lossy_f64(&n.to_string()),
        _ => None,
    }
}
