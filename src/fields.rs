//! Dotted-path field resolution over arbitrary JSON payloads.
//!
//! Paths look like `"data.rates.USD"` or `"values.0.close"`; numeric
//! segments index into arrays. Financial APIs disagree wildly on response
//! shape, so nothing here validates: a path that doesn't fit the document
//! resolves to nothing and renders as `"N/A"`.

use serde_json::Value;

/// Resolves `path` against `document`, segment by segment.
///
/// A null node short-circuits the walk. A segment that parses as a number
/// must land on an array (anything else resolves to `None`); any other
/// segment is looked up as an object key, with an absent key resolving to
/// `None` rather than an error.
pub fn resolve<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;

    for segment in path.split('.') {
        if current.is_null() {
            return None;
        }

        // Handle array access like "values.0.close"
        current = match segment.parse::<usize>() {
            Ok(index) => match current {
                Value::Array(items) => items.get(index)?,
                _ => return None,
            },
            Err(_) => match current {
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            },
        };
    }

    Some(current)
}

/// Enumerates every leaf path of a sample document, in key order.
///
/// Arrays are collapsed by inspecting only their first element (the
/// discovered paths assume homogeneous arrays), so `{"values": [{"close":
/// 1}]}` yields `"values.0.close"`. An empty array under a key yields the
/// sentinel path `"key[]"`; a top-level empty array yields nothing.
pub fn enumerate(document: &Value) -> Vec<String> {
    let mut fields = Vec::new();
    extract(document, "", &mut fields);
    fields
}

fn extract(value: &Value, prefix: &str, fields: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            if let Some(first) = items.first() {
                let child = if prefix.is_empty() {
                    "0".to_string()
                } else {
                    format!("{}.0", prefix)
                };
                extract(first, &child, fields);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };

                match child {
                    Value::Array(items) => match items.first() {
                        Some(first) => extract(first, &format!("{}.0", path), fields),
                        None => fields.push(format!("{}[]", path)),
                    },
                    Value::Object(_) => extract(child, &path, fields),
                    _ => fields.push(path),
                }
            }
        }
        _ => {}
    }
}

/// Formats a resolved value for display: missing/null becomes `"N/A"`,
/// numbers are grouped with up to 8 fractional digits, strings pass
/// through, anything else falls back to its JSON rendering.
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                group_digits(&i.to_string())
            } else {
                format_f64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    // Up to 8 fractional digits, trailing zeros dropped.
    let fixed = format!("{:.8}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');

    match trimmed.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{}", group_digits(int_part), frac_part),
        None => group_digits(trimmed),
    }
}

/// Inserts thousands separators into a (possibly signed) integer string.
fn group_digits(raw: &str) -> String {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}", sign, grouped)
}
